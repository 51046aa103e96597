use crate::game::card::{Card, Rank};

/// An ordered run of cards belonging to the dealer or to one of the player's
/// hands. Totals only see face-up cards, so a dealer hand with a hidden hole
/// card reports just the up-card's value until the reveal.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand { cards: Vec::new() }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Removes and returns the last card; used when splitting a pair.
    pub(crate) fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Sums blackjack values over a set of cards, counting each Ace as 11 and
    /// then reprojecting Aces to 1 one at a time while the total exceeds 21.
    /// Returns the total and whether an Ace is still counted as 11.
    fn project(cards: impl Iterator<Item = Card>) -> (u8, bool) {
        let mut total: u32 = 0;
        let mut aces = 0u32;
        for card in cards {
            total += u32::from(card.value());
            if card.rank == Rank::Ace {
                aces += 1;
            }
        }
        while total > 21 && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        (total.min(u8::MAX as u32) as u8, aces > 0)
    }

    /// Total of the face-up cards with Ace reprojection.
    pub fn total(&self) -> u8 {
        let (total, _) = Self::project(self.cards.iter().copied().filter(Card::is_face_up));
        total
    }

    /// True iff at least one Ace currently contributes 11 to the face-up total.
    pub fn is_soft(&self) -> bool {
        let (_, soft) = Self::project(self.cards.iter().copied().filter(Card::is_face_up));
        soft
    }

    /// Total over all cards, hidden ones included. Used to spot a dealer
    /// natural while the hole card is still face down.
    pub fn total_all(&self) -> u8 {
        let (total, _) = Self::project(self.cards.iter().copied());
        total
    }

    /// Exactly two cards totalling 21, face state ignored.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.total_all() == 21
    }

    /// Exactly two face-up cards totalling 21.
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.total() == 21
    }

    /// Exactly two cards of the same rank. A ten next to a king is a twenty,
    /// not a pair, matching the split rule.
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    pub fn is_bust(&self) -> bool {
        self.total() > 21
    }

    /// Flips the first face-down card and returns it so the caller can apply
    /// its count value. `None` when no card is hidden.
    pub fn reveal_hole_card(&mut self) -> Option<&Card> {
        let card = self.cards.iter_mut().find(|c| !c.is_face_up())?;
        card.set_face_up(true);
        Some(&*card)
    }

    /// The first face-up card; for the dealer this is the up-card.
    pub fn up_card(&self) -> Option<&Card> {
        self.cards.iter().find(|c| c.is_face_up())
    }

    /// Card labels for display, face-down cards as "??".
    pub fn labels(&self) -> Vec<String> {
        self.cards.iter().map(Card::label).collect()
    }
}
