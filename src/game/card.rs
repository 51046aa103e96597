use std::fmt::{self, Display};

use log::debug;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::Serialize;

use crate::TrainerError;

/// Below this many decks remaining, the true count is reported as unavailable
/// rather than blowing up from the tiny denominator.
const MIN_DECKS_FOR_TRUE_COUNT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Blackjack value of the rank. Aces count as 11 here; the hand evaluator
    /// reprojects them to 1 as needed.
    pub fn value(&self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }

    /// Hi-Lo tag of the rank: +1 for 2-6, 0 for 7-9, -1 for tens and aces.
    pub fn count_value(&self) -> i32 {
        match self.value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }

    /// True for T, J, Q and K, the ranks the strategy tables treat as one "ten".
    pub fn is_ten_value(&self) -> bool {
        !matches!(self, Rank::Ace) && self.value() == 10
    }

    pub fn symbol(&self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub fn symbol(&self) -> char {
        match self {
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
            Suit::Spades => 'S',
        }
    }
}

/// A single card in the shoe or in a hand. `face_up` flips exactly once, when a
/// hole card is revealed; its Hi-Lo value enters the running count at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    face_up: bool,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card {
            rank,
            suit,
            face_up: true,
        }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn count_value(&self) -> i32 {
        self.rank.count_value()
    }

    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    pub(crate) fn set_face_up(&mut self, face_up: bool) {
        self.face_up = face_up;
    }

    /// Two-character label, e.g. "AH" or "TC". Face-down cards render as "??".
    pub fn label(&self) -> String {
        if self.face_up {
            format!("{}{}", self.rank.symbol(), self.suit.symbol())
        } else {
            "??".to_string()
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A multi-deck shoe plus the Hi-Lo running count for its lifetime. Cards are
/// drawn from the back only; a rebuild reshuffles all `num_decks * 52` cards and
/// resets the running count to zero.
pub struct Shoe {
    cards: Vec<Card>,
    num_decks: usize,
    running_count: i32,
}

impl Shoe {
    pub fn new(num_decks: usize) -> Shoe {
        let mut shoe = Shoe {
            cards: Vec::new(),
            num_decks,
            running_count: 0,
        };
        shoe.rebuild();
        shoe
    }

    /// Rebuilds the full shoe, shuffles it uniformly and resets the running count.
    pub fn rebuild(&mut self) {
        self.cards.clear();
        for _ in 0..self.num_decks {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    self.cards.push(Card::new(rank, suit));
                }
            }
        }
        self.cards.shuffle(&mut thread_rng());
        self.running_count = 0;
        debug!(
            "shoe rebuilt with {} decks ({} cards), running count reset",
            self.num_decks,
            self.cards.len()
        );
    }

    /// Draws the next card. Face-up draws are counted immediately; face-down
    /// draws are counted later via [`Shoe::count_card`] when revealed. An empty
    /// shoe forces one rebuild before giving up.
    pub fn draw(&mut self, face_up: bool) -> Result<Card, TrainerError> {
        if self.cards.is_empty() {
            debug!("shoe empty on draw, forcing a reshuffle");
            self.rebuild();
        }
        let mut card = self.cards.pop().ok_or(TrainerError::ShoeExhausted)?;
        card.set_face_up(face_up);
        if face_up {
            self.running_count += card.count_value();
        }
        Ok(card)
    }

    /// Applies a just-revealed card's Hi-Lo value to the running count.
    pub fn count_card(&mut self, card: &Card) {
        self.running_count += card.count_value();
    }

    /// True when the remaining cards have fallen below the penetration threshold
    /// and a fresh shoe is due before the next deal.
    pub fn needs_reshuffle(&self, penetration: f64) -> bool {
        (self.cards.len() as f64) < penetration * (self.num_decks as f64) * 52.0
    }

    pub fn cards_remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn decks_remaining(&self) -> f64 {
        self.cards.len() as f64 / 52.0
    }

    pub fn num_decks(&self) -> usize {
        self.num_decks
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    /// Running count normalized by decks remaining. `None` near shoe exhaustion,
    /// where the ratio stops being meaningful.
    pub fn true_count(&self) -> Option<f64> {
        let decks_left = self.decks_remaining();
        if decks_left < MIN_DECKS_FOR_TRUE_COUNT {
            return None;
        }
        Some(self.running_count as f64 / decks_left)
    }

    /// Swaps in a different deck count and rebuilds immediately.
    pub fn set_num_decks(&mut self, num_decks: usize) {
        self.num_decks = num_decks;
        self.rebuild();
    }

    /// Test-only shoe with a scripted draw order: `cards[0]` is drawn first.
    #[cfg(test)]
    pub(crate) fn stacked(num_decks: usize, mut cards: Vec<Card>) -> Shoe {
        cards.reverse();
        Shoe {
            cards,
            num_decks,
            running_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hi_lo_balances_over_a_full_deck() {
        // 20 low cards at +1, 20 high at -1, 12 neutral.
        let shoe = Shoe::new(1);
        let total: i32 = shoe.cards.iter().map(|c| c.count_value()).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn hi_lo_balances_over_six_decks_dealt_face_up() {
        let mut shoe = Shoe::new(6);
        assert_eq!(shoe.cards_remaining(), 312);
        for _ in 0..312 {
            shoe.draw(true).unwrap();
        }
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn face_down_draws_are_not_counted_until_revealed() {
        let cards = vec![
            Card::new(Rank::Five, Suit::Hearts),
            Card::new(Rank::King, Suit::Spades),
        ];
        let mut shoe = Shoe::stacked(1, cards);
        shoe.draw(true).unwrap();
        assert_eq!(shoe.running_count(), 1);
        let hole = shoe.draw(false).unwrap();
        assert_eq!(shoe.running_count(), 1);
        shoe.count_card(&hole);
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn reshuffle_trigger_at_quarter_penetration() {
        let mut shoe = Shoe::new(6);
        for _ in 0..(312 - 78) {
            shoe.draw(true).unwrap();
        }
        // Exactly 78 left: not yet below the threshold.
        assert!(!shoe.needs_reshuffle(0.25));
        shoe.draw(true).unwrap();
        assert!(shoe.needs_reshuffle(0.25));

        shoe.rebuild();
        assert_eq!(shoe.cards_remaining(), 312);
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn empty_shoe_rebuilds_once_on_draw() {
        let mut shoe = Shoe::new(1);
        for _ in 0..52 {
            shoe.draw(true).unwrap();
        }
        assert_eq!(shoe.cards_remaining(), 0);
        shoe.draw(true).unwrap();
        assert_eq!(shoe.cards_remaining(), 51);
    }

    #[test]
    fn true_count_unavailable_near_exhaustion() {
        let cards = vec![
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Three, Suit::Clubs),
            Card::new(Rank::Four, Suit::Clubs),
        ];
        let mut shoe = Shoe::stacked(1, cards);
        // 3 cards left is well under 0.2 decks.
        assert!(shoe.true_count().is_none());
        shoe.rebuild();
        assert_eq!(shoe.true_count(), Some(0.0));
    }

    #[test]
    fn true_count_divides_by_decks_remaining() {
        let mut cards: Vec<Card> = Vec::new();
        // 52 low cards on top of a full-deck tail so one deck remains afterwards.
        for _ in 0..13 {
            for suit in Suit::ALL {
                cards.push(Card::new(Rank::Two, suit));
            }
        }
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        let mut shoe = Shoe::stacked(2, cards);
        for _ in 0..52 {
            shoe.draw(true).unwrap();
        }
        assert_eq!(shoe.running_count(), 52);
        assert_eq!(shoe.true_count(), Some(52.0));
    }
}
