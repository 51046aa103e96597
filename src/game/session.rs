use std::cmp::Ordering;

use log::debug;
use serde::Serialize;

use crate::game::card::{Rank, Shoe};
use crate::game::hand::Hand;
use crate::game::strategy::{
    insurance_advice, perceived_edge, recommended_bet_units, BasicStrategy, InsuranceAdvice, Play,
    Recommendation,
};
use crate::stats::SessionStats;
use crate::{TrainerConfig, TrainerError};

/// Where a round currently is. Every player-facing operation checks the phase
/// first and refuses to run out of turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Init,
    InputGuesses,
    PlayerAction,
    DealerAction,
    HandOver,
}

/// Which of the player's (at most two) hands is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandSlot {
    Main,
    Split,
}

impl HandSlot {
    fn name(&self) -> &'static str {
        match self {
            HandSlot::Main => "main",
            HandSlot::Split => "split",
        }
    }
}

/// Scoring of one pair of guesses: the running count and the play. The actual
/// values ride along so a caller can show the player what was right.
#[derive(Debug, Clone, Serialize)]
pub struct GuessFeedback {
    pub rc_correct: bool,
    pub actual_running_count: i32,
    pub strategy_correct: bool,
    pub recommended: Play,
    pub basic: Play,
    pub is_deviation: bool,
    pub deviation_note: Option<&'static str>,
}

/// How a single player hand settled against the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandOutcome {
    Bust,
    Blackjack,
    BlackjackPush,
    DealerBust,
    Win,
    Loss,
    Push,
}

impl HandOutcome {
    /// Units won or lost on a hand with the given committed bet. A natural
    /// pays 3:2, everything else even money.
    pub fn net_units(&self, bet: u32) -> f64 {
        let bet = f64::from(bet);
        match self {
            HandOutcome::Blackjack => 1.5 * bet,
            HandOutcome::DealerBust | HandOutcome::Win => bet,
            HandOutcome::Bust | HandOutcome::Loss => -bet,
            HandOutcome::BlackjackPush | HandOutcome::Push => 0.0,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(
            self,
            HandOutcome::Blackjack | HandOutcome::DealerBust | HandOutcome::Win
        )
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, HandOutcome::Bust | HandOutcome::Loss)
    }

    pub fn is_push(&self) -> bool {
        matches!(self, HandOutcome::BlackjackPush | HandOutcome::Push)
    }

    /// A natural counts whether it won or pushed against another natural.
    pub fn is_blackjack(&self) -> bool {
        matches!(self, HandOutcome::Blackjack | HandOutcome::BlackjackPush)
    }

    /// Display line for the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            HandOutcome::Bust => "Bust!",
            HandOutcome::Blackjack => "Blackjack!",
            HandOutcome::BlackjackPush => "Push, both blackjacks",
            HandOutcome::DealerBust => "Dealer busts, you win",
            HandOutcome::Win => "You win",
            HandOutcome::Loss => "Dealer wins",
            HandOutcome::Push => "Push",
        }
    }
}

/// Settlement of one player hand.
#[derive(Debug, Clone, Serialize)]
pub struct HandResult {
    pub slot: HandSlot,
    pub outcome: HandOutcome,
    pub total: u8,
    pub bet: u32,
    pub net: f64,
}

/// Settlement of a whole round, one entry per player hand.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub hands: Vec<HandResult>,
    pub dealer_total: u8,
    pub dealer_bust: bool,
    pub net: f64,
}

/// Serializable view of the table for rendering or reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub phase: Phase,
    pub dealer: Vec<String>,
    pub dealer_total: u8,
    pub main: Vec<String>,
    pub main_total: u8,
    pub split: Option<Vec<String>>,
    pub split_total: Option<u8>,
    pub active: HandSlot,
    pub bet_units: u32,
    pub running_count: i32,
    pub true_count: Option<f64>,
    pub perceived_edge: Option<f64>,
    pub cards_remaining: usize,
}

/// One training session: a shoe, the dealer's and player's hands, the round
/// state machine, and running statistics. Drives deal / guess / act / settle
/// round after round until the caller stops.
pub struct TrainerSession {
    config: TrainerConfig,
    shoe: Shoe,
    strategy: BasicStrategy,
    dealer: Hand,
    main: Hand,
    split: Option<Hand>,
    active: HandSlot,
    main_done: bool,
    split_done: bool,
    main_bet: u32,
    split_bet: u32,
    phase: Phase,
    stats: SessionStats,
    feedback: Option<GuessFeedback>,
    insurance: Option<InsuranceAdvice>,
    result: Option<RoundResult>,
}

impl TrainerSession {
    pub fn new(config: TrainerConfig) -> Result<TrainerSession, TrainerError> {
        config.validate()?;
        let shoe = Shoe::new(config.num_decks);
        Ok(TrainerSession::with_parts(config, shoe))
    }

    fn with_parts(config: TrainerConfig, shoe: Shoe) -> TrainerSession {
        TrainerSession {
            config,
            shoe,
            strategy: BasicStrategy::new(),
            dealer: Hand::new(),
            main: Hand::new(),
            split: None,
            active: HandSlot::Main,
            main_done: false,
            split_done: false,
            main_bet: 0,
            split_bet: 0,
            phase: Phase::Init,
            stats: SessionStats::default(),
            feedback: None,
            insurance: None,
            result: None,
        }
    }

    /// Test-only constructor taking a pre-arranged shoe.
    #[cfg(test)]
    pub(crate) fn with_shoe(config: TrainerConfig, shoe: Shoe) -> TrainerSession {
        TrainerSession::with_parts(config, shoe)
    }

    fn require_phase(&self, expected: Phase, action: &'static str) -> Result<(), TrainerError> {
        if self.phase != expected {
            return Err(TrainerError::IllegalAction {
                action,
                reason: format!("not allowed in phase {:?}", self.phase),
            });
        }
        Ok(())
    }

    /// Method for starting a fresh round: reshuffle check, bet sizing from the
    /// current true count, then the opening deal. Ends the round on the spot
    /// when either side has a natural.
    pub fn start_new_round(&mut self) -> Result<(), TrainerError> {
        if self.phase != Phase::Init && self.phase != Phase::HandOver {
            return Err(TrainerError::IllegalAction {
                action: "deal",
                reason: format!("round still in progress, phase {:?}", self.phase),
            });
        }

        if self.shoe.needs_reshuffle(self.config.penetration) {
            self.shoe.rebuild();
        }

        self.dealer.clear();
        self.main.clear();
        self.split = None;
        self.active = HandSlot::Main;
        self.main_done = false;
        self.split_done = false;
        self.split_bet = 0;
        self.feedback = None;
        self.insurance = None;
        self.result = None;

        // The bet is committed before any card leaves the shoe, off the
        // pre-deal true count.
        self.main_bet = recommended_bet_units(self.shoe.true_count());
        self.stats.add_wager(self.main_bet);

        self.main.push(self.shoe.draw(true)?);
        self.dealer.push(self.shoe.draw(true)?);
        self.main.push(self.shoe.draw(true)?);
        self.dealer.push(self.shoe.draw(false)?);

        debug!(
            "deal: player {:?} dealer {:?}, bet {} units, rc {}",
            self.main.labels(),
            self.dealer.labels(),
            self.main_bet,
            self.shoe.running_count()
        );

        if matches!(self.dealer.up_card(), Some(c) if c.rank == Rank::Ace) {
            self.insurance = Some(insurance_advice(self.shoe.true_count()));
        }

        if self.main.is_natural() || self.dealer.is_natural() {
            self.reveal_dealer_hole();
            self.resolve_round();
        } else {
            self.phase = Phase::InputGuesses;
        }
        Ok(())
    }

    /// Method for scoring the player's running-count and play guesses. A guess
    /// that fails to parse is simply wrong, not an error. Moves the round on
    /// to the action phase either way.
    pub fn submit_guesses(
        &mut self,
        rc_guess: Option<i32>,
        play_guess: &str,
    ) -> Result<GuessFeedback, TrainerError> {
        self.require_phase(Phase::InputGuesses, "guess")?;

        let recommendation = self.recommendation()?;
        let actual_rc = self.shoe.running_count();
        let guessed_play = play_guess
            .trim()
            .chars()
            .next()
            .and_then(Play::from_letter);
        let recommended = Play::from(recommendation.action);

        let feedback = GuessFeedback {
            rc_correct: rc_guess == Some(actual_rc),
            actual_running_count: actual_rc,
            strategy_correct: guessed_play == Some(recommended),
            recommended,
            basic: Play::from(recommendation.basic),
            is_deviation: recommendation.is_deviation(),
            deviation_note: recommendation.deviation.map(|rule| rule.note),
        };
        self.feedback = Some(feedback.clone());
        self.phase = Phase::PlayerAction;
        Ok(feedback)
    }

    /// Method for hitting the active hand. Reaching 21 or busting ends the
    /// hand automatically.
    pub fn player_hit(&mut self) -> Result<(), TrainerError> {
        self.require_phase(Phase::PlayerAction, "hit")?;
        let card = self.shoe.draw(true)?;
        self.active_hand_mut().push(card);
        if self.active_hand().total() >= 21 {
            self.finish_active()?;
        }
        Ok(())
    }

    pub fn player_stand(&mut self) -> Result<(), TrainerError> {
        self.require_phase(Phase::PlayerAction, "stand")?;
        self.finish_active()
    }

    /// Method for doubling down: one extra bet, one card, hand over.
    pub fn player_double(&mut self) -> Result<(), TrainerError> {
        self.require_phase(Phase::PlayerAction, "double")?;
        if self.active_hand().len() != 2 {
            return Err(TrainerError::IllegalAction {
                action: "double",
                reason: format!("{} hand has {} cards", self.active.name(), self.active_hand().len()),
            });
        }
        let bet = match self.active {
            HandSlot::Main => {
                self.stats.add_wager(self.main_bet);
                self.main_bet *= 2;
                self.main_bet
            }
            HandSlot::Split => {
                self.stats.add_wager(self.split_bet);
                self.split_bet *= 2;
                self.split_bet
            }
        };
        debug!("double on {} hand, bet now {} units", self.active.name(), bet);
        let card = self.shoe.draw(true)?;
        self.active_hand_mut().push(card);
        self.finish_active()
    }

    /// Method for splitting the main pair into two hands, each dealt a second
    /// card and carrying the same bet. Only one split per round.
    pub fn player_split(&mut self) -> Result<(), TrainerError> {
        self.require_phase(Phase::PlayerAction, "split")?;
        if self.active != HandSlot::Main || self.split.is_some() {
            return Err(TrainerError::IllegalAction {
                action: "split",
                reason: "a split has already been made this round".to_string(),
            });
        }
        if !self.main.is_pair() {
            return Err(TrainerError::IllegalAction {
                action: "split",
                reason: format!("{:?} is not a pair", self.main.labels()),
            });
        }

        self.split_bet = self.main_bet;
        self.stats.add_wager(self.split_bet);

        let mut split_hand = Hand::new();
        if let Some(card) = self.main.pop() {
            split_hand.push(card);
        }
        self.main.push(self.shoe.draw(true)?);
        split_hand.push(self.shoe.draw(true)?);
        self.split = Some(split_hand);

        debug!(
            "split: main {:?}, split {:?}",
            self.main.labels(),
            self.split.as_ref().map(Hand::labels)
        );

        // Fresh guesses are owed for the re-formed main hand, unless it
        // already sits on 21 and has no decision left.
        self.active = HandSlot::Main;
        self.feedback = None;
        self.phase = Phase::InputGuesses;
        if self.main.total() >= 21 {
            return self.finish_active();
        }
        Ok(())
    }

    /// Marks the active hand finished and either switches play to the split
    /// hand or hands the round to the dealer. A hand sitting on 21 after the
    /// switch has no decision left and is finished immediately.
    fn finish_active(&mut self) -> Result<(), TrainerError> {
        match self.active {
            HandSlot::Main => self.main_done = true,
            HandSlot::Split => self.split_done = true,
        }

        if self.split.is_some() && !self.split_done {
            self.active = HandSlot::Split;
            if self.active_hand().total() >= 21 {
                return self.finish_active();
            }
            self.feedback = None;
            self.phase = Phase::InputGuesses;
            return Ok(());
        }
        if !self.main_done {
            self.active = HandSlot::Main;
            if self.active_hand().total() >= 21 {
                return self.finish_active();
            }
            self.feedback = None;
            self.phase = Phase::InputGuesses;
            return Ok(());
        }

        self.dealer_turn()
    }

    fn reveal_dealer_hole(&mut self) {
        if let Some(card) = self.dealer.reveal_hole_card() {
            let revealed = *card;
            self.shoe.count_card(&revealed);
        }
    }

    /// The dealer's whole turn, run synchronously: reveal and count the hole
    /// card, then hit until reaching a hard 17 or better. Soft 17 is hit. No
    /// cards are drawn when every player hand has already busted.
    fn dealer_turn(&mut self) -> Result<(), TrainerError> {
        self.phase = Phase::DealerAction;
        self.reveal_dealer_hole();

        let all_bust =
            self.main.is_bust() && self.split.as_ref().map_or(true, Hand::is_bust);
        if !all_bust {
            while self.dealer.total() < 17
                || (self.dealer.total() == 17 && self.dealer.is_soft())
            {
                let card = self.shoe.draw(true)?;
                self.dealer.push(card);
            }
        }

        self.resolve_round();
        Ok(())
    }

    /// Settles every player hand against the dealer and folds the results into
    /// the session statistics.
    fn resolve_round(&mut self) {
        self.phase = Phase::HandOver;

        let dealer_total = self.dealer.total();
        let dealer_bust = dealer_total > 21;
        let dealer_natural = self.dealer.is_natural();
        // A 21 assembled through a split is never a natural.
        let main_natural = self.main.is_natural() && self.split.is_none();

        let mut hands = vec![Self::settle(
            HandSlot::Main,
            &self.main,
            main_natural,
            self.main_bet,
            dealer_total,
            dealer_bust,
            dealer_natural,
        )];
        if let Some(split) = &self.split {
            hands.push(Self::settle(
                HandSlot::Split,
                split,
                false,
                self.split_bet,
                dealer_total,
                dealer_bust,
                dealer_natural,
            ));
        }

        let mut net = 0.0;
        for hand in &hands {
            self.stats.record(&hand.outcome, hand.net);
            net += hand.net;
        }

        debug!(
            "round over: dealer {} ({}), net {:+.1} units",
            dealer_total,
            if dealer_bust { "bust" } else { "stands" },
            net
        );

        self.result = Some(RoundResult {
            hands,
            dealer_total,
            dealer_bust,
            net,
        });
    }

    fn settle(
        slot: HandSlot,
        hand: &Hand,
        natural: bool,
        bet: u32,
        dealer_total: u8,
        dealer_bust: bool,
        dealer_natural: bool,
    ) -> HandResult {
        let total = hand.total();
        let outcome = if hand.is_bust() {
            HandOutcome::Bust
        } else if natural {
            if dealer_natural {
                HandOutcome::BlackjackPush
            } else {
                HandOutcome::Blackjack
            }
        } else if dealer_natural {
            HandOutcome::Loss
        } else if dealer_bust {
            HandOutcome::DealerBust
        } else {
            match total.cmp(&dealer_total) {
                Ordering::Greater => HandOutcome::Win,
                Ordering::Less => HandOutcome::Loss,
                Ordering::Equal => HandOutcome::Push,
            }
        };
        HandResult {
            slot,
            outcome,
            total,
            bet,
            net: outcome.net_units(bet),
        }
    }

    /// The engine's current advice for the active hand, deviations included.
    pub fn recommendation(&self) -> Result<Recommendation, TrainerError> {
        let dealer_up = self.dealer.up_card().ok_or(TrainerError::IllegalAction {
            action: "recommend",
            reason: "no round in progress".to_string(),
        })?;
        Ok(self.strategy.recommend(
            self.active_hand(),
            dealer_up,
            self.shoe.true_count(),
            self.split.is_none(),
            self.config.das,
        ))
    }

    /// Method for swapping in a different shoe size. Rebuilds the shoe and
    /// wipes the statistics; counts from different shoe depths do not compare.
    pub fn set_shoe_size(&mut self, num_decks: usize) -> Result<(), TrainerError> {
        if num_decks == 0 {
            return Err(TrainerError::InvalidConfig(
                "shoe must hold at least one deck".to_string(),
            ));
        }
        self.config.num_decks = num_decks;
        self.shoe.set_num_decks(num_decks);
        self.stats.reset();
        self.dealer.clear();
        self.main.clear();
        self.split = None;
        self.feedback = None;
        self.insurance = None;
        self.result = None;
        self.phase = Phase::Init;
        Ok(())
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn active_hand(&self) -> &Hand {
        match self.active {
            HandSlot::Main => &self.main,
            HandSlot::Split => self.split.as_ref().unwrap_or(&self.main),
        }
    }

    fn active_hand_mut(&mut self) -> &mut Hand {
        match self.active {
            HandSlot::Main => &mut self.main,
            HandSlot::Split => self.split.as_mut().unwrap_or(&mut self.main),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_slot(&self) -> HandSlot {
        self.active
    }

    pub fn running_count(&self) -> i32 {
        self.shoe.running_count()
    }

    pub fn true_count(&self) -> Option<f64> {
        self.shoe.true_count()
    }

    pub fn cards_remaining(&self) -> usize {
        self.shoe.cards_remaining()
    }

    pub fn decks_remaining(&self) -> f64 {
        self.shoe.decks_remaining()
    }

    pub fn main_hand(&self) -> &Hand {
        &self.main
    }

    pub fn split_hand(&self) -> Option<&Hand> {
        self.split.as_ref()
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }

    pub fn bet_units(&self) -> u32 {
        self.main_bet
    }

    pub fn feedback(&self) -> Option<&GuessFeedback> {
        self.feedback.as_ref()
    }

    pub fn insurance(&self) -> Option<&InsuranceAdvice> {
        self.insurance.as_ref()
    }

    pub fn round_result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            phase: self.phase,
            dealer: self.dealer.labels(),
            dealer_total: self.dealer.total(),
            main: self.main.labels(),
            main_total: self.main.total(),
            split: self.split.as_ref().map(Hand::labels),
            split_total: self.split.as_ref().map(Hand::total),
            active: self.active,
            bet_units: self.main_bet,
            running_count: self.shoe.running_count(),
            true_count: self.shoe.true_count(),
            perceived_edge: perceived_edge(self.shoe.true_count()),
            cards_remaining: self.shoe.cards_remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Card, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    /// A six-deck session whose first draws follow `script`, padded with two
    /// decks' worth of neutral-ish filler so the true count stays available
    /// and no reshuffle triggers.
    fn scripted_session(script: &[Rank]) -> TrainerSession {
        let mut cards: Vec<Card> = script.iter().copied().map(card).collect();
        for _ in 0..52 {
            cards.push(card(Rank::Seven));
            cards.push(card(Rank::Eight));
        }
        let shoe = Shoe::stacked(6, cards);
        TrainerSession::with_shoe(TrainerConfig::default(), shoe)
    }

    #[test]
    fn guess_scoring_and_deviation_across_two_rounds() {
        let mut session = scripted_session(&[
            // Round 1: player 2,3 vs dealer 6 (hole 9).
            Rank::Two,
            Rank::Six,
            Rank::Three,
            Rank::Nine,
            Rank::Ten, // player hit
            Rank::Ten, // dealer draw, busts
            // Round 2: player T,6 vs dealer T (hole 5).
            Rank::Ten,
            Rank::Ten,
            Rank::Six,
            Rank::Five,
            Rank::King, // dealer draw, busts
        ]);

        session.start_new_round().unwrap();
        assert_eq!(session.phase(), Phase::InputGuesses);
        assert_eq!(session.running_count(), 3);

        let fb = session.submit_guesses(Some(3), "h").unwrap();
        assert!(fb.rc_correct);
        assert!(fb.strategy_correct);
        assert!(!fb.is_deviation);

        session.player_hit().unwrap(); // 15 vs 6
        session.player_stand().unwrap();
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap().clone();
        assert!(result.dealer_bust);
        assert_eq!(result.hands[0].outcome, HandOutcome::DealerBust);
        assert_eq!(result.net, 1.0);
        // 2,6,3 at +1 each; T,T at -1; the 9 hole is neutral.
        assert_eq!(session.running_count(), 1);

        session.start_new_round().unwrap();
        // T(-1) T(-1) 6(+1) on top of +1 carried over.
        assert_eq!(session.running_count(), 0);
        assert_eq!(session.true_count(), Some(0.0));

        // Hard 16 vs ten deviates to Stand at true count zero.
        let fb = session.submit_guesses(Some(0), "S").unwrap();
        assert!(fb.rc_correct);
        assert!(fb.strategy_correct);
        assert!(fb.is_deviation);
        assert_eq!(fb.basic, Play::Hit);
        assert_eq!(fb.deviation_note, Some("Stand with 16 vs 10"));

        session.player_stand().unwrap();
        let result = session.round_result().unwrap();
        assert!(result.dealer_bust);
        assert_eq!(session.stats().wins, 2);
        assert_eq!(session.stats().hands_played, 2);
    }

    #[test]
    fn wrong_and_unparseable_guesses_score_incorrect() {
        let mut session = scripted_session(&[Rank::Two, Rank::Six, Rank::Three, Rank::Nine]);
        session.start_new_round().unwrap();
        let fb = session.submit_guesses(Some(7), "X").unwrap();
        assert!(!fb.rc_correct);
        assert_eq!(fb.actual_running_count, 3);
        assert!(!fb.strategy_correct);
        assert_eq!(session.phase(), Phase::PlayerAction);
    }

    #[test]
    fn player_natural_pays_three_to_two_immediately() {
        let mut session = scripted_session(&[Rank::Ace, Rank::Five, Rank::King, Rank::Nine]);
        session.start_new_round().unwrap();
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert_eq!(result.hands[0].outcome, HandOutcome::Blackjack);
        assert_eq!(result.net, 1.5);
        assert_eq!(session.stats().blackjacks, 1);
        assert_eq!(session.stats().wins, 1);
        // Hole card revealed and counted: A(-1) +5(+1) K(-1) 9(0).
        assert_eq!(session.running_count(), -1);
    }

    #[test]
    fn dealer_natural_ends_the_round_without_guesses() {
        let mut session = scripted_session(&[Rank::Nine, Rank::Ace, Rank::Nine, Rank::King]);
        session.start_new_round().unwrap();
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert_eq!(result.hands[0].outcome, HandOutcome::Loss);
        assert_eq!(session.stats().losses, 1);
        assert_eq!(session.running_count(), -2);
    }

    #[test]
    fn both_naturals_push_and_still_count_as_blackjack() {
        let mut session = scripted_session(&[Rank::Ace, Rank::Ace, Rank::King, Rank::Queen]);
        session.start_new_round().unwrap();
        let result = session.round_result().unwrap();
        assert_eq!(result.hands[0].outcome, HandOutcome::BlackjackPush);
        assert_eq!(result.net, 0.0);
        assert_eq!(session.stats().blackjacks, 1);
        assert_eq!(session.stats().pushes, 1);
    }

    #[test]
    fn insurance_is_offered_on_a_dealer_ace() {
        let mut session = scripted_session(&[Rank::Nine, Rank::Ace, Rank::Nine, Rank::Seven]);
        session.start_new_round().unwrap();
        assert_eq!(session.phase(), Phase::InputGuesses);
        let advice = session.insurance().unwrap();
        // Running count is -1, nowhere near the +3 threshold.
        assert!(!advice.take);
        assert_eq!(advice.threshold, 3);
    }

    #[test]
    fn double_down_draws_one_card_and_doubles_the_wager() {
        let mut session = scripted_session(&[
            Rank::Six,
            Rank::Five,
            Rank::Five,
            Rank::Ten, // hole
            Rank::Ten, // double card -> 21
            Rank::Nine, // dealer draw, 24 bust
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(3), "D").unwrap();
        session.player_double().unwrap();
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert_eq!(result.hands[0].bet, 2);
        assert_eq!(result.net, 2.0);
        assert_eq!(session.stats().units_wagered, 2);
        assert_eq!(session.stats().units_net, 2.0);
    }

    #[test]
    fn double_requires_exactly_two_cards() {
        let mut session = scripted_session(&[
            Rank::Two,
            Rank::Six,
            Rank::Three,
            Rank::Nine,
            Rank::Four, // hit -> 9 on three cards
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(3), "H").unwrap();
        session.player_hit().unwrap();
        let err = session.player_double().unwrap_err();
        assert!(matches!(err, TrainerError::IllegalAction { action: "double", .. }));
    }

    #[test]
    fn split_plays_both_hands_and_a_split_21_is_not_a_natural() {
        let mut session = scripted_session(&[
            Rank::Ace,
            Rank::Nine,
            Rank::Ace,
            Rank::Seven, // hole
            Rank::King,  // to main after split -> A,K = 21
            Rank::Queen, // to split hand -> A,Q = 21
            Rank::Two,   // dealer draw: 16 -> 18
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(-1), "P").unwrap();
        session.player_split().unwrap();

        // Both hands landed on 21, so there are no decisions left and the
        // dealer plays out at once.
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert_eq!(result.hands.len(), 2);
        assert_eq!(result.dealer_total, 18);
        assert_eq!(result.hands[0].outcome, HandOutcome::Win);
        assert_eq!(result.hands[1].outcome, HandOutcome::Win);
        assert_eq!(result.net, 2.0);
        assert_eq!(session.stats().hands_played, 2);
        assert_eq!(session.stats().blackjacks, 0);
        assert_eq!(session.stats().units_wagered, 2);
    }

    #[test]
    fn split_hands_are_played_one_after_the_other() {
        let mut session = scripted_session(&[
            Rank::Eight,
            Rank::Six,
            Rank::Eight,
            Rank::Ten,   // hole
            Rank::Two,   // to main -> 8,2
            Rank::Three, // to split -> 8,3
            Rank::Nine,  // main hit -> 19
            Rank::Seven, // split hit -> 18
            Rank::Six,   // dealer draw: 16 -> 22 bust
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(2), "P").unwrap();
        session.player_split().unwrap();
        assert_eq!(session.phase(), Phase::InputGuesses);
        assert_eq!(session.active_slot(), HandSlot::Main);

        session.submit_guesses(Some(3), "H").unwrap();
        session.player_hit().unwrap(); // main 19
        session.player_stand().unwrap();
        assert_eq!(session.phase(), Phase::InputGuesses);
        assert_eq!(session.active_slot(), HandSlot::Split);

        session.submit_guesses(Some(2), "H").unwrap();
        session.player_hit().unwrap(); // split 18
        session.player_stand().unwrap();

        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert!(result.dealer_bust);
        assert_eq!(result.net, 2.0);
        assert_eq!(session.stats().wins, 2);
        assert_eq!(session.stats().hands_played, 2);
    }

    #[test]
    fn split_rejected_without_a_pair_or_after_a_split() {
        let mut session = scripted_session(&[
            Rank::Eight,
            Rank::Six,
            Rank::Seven,
            Rank::Ten,
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(2), "S").unwrap();
        let err = session.player_split().unwrap_err();
        assert!(matches!(err, TrainerError::IllegalAction { action: "split", .. }));
    }

    #[test]
    fn all_hands_bust_means_the_dealer_draws_nothing() {
        let mut session = scripted_session(&[
            Rank::Ten,
            Rank::Six,
            Rank::Six,
            Rank::Ten,  // hole
            Rank::King, // player hit -> 26 bust
        ]);
        session.start_new_round().unwrap();
        session.submit_guesses(Some(1), "S").unwrap();
        session.player_hit().unwrap();
        assert_eq!(session.phase(), Phase::HandOver);
        let result = session.round_result().unwrap();
        assert_eq!(result.hands[0].outcome, HandOutcome::Bust);
        // Dealer keeps the two dealt cards.
        assert_eq!(session.dealer_hand().len(), 2);
        assert_eq!(result.net, -1.0);
    }

    #[test]
    fn actions_out_of_phase_are_rejected() {
        let mut session = scripted_session(&[Rank::Two, Rank::Six, Rank::Three, Rank::Nine]);
        assert!(session.player_hit().is_err());
        assert!(session.submit_guesses(Some(0), "H").is_err());

        session.start_new_round().unwrap();
        // Hitting before guessing is out of order.
        assert!(session.player_hit().is_err());
        // So is dealing again mid-round.
        assert!(session.start_new_round().is_err());
    }

    #[test]
    fn set_shoe_size_resets_statistics_and_state() {
        let mut session = scripted_session(&[Rank::Ace, Rank::Five, Rank::King, Rank::Nine]);
        session.start_new_round().unwrap();
        assert_eq!(session.stats().hands_played, 1);

        session.set_shoe_size(2).unwrap();
        assert_eq!(session.phase(), Phase::Init);
        assert_eq!(session.stats().hands_played, 0);
        assert_eq!(session.cards_remaining(), 104);
        assert_eq!(session.running_count(), 0);

        assert!(session.set_shoe_size(0).is_err());
    }

    #[test]
    fn snapshot_reflects_the_table() {
        let mut session = scripted_session(&[Rank::Two, Rank::Six, Rank::Three, Rank::Nine]);
        session.start_new_round().unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::InputGuesses);
        assert_eq!(snap.main, vec!["2S", "3S"]);
        assert_eq!(snap.dealer, vec!["6S", "??"]);
        assert_eq!(snap.main_total, 5);
        assert_eq!(snap.dealer_total, 6);
        assert_eq!(snap.running_count, 3);
        assert_eq!(snap.bet_units, 1);
    }
}
