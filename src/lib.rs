//! Card-counting blackjack trainer engine.
//!
//! Deals rounds from a multi-deck shoe, keeps the Hi-Lo running and true
//! counts, and scores the player's count and basic-strategy guesses (deviation
//! plays included) before each action. Round settlement feeds a running
//! session tally of hands, outcomes and betting units.

pub mod game;
pub mod stats;

use thiserror::Error;

pub use game::session::TrainerSession;
pub use stats::SessionStats;

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("the shoe has no cards left to draw")]
    ShoeExhausted,
    #[error("illegal {action}: {reason}")]
    IllegalAction {
        action: &'static str,
        reason: String,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Table rules and shoe shape for a session.
#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    /// Decks in the shoe.
    pub num_decks: usize,
    /// Fraction of the shoe below which a reshuffle happens before the next deal.
    pub penetration: f64,
    /// Whether doubling after a split is allowed.
    pub das: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_decks: 6,
            penetration: 0.25,
            das: true,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> TrainerConfigBuilder {
        TrainerConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), TrainerError> {
        if self.num_decks == 0 {
            return Err(TrainerError::InvalidConfig(
                "shoe must hold at least one deck".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.penetration) {
            return Err(TrainerError::InvalidConfig(format!(
                "penetration must be in [0, 1), got {}",
                self.penetration
            )));
        }
        Ok(())
    }
}

/// Builder for `TrainerConfig`; unset fields take the six-deck defaults.
#[derive(Debug, Default)]
pub struct TrainerConfigBuilder {
    num_decks: Option<usize>,
    penetration: Option<f64>,
    das: Option<bool>,
}

impl TrainerConfigBuilder {
    pub fn num_decks(mut self, num_decks: usize) -> Self {
        self.num_decks = Some(num_decks);
        self
    }

    pub fn penetration(mut self, penetration: f64) -> Self {
        self.penetration = Some(penetration);
        self
    }

    pub fn das(mut self, das: bool) -> Self {
        self.das = Some(das);
        self
    }

    pub fn build(self) -> TrainerConfig {
        let defaults = TrainerConfig::default();
        TrainerConfig {
            num_decks: self.num_decks.unwrap_or(defaults.num_decks),
            penetration: self.penetration.unwrap_or(defaults.penetration),
            das: self.das.unwrap_or(defaults.das),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::Phase;
    use crate::game::strategy::Action;

    #[test]
    fn builder_defaults_and_overrides() {
        let config = TrainerConfig::new().build();
        assert_eq!(config.num_decks, 6);
        assert_eq!(config.penetration, 0.25);
        assert!(config.das);

        let config = TrainerConfig::new().num_decks(2).das(false).build();
        assert_eq!(config.num_decks, 2);
        assert_eq!(config.penetration, 0.25);
        assert!(!config.das);
    }

    #[test]
    fn zero_decks_is_rejected() {
        let config = TrainerConfig::new().num_decks(0).build();
        assert!(TrainerSession::new(config).is_err());
    }

    #[test]
    fn out_of_range_penetration_is_rejected() {
        let config = TrainerConfig::new().penetration(1.5).build();
        assert!(TrainerSession::new(config).is_err());
    }

    /// Plays many rounds on a small shoe, always following the engine's own
    /// advice, and checks the bookkeeping invariants hold across reshuffles.
    #[test]
    fn self_play_keeps_the_books_balanced() {
        let config = TrainerConfig::new().num_decks(1).build();
        let mut session = TrainerSession::new(config).unwrap();

        for _ in 0..200 {
            session.start_new_round().unwrap();
            while matches!(
                session.phase(),
                Phase::InputGuesses | Phase::PlayerAction
            ) {
                if session.phase() == Phase::InputGuesses {
                    let rec = session.recommendation().unwrap();
                    let fb = session
                        .submit_guesses(
                            Some(session.running_count()),
                            &rec.action.letter().to_string(),
                        )
                        .unwrap();
                    assert!(fb.rc_correct);
                    assert!(fb.strategy_correct);
                }
                match session.recommendation().unwrap().action {
                    Action::Hit => session.player_hit().unwrap(),
                    Action::Stand => session.player_stand().unwrap(),
                    Action::Double => session.player_double().unwrap(),
                    Action::Split => session.player_split().unwrap(),
                }
            }
            assert_eq!(session.phase(), Phase::HandOver);

            let result = session.round_result().unwrap();
            assert!(!result.hands.is_empty());
            for hand in &result.hands {
                assert!(hand.bet >= 1);
            }
        }

        let stats = session.stats();
        assert!(stats.hands_played >= 200);
        assert_eq!(stats.wins + stats.losses + stats.pushes, stats.hands_played);
        assert!(stats.units_wagered >= stats.hands_played);
    }
}
