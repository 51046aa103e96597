//! The engine proper: cards and the counted shoe, hand arithmetic, the
//! strategy and deviation tables, and the round state machine that ties them
//! together into a training session.

pub mod card;
pub mod hand;
pub mod session;
pub mod strategy;

pub use card::{Card, Rank, Shoe, Suit};
pub use hand::Hand;
pub use session::{
    GuessFeedback, HandOutcome, HandResult, HandSlot, Phase, RoundResult, TableSnapshot,
    TrainerSession,
};
pub use strategy::{
    insurance_advice, perceived_edge, recommended_bet_units, Action, BasicStrategy,
    DeviationRule, InsuranceAdvice, Play, Recommendation, SituationKey, TcCondition,
};
