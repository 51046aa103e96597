use std::collections::HashMap;
use std::fmt::{self, Display};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::game::card::{Card, Rank};
use crate::game::hand::Hand;

/// An action the player can take on a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
}

impl Action {
    pub fn letter(&self) -> char {
        match self {
            Action::Hit => 'H',
            Action::Stand => 'S',
            Action::Double => 'D',
            Action::Split => 'P',
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The full guess alphabet: the four hand actions plus the insurance
/// side-decision letters Y and N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Play {
    Hit,
    Stand,
    Double,
    Split,
    TakeInsurance,
    DeclineInsurance,
}

impl Play {
    /// Parses a guess letter, case-insensitively. Anything unrecognized is
    /// `None`, which the session scores as an automatic incorrect guess.
    pub fn from_letter(letter: char) -> Option<Play> {
        match letter.to_ascii_uppercase() {
            'H' => Some(Play::Hit),
            'S' => Some(Play::Stand),
            'D' => Some(Play::Double),
            'P' => Some(Play::Split),
            'Y' => Some(Play::TakeInsurance),
            'N' => Some(Play::DeclineInsurance),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<Action> {
        match self {
            Play::Hit => Some(Action::Hit),
            Play::Stand => Some(Action::Stand),
            Play::Double => Some(Action::Double),
            Play::Split => Some(Action::Split),
            _ => None,
        }
    }
}

impl From<Action> for Play {
    fn from(action: Action) -> Play {
        match action {
            Action::Hit => Play::Hit,
            Action::Stand => Play::Stand,
            Action::Double => Play::Double,
            Action::Split => Play::Split,
        }
    }
}

/// Canonical identity of a play situation. Dealer up-cards are their blackjack
/// value (ace = 11, all ten-value ranks = 10); paired hands carry the paired
/// card's value the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SituationKey {
    Pair { rank: u8, dealer: u8 },
    Soft { total: u8, dealer: u8 },
    Hard { total: u8, dealer: u8 },
    Insurance,
}

/// Classifies a hand for strategy lookup. Pair identity only holds while a
/// split is still available this round; a pair on an already-split hand plays
/// as its soft or hard total.
fn classify(hand: &Hand, dealer_value: u8, split_available: bool) -> SituationKey {
    if split_available && hand.is_pair() {
        return SituationKey::Pair {
            rank: hand.cards()[0].value(),
            dealer: dealer_value,
        };
    }
    if hand.is_soft() {
        SituationKey::Soft {
            total: hand.total(),
            dealer: dealer_value,
        }
    } else {
        SituationKey::Hard {
            total: hand.total(),
            dealer: dealer_value,
        }
    }
}

/// Public situation key per the trainer's feedback contract: a two-card hand
/// facing a dealer ace is the insurance side-decision.
pub fn situation_key(hand: &Hand, dealer_up: &Card, split_available: bool) -> SituationKey {
    if dealer_up.rank == Rank::Ace && hand.len() == 2 {
        return SituationKey::Insurance;
    }
    classify(hand, dealer_up.value(), split_available)
}

/// Direction of a deviation's true-count comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TcCondition {
    AtOrAbove,
    AtOrBelow,
}

/// One count-based departure from basic strategy.
#[derive(Debug, Clone)]
pub struct DeviationRule {
    pub threshold: i32,
    pub condition: TcCondition,
    pub deviated: Play,
    pub basic: Play,
    pub note: &'static str,
}

impl DeviationRule {
    const fn new(
        threshold: i32,
        condition: TcCondition,
        deviated: Play,
        basic: Play,
        note: &'static str,
    ) -> DeviationRule {
        DeviationRule {
            threshold,
            condition,
            deviated,
            basic,
            note,
        }
    }

    /// Whether the rule triggers at the given true count.
    pub fn applies(&self, true_count: f64) -> bool {
        match self.condition {
            TcCondition::AtOrAbove => true_count >= self.threshold as f64,
            TcCondition::AtOrBelow => true_count <= self.threshold as f64,
        }
    }
}

lazy_static! {
    /// Illustrious-18 subset for multi-deck H17 play, keyed by situation.
    /// The numeric thresholds are a policy input; the engine contract is only
    /// "look up by key, compare the true count per the rule's direction".
    pub static ref DEVIATIONS_H17_MULTIDECK: HashMap<SituationKey, DeviationRule> = {
        use Play::*;
        use SituationKey::*;
        use TcCondition::*;

        let mut table = HashMap::new();
        table.insert(
            Insurance,
            DeviationRule::new(3, AtOrAbove, TakeInsurance, DeclineInsurance, "Take Insurance"),
        );
        table.insert(
            Hard { total: 16, dealer: 10 },
            DeviationRule::new(0, AtOrAbove, Stand, Hit, "Stand with 16 vs 10"),
        );
        table.insert(
            Hard { total: 15, dealer: 10 },
            DeviationRule::new(4, AtOrAbove, Stand, Hit, "Stand with 15 vs 10"),
        );
        table.insert(
            Pair { rank: 10, dealer: 5 },
            DeviationRule::new(5, AtOrAbove, Split, Stand, "Split Tens vs 5"),
        );
        table.insert(
            Pair { rank: 10, dealer: 6 },
            DeviationRule::new(4, AtOrAbove, Split, Stand, "Split Tens vs 6"),
        );
        table.insert(
            Hard { total: 10, dealer: 10 },
            DeviationRule::new(4, AtOrAbove, Double, Hit, "Double 10 vs 10"),
        );
        table.insert(
            Hard { total: 10, dealer: 11 },
            DeviationRule::new(4, AtOrAbove, Double, Hit, "Double 10 vs Ace"),
        );
        table.insert(
            Hard { total: 12, dealer: 3 },
            DeviationRule::new(2, AtOrAbove, Stand, Hit, "Stand 12 vs 3"),
        );
        table.insert(
            Hard { total: 12, dealer: 2 },
            DeviationRule::new(3, AtOrAbove, Stand, Hit, "Stand 12 vs 2"),
        );
        table.insert(
            Hard { total: 11, dealer: 11 },
            DeviationRule::new(1, AtOrAbove, Double, Hit, "Double 11 vs Ace"),
        );
        table.insert(
            Hard { total: 9, dealer: 2 },
            DeviationRule::new(1, AtOrAbove, Double, Hit, "Double 9 vs 2"),
        );
        table.insert(
            Hard { total: 9, dealer: 7 },
            DeviationRule::new(3, AtOrAbove, Double, Hit, "Double 9 vs 7"),
        );
        table.insert(
            Hard { total: 13, dealer: 2 },
            DeviationRule::new(-1, AtOrBelow, Stand, Hit, "Stand 13 vs 2"),
        );
        table.insert(
            Hard { total: 12, dealer: 4 },
            DeviationRule::new(0, AtOrBelow, Stand, Hit, "Stand 12 vs 4"),
        );
        table.insert(
            Hard { total: 12, dealer: 5 },
            DeviationRule::new(-2, AtOrBelow, Stand, Hit, "Stand 12 vs 5"),
        );
        table.insert(
            Hard { total: 12, dealer: 6 },
            DeviationRule::new(-1, AtOrBelow, Stand, Hit, "Stand 12 vs 6"),
        );
        table
    };
}

/// The engine's answer for one situation: the play to make, the pure
/// basic-strategy play, and the deviation rule if one fired.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub action: Action,
    pub basic: Action,
    pub deviation: Option<&'static DeviationRule>,
}

impl Recommendation {
    pub fn is_deviation(&self) -> bool {
        self.deviation.is_some()
    }
}

/// Basic strategy for multi-deck play where the dealer hits soft 17. Hard and
/// soft totals live in lookup tables; the pair chart is irregular enough (and
/// DAS-dependent in one spot) that it stays a direct match.
pub struct BasicStrategy {
    hard_totals: HashMap<(u8, u8), Action>,
    soft_totals: HashMap<(u8, u8), Action>,
}

impl Default for BasicStrategy {
    fn default() -> Self {
        BasicStrategy::new()
    }
}

impl BasicStrategy {
    /// Associated method for populating the hard and soft lookup tables,
    /// keyed by (player total, dealer up-card value 2..=11).
    fn build_lookup_tables() -> (HashMap<(u8, u8), Action>, HashMap<(u8, u8), Action>) {
        let mut hard_totals: HashMap<(u8, u8), Action> = HashMap::new();
        for total in 4..=21u8 {
            for dealer in 2..=11u8 {
                let action = match total {
                    9 => match dealer {
                        3..=6 => Action::Double,
                        _ => Action::Hit,
                    },
                    10 => match dealer {
                        2..=9 => Action::Double,
                        _ => Action::Hit,
                    },
                    11 => Action::Double,
                    12 => match dealer {
                        4..=6 => Action::Stand,
                        _ => Action::Hit,
                    },
                    13..=16 => match dealer {
                        2..=6 => Action::Stand,
                        _ => Action::Hit,
                    },
                    17..=21 => Action::Stand,
                    _ => Action::Hit,
                };
                hard_totals.insert((total, dealer), action);
            }
        }

        let mut soft_totals: HashMap<(u8, u8), Action> = HashMap::new();
        for total in 12..=21u8 {
            for dealer in 2..=11u8 {
                let action = match total {
                    20..=21 => Action::Stand,
                    19 => match dealer {
                        6 => Action::Double,
                        _ => Action::Stand,
                    },
                    18 => match dealer {
                        2..=6 => Action::Double,
                        7..=8 => Action::Stand,
                        _ => Action::Hit,
                    },
                    17 => match dealer {
                        3..=6 => Action::Double,
                        _ => Action::Hit,
                    },
                    15..=16 => match dealer {
                        4..=6 => Action::Double,
                        _ => Action::Hit,
                    },
                    13..=14 => match dealer {
                        5..=6 => Action::Double,
                        _ => Action::Hit,
                    },
                    _ => Action::Hit,
                };
                soft_totals.insert((total, dealer), action);
            }
        }

        (hard_totals, soft_totals)
    }

    pub fn new() -> BasicStrategy {
        let (hard_totals, soft_totals) = BasicStrategy::build_lookup_tables();
        BasicStrategy {
            hard_totals,
            soft_totals,
        }
    }

    /// Pair chart. `rank` is the paired card's value; a pair of 5s plays as a
    /// hard 10 and a pair of 4s only splits against 5-6 when doubling after a
    /// split is allowed.
    fn pair_action(&self, rank: u8, dealer: u8, das: bool) -> Action {
        match rank {
            11 | 8 => Action::Split,
            10 => Action::Stand,
            9 => {
                if dealer == 7 || dealer >= 10 {
                    Action::Stand
                } else {
                    Action::Split
                }
            }
            7 => {
                if (2..=7).contains(&dealer) {
                    Action::Split
                } else {
                    Action::Hit
                }
            }
            6 => {
                if (2..=6).contains(&dealer) {
                    Action::Split
                } else {
                    Action::Hit
                }
            }
            5 => {
                if (2..=9).contains(&dealer) {
                    Action::Double
                } else {
                    Action::Hit
                }
            }
            4 => {
                if das && (dealer == 5 || dealer == 6) {
                    Action::Split
                } else {
                    Action::Hit
                }
            }
            _ => {
                if (2..=7).contains(&dealer) {
                    Action::Split
                } else {
                    Action::Hit
                }
            }
        }
    }

    /// Downgrades a tabled Double when the hand is no longer two cards: soft
    /// 18 and 19 fall back to Stand, everything else to Hit.
    fn without_double(action: Action, key: &SituationKey) -> Action {
        if action != Action::Double {
            return action;
        }
        match key {
            SituationKey::Soft { total: 18..=19, .. } => Action::Stand,
            _ => Action::Hit,
        }
    }

    /// The pure basic-strategy action for a hand against a dealer up-card.
    pub fn decide(&self, hand: &Hand, dealer_up: &Card, split_available: bool, das: bool) -> Action {
        let key = classify(hand, dealer_up.value(), split_available);
        let can_double = hand.len() == 2;
        let action = match key {
            SituationKey::Pair { rank, dealer } => self.pair_action(rank, dealer, das),
            SituationKey::Soft { total, dealer } => self
                .soft_totals
                .get(&(total, dealer))
                .copied()
                .unwrap_or(Action::Hit),
            SituationKey::Hard { total, dealer } => self
                .hard_totals
                .get(&(total, dealer))
                .copied()
                .unwrap_or(Action::Stand),
            SituationKey::Insurance => unreachable!("classify never yields Insurance"),
        };
        if can_double {
            action
        } else {
            Self::without_double(action, &key)
        }
    }

    /// Basic strategy plus the deviation table: when the true count is
    /// available and crosses the matching rule's threshold, the deviated play
    /// wins, provided it is legal for the hand right now.
    pub fn recommend(
        &self,
        hand: &Hand,
        dealer_up: &Card,
        true_count: Option<f64>,
        split_available: bool,
        das: bool,
    ) -> Recommendation {
        let basic = self.decide(hand, dealer_up, split_available, das);
        let key = classify(hand, dealer_up.value(), split_available);

        if let (Some(tc), Some(rule)) = (true_count, DEVIATIONS_H17_MULTIDECK.get(&key)) {
            if rule.applies(tc) {
                if let Some(action) = rule.deviated.as_action() {
                    let legal = match action {
                        Action::Double => hand.len() == 2,
                        Action::Split => split_available && hand.is_pair(),
                        _ => true,
                    };
                    if legal && action != basic {
                        return Recommendation {
                            action,
                            basic,
                            deviation: Some(rule),
                        };
                    }
                }
            }
        }

        Recommendation {
            action: basic,
            basic,
            deviation: None,
        }
    }
}

/// Advice on the insurance side-bet when the dealer shows an ace. Purely
/// informational: no insurance wager is ever settled in the statistics.
#[derive(Debug, Clone, Serialize)]
pub struct InsuranceAdvice {
    pub take: bool,
    pub is_deviation: bool,
    pub threshold: i32,
    pub true_count: Option<f64>,
}

pub fn insurance_advice(true_count: Option<f64>) -> InsuranceAdvice {
    let rule = &DEVIATIONS_H17_MULTIDECK[&SituationKey::Insurance];
    let take = matches!(true_count, Some(tc) if rule.applies(tc));
    InsuranceAdvice {
        take,
        is_deviation: take,
        threshold: rule.threshold,
        true_count,
    }
}

/// Bet sizing from the true count: one unit below +1 or when the count is
/// unavailable, then one unit per true-count point up to six.
pub fn recommended_bet_units(true_count: Option<f64>) -> u32 {
    match true_count {
        Some(tc) if tc >= 1.0 => (tc.floor() as u32).min(6),
        _ => 1,
    }
}

/// Rough player edge in percent, `(TC - 1) * 0.5`. `None` when the true count
/// is unavailable.
pub fn perceived_edge(true_count: Option<f64>) -> Option<f64> {
    true_count.map(|tc| (tc - 1.0) * 0.5)
}
