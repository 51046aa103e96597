//! Running tallies for a training session. Split hands count individually, so
//! one round can add two entries to the win/loss/push columns.

use serde::Serialize;

use crate::game::session::HandOutcome;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub hands_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub blackjacks: u32,
    pub units_wagered: u32,
    pub units_net: f64,
}

/// Point-in-time report with derived percentages, for display or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub hands_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub blackjacks: u32,
    pub win_pct: f64,
    pub loss_pct: f64,
    pub push_pct: f64,
    pub units_wagered: u32,
    pub units_net: f64,
}

impl SessionStats {
    /// Units go into the wagered column the moment they are committed, so
    /// doubles and splits each add their extra bet here.
    pub fn add_wager(&mut self, units: u32) {
        self.units_wagered += units;
    }

    /// Folds one settled hand into the tallies.
    pub fn record(&mut self, outcome: &HandOutcome, net: f64) {
        self.hands_played += 1;
        if outcome.is_win() {
            self.wins += 1;
        } else if outcome.is_loss() {
            self.losses += 1;
        } else {
            self.pushes += 1;
        }
        if outcome.is_blackjack() {
            self.blackjacks += 1;
        }
        self.units_net += net;
    }

    pub fn reset(&mut self) {
        *self = SessionStats::default();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let pct = |n: u32| {
            if self.hands_played == 0 {
                0.0
            } else {
                100.0 * f64::from(n) / f64::from(self.hands_played)
            }
        };
        StatsSnapshot {
            hands_played: self.hands_played,
            wins: self.wins,
            losses: self.losses,
            pushes: self.pushes,
            blackjacks: self.blackjacks,
            win_pct: pct(self.wins),
            loss_pct: pct(self.losses),
            push_pct: pct(self.pushes),
            units_wagered: self.units_wagered,
            units_net: self.units_net,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hand_lands_in_exactly_one_column() {
        let mut stats = SessionStats::default();
        stats.add_wager(1);
        stats.record(&HandOutcome::Blackjack, 1.5);
        stats.add_wager(1);
        stats.record(&HandOutcome::Bust, -1.0);
        stats.add_wager(1);
        stats.record(&HandOutcome::Push, 0.0);
        stats.add_wager(1);
        stats.record(&HandOutcome::BlackjackPush, 0.0);

        assert_eq!(stats.hands_played, 4);
        assert_eq!(stats.wins + stats.losses + stats.pushes, 4);
        assert_eq!(stats.blackjacks, 2);
        assert_eq!(stats.units_wagered, 4);
        assert_eq!(stats.units_net, 0.5);
    }

    #[test]
    fn snapshot_percentages_handle_zero_hands() {
        let stats = SessionStats::default();
        let snap = stats.snapshot();
        assert_eq!(snap.win_pct, 0.0);
        assert_eq!(snap.loss_pct, 0.0);
        assert_eq!(snap.push_pct, 0.0);
    }

    #[test]
    fn snapshot_percentages_sum_to_one_hundred() {
        let mut stats = SessionStats::default();
        stats.record(&HandOutcome::Win, 1.0);
        stats.record(&HandOutcome::Loss, -1.0);
        stats.record(&HandOutcome::DealerBust, 1.0);
        stats.record(&HandOutcome::Push, 0.0);
        let snap = stats.snapshot();
        assert!((snap.win_pct + snap.loss_pct + snap.push_pct - 100.0).abs() < 1e-9);
        assert_eq!(snap.win_pct, 50.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut stats = SessionStats::default();
        stats.add_wager(3);
        stats.record(&HandOutcome::Win, 3.0);
        stats.reset();
        assert_eq!(stats.hands_played, 0);
        assert_eq!(stats.units_wagered, 0);
        assert_eq!(stats.units_net, 0.0);
    }
}
