use serde::Serialize;

use crate::model::{Game, Outcome};

/// Direction of the single pass over the supplied games.
///
/// Streaks depend on it: the "current" streak is the run active when the pass
/// ends. `Forward` over chronological games yields the streak ending at the most
/// recent game; `Reverse` over the same slice yields the one ending at the oldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    #[default]
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakKind {
    Win,
    Loss,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    #[serde(rename = "type")]
    pub kind: StreakKind,
    pub count: u32,
}

impl Streak {
    pub const NONE: Streak = Streak {
        kind: StreakKind::None,
        count: 0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percentage rounded to one decimal.
    pub win_rate: f64,
    pub current_streak: Streak,
    pub best_streak: Streak,
    pub worst_streak: Streak,
}

pub fn compute_metrics(games: &[Game], username: &str, traversal: Traversal) -> PerformanceMetrics {
    let outcomes: Box<dyn Iterator<Item = Outcome> + '_> = match traversal {
        Traversal::Forward => Box::new(games.iter().map(|g| g.outcome_for(username))),
        Traversal::Reverse => Box::new(games.iter().rev().map(|g| g.outcome_for(username))),
    };
    metrics_from_outcomes(outcomes)
}

pub fn metrics_from_outcomes(outcomes: impl IntoIterator<Item = Outcome>) -> PerformanceMetrics {
    let (mut wins, mut losses, mut draws) = (0u32, 0u32, 0u32);
    let (mut win_run, mut loss_run) = (0u32, 0u32);
    let (mut best_win, mut worst_loss) = (0u32, 0u32);

    for outcome in outcomes {
        match outcome {
            Outcome::Win => {
                wins += 1;
                win_run += 1;
                loss_run = 0;
                best_win = best_win.max(win_run);
            }
            Outcome::Loss => {
                losses += 1;
                loss_run += 1;
                win_run = 0;
                worst_loss = worst_loss.max(loss_run);
            }
            Outcome::Draw => {
                draws += 1;
                win_run = 0;
                loss_run = 0;
            }
        }
    }

    let total_games = wins + losses + draws;
    let current_streak = if win_run > 0 {
        Streak {
            kind: StreakKind::Win,
            count: win_run,
        }
    } else if loss_run > 0 {
        Streak {
            kind: StreakKind::Loss,
            count: loss_run,
        }
    } else {
        Streak::NONE
    };

    PerformanceMetrics {
        total_games,
        wins,
        losses,
        draws,
        win_rate: win_rate(wins, total_games),
        current_streak,
        best_streak: Streak {
            kind: StreakKind::Win,
            count: best_win,
        },
        worst_streak: Streak {
            kind: StreakKind::Loss,
            count: worst_loss,
        },
    }
}

fn win_rate(wins: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (wins as f64 / total as f64 * 1000.0).round() / 10.0
}
