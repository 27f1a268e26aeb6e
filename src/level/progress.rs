//! Per-level progress record.
//!
//! The engine only updates this value; storing it is up to the host.

use serde::{Deserialize, Serialize};

use crate::solver::SimulationOutcome;

/// What a player has achieved on one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level_id: String,
    pub completed: bool,
    /// Best efficiency percentage among completed attempts
    pub best_score: Option<f64>,
    pub attempts: u32,
}

impl LevelProgress {
    pub fn new(level_id: impl Into<String>) -> Self {
        Self {
            level_id: level_id.into(),
            ..Self::default()
        }
    }

    /// Fold one simulation attempt into the record.
    ///
    /// Returns `true` if the attempt set a new best score.
    pub fn record(&mut self, outcome: &SimulationOutcome) -> bool {
        self.attempts += 1;
        if !outcome.is_complete {
            return false;
        }
        self.completed = true;
        match self.best_score {
            Some(best) if best >= outcome.score => false,
            _ => {
                self.best_score = Some(outcome.score);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SimulationResult;

    fn outcome(is_complete: bool, score: f64) -> SimulationOutcome {
        SimulationOutcome {
            result: SimulationResult::failed(100.0, "test"),
            is_complete,
            score,
            message: String::new(),
        }
    }

    #[test]
    fn test_incomplete_attempt_only_counts() {
        let mut progress = LevelProgress::new("L1");
        assert!(!progress.record(&outcome(false, 80.0)));
        assert_eq!(progress.attempts, 1);
        assert!(!progress.completed);
        assert_eq!(progress.best_score, None);
    }

    #[test]
    fn test_best_score_only_improves() {
        let mut progress = LevelProgress::new("L1");
        assert!(progress.record(&outcome(true, 40.0)));
        assert!(!progress.record(&outcome(true, 30.0)));
        assert!(progress.record(&outcome(true, 55.5)));
        assert_eq!(progress.best_score, Some(55.5));
        assert_eq!(progress.attempts, 3);
        assert!(progress.completed);
    }
}
