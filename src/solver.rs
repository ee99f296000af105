mod cbs;

pub use cbs::CBS;

use crate::common::Solution;
use crate::config::Config;

/// Terminal state of a search. Infeasible and timed out are both ordinary
/// results the caller has to report, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(Solution),
    // The constraint tree was exhausted without a conflict-free node.
    Infeasible,
    // The expansion budget or the wall clock limit ran out first.
    TimedOut,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            SolveOutcome::Infeasible | SolveOutcome::TimedOut => None,
        }
    }
}

pub trait Solver {
    fn solve(&mut self, config: &Config) -> SolveOutcome;
}
