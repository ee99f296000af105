mod corridor;
mod highlevel;
mod lowlevel;

pub(crate) use corridor::expand_corridor;
pub use highlevel::{detect_conflict, detect_conflicts, Conflict, ConflictType, Constraint};
pub(crate) use highlevel::HighLevelNode;
pub(crate) use lowlevel::LowLevelOpenNode;

use serde::{Deserialize, Serialize};

use crate::map::{Map, Position};

/// A time-indexed sequence of cells; `path[t]` is where the agent stands at
/// time `t`. The agent leaves the grid after its last step.
pub type Path = Vec<Position>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub waypoints: Vec<Position>,
}

impl Agent {
    pub fn new(id: usize, waypoints: Vec<Position>) -> Self {
        Agent { id, waypoints }
    }

}

/// Number of moves in a path. The start cell is free.
pub(crate) fn path_cost(path: &Path) -> usize {
    path.len().saturating_sub(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub paths: Vec<Path>,
}

impl Solution {
    pub fn makespan(&self) -> usize {
        self.paths.iter().map(path_cost).max().unwrap_or(0)
    }

    pub fn sum_of_costs(&self) -> usize {
        self.paths.iter().map(path_cost).sum()
    }

    /// Checks that every path is a legal no-wait walk on the map through the
    /// agent's waypoints in order, and that the joint plan is conflict free.
    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        if self.paths.len() != agents.len() {
            return false;
        }

        for (agent, path) in agents.iter().zip(&self.paths) {
            if path.first() != agent.waypoints.first() || path.last() != agent.waypoints.last() {
                return false;
            }
            if !path.iter().all(|&position| map.is_accessible(position)) {
                return false;
            }
            if !path
                .windows(2)
                .all(|step| map.get_neighbors(step[0]).contains(&step[1]))
            {
                return false;
            }

            // Waypoints must be visited as an ordered subsequence.
            let mut remaining = agent.waypoints.iter().peekable();
            for position in path {
                while remaining.peek() == Some(&position) {
                    remaining.next();
                }
            }
            if remaining.next().is_some() {
                return false;
            }
        }

        detect_conflict(&self.paths).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map() -> Map {
        "ooo\nooo\nooo\n".parse().unwrap()
    }

    #[test]
    fn test_costs() {
        let solution = Solution {
            paths: vec![vec![(0, 0), (0, 1), (0, 2)], vec![(2, 2)]],
        };
        assert_eq!(solution.makespan(), 2);
        assert_eq!(solution.sum_of_costs(), 2);
    }

    #[test]
    fn test_verify_accepts_valid_plan() {
        let map = open_map();
        let agents = vec![
            Agent::new(0, vec![(0, 0), (0, 2)]),
            Agent::new(1, vec![(2, 0), (2, 2), (1, 2)]),
        ];
        let solution = Solution {
            paths: vec![
                vec![(0, 0), (0, 1), (0, 2)],
                vec![(2, 0), (2, 1), (2, 2), (1, 2)],
            ],
        };
        assert!(solution.verify(&map, &agents));
    }

    #[test]
    fn test_verify_rejects_bad_plans() {
        let map = open_map();
        let agents = vec![Agent::new(0, vec![(0, 0), (0, 2)])];

        // Teleport.
        let jump = Solution {
            paths: vec![vec![(0, 0), (0, 2)]],
        };
        assert!(!jump.verify(&map, &agents));

        // Waiting in place is not a move.
        let wait = Solution {
            paths: vec![vec![(0, 0), (0, 0), (0, 1), (0, 2)]],
        };
        assert!(!wait.verify(&map, &agents));

        // Skipped intermediate waypoint.
        let agents = vec![Agent::new(0, vec![(0, 0), (2, 0), (0, 2)])];
        let skipped = Solution {
            paths: vec![vec![(0, 0), (0, 1), (0, 2)]],
        };
        assert!(!skipped.verify(&map, &agents));
    }

    #[test]
    fn test_verify_rejects_conflicts() {
        let map = open_map();
        let agents = vec![
            Agent::new(0, vec![(1, 0), (1, 2)]),
            Agent::new(1, vec![(0, 1), (2, 1)]),
        ];
        let solution = Solution {
            paths: vec![
                vec![(1, 0), (1, 1), (1, 2)],
                vec![(0, 1), (1, 1), (2, 1)],
            ],
        };
        assert!(!solution.verify(&map, &agents));
    }
}
