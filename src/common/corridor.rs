use std::collections::{HashSet, VecDeque};

use super::Constraint;
use crate::map::{Map, Position};

fn manhattan(a: Position, b: Position) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// Grows an exclusion at a narrow cell into the whole connected run of narrow
/// cells around it. Each reached cell is excluded at the time the agent could
/// first get there from the conflict cell, so the agent cannot slip back into
/// the passage one step later. The origin itself is not included.
pub(crate) fn expand_corridor(map: &Map, origin: Position, time_step: usize) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    if !map.is_narrow(origin) {
        return constraints;
    }

    let mut visited = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);

    while let Some(position) = queue.pop_front() {
        for &neighbor in map.get_neighbors(position) {
            if !map.is_narrow(neighbor) || !visited.insert(neighbor) {
                continue;
            }
            queue.push_back(neighbor);
            constraints.push(Constraint {
                position: neighbor,
                time_step: time_step + manhattan(origin, neighbor),
            });
        }
    }

    constraints
}
