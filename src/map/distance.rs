use std::time::Instant;

use tracing::info;

use super::{Map, Position};
use crate::common::Agent;

const UNREACHABLE: u32 = u32::MAX;

/// All-pairs hop distances over the static grid, ignoring every agent and
/// every constraint. Serves as the admissible heuristic of the low-level
/// search.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    height: usize,
    width: usize,
    size: usize,
    distances: Vec<u32>,
}

impl DistanceTable {
    /// Floyd-Warshall over every cell of the map. Cubic in the cell count.
    pub fn new(map: &Map) -> Self {
        let start_time = Instant::now();
        let size = map.num_cells();
        let mut distances = vec![UNREACHABLE; size * size];

        for index in 0..size {
            let position = map.position(index);
            if !map.is_accessible(position) {
                continue;
            }
            distances[index * size + index] = 0;
            for &neighbor in map.get_neighbors(position) {
                distances[index * size + map.index(neighbor)] = 1;
            }
        }

        for k in 0..size {
            for i in 0..size {
                let through_k = distances[i * size + k];
                if through_k == UNREACHABLE {
                    continue;
                }
                for j in 0..size {
                    let k_to_j = distances[k * size + j];
                    if k_to_j == UNREACHABLE {
                        continue;
                    }
                    let candidate = through_k + k_to_j;
                    if candidate < distances[i * size + j] {
                        distances[i * size + j] = candidate;
                    }
                }
            }
        }

        info!(
            "Distance table over {size} cells built in {} microseconds",
            start_time.elapsed().as_micros()
        );

        DistanceTable {
            height: map.height,
            width: map.width,
            size,
            distances,
        }
    }

    /// Hop count from `from` to `to`, `None` when unreachable.
    pub fn distance(&self, from: Position, to: Position) -> Option<usize> {
        let in_bounds = |position: Position| position.0 < self.height && position.1 < self.width;
        if !in_bounds(from) || !in_bounds(to) {
            return None;
        }
        let from = from.0 * self.width + from.1;
        let to = to.0 * self.width + to.1;

        match self.distances[from * self.size + to] {
            UNREACHABLE => None,
            distance => Some(distance as usize),
        }
    }

    /// Per-agent sum of waypoint leg distances. Every agent's constrained
    /// path is at least this long, so the max is a makespan lower bound and
    /// the sum a sum-of-costs lower bound.
    pub fn lower_bound(&self, agents: &[Agent]) -> Option<Vec<usize>> {
        agents
            .iter()
            .map(|agent| {
                agent
                    .waypoints
                    .windows(2)
                    .map(|leg| self.distance(leg[0], leg[1]))
                    .sum::<Option<usize>>()
            })
            .collect()
    }
}
