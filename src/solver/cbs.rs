use super::{SolveOutcome, Solver};
use crate::common::{detect_conflicts, Agent, HighLevelNode};
use crate::config::Config;
use crate::map::{DistanceTable, Map};
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, enabled, info, warn, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    cost: usize,
    tie_break: u64,
    node_id: usize,
}

/// Arena of constraint tree nodes plus the open list indexing into it. An
/// expanded node is taken out of its slot and dropped once its children exist.
struct Frontier {
    nodes: Vec<Option<HighLevelNode>>,
    open: BTreeSet<OpenEntry>,
    rng: StdRng,
}

impl Frontier {
    fn new(seed: u64) -> Self {
        Frontier {
            nodes: Vec::new(),
            open: BTreeSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn push(&mut self, node: HighLevelNode) {
        let entry = OpenEntry {
            cost: node.cost,
            tie_break: self.rng.gen(),
            node_id: self.nodes.len(),
        };
        self.nodes.push(Some(node));
        self.open.insert(entry);
    }

    fn pop(&mut self) -> Option<(usize, HighLevelNode)> {
        while let Some(entry) = self.open.pop_first() {
            if let Some(node) = self.nodes[entry.node_id].take() {
                return Some((entry.node_id, node));
            }
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

pub struct CBS<'a> {
    agents: Vec<Agent>,
    map: &'a Map,
    distances: &'a DistanceTable,
    stats: Stats,
}

impl<'a> CBS<'a> {
    pub fn new(agents: Vec<Agent>, map: &'a Map, distances: &'a DistanceTable) -> Self {
        CBS {
            agents,
            map,
            distances,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn finish(&mut self, total_solve_start_time: Instant) {
        self.stats.time_micros = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.print();
    }
}

impl Solver for CBS<'_> {
    fn solve(&mut self, config: &Config) -> SolveOutcome {
        let total_solve_start_time = Instant::now();
        let deadline = config
            .time_limit()
            .map(|limit| total_solve_start_time + limit);
        self.stats = Stats::default();

        let Some(root) =
            HighLevelNode::new(&self.agents, self.map, self.distances, &mut self.stats)
        else {
            info!("Some agent cannot reach its waypoints even alone");
            self.finish(total_solve_start_time);
            return SolveOutcome::Infeasible;
        };

        let mut frontier = Frontier::new(config.seed);
        frontier.push(root);
        self.stats.high_level_generate_nodes += 1;

        while !frontier.is_empty() {
            if self.stats.high_level_expand_nodes >= config.max_expansions
                || deadline.is_some_and(|deadline| Instant::now() >= deadline)
            {
                warn!(
                    "Search budget exhausted after {} high level expansions",
                    self.stats.high_level_expand_nodes
                );
                self.finish(total_solve_start_time);
                return SolveOutcome::TimedOut;
            }

            let Some((node_id, current_node)) = frontier.pop() else {
                break;
            };
            self.stats.high_level_expand_nodes += 1;

            let Some(conflict) = current_node.conflict() else {
                // No conflicts, return solution.
                self.stats.makespan = current_node.cost;
                let solution = current_node.into_solution();
                self.stats.sum_of_costs = solution.sum_of_costs();
                self.finish(total_solve_start_time);
                return SolveOutcome::Solved(solution);
            };

            if enabled!(Level::DEBUG) {
                debug!(
                    "Node {node_id} cost {} has {} conflicts, branch on {conflict:?}",
                    current_node.cost,
                    detect_conflicts(&current_node.paths).len()
                );
            }

            for resolve_first in [true, false] {
                match current_node.update_constraint(
                    &self.agents,
                    &conflict,
                    resolve_first,
                    config.corridor_widening,
                    self.map,
                    self.distances,
                    &mut self.stats,
                ) {
                    Some(child) => {
                        frontier.push(child);
                        self.stats.high_level_generate_nodes += 1;
                    }
                    None => self.stats.pruned_branches += 1,
                }
            }
        }

        info!("Constraint tree exhausted, no conflict-free plan exists");
        self.finish(total_solve_start_time);
        SolveOutcome::Infeasible
    }
}
