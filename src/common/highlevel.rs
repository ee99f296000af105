use super::{expand_corridor, path_cost, Agent, Path, Solution};
use crate::algorithm::a_star_search;
use crate::map::{DistanceTable, Map, Position};
use crate::stat::Stats;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    Vertex {
        position: Position,
        time_step: usize,
    },
    // Swap: agent_1 moves v -> u while agent_2 moves u -> v.
    Edge {
        u: Position,
        v: Position,
        time_step: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict {
    pub agent_1: usize,
    pub agent_2: usize,
    pub conflict_type: ConflictType,
}

impl Conflict {
    pub fn time_step(&self) -> usize {
        match self.conflict_type {
            ConflictType::Vertex { time_step, .. } | ConflictType::Edge { time_step, .. } => {
                time_step
            }
        }
    }

    /// The agent to replan and the cell it must avoid in the chosen branch.
    /// For a swap each agent is kept out of the cell it moved into.
    pub fn exclusion(&self, resolve_first: bool) -> (usize, Constraint) {
        let agent = if resolve_first {
            self.agent_1
        } else {
            self.agent_2
        };

        let constraint = match self.conflict_type {
            ConflictType::Vertex {
                position,
                time_step,
            } => Constraint {
                position,
                time_step,
            },
            ConflictType::Edge { u, v, time_step } => Constraint {
                position: if resolve_first { u } else { v },
                time_step,
            },
        };

        (agent, constraint)
    }
}

/// A single forbidden (cell, time step) pair. The agent it binds is implied by
/// the per-agent set it is stored in.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub struct Constraint {
    pub position: Position,
    pub time_step: usize,
}

/// First conflict in scan order: ascending time step, vertex conflicts before
/// swaps, then ascending agent index. Branching relies on this order being
/// stable.
pub fn detect_conflict<P: AsRef<Path>>(paths: &[P]) -> Option<Conflict> {
    scan_conflicts(paths, true).into_iter().next()
}

/// Every conflict in the same order as [`detect_conflict`].
pub fn detect_conflicts<P: AsRef<Path>>(paths: &[P]) -> Vec<Conflict> {
    scan_conflicts(paths, false)
}

fn scan_conflicts<P: AsRef<Path>>(paths: &[P], first_only: bool) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let max_length = paths
        .iter()
        .map(|path| path.as_ref().len())
        .max()
        .unwrap_or(0);

    for step in 0..max_length {
        let mut positions: HashMap<Position, usize> = HashMap::new();

        // Vertex conflicts. Finished agents are gone, not parked at their goal.
        for (agent, path) in paths.iter().enumerate() {
            let Some(&position) = path.as_ref().get(step) else {
                continue;
            };
            if let Some(&occupant) = positions.get(&position) {
                conflicts.push(Conflict {
                    agent_1: agent,
                    agent_2: occupant,
                    conflict_type: ConflictType::Vertex {
                        position,
                        time_step: step,
                    },
                });
                if first_only {
                    return conflicts;
                }
            } else {
                positions.insert(position, agent);
            }
        }

        if step == 0 {
            continue;
        }

        // Swap conflicts.
        for i in 0..paths.len() {
            let path1 = paths[i].as_ref();
            if step >= path1.len() {
                continue;
            }
            for (j, path2) in paths.iter().enumerate().skip(i + 1) {
                let path2 = path2.as_ref();
                if step >= path2.len() {
                    continue;
                }

                if path1[step] == path2[step - 1] && path1[step - 1] == path2[step] {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Edge {
                            u: path1[step],
                            v: path1[step - 1],
                            time_step: step,
                        },
                    });
                    if first_only {
                        return conflicts;
                    }
                }
            }
        }
    }

    conflicts
}

/// A node of the constraint tree. Unchanged agents share their path and
/// constraint set with the parent.
#[derive(Clone, Debug)]
pub(crate) struct HighLevelNode {
    pub(crate) constraints: Vec<Arc<HashSet<Constraint>>>,
    pub(crate) paths: Vec<Arc<Path>>,
    pub(crate) cost: usize, // Makespan of the joint plan
}

impl HighLevelNode {
    /// Root node: every agent planned alone without constraints.
    pub(crate) fn new(
        agents: &[Agent],
        map: &Map,
        distances: &DistanceTable,
        stats: &mut Stats,
    ) -> Option<Self> {
        let empty = Arc::new(HashSet::new());
        let mut paths = Vec::with_capacity(agents.len());

        for agent in agents {
            let Some(path) = a_star_search(map, distances, agent, &empty, stats) else {
                debug!("Agent {} has no path on the bare map", agent.id);
                return None;
            };
            paths.push(Arc::new(path));
        }

        let root = HighLevelNode {
            constraints: vec![empty; agents.len()],
            cost: makespan(&paths),
            paths,
        };
        debug!("High level root node cost {}", root.cost);
        Some(root)
    }

    pub(crate) fn conflict(&self) -> Option<Conflict> {
        detect_conflict(&self.paths)
    }

    /// Child node for one side of `conflict`. The first side may have its
    /// exclusion widened over the surrounding corridor. Returns `None` when
    /// the replanned agent has no path left.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn update_constraint(
        &self,
        agents: &[Agent],
        conflict: &Conflict,
        resolve_first: bool,
        corridor_widening: bool,
        map: &Map,
        distances: &DistanceTable,
        stats: &mut Stats,
    ) -> Option<Self> {
        let (agent_to_update, constraint) = conflict.exclusion(resolve_first);

        let mut agent_constraints = HashSet::clone(&self.constraints[agent_to_update]);
        agent_constraints.insert(constraint);

        if resolve_first && corridor_widening {
            let corridor = expand_corridor(map, constraint.position, constraint.time_step);
            if !corridor.is_empty() {
                trace!(
                    "Widen constraint {constraint:?} of agent {agent_to_update} over {} corridor cells",
                    corridor.len()
                );
                stats.widened_branches += 1;
                agent_constraints.extend(corridor);
            }
        }

        let agent_constraints = Arc::new(agent_constraints);
        let new_path = a_star_search(
            map,
            distances,
            &agents[agent_to_update],
            &agent_constraints,
            stats,
        )?;

        debug!(
            "Update agent {agent_to_update:?} with path of cost {} for conflict {conflict:?}",
            path_cost(&new_path)
        );

        let mut constraints = self.constraints.clone();
        constraints[agent_to_update] = agent_constraints;
        let mut paths = self.paths.clone();
        paths[agent_to_update] = Arc::new(new_path);

        Some(HighLevelNode {
            constraints,
            cost: makespan(&paths),
            paths,
        })
    }

    pub(crate) fn into_solution(self) -> Solution {
        Solution {
            paths: self
                .paths
                .into_iter()
                .map(|path| Arc::try_unwrap(path).unwrap_or_else(|shared| Path::clone(&shared)))
                .collect(),
        }
    }
}

fn makespan(paths: &[Arc<Path>]) -> usize {
    paths.iter().map(|path| path_cost(path)).max().unwrap_or(0)
}
