use super::{construct_path, Trace};
use crate::common::{Agent, Constraint, LowLevelOpenNode, Path};
use crate::map::{DistanceTable, Map, Position};
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument, trace};

/// Shortest no-wait walk from `start` to `goal` for one leg of an agent's
/// journey. `start_time` is the absolute time at which the leg begins, so the
/// constraints are always read against the full concatenated path.
#[instrument(skip_all, name = "standard_a_star", fields(start = ?start, goal = ?goal, start_time = start_time), level = "debug")]
#[allow(clippy::too_many_arguments)]
pub(crate) fn standard_a_star_search(
    map: &Map,
    distances: &DistanceTable,
    start: Position,
    goal: Position,
    start_time: usize,
    constraints: &HashSet<Constraint>,
    constraint_limit_time_step: usize,
    stats: &mut Stats,
) -> Option<Path> {
    if constraints.contains(&Constraint {
        position: start,
        time_step: start_time,
    }) {
        debug!("start cell is excluded");
        return None;
    }

    let Some(start_h_open_cost) = distances.distance(start, goal) else {
        debug!("goal is unreachable on the bare map");
        return None;
    };

    // Tricky: after the last constraint the time step is fixed at T + 1, the
    // search demotes to plain 2-D A* and the state space stays finite.
    let clamp = |time: usize| time.min(constraint_limit_time_step + 1);

    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut trace = Trace::new();

    open_list.insert(LowLevelOpenNode {
        position: start,
        f_open_cost: start_h_open_cost,
        g_cost: 0,
        time_step: clamp(start_time),
    });

    while let Some(current) = open_list.pop_first() {
        if !closed_list.insert((current.position, current.time_step)) {
            continue;
        }
        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        if current.position == goal {
            return Some(construct_path(&trace, current.position, current.g_cost));
        }

        // Uniform cost, so g also counts elapsed time within the leg.
        let tentative_g_cost = current.g_cost + 1;
        let absolute_time = start_time + tentative_g_cost;
        let tentative_time_step = clamp(absolute_time);

        for &neighbor in map.get_neighbors(current.position) {
            if closed_list.contains(&(neighbor, tentative_time_step)) {
                continue;
            }

            if constraints.contains(&Constraint {
                position: neighbor,
                time_step: absolute_time,
            }) {
                continue;
            }

            let Some(h_open_cost) = distances.distance(neighbor, goal) else {
                continue;
            };

            if open_list.insert(LowLevelOpenNode {
                position: neighbor,
                f_open_cost: tentative_g_cost + h_open_cost,
                g_cost: tentative_g_cost,
                time_step: tentative_time_step,
            }) {
                trace
                    .entry((neighbor, tentative_g_cost))
                    .or_insert(current.position);
            }
        }
    }

    debug!("cannot find solution");
    None
}

/// Full journey of an agent through its waypoints. Each leg starts where the
/// previous one ended, at the time it ended. Any failing leg fails the whole
/// journey.
#[instrument(skip_all, name = "a_star", fields(agent = agent.id), level = "debug")]
pub(crate) fn a_star_search(
    map: &Map,
    distances: &DistanceTable,
    agent: &Agent,
    constraints: &HashSet<Constraint>,
    stats: &mut Stats,
) -> Option<Path> {
    let constraint_limit_time_step = constraints
        .iter()
        .map(|constraint| constraint.time_step)
        .max()
        .unwrap_or(0);

    let &start = agent.waypoints.first()?;
    if constraints.contains(&Constraint {
        position: start,
        time_step: 0,
    }) {
        debug!("agent is excluded from its own start");
        return None;
    }

    let mut path = vec![start];
    for leg in agent.waypoints.windows(2) {
        let start_time = path.len() - 1;
        let sub_path = standard_a_star_search(
            map,
            distances,
            leg[0],
            leg[1],
            start_time,
            constraints,
            constraint_limit_time_step,
            stats,
        )?;
        path.extend_from_slice(&sub_path[1..]);
    }

    debug!("path of {} moves", path.len() - 1);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper function to setup tracing
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .try_init();
    }

    fn setup(map: &str) -> (Map, DistanceTable) {
        let map: Map = map.parse().unwrap();
        let distances = DistanceTable::new(&map);
        (map, distances)
    }

    fn constraints(pairs: &[(Position, usize)]) -> HashSet<Constraint> {
        pairs
            .iter()
            .map(|&(position, time_step)| Constraint {
                position,
                time_step,
            })
            .collect()
    }

    fn assert_walk(map: &Map, path: &Path) {
        for step in path.windows(2) {
            assert!(map.get_neighbors(step[0]).contains(&step[1]), "{path:?}");
        }
    }

    #[test]
    fn test_a_star_no_constraint() {
        init_tracing();
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let distances = DistanceTable::new(&map);
        let agent = Agent::new(0, vec![(2, 0), (1, 4)]);
        let stats = &mut Stats::default();

        let path = a_star_search(&map, &distances, &agent, &HashSet::new(), stats).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&(2, 0)));
        assert_eq!(path.last(), Some(&(1, 4)));
        assert_walk(&map, &path);
        assert!(stats.low_level_expand_nodes > 0);
    }

    #[test]
    fn test_a_star_open_grid_matches_manhattan() {
        let (map, distances) = setup("ooooo\nooooo\nooooo\nooooo\n");
        let stats = &mut Stats::default();

        let cases: [(Position, Position); 3] =
            [((0, 0), (3, 4)), ((3, 1), (0, 2)), ((2, 2), (2, 2))];
        for (start, goal) in cases {
            let agent = Agent::new(0, vec![start, goal]);
            let path = a_star_search(&map, &distances, &agent, &HashSet::new(), stats).unwrap();
            let manhattan = start.0.abs_diff(goal.0) + start.1.abs_diff(goal.1);
            assert_eq!(path.len() - 1, manhattan);
            assert_walk(&map, &path);
        }
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint_alternative_path() {
        init_tracing();
        let (map, distances) = setup("ooo\nooo\nooo\n");
        let agent = Agent::new(0, vec![(2, 2), (0, 0)]);
        let stats = &mut Stats::default();

        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 2), 2)]),
            stats,
        )
        .unwrap();
        assert_eq!(path.len(), 5);
        assert_ne!(path[2], (0, 2));
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint_detour() {
        init_tracing();
        let (map, distances) = setup("ooo\nooo\nooo\n");
        let agent = Agent::new(0, vec![(2, 2), (0, 0)]);
        let stats = &mut Stats::default();

        // Every cell halfway between start and goal is closed at time 2. With
        // no wait move the detour costs two extra steps.
        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 2), 2), ((1, 1), 2), ((2, 0), 2)]),
            stats,
        )
        .unwrap();
        assert_eq!(path.len(), 7);
        assert_walk(&map, &path);
    }

    #[test]
    fn test_a_star_goal_constraint_delays_arrival() {
        let (map, distances) = setup("ooo\nooo\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 2)]);
        let stats = &mut Stats::default();

        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 2), 2)]),
            stats,
        )
        .unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[4], (0, 2));
    }

    #[test]
    fn test_a_star_no_wait_makes_goal_unreachable() {
        // A planner allowed to wait would stay at (0, 0) for one step.
        let (map, distances) = setup("ooo\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 2)]);
        let stats = &mut Stats::default();

        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 1), 1)]),
            stats,
        );
        assert_eq!(path, None);
    }

    #[test]
    fn test_a_star_dead_end_has_no_successor() {
        // From (0, 0) the only move is into (0, 1), closed at time 1, even
        // though the goal itself is still reachable later on.
        let (map, distances) = setup("oo\n#o\n");
        let agent = Agent::new(0, vec![(0, 0), (1, 1)]);
        let stats = &mut Stats::default();

        assert_eq!(
            a_star_search(
                &map,
                &distances,
                &agent,
                &constraints(&[((0, 1), 1)]),
                stats
            ),
            None
        );
    }

    #[test]
    fn test_a_star_excluded_start() {
        let (map, distances) = setup("ooo\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 2)]);
        let stats = &mut Stats::default();

        assert_eq!(
            a_star_search(
                &map,
                &distances,
                &agent,
                &constraints(&[((0, 0), 0)]),
                stats
            ),
            None
        );
    }

    #[test]
    fn test_a_star_single_waypoint() {
        let (map, distances) = setup("ooo\n");
        let agent = Agent::new(0, vec![(0, 1)]);
        let stats = &mut Stats::default();

        let path = a_star_search(&map, &distances, &agent, &HashSet::new(), stats).unwrap();
        assert_eq!(path, vec![(0, 1)]);
    }

    #[test]
    fn test_a_star_unreachable_goal() {
        let (map, distances) = setup("o#o\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 2)]);
        let stats = &mut Stats::default();

        assert_eq!(
            a_star_search(&map, &distances, &agent, &HashSet::new(), stats),
            None
        );
    }

    #[test]
    fn test_a_star_multi_leg_uses_absolute_time() {
        init_tracing();
        let (map, distances) = setup("ooo\nooo\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 2), (0, 0)]);
        let stats = &mut Stats::default();

        let free = a_star_search(&map, &distances, &agent, &HashSet::new(), stats).unwrap();
        assert_eq!(free, vec![(0, 0), (0, 1), (0, 2), (0, 1), (0, 0)]);

        // Time 3 is the first step of the second leg.
        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 1), 3)]),
            stats,
        )
        .unwrap();
        assert_eq!(&path[..3], &[(0, 0), (0, 1), (0, 2)]);
        assert_ne!(path[3], (0, 1));
        assert_eq!(path.len(), 7);
        assert_eq!(path.last(), Some(&(0, 0)));
        assert_walk(&map, &path);

        // Time 1 only concerns the first leg, never the second one.
        let path = a_star_search(
            &map,
            &distances,
            &agent,
            &constraints(&[((0, 1), 1)]),
            stats,
        )
        .unwrap();
        assert_ne!(path[1], (0, 1));
        assert_eq!(path.len(), 7);
        assert!(path[4..].contains(&(0, 1)));
    }

    #[test]
    fn test_a_star_repeated_waypoint() {
        let (map, distances) = setup("ooo\n");
        let agent = Agent::new(0, vec![(0, 0), (0, 0), (0, 1)]);
        let stats = &mut Stats::default();

        let path = a_star_search(&map, &distances, &agent, &HashSet::new(), stats).unwrap();
        assert_eq!(path, vec![(0, 0), (0, 1)]);
    }
}
