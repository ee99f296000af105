mod astar;

pub(crate) use astar::a_star_search;

use std::collections::HashMap;

use crate::common::Path;
use crate::map::Position;

// (position, g cost) -> position one step earlier.
type Trace = HashMap<(Position, usize), Position>;

fn construct_path(trace: &Trace, position: Position, g_cost: usize) -> Path {
    let mut path = vec![position];
    let mut current = (position, g_cost);
    while let Some(&previous) = trace.get(&current) {
        path.push(previous);
        current = (previous, current.1 - 1);
    }
    path.reverse();
    path
}
