use std::cmp::Ordering;

use crate::map::Position;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: Position,
    pub(crate) f_open_cost: usize,
    pub(crate) g_cost: usize,
    // Absolute time, clamped once every constraint lies in the past.
    pub(crate) time_step: usize,
}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            // Higher g cost (time) has higher priority
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| self.time_step.cmp(&other.time_step))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn node(position: Position, f_open_cost: usize, g_cost: usize) -> LowLevelOpenNode {
        LowLevelOpenNode {
            position,
            f_open_cost,
            g_cost,
            time_step: g_cost,
        }
    }

    #[test]
    fn test_open_order() {
        let mut open = BTreeSet::new();
        open.insert(node((0, 0), 5, 1));
        open.insert(node((0, 1), 4, 1));
        open.insert(node((1, 1), 5, 3));

        assert_eq!(open.pop_first().unwrap().position, (0, 1));
        // Same f: deeper node first.
        assert_eq!(open.pop_first().unwrap().position, (1, 1));
        assert_eq!(open.pop_first().unwrap().position, (0, 0));
    }
}
