use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub makespan: usize,
    pub sum_of_costs: usize,
    pub time_micros: usize,
    pub low_level_expand_nodes: usize,
    pub high_level_expand_nodes: usize,
    pub high_level_generate_nodes: usize,
    pub pruned_branches: usize,
    pub widened_branches: usize,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Makespan {:?} Sum of costs {:?} Time(microseconds) {:?} High level expand nodes number: {:?} generated: {:?} pruned: {:?} widened: {:?} Low level expand nodes number {:?}",
            self.makespan,
            self.sum_of_costs,
            self.time_micros,
            self.high_level_expand_nodes,
            self.high_level_generate_nodes,
            self.pruned_branches,
            self.widened_branches,
            self.low_level_expand_nodes
        );
    }
}
