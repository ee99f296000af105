use mapf_cbs::common::Path;
use mapf_cbs::config::{Cli, Config};
use mapf_cbs::map::{DistanceTable, Map};
use mapf_cbs::scenario::Scenario;
use mapf_cbs::solver::{SolveOutcome, Solver, CBS};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct PlanReport<'a> {
    makespan: usize,
    sum_of_costs: usize,
    paths: &'a [Path],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level: {}", config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let map = Map::from_file(&config.map_path)
        .with_context(|| format!("error loading map: {}", config.map_path))?;
    let scenario = Scenario::load_from_file(&config.task_path)
        .with_context(|| format!("error loading task: {}", config.task_path))?;
    scenario
        .validate(&map)
        .with_context(|| format!("task does not fit map: {}", config.task_path))?;

    let distances = DistanceTable::new(&map);
    match distances.lower_bound(&scenario.agents) {
        Some(bounds) => info!(
            "Lower bound makespan {} sum of costs {}",
            bounds.iter().max().copied().unwrap_or(0),
            bounds.iter().sum::<usize>()
        ),
        None => warn!("Some waypoint cannot be reached from the previous one"),
    }

    let mut cbs_solver = CBS::new(scenario.agents.clone(), &map, &distances);
    match cbs_solver.solve(&config) {
        SolveOutcome::Solved(solution) => {
            if !solution.verify(&map, &scenario.agents) {
                bail!("cbs returned a plan that fails verification");
            }
            info!(
                "cbs solution makespan {} sum of costs {}",
                solution.makespan(),
                solution.sum_of_costs()
            );

            if let Some(output_path) = config.output_path.as_ref() {
                let file = File::create(output_path)
                    .with_context(|| format!("cannot create output file: {output_path}"))?;
                let report = PlanReport {
                    makespan: solution.makespan(),
                    sum_of_costs: solution.sum_of_costs(),
                    paths: &solution.paths,
                };
                serde_json::to_writer_pretty(BufWriter::new(file), &report)
                    .with_context(|| format!("cannot write plan to {output_path}"))?;
                info!("Write plan to {output_path}");
            }
        }
        SolveOutcome::Infeasible => error!("cbs solve fails: no conflict-free plan exists"),
        SolveOutcome::TimedOut => warn!("cbs solve fails: search budget exhausted"),
    }

    Ok(())
}
