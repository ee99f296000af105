use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "MAPF CBS",
    about = "Conflict-based search for agents visiting ordered waypoints on a grid.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the task file (text, or YAML with a .yaml extension)")]
    pub task_path: Option<String>,

    #[arg(long, help = "Path to the JSON result file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Seed for high level tie breaking")]
    pub seed: Option<u64>,

    #[arg(long, help = "Maximum number of high level node expansions")]
    pub max_expansions: Option<usize>,

    #[arg(long, help = "Wall clock limit for the search, in seconds")]
    pub time_limit_secs: Option<f64>,

    #[arg(
        long,
        help = "Disable corridor widening of the first branch",
        default_value_t = false
    )]
    pub no_corridor_widening: bool,

    #[arg(long, help = "Log filter used when RUST_LOG is unset")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: String,
    pub task_path: String,
    pub output_path: Option<String>,
    pub seed: u64,
    pub max_expansions: usize,
    pub time_limit_secs: Option<f64>,
    pub corridor_widening: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/corridor.map".to_string(),
            task_path: "map_file/test/corridor.task".to_string(),
            output_path: None,
            seed: 0,
            max_expansions: 100_000,
            time_limit_secs: None,
            corridor_widening: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("invalid YAML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Command line flags win over values from the config file.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(task_path) = &cli.task_path {
            self.task_path = task_path.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(max_expansions) = cli.max_expansions {
            self.max_expansions = max_expansions;
        }
        if let Some(time_limit_secs) = cli.time_limit_secs {
            self.time_limit_secs = Some(time_limit_secs);
        }
        if cli.no_corridor_widening {
            self.corridor_widening = false;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_expansions == 0 {
            return Err(anyhow!("max_expansions must be at least 1"));
        }

        if let Some(time_limit_secs) = self.time_limit_secs {
            if !time_limit_secs.is_finite() || time_limit_secs <= 0.0 {
                return Err(anyhow!(
                    "time_limit_secs must be a positive number of seconds, got {}",
                    time_limit_secs
                ));
            }
        }

        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }
}
