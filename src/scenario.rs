use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path as FsPath;
use std::str::FromStr;

use tracing::{info, warn};

use crate::common::Agent;
use crate::error::ScenarioError;
use crate::map::Map;

/// The agents of one planning run, in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub agents: Vec<Agent>,
}

impl Scenario {
    /// Loads a task file. Files ending in `.yaml`/`.yml` hold a YAML list of
    /// agents, anything else uses the plain text format.
    pub fn load_from_file(path: &str) -> Result<Self, ScenarioError> {
        let is_yaml = FsPath::new(path)
            .extension()
            .is_some_and(|extension| extension == "yaml" || extension == "yml");

        let scenario = if is_yaml {
            Scenario {
                agents: Self::load_agents_from_yaml(path)?,
            }
        } else {
            fs::read_to_string(path)
                .map_err(|err| ScenarioError::ReadFile(path.to_string(), err))?
                .parse()?
        };

        info!("Load {} agents from {path}", scenario.agents.len());
        Ok(scenario)
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Vec<Agent>, ScenarioError> {
        let file = File::open(path).map_err(|err| ScenarioError::ReadFile(path.to_string(), err))?;
        let reader = BufReader::new(file);
        let agents: Vec<Agent> = serde_yaml::from_reader(reader)?;

        for (expected, agent) in agents.iter().enumerate() {
            if agent.id != expected {
                return Err(ScenarioError::InvalidAgentId {
                    expected,
                    found: agent.id,
                });
            }
        }
        Ok(agents)
    }

    /// Every agent needs at least one waypoint, and every waypoint must be an
    /// accessible cell of `map`.
    pub fn validate(&self, map: &Map) -> Result<(), ScenarioError> {
        for agent in &self.agents {
            if agent.waypoints.is_empty() {
                return Err(ScenarioError::NoWaypoints(agent.id));
            }
            for &position in &agent.waypoints {
                if !map.in_bounds(position) {
                    return Err(ScenarioError::OutOfBounds {
                        agent: agent.id,
                        position,
                    });
                }
                if !map.is_accessible(position) {
                    return Err(ScenarioError::Inaccessible {
                        agent: agent.id,
                        position,
                    });
                }
            }
        }
        Ok(())
    }
}

fn next_number<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    context: impl Fn() -> String,
) -> Result<usize, ScenarioError> {
    let token = tokens
        .next()
        .ok_or_else(|| ScenarioError::MissingToken(context()))?;
    token.parse().map_err(|_| ScenarioError::InvalidNumber {
        token: token.to_string(),
        context: context(),
    })
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    /// `N`, then for each agent `K` followed by `K` row/column pairs.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut tokens = content.split_whitespace();

        let num_agents = next_number(&mut tokens, || "agent count".to_string())?;
        let mut agents = Vec::with_capacity(num_agents);

        for id in 0..num_agents {
            let num_waypoints =
                next_number(&mut tokens, || format!("waypoint count of agent {id}"))?;
            if num_waypoints == 0 {
                return Err(ScenarioError::NoWaypoints(id));
            }

            let mut waypoints = Vec::with_capacity(num_waypoints);
            for index in 0..num_waypoints {
                let row = next_number(&mut tokens, || {
                    format!("row of agent {id} waypoint {index}")
                })?;
                let col = next_number(&mut tokens, || {
                    format!("column of agent {id} waypoint {index}")
                })?;
                waypoints.push((row, col));
            }
            agents.push(Agent::new(id, waypoints));
        }

        let trailing = tokens.count();
        if trailing > 0 {
            warn!("Ignore {trailing} trailing tokens in task input");
        }

        Ok(Scenario { agents })
    }
}
