//! Subcommands of the `locator` tool.

use anyhow::{anyhow, Context};
use clap::Subcommand;
use corelib::{partitioner, SharedTopology, TopologyProvider};
use replication::{registry, EffectiveReplicationMap, ReplicationOptions};
use std::path::PathBuf;
use std::sync::Arc;

use crate::topology_file::TopologyFile;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every registered strategy name.
    Strategies,

    /// Check a strategy configuration against a topology.
    Validate {
        /// Topology JSON file.
        #[arg(long)]
        topology: PathBuf,
        /// Strategy name, short or fully qualified.
        #[arg(long)]
        strategy: String,
        /// Strategy option as key=value; repeatable.
        #[arg(long = "option", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Print the replicas of each partition key.
    Endpoints {
        #[arg(long)]
        topology: PathBuf,
        #[arg(long)]
        strategy: String,
        #[arg(long = "option", value_parser = parse_option)]
        options: Vec<(String, String)>,
        /// Partitioner turning keys into tokens.
        #[arg(long, default_value = "Xxh3Partitioner")]
        partitioner: String,
        /// Partition keys to place.
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Output of a command, one line per entry.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub lines: Vec<String>,
}

impl Command {
    pub async fn execute(self) -> anyhow::Result<CommandResult> {
        match self {
            Command::Strategies => {
                let lines = registry::global()?.names().map(str::to_string).collect();
                Ok(CommandResult { lines })
            }
            Command::Validate {
                topology,
                strategy,
                options,
            } => {
                let metadata = TopologyFile::load(&topology)?.into_metadata()?;
                let options: ReplicationOptions = options.into_iter().collect();
                let created = registry::validate_replication_strategy(&strategy, options, &metadata)
                    .with_context(|| format!("validating {strategy}"))?;

                Ok(CommandResult {
                    lines: vec![format!(
                        "{} ok: replication factor {} on {} nodes (epoch {})",
                        created.name(),
                        created.replication_factor(&metadata),
                        metadata.node_count(),
                        metadata.epoch()
                    )],
                })
            }
            Command::Endpoints {
                topology,
                strategy,
                options,
                partitioner,
                keys,
            } => {
                let partitioner = partitioner::by_name(&partitioner)
                    .ok_or_else(|| anyhow!("unknown partitioner: {partitioner}"))?;
                let metadata = TopologyFile::load(&topology)?.into_metadata()?;
                let options: ReplicationOptions = options.into_iter().collect();
                let created = registry::validate_replication_strategy(&strategy, options, &metadata)
                    .with_context(|| format!("validating {strategy}"))?;

                let provider: Arc<dyn TopologyProvider> = Arc::new(SharedTopology::new(metadata));
                let map = EffectiveReplicationMap::build(created, provider).await?;
                tracing::info!(
                    strategy = map.strategy().name(),
                    epoch = %map.epoch(),
                    replication_factor = map.replication_factor(),
                    "placing keys"
                );

                let mut lines = Vec::with_capacity(keys.len());
                for key in keys {
                    let token = partitioner.token_for(key.as_bytes());
                    let replicas = map
                        .get_natural_endpoints(token)
                        .with_context(|| format!("placing key {key}"))?;
                    lines.push(format!("{key}\t{token}\t{replicas}"));
                }
                Ok(CommandResult { lines })
            }
        }
    }
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty option name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
