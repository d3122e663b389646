//! Command line configuration and process setup.

use anyhow::Context;
use clap::Parser;
use corelib::Endpoint;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "locator", version, about = "Inspect replica placement on a token ring")]
pub struct CliConfig {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Address of the node running the command, used by LocalStrategy.
    #[arg(long, global = true)]
    pub broadcast_address: Option<Endpoint>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        init_logging(&self.log_level);

        if let Some(endpoint) = self.broadcast_address {
            corelib::set_broadcast_address(endpoint).context("setting broadcast address")?;
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("starting runtime")?;
        let result = runtime.block_on(self.command.execute())?;

        for line in result.lines {
            println!("{line}");
        }
        Ok(())
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so command output stays pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let config = CliConfig::try_parse_from([
            "locator",
            "--broadcast-address",
            "10.0.0.9",
            "strategies",
        ])
        .unwrap();
        assert_eq!(config.broadcast_address, Some("10.0.0.9".parse().unwrap()));
        assert_eq!(config.log_level, "info");
        assert!(matches!(config.command, Command::Strategies));
    }

    #[test]
    fn test_rejects_bad_address() {
        assert!(CliConfig::try_parse_from(["locator", "--broadcast-address", "nope", "strategies"]).is_err());
    }
}
