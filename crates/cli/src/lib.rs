//! CLI tool for inspecting replica placement.
//!
//! Provides commands for:
//! - Listing registered replication strategies
//! - Validating a strategy configuration against a topology
//! - Printing the replicas of partition keys

pub mod commands;
pub mod config;
pub mod topology_file;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
pub use topology_file::TopologyFile;
