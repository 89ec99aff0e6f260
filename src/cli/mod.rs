//! CLI module for Worker Gateway
//!
//! Provides subcommands:
//! - `serve`: admin API server
//! - `invoke`: one audited worker invocation from the command line

pub mod invoke;
pub mod serve;

use clap::{Parser, Subcommand};

/// Worker Gateway - workflow records and audited worker invocations
#[derive(Parser)]
#[command(name = "worker-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the admin API server
    Serve,

    /// Invoke a worker endpoint once and print the result
    Invoke(invoke::InvokeArgs),
}
