use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cascade")]
#[command(version)]
#[command(about = "Dependency-ordered CloudFormation stack deployments", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the wave-grouped deployment and teardown order
    Plan(ManifestArgs),

    /// Create or update every stack, in dependency order
    Deploy(RunArgs),

    /// Delete every stack, in reverse dependency order
    Teardown(RunArgs),

    /// Check the manifest: entry fields, references, cycles
    Validate(ManifestArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ManifestArgs {
    /// Path to the stack manifest
    #[arg(short, long, default_value = "cascade.toml")]
    pub manifest: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the stack manifest
    #[arg(short, long, default_value = "cascade.toml")]
    pub manifest: PathBuf,

    /// Number of parallel workers per wave
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Seconds between stack status polls
    #[arg(long, default_value = "5")]
    pub poll_interval: u64,

    /// Seconds to wait per stack before forcing a failure
    #[arg(long, default_value = "1800")]
    pub timeout: u64,

    /// AWS region to target
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS credentials profile to use
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}
