// Command line arguments

use clap::Parser;
use std::path::PathBuf;

/// System information viewer (CPU, storage).
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "wininfo", version, about)]
pub struct Args {
    /// Open the CPU information window at startup
    #[arg(long)]
    pub cpuinfo: bool,

    /// Do not try to restart with elevated privileges
    #[arg(long)]
    pub no_elevate: bool,

    /// Path of the settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
