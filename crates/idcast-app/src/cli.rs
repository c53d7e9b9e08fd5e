use std::path::PathBuf;

use clap::Parser;

/// idcast: pick an identity, announce a random number, see everyone else's.
#[derive(Parser, Debug)]
#[command(name = "idcast", version, about)]
pub struct Args {
    /// Select this identity right away instead of asking.
    #[arg(short, long)]
    pub identity: Option<u32>,

    /// Broker WebSocket URL override.
    #[arg(short, long)]
    pub broker: Option<String>,

    /// Shared topic override.
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. "idcast=debug").
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
