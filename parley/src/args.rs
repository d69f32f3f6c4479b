use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Parley, a Messages API proxy with an `OpenAI`-compatible front
#[derive(Debug, Parser)]
#[command(name = "parley", about = "Retrying proxy for the Anthropic Messages API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "parley.toml", env = "PARLEY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "PARLEY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the log filter (e.g. `parley_llm=debug,info`)
    #[arg(long, env = "PARLEY_LOG")]
    pub log: Option<String>,
}
