use std::path::PathBuf;

use clap::Parser;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "moira-trigger")]
#[command(about = "Create, update or delete a Moira trigger from a desired-state document")]
#[command(version)]
pub struct Cli {
    /// Desired-state document (JSON, YAML or TOML)
    #[arg(short, long, env = "MOIRA_TRIGGER_PARAMS")]
    pub params: PathBuf,

    /// Report what would change without writing anything
    #[arg(long, env = "MOIRA_TRIGGER_CHECK")]
    pub check: bool,

    /// Output format of the result document
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
