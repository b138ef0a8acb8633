use anyhow::{Context, Result};
use clap::Parser;

use moira_client::MoiraClient;
use moira_trigger::cli::Cli;
use moira_trigger::output::{self, print_error, print_success};
use moira_trigger::{Report, execute, load_params, observability};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

/// Returns whether the invocation succeeded.
async fn run(cli: &Cli) -> Result<bool> {
    let params = load_params(&cli.params)
        .with_context(|| format!("Failed to load {}", cli.params.display()))?;
    let client = MoiraClient::new(&params.api_url, &params.auth(), params.timeout())
        .context("Failed to create Moira API client")?;

    let report = execute(&client, &params, cli.check).await;
    let value = report.to_value().context("Failed to serialize result")?;
    println!("{}", output::render(&value, cli.format)?);

    match &report {
        Report::Success(doc) if doc.changed => {
            print_success(&format!("{}: changed", params.id));
            Ok(true)
        }
        Report::Success(_) => Ok(true),
        Report::Failure(doc) => {
            print_error(&format!("{}: {}", doc.msg, doc.failed.details));
            Ok(false)
        }
    }
}
