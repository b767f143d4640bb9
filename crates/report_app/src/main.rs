mod cli;
mod config;
mod logging;
mod session;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cli::{Cli, Command};
use config::ClientConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::load(cli.config.as_deref())?;
    let config = cli.apply_overrides(config);
    logging::initialize(config.log_destination, cli.log_level());

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let outcome = runtime.block_on(async {
        match &cli.command {
            Command::Generate(args) => {
                let request = args.to_request(&config);
                session::generate(&config, request).await
            }
            Command::Status { job_id } => session::follow_job(&config, job_id).await,
        }
    })?;

    outcome.report();
    Ok(outcome.exit_code())
}
