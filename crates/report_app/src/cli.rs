use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use report_core::JobRequest;

use crate::config::ClientConfig;

#[derive(Debug, Parser)]
#[command(
    name = "report-client",
    version,
    about = "Submit AI trade report requests and follow them to completion"
)]
pub struct Cli {
    /// RON configuration file (defaults to ./report_client.ron when present).
    #[arg(long, global = true, env = "REPORT_CLIENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://127.0.0.1:8000
    #[arg(long, global = true, env = "REPORT_BASE_URL")]
    pub base_url: Option<String>,

    /// Value of the `access_token` session cookie.
    #[arg(long, global = true, env = "REPORT_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new report and wait for it.
    Generate(GenerateArgs),
    /// Follow an already queued report job.
    Status { job_id: String },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub brand: String,

    /// Repeat for several products; they are sent comma-joined.
    #[arg(long = "product", required = true)]
    pub products: Vec<String>,

    #[arg(long, default_value = "")]
    pub budget: String,

    #[arg(long)]
    pub enterprise_size: String,

    #[arg(long, default_value = "")]
    pub other_info: String,

    /// AI model; falls back to the configured default.
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub language: Option<String>,
}

impl Cli {
    pub fn apply_overrides(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(token) = &self.session_token {
            config.session_token = Some(token.clone());
        }
        config
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

impl GenerateArgs {
    pub fn to_request(&self, config: &ClientConfig) -> JobRequest {
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| config.default_model.clone());
        let language = self
            .language
            .clone()
            .unwrap_or_else(|| config.default_language.clone());

        JobRequest::new(model)
            .with_field("brand", self.brand.trim())
            .with_field("product", self.products.clone())
            .with_field("budget", self.budget.trim())
            .with_field("enterprise_size", self.enterprise_size.trim())
            .with_field("other_info", self.other_info.trim())
            .with_field("language", language)
    }
}
