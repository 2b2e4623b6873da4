use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use log::info;

mod cli;

use cli::Cli;
use hooklens::config::Config;
use hooklens::deepseek::{self, DeepSeekClient};
use hooklens::routes::{self, AppState};
use hooklens::usage::{FileUsageLog, NullUsageSink, UsageSink};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("hooklens.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hooklens")
        .join("logs")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();

    // CLI flags take priority over config values
    let bind = cli
        .bind
        .or(config.bind)
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let model = cli
        .model
        .or(config.model)
        .unwrap_or_else(|| deepseek::DEFAULT_MODEL.to_string());
    let base_url = config
        .base_url
        .unwrap_or_else(|| deepseek::DEFAULT_BASE_URL.to_string());

    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .map_err(|_| eyre::eyre!("DEEPSEEK_API_KEY environment variable not set"))?;

    if cli.verbose {
        let config_path = hooklens::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Model: {model}");
        eprintln!("Logs: {}", log_dir().join("hooklens.log").display());
    }

    let http = reqwest::Client::builder()
        .timeout(deepseek::REQUEST_TIMEOUT)
        .build()?;

    let usage: Arc<dyn UsageSink> = if cli.log_usage || config.log_usage.unwrap_or(false) {
        let path = cli
            .usage_log
            .or(config.usage_log_path)
            .unwrap_or_else(|| PathBuf::from("token-usage.md"));
        info!("Recording token usage to {}", path.display());
        Arc::new(FileUsageLog::new(path))
    } else {
        Arc::new(NullUsageSink)
    };

    let provider = Arc::new(DeepSeekClient::new(http.clone(), base_url, api_key, model));

    let app = routes::router(AppState {
        http,
        provider,
        usage,
    });

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on {bind}");
    if cli.verbose {
        eprintln!("Listening on http://{bind}");
    }
    axum::serve(listener, app).await?;

    Ok(())
}
