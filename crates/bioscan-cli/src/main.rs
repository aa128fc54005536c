//! bioscan: console front end for the fingerprint device service.
//!
//! Startup order: configuration, logging, template database, device
//! session. Device initialization failure is fatal. Once running, each input
//! line is one operation and each response is one JSON line on stdout. The
//! device is released and the database closed on every exit path.

mod args;
mod console;
mod input;

use anyhow::Context;
use args::Cli;
use bioscan_hardware::DeviceSession;
use bioscan_hardware::mock::MockDriver;
use bioscan_service::logging::init_logging;
use bioscan_service::{BiometricService, ServiceConfig};
use bioscan_storage::{Database, SqliteTemplateStore};
use clap::Parser;
use console::{Console, HELP, Reply};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ServiceConfig::from_env()?,
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_logging(&config.logging.level, &config.logging.format)?;
    info!("bioscan v{} starting", bioscan_core::VERSION);

    let db = Database::open(&config.database_config())
        .await
        .context("Failed to open template database")?;
    db.health_check()
        .await
        .context("Template database health check failed")?;

    let (driver, sensor) = MockDriver::new();
    let mut session = DeviceSession::new(driver.with_latency(config.simulated_latency()));
    if let Some(timeout) = config.lock_timeout() {
        session = session.with_lock_timeout(timeout);
    }
    let service = BiometricService::new(session, SqliteTemplateStore::new(db.pool().clone()));

    if let Err(e) = service.initialize().await {
        error!("Device initialization failed: {}", e);
        db.close().await;
        return Err(e).context("Failed to initialize fingerprint device");
    }

    let console = Console::new(service, sensor);
    let result = run(&console).await;

    if let Err(e) = console.service().shutdown().await {
        warn!("Device did not terminate cleanly: {}", e);
    }
    db.close().await;
    info!("bioscan stopped");

    result
}

async fn run(console: &Console) -> anyhow::Result<()> {
    let mut lines = input::spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start input reader")?;
    let mut stdout = tokio::io::stdout();

    stdout.write_all(format!("{HELP}\n").as_bytes()).await?;
    stdout.flush().await?;

    loop {
        let line = tokio::select! {
            line = lines.recv() => line.transpose().context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
        };

        let Some(line) = line else {
            info!("Input closed, shutting down");
            return Ok(());
        };

        match console.handle_line(&line).await {
            None => {}
            Some(Reply::Quit) => return Ok(()),
            Some(Reply::Print(body)) => {
                let mut text = serde_json::to_string(&body)?;
                text.push('\n');
                stdout.write_all(text.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }
}
