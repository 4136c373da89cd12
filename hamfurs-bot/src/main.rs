use hamfurs_bot::app;
use hamfurs_bot::config::BotConfig;
use hamfurs_bot::logging;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("HAMFURS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = BotConfig::from_file(&config_path)?;

    // Initialize logging
    let _logging_guard = logging::init_logging("logs", "hamfurs-bot", &config.log_level)?;

    tracing::info!("HamFurs bot starting...");
    tracing::info!("Data directory: {}", config.data_dir.display());

    let mut app = app::build(&config).await?;
    app.tasks.start_all();
    tracing::info!("All scheduled tasks started successfully");

    app.poller.run().await;

    app.tasks.shutdown();
    Ok(())
}
