//! services/client/src/bin/crybaby.rs

use client_lib::{
    adapters::TerminalView,
    app::{App, Outcome},
    commands::Command,
    config::Config,
    error::ClientError,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Platform: {:?}", config.platform);

    // --- 2. Wire the components ---
    let view = Arc::new(TerminalView::new(config.backend_url.clone()));
    let app = App::from_config(&config, view);

    // --- 3. Launch URL & session observer ---
    let launch_url = std::env::args().nth(1);
    let cancel = CancellationToken::new();
    let observer = app.start(launch_url.as_deref(), cancel.clone())?;

    // --- 4. Command loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match app.dispatch(command).await {
            Ok(Outcome::Done) => {}
            Ok(Outcome::Say(text)) => println!("{}", text),
            Ok(Outcome::Quit) => break,
            // Flows have already told the user.
            Err(e) => debug!("Command failed: {}", e),
        }
    }

    cancel.cancel();
    observer.await.ok();
    info!("Goodbye.");
    Ok(())
}
