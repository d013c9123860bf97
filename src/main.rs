use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, Level};

use wordtrail::bridge::{self, Bridge, StdioHost};
use wordtrail::state::{Config, Coordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the native-messaging channel
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenv::dotenv();
    let config = Config::from_env();
    info!(meets = %config.endpoints.meets, collections = %config.endpoints.collections, "Backend endpoints configured");

    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let host = Arc::new(StdioHost::new(outgoing_tx.clone()));
    let coordinator = Arc::new(Coordinator::new(config, host.clone())?);
    info!("Coordinator initialized");

    let (event_tx, event_rx) = mpsc::channel(32);
    tokio::spawn(coordinator.clone().run_events(event_rx));
    let writer = tokio::spawn(bridge::write_loop(tokio::io::stdout(), outgoing_rx));

    let bridge = Bridge {
        coordinator,
        host,
        outgoing: outgoing_tx,
        events: event_tx,
    };

    info!("Starting native messaging host...");
    if let Err(e) = bridge.serve(tokio::io::stdin()).await {
        error!("Bridge error: {:#}", e);
    }

    if writer.is_finished() {
        match writer.await {
            Ok(Err(e)) => error!("Writer error: {:#}", e),
            Err(e) => error!("Writer task failed: {}", e),
            Ok(Ok(())) => {}
        }
    }

    Ok(())
}
