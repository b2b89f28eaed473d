use std::sync::Arc;

use base64::Engine;
use clap::Parser;
use serde_json::Value;
use voyager_client::{Callback, ClientConfig, VoyagerClient};
use voyager_proto::InboundMessage;

/// Connect to a Voyager application server, stream its log events, and save
/// every finished JPG the host announces.
#[derive(Parser)]
#[command(name = "voyager")]
struct Args {
    /// Application server host
    host: String,
    /// Application server port
    #[arg(default_value_t = 5950)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = VoyagerClient::connect(ClientConfig::new(args.host, args.port)).await?;

    let save_jpg: Callback = Arc::new(|message: InboundMessage, _: Value| {
        if let Err(err) = save_image(&message) {
            tracing::error!(error = %err, "Failed to save image");
        }
    });
    client.add_handler("NewJPGReady", save_jpg, Value::Null);

    client.set_log_events(true, 2).await?;
    client.set_dashboard(true).await?;

    tokio::signal::ctrl_c().await?;
    client.close().await;
    Ok(())
}

fn save_image(message: &InboundMessage) -> anyhow::Result<()> {
    let Some(data) = message.get("Base64Data").and_then(Value::as_str) else {
        tracing::warn!("NewJPGReady without Base64Data");
        return Ok(());
    };
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    let len = bytes.len();
    std::fs::write("image.jpg", bytes)?;
    tracing::info!(bytes = len, "Saved image.jpg");
    Ok(())
}
