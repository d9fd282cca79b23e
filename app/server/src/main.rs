use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pcte_chat::{ChatEngine, HelpdeskConfig};

#[derive(Parser)]
#[command(
    name = "pcte-chat-server",
    about = "PCTE helpdesk chat API (local intents with Gemini fallback)"
)]
struct Cli {
    /// JSON config file (defaults to HELPDESK_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    pcte_chat_app::init_tracing();
    let cli = Cli::parse();

    let mut config = HelpdeskConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let engine = ChatEngine::from_config(&config)?;
    tracing::info!(
        retrieval = engine.retrieval_enabled(),
        threshold = config.classifier.confidence_threshold,
        "Helpdesk engine ready"
    );

    pcte_chat_app::start_server(engine, &config.server).await
}
