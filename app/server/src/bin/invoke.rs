use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use pcte_chat::{ChatEngine, ChatRequest, HelpdeskConfig};
use pcte_chat_app::invoke::{invoke, invoke_json};

#[derive(Parser)]
#[command(
    name = "pcte-chat-invoke",
    about = "Answer one helpdesk request. Reads a JSON request from stdin unless --message is given."
)]
struct Cli {
    /// JSON config file (defaults to HELPDESK_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    message: Option<String>,

    /// IANA zone name, e.g. Asia/Kolkata
    #[arg(short, long)]
    timezone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    pcte_chat_app::init_tracing();
    let cli = Cli::parse();

    let config = HelpdeskConfig::load(cli.config.as_deref())?;
    let engine = ChatEngine::from_config(&config)?;

    let outcome = match cli.message {
        Some(message) => {
            let request = ChatRequest {
                message: Some(message),
                timezone: cli.timezone,
            };
            invoke(&engine, request).await
        }
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request from stdin")?;
            invoke_json(&engine, &body).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
