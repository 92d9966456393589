use std::error::Error;

use clap::Parser;
use grelay_protocol::openai::ChatCompletionRequest;
use grelay_provider_impl::Relay;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("grelay failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = cli.config_patch().into_config()?;
    info!(
        channel_type = cli.channel_type,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        vertex_location = %config.vertex_location,
        "config loaded"
    );

    let raw = read_request(&cli.request).await?;
    let request: ChatCompletionRequest = serde_json::from_slice(&raw)?;
    let relay = Relay::from_config(&config);

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(bytes) = rx.recv().await {
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let result = relay.relay(cli.relay_meta(), Some(&request), &tx).await;
    drop(tx);
    writer.await??;

    match result {
        Ok(usage) => {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "relay finished"
            );
            Ok(())
        }
        Err(err) => {
            let (status, envelope) = err.to_envelope();
            println!("{}", serde_json::to_string(&envelope)?);
            Err(format!("{status}: {err}").into())
        }
    }
}

async fn read_request(path: &str) -> std::io::Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read(path).await
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
