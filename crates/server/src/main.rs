//! Stylist Server
//!
//! Axum server and CLI over the stylist turn orchestrator.

mod api;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use stylist_core::config::StylistConfig;
use stylist_core::orchestrator::{StylistRuntime, TurnOutcome};
use stylist_core::telemetry::init_tracing;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

#[derive(Parser, Clone)]
#[command(author, version, about = "Stylist - weather-aware outfit recommendations")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Interactive conversation on one thread
    Chat {
        /// Continue an existing thread
        #[arg(long)]
        thread: Option<String>,
    },
    /// Ask for a single recommendation
    Recommend {
        message: String,
        /// Location to use instead of one found in the message
        #[arg(short, long)]
        location: Option<String>,
        /// Occasion, e.g. "office" or "wedding"
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Import wardrobe items from a JSON array
    Seed {
        path: PathBuf,
        /// Remove existing items first
        #[arg(long)]
        replace: bool,
    },
    /// Print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = dotenvy::from_path(".stylist/.env");
    init_tracing();

    let args = Args::parse();
    let config = StylistConfig::load().await?;

    match args.command.unwrap_or(CliCommand::Serve { port: 8080 }) {
        CliCommand::Serve { port } => serve(config, port).await,
        CliCommand::Chat { thread } => {
            config.validate()?;
            chat(StylistRuntime::from_config(config)?, thread).await
        }
        CliCommand::Recommend {
            message,
            location,
            context,
        } => {
            config.validate()?;
            let runtime = StylistRuntime::from_config(config)?;
            let thread_id = uuid::Uuid::new_v4().to_string();
            let outcome = runtime
                .orchestrator
                .handle_turn(&thread_id, &message, location.as_deref(), context.as_deref())
                .await;
            print_outcome(&outcome);
            if !outcome.success {
                std::process::exit(1);
            }
            Ok(())
        }
        CliCommand::Seed { path, replace } => {
            let runtime = StylistRuntime::from_config(config)?;
            if replace {
                let removed = runtime.wardrobe.clear()?;
                println!("Removed {} existing items", removed);
            }
            let imported = runtime
                .wardrobe
                .import_json(&path)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            if imported == 0 {
                println!("Wardrobe already has items; nothing imported (use --replace)");
            } else {
                println!("Imported {} items from {}", imported, path.display());
            }
            println!("{}", serde_json::to_string_pretty(&runtime.wardrobe.stats()?)?);
            Ok(())
        }
        CliCommand::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            if let Err(e) = config.validate() {
                println!("\nWarning: {}", e);
            }
            Ok(())
        }
    }
}

async fn serve(config: StylistConfig, port: u16) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        tracing::warn!("{}; turns will fail until this is fixed", e);
    }

    let runtime = Arc::new(StylistRuntime::from_config(config)?);
    let app = api::router(runtime);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Stylist server running at http://{}", addr);
    tracing::info!("   Turns:    /api/v1/chat, /api/v1/recommend");
    tracing::info!("   Threads:  /api/v1/threads/:id (GET, DELETE)");
    tracing::info!("   Events:   /api/v1/events (SSE)");
    tracing::info!("   Docs:     /api/v1/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn chat(runtime: StylistRuntime, thread: Option<String>) -> anyhow::Result<()> {
    let thread_id = thread.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    println!("Thread {} (empty line or Ctrl-D to quit)", thread_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        let outcome = runtime
            .orchestrator
            .handle_turn(&thread_id, message, None, None)
            .await;
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("\n{}\n", outcome.reply);
    if let Some(outfit) = &outcome.final_outfit {
        for (slot, item) in [
            ("top", &outfit.top),
            ("bottom", &outfit.bottom),
            ("footwear", &outfit.footwear),
            ("outerwear", &outfit.outerwear),
        ] {
            if let Some(item) = item {
                println!("  {:<10} {}", slot, item.describe());
            }
        }
        if !outfit.accessories.is_empty() {
            println!("  {:<10} {}", "accessories", outfit.accessory_names().join(", "));
        }
    }
    for d in &outcome.diagnostics {
        println!("  note ({}): {}", d.stage, d.note);
    }
    tracing::debug!(
        action = %outcome.routing_action,
        elapsed_ms = outcome.elapsed_ms,
        "Turn printed"
    );
}
