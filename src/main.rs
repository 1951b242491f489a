#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod daily;
mod database;
mod error;
mod markup;
mod publish;
mod render;
mod scrape;
mod server;

pub use error::{Error, Result};

#[derive(Parser)]
#[command(name = "kotoba", version, about = "Daily vocabulary dashboard over scraped dictionary entries")]
struct Cli {
    /// Path to the word store.
    #[arg(long, env = "KOTOBA_DB", default_value = "data/jisho_words.db", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract entries from saved search pages and store the batch.
    Scrape {
        /// Directory of saved page_<n>.html files.
        #[arg(long, default_value = "jisho_pages")]
        pages: PathBuf,
    },
    /// Render every stored entry to an SVG card.
    Render {
        #[arg(long, default_value = "www/img")]
        out: PathBuf,
        #[arg(long, default_value_t = 780)]
        width: u32,
        #[arg(long, default_value_t = 460)]
        height: u32,
    },
    /// Serve the dashboard and keep the daily push running.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
        #[arg(long, default_value = "www")]
        www: PathBuf,
        #[arg(long, env = "TRMNL_PLUGIN_API_KEY")]
        api_key: Option<String>,
        #[arg(long, default_value = "data/trmnl.json")]
        history: PathBuf,
        /// Seconds between background push attempts.
        #[arg(long, default_value_t = 3600)]
        push_interval: u64,
    },
    /// Push the daily batch to the display service once.
    Push {
        #[arg(long, env = "TRMNL_PLUGIN_API_KEY")]
        api_key: String,
        #[arg(long, default_value = "data/trmnl.json")]
        history: PathBuf,
        /// Date to push, defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!(error = %e, "exiting");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let conn = database::open(&cli.db).await?;

    match cli.command {
        Command::Scrape { pages } => {
            scrape::ingest_dir(&conn, &pages).await?;
        }
        Command::Render { out, width, height } => {
            let layout = render::CardLayout {
                width,
                height,
                ..Default::default()
            };
            render::render_all(&conn, &out, &layout).await?;
        }
        Command::Serve {
            addr,
            www,
            api_key,
            history,
            push_interval,
        } => {
            server::run(
                conn,
                server::ServerConfig {
                    addr,
                    www_dir: www,
                    api_key,
                    history_path: history,
                    push_interval: Duration::from_secs(push_interval),
                },
            )
            .await?;
        }
        Command::Push {
            api_key,
            history,
            date,
        } => {
            let date = date.unwrap_or_else(daily::today);
            publish::push_daily(&conn, &api_key, &history, &date).await?;
        }
    }

    Ok(())
}
