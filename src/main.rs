//! Drive Gallery Proxy - cached JSON API over Google Drive folders
//!
//! Serves image galleries (one per sub-folder of a root folder) and news
//! articles (word documents in a news folder, rendered to HTML).

mod api;
mod app;
mod cache;
mod config;
mod content;
mod drive;
mod error;
mod models;
mod render;
#[cfg(test)]
mod testing;
mod transform;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{cors_layer, ApiServer};
use app::AppState;
use cache::SystemClock;
use config::Config;
use content::ContentService;
use drive::DriveClient;
use render::DocxRenderer;

/// CLI command
#[derive(Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Aggregate galleries once and print them
    Galleries,
    /// Aggregate the news listing once and print it
    News,
    /// Render one article and print it
    Article { id: String },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"Drive Gallery Proxy - JSON gallery and news API over Google Drive

USAGE:
    drive-gallery-proxy                  # Run HTTP server (default)
    drive-gallery-proxy serve
    drive-gallery-proxy galleries
    drive-gallery-proxy news
    drive-gallery-proxy article <id>
    drive-gallery-proxy help

COMMANDS:
    serve      Run the HTTP API until Ctrl+C
    galleries  Print every gallery with its images as JSON
    news       Print the news listing as JSON
    article    Print one rendered article as JSON
    help       Show this help message

ENVIRONMENT:
    ROOT_FOLDER_ID           Drive folder whose sub-folders are galleries (required)
    NEWS_FOLDER_ID           Drive folder holding news documents (required)
    GOOGLE_CLIENT_ID         OAuth client id (required)
    GOOGLE_CLIENT_SECRET     OAuth client secret (required)
    GOOGLE_REFRESH_TOKEN     Offline refresh token (required)
    PORT / BIND_ADDR         Listen address (default 0.0.0.0:3001)
    CACHE_TTL_SECS           Cache freshness window (default 600)
    UPSTREAM_TIMEOUT_SECS    Per-call Drive timeout (default 30)
    EXCERPT_LENGTH           News excerpt length (default 200)
    IMAGE_URL_STRATEGY       thumbnail | direct (default thumbnail)
    THUMBNAIL_SIZE           Thumbnail edge size (default 1600)
    GALLERY_FAILURE_POLICY   skip | strict (default skip)
    CORS_ORIGIN              Allowed origin, * for any (default *)
    RUST_LOG                 Log filter (trace, debug, info, warn, error)
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Serve);
    }

    match args[1].as_str() {
        "serve" => Ok(Command::Serve),
        "galleries" => Ok(Command::Galleries),
        "news" => Ok(Command::News),
        "article" => {
            let id = args
                .get(2)
                .ok_or_else(|| anyhow!("Usage: drive-gallery-proxy article <id>"))?;
            Ok(Command::Article { id: id.clone() })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Wire the Drive client, renderer and caches together
fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let client = DriveClient::new(
        config.credentials.clone(),
        &config.drive_api_base,
        &config.oauth_token_url,
        config.upstream_timeout,
    )
    .context("Failed to create Drive client")?;

    let content = ContentService::new(
        Arc::new(client),
        Arc::new(DocxRenderer),
        config.sources.clone(),
        config.transform,
        config.gallery_failures,
    );

    Ok(Arc::new(AppState::new(
        content,
        config.cache_ttl,
        Arc::new(SystemClock),
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    if let Command::Help = command {
        print_help();
        return Ok(());
    }

    let config = Config::from_env().context("Invalid configuration")?;
    let state = build_state(&config)?;

    match command {
        Command::Serve => {
            info!(
                root = %config.sources.root_folder_id,
                news = %config.sources.news_folder_id,
                cache_ttl_secs = config.cache_ttl.as_secs(),
                image_urls = %config.transform.image_urls,
                gallery_failures = %config.gallery_failures,
                "Starting drive gallery proxy"
            );

            let cors = cors_layer(&config.cors_origin)?;
            let mut server = ApiServer::new(state, config.bind_addr, cors);
            if let Err(e) = server.start().await {
                error!(error = %e, "Failed to start API server");
                return Err(e);
            }

            server.run(shutdown_signal()).await?;
            info!("Shutdown complete.");
        }
        Command::Galleries => {
            let galleries = state.content.list_galleries().await?;
            print_json(&galleries)?;
        }
        Command::News => {
            let articles = state.content.list_articles().await?;
            print_json(&articles)?;
        }
        Command::Article { id } => {
            let article = state.content.get_article(&id).await?;
            print_json(&article)?;
        }
        Command::Help => {}
    }

    Ok(())
}
