mod cli;
mod config;
mod corpus;
mod errors;
mod ingest;
mod llm_client;
mod pipeline;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, GenerateArgs, ScrapeArgs, ServeArgs};
use crate::config::{Config, ScrapeConfig};
use crate::ingest::CareerScraper;
use crate::pipeline::RunStatus;
use crate::routes::build_router;
use crate::state::{build_pipeline, AppState};

/// Exit code for a run that reported `ERROR`.
const EXIT_RUN_FAILED: u8 = 1;
/// Exit code for configuration or startup failures.
const EXIT_STARTUP_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing
    init_tracing();

    let command = Cli::parse().command();
    let result = match command {
        Command::Generate(args) => generate(args).await,
        Command::Scrape(args) => scrape(args).await,
        Command::Serve(args) => serve(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::from(EXIT_STARTUP_FAILED)
        }
    }
}

/// Initialize structured logging (stderr, so stdout carries only run status).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ats_keywords=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let mut config = Config::from_env()?;
    if args.emit_intermediates {
        config.emit_intermediates = true;
    }
    let pipeline = build_pipeline(&config)?;

    let role = match args.role {
        Some(role) => role,
        None => cli::prompt_for_role(&mut std::io::stdin().lock(), &mut std::io::stdout())
            .context("Failed to read role from stdin")?,
    };
    let num_keywords = args.num_keywords.unwrap_or(config.num_keywords);

    info!("Fetching response from the LLM");
    let result = pipeline.run(&role, num_keywords).await;
    let status = RunStatus::of(&result);

    match result {
        Ok(outcome) => {
            println!("{status}");
            println!(
                "Results are stored at '{}'.",
                outcome.artifact_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(kind = ?e.kind(), stage = ?e.stage(), "{e}");
            println!("{status}");
            Ok(ExitCode::from(EXIT_RUN_FAILED))
        }
    }
}

async fn scrape(args: ScrapeArgs) -> Result<ExitCode> {
    let config = ScrapeConfig::from_env()?;
    let scraper = CareerScraper::new(config, &args.data_dir)?;

    match scraper.run().await {
        Ok(summary) => {
            println!(
                "{} careers scraped into '{}' ({} failed).",
                summary.written,
                args.data_dir.display(),
                summary.failed
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Scrape failed: {e}");
            println!("{}", RunStatus::Error);
            Ok(ExitCode::from(EXIT_RUN_FAILED))
        }
    }
}

async fn serve(args: ServeArgs) -> Result<ExitCode> {
    let config = Config::from_env()?;
    let port = args.port.unwrap_or(config.port);

    info!("Starting ATS keyword API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState {
        pipeline: Arc::new(build_pipeline(&config)?),
        default_num_keywords: config.num_keywords,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(ExitCode::SUCCESS)
}
