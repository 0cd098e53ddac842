//! fx-weigher - an image effects service.
//!
//! This binary starts the HTTP server or runs the pipeline on local files.

use std::process::ExitCode;

use base64::{engine::general_purpose, Engine as _};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fx_weigher::{
    config::{ApplyConfig, Cli, Command, EffectsConfig, ServeConfig},
    effects::{Effect, OutputFormat},
    pipeline::{Envelope, Orchestrator, DEFAULT_MAX_WEIGHT},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Apply(config) => run_apply(config),
        Command::Effects(config) => run_effects(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if !OutputFormat::is_recognized(&config.output_format) {
        warn!(
            "Unrecognized output format '{}', falling back to jpg",
            config.output_format
        );
    }

    let orchestrator = Orchestrator::new()
        .with_max_weight(config.max_weight)
        .with_output_format(config.output_format());

    info!("Configuration:");
    info!("  Max weight: {}", orchestrator.max_weight());
    info!("  Output format: {}", orchestrator.output_format());
    info!("  Body limit: {} bytes", config.max_body_bytes);
    match config.request_timeout() {
        Some(timeout) => info!("  Request timeout: {}s", timeout.as_secs()),
        None => warn!("  Request timeout: DISABLED"),
    }

    let router = create_router(orchestrator, build_router_config(&config));
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  Try: curl http://{}/effects", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "fx_weigher=debug,tower_http=debug"
    } else {
        "fx_weigher=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_body_bytes(config.max_body_bytes)
        .with_request_timeout(config.request_timeout())
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Apply Command
// =============================================================================

fn run_apply(config: ApplyConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let bytes = match std::fs::read(&config.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let request = serde_json::json!({
        "img": general_purpose::STANDARD.encode(&bytes),
        "effects": &config.effects,
    });

    let orchestrator = Orchestrator::new()
        .with_max_weight(config.max_weight)
        .with_output_format(config.output_format());

    match orchestrator.build_response(&request) {
        envelope @ Envelope::Success(_) => {
            let Some(image) = envelope.image_bytes() else {
                eprintln!("Error: result image could not be decoded");
                return ExitCode::FAILURE;
            };
            if let Err(e) = std::fs::write(&config.output, &image) {
                eprintln!("Error: cannot write {}: {}", config.output.display(), e);
                return ExitCode::FAILURE;
            }
            println!(
                "✓ Wrote {} ({} bytes)",
                config.output.display(),
                image.len()
            );
            ExitCode::SUCCESS
        }
        envelope @ Envelope::Error(_) => {
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => eprintln!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Effects Command
// =============================================================================

fn run_effects(config: EffectsConfig) -> ExitCode {
    if config.json {
        let effects: Vec<_> = Effect::ALL
            .iter()
            .map(|e| serde_json::json!({"name": e.name(), "weight": e.weight()}))
            .collect();
        let json = serde_json::json!({
            "effects": effects,
            "max_weight": DEFAULT_MAX_WEIGHT,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Effect       Weight");
    println!("───────────  ──────");
    for effect in Effect::ALL {
        println!("{:<11}  {:>6}", effect.name(), effect.weight());
    }
    println!();
    println!("Default budget: {}", DEFAULT_MAX_WEIGHT);

    ExitCode::SUCCESS
}
