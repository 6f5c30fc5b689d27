//! LawHelp CLI and server entry point.
//!
//! Binary name: `lawhelp`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! appropriate command handler or starts the HTTP and WebSocket server.

mod cli;
mod http;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;
use lawhelp_infra::config::{default_config_path, load_server_config, require_jwt_secret};
use lawhelp_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use lawhelp_observe::tracing_setup::{init_tracing, shutdown_tracing};
use lawhelp_types::config::ServerConfig;

use cli::{Cli, Commands, SessionCommand, TokenCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or logging
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "lawhelp", &mut std::io::stdout());
        return Ok(());
    }

    // Default filter when RUST_LOG is unset
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if matches!(cli.command, Commands::Serve { .. }) => "info",
        0 => "warn",
        1 => "info,lawhelp_core=debug,lawhelp_infra=debug,lawhelp_api=debug",
        _ => "trace",
    };
    init_tracing(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    ensure_data_dir(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&data_dir));
    let mut config = load_server_config(&config_path).await?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.listen.port = port;
            }
            if let Some(host) = host {
                config.listen.host = host;
            }
            serve(config, data_dir, cli.quiet).await?;
        }

        Commands::Session { action } => {
            let service = state::open_chat_service(&config, &data_dir).await?;
            match action {
                SessionCommand::Create { owner, title } => {
                    cli::session::create_session(&service, &owner, title, cli.json).await?;
                }
                SessionCommand::List { owner } => {
                    cli::session::list_sessions(&service, &owner, cli.json).await?;
                }
                SessionCommand::Messages { id } => {
                    cli::session::show_messages(&service, &id, cli.json).await?;
                }
            }
        }

        Commands::Token { action } => match action {
            TokenCommand::Issue { subject, ttl_secs } => {
                let secret = require_jwt_secret(&config)?;
                cli::token::issue_token(secret, &subject, ttl_secs, cli.json)?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve(config: ServerConfig, data_dir: PathBuf, quiet: bool) -> anyhow::Result<()> {
    let state = AppState::init(&config, &data_dir).await?;
    let registry = state.registry.clone();

    let addr = format!("{}:{}", config.listen.host, config.listen.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    if !quiet {
        println!(
            "  {} LawHelp listening on {} (WebSocket at {})",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan(),
            console::style(format!("ws://{addr}/ws")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, model = %config.answer.model, "Server started");

    let router = http::router::build_router(state);

    // Graceful shutdown does not track upgraded WebSocket tasks; close them
    // through the registry.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let closed = registry.shutdown();
            tracing::info!(connections = closed, "Shutting down");
        })
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
