mod cli;
mod error;
mod routes;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::ServerError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "ceprace stopped");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing(fallback: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let coordinator = Arc::new(cli.coordinator_builder()?.build()?);

    let listener = TcpListener::bind(cli.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: cli.bind,
            source,
        })?;

    let config = coordinator.config();
    tracing::info!(
        addr = %listener.local_addr()?,
        providers = ?coordinator.providers(),
        deadline_ms = ceprace_core::duration_ms(config.deadline),
        losers = ?config.losers,
        "ceprace listening"
    );

    axum::serve(listener, routes::router(coordinator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ceprace shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "could not install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
