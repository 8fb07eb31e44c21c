use std::sync::Arc;

use account_service::{api, AccountService, AccountServiceConfig};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// Account Service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listening address
    #[arg(short, long, env = "ACCOUNT_ADDR")]
    addr: Option<String>,

    /// Database URL; the in-memory store is used when absent
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Database pool size
    #[arg(short, long)]
    pool_size: Option<u32>,

    /// Base URL of the crypto price service
    #[arg(short, long, env = "CRYPTO_SERVICE_URL")]
    crypto_service_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = Cli::parse();

    // DEBUG=1 raises the default level
    let log_level = if std::env::var("DEBUG").as_deref() == Ok("1") { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    debug!("Debug logging enabled");

    let mut config = AccountServiceConfig::from_env();
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    if let Some(url) = cli.database_url.filter(|u| !u.is_empty()) {
        config.database_url = Some(url);
    }
    if let Some(pool_size) = cli.pool_size {
        config.db_pool_size = pool_size;
    }
    if let Some(url) = cli.crypto_service_url {
        config.crypto_service_url = url;
    }

    info!(
        "Starting account service with database: {}, price source: {}",
        if config.database_url.is_some() { "postgres" } else { "in-memory" },
        config.crypto_service_url
    );

    let service = Arc::new(AccountService::with_config(&config).await?);
    let app = api::router(service);

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Account service stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Error waiting for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
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

    info!("Shutting down account service...");
}
