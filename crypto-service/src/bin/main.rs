use std::sync::Arc;

use clap::Parser;
use crypto_service::{api, CryptoCompareClient, CryptoService, CryptoServiceConfig};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// Crypto price service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listening address
    #[arg(short, long, env = "CRYPTO_ADDR")]
    addr: Option<String>,

    /// CryptoCompare base URL
    #[arg(long, env = "CRYPTOCOMPARE_URL")]
    provider_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = Cli::parse();

    let log_level = if std::env::var("DEBUG").as_deref() == Ok("1") { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    debug!("Debug logging enabled");

    let mut config = CryptoServiceConfig::from_env()?;
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    if let Some(url) = cli.provider_url {
        config.base_url = url;
    }

    let provider = CryptoCompareClient::with_config(&config)?;
    let service = Arc::new(CryptoService::new(Arc::new(provider)));
    let app = api::router(service);

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Crypto service listening on {}, provider {}", listener.local_addr()?, config.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Crypto service stopped");
    Ok(())
}

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

    info!("Shutdown signal received, starting graceful shutdown");
}
