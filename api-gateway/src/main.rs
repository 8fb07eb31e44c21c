//! API Gateway for the crypto app

use std::sync::Arc;

use api_gateway::config::GatewayConfig;
use api_gateway::{router, AppState};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// Crypto app API gateway
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, env = "GATEWAY_ADDR")]
    addr: Option<String>,

    /// Base URL of the account service
    #[clap(long, env = "ACCOUNT_SERVICE_URL")]
    account_service_url: Option<String>,

    /// Base URL of the crypto price service
    #[clap(long, env = "CRYPTO_SERVICE_URL")]
    crypto_service_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let log_level = if std::env::var("DEBUG").as_deref() == Ok("1") { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    debug!("Debug logging enabled");

    let mut config = GatewayConfig::from_env()?;
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(url) = args.account_service_url {
        config.account_service_url = url;
    }
    if let Some(url) = args.crypto_service_url {
        config.crypto_service_url = url;
    }

    info!(
        "Routing to account service at {}, crypto service at {}",
        config.account_service_url, config.crypto_service_url
    );

    let addr = config.addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Gateway stopped");
    Ok(())
}

/// Graceful shutdown signal handler
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
                error!("Failed to install signal handler: {}", err);
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
