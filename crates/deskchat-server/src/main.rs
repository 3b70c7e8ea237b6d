//! Deskchat Server

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use deskchat_server::auth::StaticTokenAuth;
use deskchat_server::config::ServerConfig;
use deskchat_server::http::create_router;
use deskchat_server::state::AppState;

#[derive(Parser)]
#[command(name = "deskchat-server", about = "Support-chat server")]
struct Args {
    /// HTTP bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Disable the auto-reply engine.
    #[arg(long)]
    no_auto_reply: bool,

    /// Auto-reply delay in seconds.
    #[arg(long)]
    auto_reply_delay_secs: Option<u64>,

    /// Admin bearer token as TOKEN=STAFF_ID. Repeatable.
    #[arg(long = "admin-token", value_name = "TOKEN=ID")]
    admin_tokens: Vec<String>,

    /// Visitor bearer token as TOKEN=USER_ID. Repeatable.
    #[arg(long = "visitor-token", value_name = "TOKEN=ID")]
    visitor_tokens: Vec<String>,
}

fn split_token(entry: &str) -> Result<(&str, &str), String> {
    entry
        .split_once('=')
        .ok_or_else(|| format!("expected TOKEN=ID, got '{}'", entry))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with default filter if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::default();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.no_auto_reply {
        config.auto_reply.enabled = false;
    }
    if let Some(secs) = args.auto_reply_delay_secs {
        config.auto_reply.delay = Duration::from_secs(secs);
    }

    let mut auth = StaticTokenAuth::new();
    for entry in &args.admin_tokens {
        let (token, id) = split_token(entry)?;
        auth = auth.with_admin(token, id);
    }
    for entry in &args.visitor_tokens {
        let (token, id) = split_token(entry)?;
        auth = auth.with_visitor(token, id);
    }

    let state = AppState::new(Arc::new(auth), config.auto_reply.clone());
    let app = create_router(state);

    info!(bind_addr = %config.bind_addr, "Starting Deskchat server");
    let listener = TcpListener::bind(&config.bind_addr).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = axum::serve(listener, app) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
    }

    Ok(())
}
