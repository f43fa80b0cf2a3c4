// src/main.rs

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use oneshot_mcp_server::{
    actions::ActionContext,
    api,
    blockchain::{LocalSigner, LocalWalletSigner},
    config::Config,
    mcp,
    oneshot::{ExecutionService, OneShotClient},
    session::{self, AgentSession},
    utils, AppState,
};
use tokio::io;
use tracing::info;

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let cancel = state.session.context.cancel.clone();
    let app = api::router(state);

    info!("🚀 HTTP Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("HTTP server failed")
}

fn build_state(config: Config) -> Result<AppState> {
    let service: Arc<dyn ExecutionService> = Arc::new(OneShotClient::from_config(&config));
    let signer: Option<Arc<dyn LocalSigner>> = LocalWalletSigner::from_config(&config)
        .context("failed to initialize local wallet")?
        .map(|s| Arc::new(s) as Arc<dyn LocalSigner>);

    let context = Arc::new(ActionContext::new(&config, service, signer));
    let session = session::get_or_init(|| AgentSession::new(context));
    info!(
        "Registered {} actions for business {}",
        session.registry.len(),
        config.business_id
    );

    Ok(AppState {
        config: Arc::new(config),
        session,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let state = build_state(config)?;
    utils::cancel_on_ctrl_c(state.session.context.cancel.clone());

    // Check if running in MCP mode (stdin/stdout) or HTTP server mode
    if utils::mcp_mode(env::args()) {
        info!("🚀 Starting MCP server on stdin/stdout...");
        mcp::stdio::serve(state, io::BufReader::new(io::stdin()), io::stdout()).await;
        // A blocking stdin read cannot be interrupted and would hold the runtime open.
        std::process::exit(0);
    } else {
        run_http_server(state).await
    }
}
