//! Process-level helpers shared by the binary and integration tests.

use std::env;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "oneshot_mcp_server=debug,oneshot_mcp=debug,tower_http=debug";

/// Logs go to stderr so stdout stays free for the stdio transport.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// True when the process should speak MCP over stdin/stdout instead of HTTP.
pub fn mcp_mode<I: IntoIterator<Item = String>>(args: I) -> bool {
    args.into_iter().any(|a| a == "--mcp") || env::var("MCP_MODE").is_ok()
}

/// Cancels `token` on Ctrl-C so in-flight polling stops promptly.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            token.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_flag_selects_stdio() {
        assert!(mcp_mode(vec!["oneshot_mcp".to_string(), "--mcp".to_string()]));
    }
}
