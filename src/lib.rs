// src/lib.rs

use std::sync::Arc;

pub mod actions;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod delegation;
pub mod error;
pub mod lifecycle;
pub mod mcp;
pub mod oneshot;
pub mod session;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Registry, action context and agent instructions
    pub session: Arc<session::AgentSession>,
}
