// src/blockchain/models.rs
use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Error types for local signing ---

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("no local signing key is configured")]
    Unavailable,
    #[error("invalid local signing key: {0}")]
    InvalidKey(String),
    #[error("signer rejected the request: {0}")]
    Rejected(String),
    #[error("node RPC error: {0}")]
    Rpc(String),
    #[error("transaction {0:?} was dropped before a receipt was produced")]
    Dropped(H256),
}

// --- Network Models ---

/// The network the local wallet lives on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub network_id: String,
    pub chain_id: u64,
}

// --- Transaction Models ---

/// A contract call submitted through the local signer.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub value: Option<U256>,
    pub data: Bytes,
}
