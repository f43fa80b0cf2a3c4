// src/blockchain/mod.rs

pub mod models;
pub mod nonce_manager;
pub mod rpc;
pub mod signer;

pub use models::{CallRequest, NetworkInfo, SignerError};
pub use signer::{LocalSigner, LocalWalletSigner};

// Re-export commonly used types
pub use ethers::{
    types::{Address, H256, U256},
    utils::to_checksum,
};
