//! Local signing identity.
//!
//! The local wallet signs and submits transactions itself (the
//! direct-signing execution path) and signs delegations handed to 1Shot
//! wallets. [`LocalSigner`] is the seam the rest of the crate depends on;
//! [`LocalWalletSigner`] backs it with an in-process private key and a node
//! reachable over HTTP JSON-RPC.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers_providers::{Http, PendingTransaction, Provider};
use ethers_core::types::{
    transaction::eip2718::TypedTransaction, Address, Signature, TransactionReceipt,
    TransactionRequest, H256,
};
use ethers_signers::{LocalWallet, Signer};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{
    models::{CallRequest, NetworkInfo, SignerError},
    nonce_manager::NonceManager,
    rpc::JsonRpc,
};
use crate::config::Config;

#[async_trait]
pub trait LocalSigner: Send + Sync {
    fn address(&self) -> Address;

    fn network(&self) -> &NetworkInfo;

    /// Signs and submits a call, returning its transaction hash.
    async fn send_transaction(&self, request: CallRequest) -> Result<H256, SignerError>;

    /// Blocks until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, SignerError>;

    /// Produces a raw ECDSA signature over a 32-byte digest.
    async fn sign_hash(&self, hash: H256) -> Result<Signature, SignerError>;
}

pub struct LocalWalletSigner {
    wallet: LocalWallet,
    network: NetworkInfo,
    rpc: JsonRpc,
    provider: Arc<Provider<Http>>,
    nonce_manager: NonceManager,
    receipt_interval: Duration,
}

impl LocalWalletSigner {
    pub fn new(private_key: &str, rpc_url: &str, network: NetworkInfo) -> Result<Self, SignerError> {
        let wallet = LocalWallet::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?
            .with_chain_id(network.chain_id);
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| SignerError::Rpc(format!("invalid RPC url {}: {}", rpc_url, e)))?;

        Ok(Self {
            wallet,
            network,
            rpc: JsonRpc::new(rpc_url),
            provider: Arc::new(provider),
            nonce_manager: NonceManager::new(),
            receipt_interval: Duration::from_secs(2),
        })
    }

    /// Builds the signer described by the configuration, if a key is present.
    pub fn from_config(config: &Config) -> Result<Option<Self>, SignerError> {
        let Some(key) = config.local_private_key.as_ref() else {
            warn!("LOCAL_PRIVATE_KEY not set; local wallet actions are disabled");
            return Ok(None);
        };
        let rpc_url = config
            .local_rpc_url
            .as_deref()
            .ok_or_else(|| SignerError::Rpc("LOCAL_RPC_URL must be set with LOCAL_PRIVATE_KEY".into()))?;
        let network = NetworkInfo {
            network_id: config.local_network_id.clone(),
            chain_id: config.local_chain_id,
        };
        let signer = Self::new(key.expose_secret(), rpc_url, network)?;
        info!(
            "Local wallet {} on {} (chain {})",
            ethers::utils::to_checksum(&signer.address(), None),
            signer.network.network_id,
            signer.network.chain_id
        );
        Ok(Some(signer))
    }

    async fn fill_and_sign(&self, request: CallRequest) -> Result<Vec<u8>, SignerError> {
        let from = self.wallet.address();
        let nonce = self.nonce_manager.next_nonce(from, &self.rpc).await?;

        let mut tx = TransactionRequest::new()
            .from(from)
            .to(request.to)
            .data(request.data)
            .nonce(nonce)
            .chain_id(self.network.chain_id);
        if let Some(value) = request.value {
            tx = tx.value(value);
        }

        let call_obj = serde_json::to_value(&tx).map_err(|e| SignerError::Rpc(e.to_string()))?;
        let gas = self
            .rpc
            .call_quantity("eth_estimateGas", json!([call_obj]))
            .await?;
        let gas_price = self.rpc.call_quantity("eth_gasPrice", json!([])).await?;
        let tx = tx.gas(gas).gas_price(gas_price);

        let typed: TypedTransaction = tx.into();
        let signature = self
            .wallet
            .sign_transaction(&typed)
            .await
            .map_err(|e| SignerError::Rejected(e.to_string()))?;
        Ok(typed.rlp_signed(&signature).to_vec())
    }
}

#[async_trait]
impl LocalSigner for LocalWalletSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn network(&self) -> &NetworkInfo {
        &self.network
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<H256, SignerError> {
        let from = self.wallet.address();
        let raw = match self.fill_and_sign(request).await {
            Ok(raw) => raw,
            Err(e) => {
                self.nonce_manager.reset(from).await;
                return Err(e);
            }
        };

        let result = self
            .rpc
            .call("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await;
        let hash = match result {
            Ok(v) => v,
            Err(e) => {
                self.nonce_manager.reset(from).await;
                return Err(e);
            }
        };

        let hash = hash
            .as_str()
            .ok_or_else(|| SignerError::Rpc("missing transaction hash in response".into()))?;
        let hash = H256::from_str(hash).map_err(|e| SignerError::Rpc(e.to_string()))?;
        debug!("Submitted transaction {:?}", hash);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, SignerError> {
        PendingTransaction::new(tx_hash, self.provider.as_ref())
            .interval(self.receipt_interval)
            .await
            .map_err(|e| SignerError::Rpc(e.to_string()))?
            .ok_or(SignerError::Dropped(tx_hash))
    }

    async fn sign_hash(&self, hash: H256) -> Result<Signature, SignerError> {
        self.wallet
            .sign_hash(hash)
            .map_err(|e| SignerError::Rejected(e.to_string()))
    }
}
