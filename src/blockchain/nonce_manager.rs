// src/blockchain/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use serde_json::json;
use tokio::sync::Mutex;

use super::{models::SignerError, rpc::JsonRpc};

// Hands out sequential nonces per sender so concurrent local-wallet
// executions never collide.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each address gets its own state, protected by a Mutex.
    nonces: Arc<DashMap<Address, Arc<Mutex<Option<U256>>>>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next nonce for `address`, asking the node for the pending
    /// transaction count the first time the address is seen.
    pub async fn next_nonce(&self, address: Address, rpc: &JsonRpc) -> Result<U256, SignerError> {
        let slot = self
            .nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut next = slot.lock().await;
        let nonce = match *next {
            Some(nonce) => nonce,
            None => {
                rpc.call_quantity(
                    "eth_getTransactionCount",
                    json!([format!("{:?}", address), "pending"]),
                )
                .await?
            }
        };

        *next = Some(nonce + U256::one());
        Ok(nonce)
    }

    /// Forgets the cached nonce so the next call re-reads it from the node.
    /// Used after a submission fails and the handed-out nonce went unused.
    pub async fn reset(&self, address: Address) {
        if let Some(slot) = self.nonces.get(&address).map(|s| s.clone()) {
            *slot.lock().await = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};

    #[tokio::test]
    async fn nonces_are_sequential_after_first_fetch() {
        let count = mock("POST", "/nonce")
            .match_body(Matcher::Regex("eth_getTransactionCount".to_string()))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x5"}"#)
            .expect(2)
            .create();

        let rpc = JsonRpc::new(format!("{}/nonce", mockito::server_url()));
        let manager = NonceManager::new();
        let address = Address::repeat_byte(0x11);

        assert_eq!(manager.next_nonce(address, &rpc).await.unwrap(), U256::from(5));
        assert_eq!(manager.next_nonce(address, &rpc).await.unwrap(), U256::from(6));

        // A reset re-reads the count from the node.
        manager.reset(address).await;
        assert_eq!(manager.next_nonce(address, &rpc).await.unwrap(), U256::from(5));
        count.assert();
    }
}
