// src/blockchain/rpc.rs

use ethers_core::types::U256;
use reqwest::Client;
use serde_json::{json, Value};

use super::models::SignerError;

/// Minimal JSON-RPC caller for the handful of node methods the signer needs.
#[derive(Debug, Clone)]
pub struct JsonRpc {
    http: Client,
    url: String,
}

impl JsonRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, SignerError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let response: Value = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SignerError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| SignerError::Rpc(e.to_string()))?;

        if let Some(err) = response.get("error") {
            return Err(SignerError::Rpc(format!("{} failed: {}", method, err)));
        }
        Ok(response["result"].clone())
    }

    /// Calls a method whose result is a hex quantity.
    pub async fn call_quantity(&self, method: &str, params: Value) -> Result<U256, SignerError> {
        let result = self.call(method, params).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| SignerError::Rpc(format!("{} returned a non-string result", method)))?;
        U256::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| SignerError::Rpc(format!("{} returned an invalid quantity: {}", method, e)))
    }
}
