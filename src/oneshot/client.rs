//! HTTP client for the 1Shot API.
//!
//! Authentication uses the OAuth client-credentials grant; the bearer token is
//! cached and refreshed shortly before it expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{models::*, ExecutionService};
use crate::config::Config;
use crate::error::OneShotError;

// Refresh the token this long before the API says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Client for the 1Shot transaction-execution API.
#[derive(Clone)]
pub struct OneShotClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl OneShotClient {
    pub fn new(api_key: impl Into<String>, api_secret: SecretString, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret,
            token: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            &config.base_url,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns a valid bearer token, fetching a new one when needed.
    async fn bearer(&self) -> Result<String, OneShotError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting new 1Shot API token");
        let res = self
            .http
            .post(self.url("/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.expose_secret().as_str()),
            ])
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(OneShotError::Auth(format!("{}: {}", status.as_u16(), body)));
        }
        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| OneShotError::Auth(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, OneShotError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let token = self.bearer().await?;
        debug!("GET {}", path);
        let res = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        decode(res).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, OneShotError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self.bearer().await?;
        debug!("POST {}", path);
        let res = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, OneShotError> {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(OneShotError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ExecutionService for OneShotClient {
    async fn list_chains(
        &self,
        params: &ListChainsParams,
    ) -> Result<PagedResponse<ChainInfo>, OneShotError> {
        self.get("/chains", params).await
    }

    async fn list_wallets(
        &self,
        business_id: Uuid,
        params: &ListWalletsParams,
    ) -> Result<PagedResponse<Wallet>, OneShotError> {
        self.get(&format!("/business/{}/wallets", business_id), params)
            .await
    }

    async fn get_wallet(
        &self,
        wallet_id: Uuid,
        include_balances: bool,
    ) -> Result<Wallet, OneShotError> {
        self.get(
            &format!("/wallets/{}", wallet_id),
            &[("includeBalances", include_balances)],
        )
        .await
    }

    async fn list_delegations(
        &self,
        wallet_id: Uuid,
        params: &PageParams,
    ) -> Result<PagedResponse<DelegationRecord>, OneShotError> {
        self.get(&format!("/wallets/{}/delegations", wallet_id), params)
            .await
    }

    async fn create_delegation(
        &self,
        wallet_id: Uuid,
        request: &CreateDelegationRequest,
    ) -> Result<DelegationRecord, OneShotError> {
        self.post(&format!("/wallets/{}/delegations", wallet_id), request)
            .await
    }

    async fn list_contract_methods(
        &self,
        business_id: Uuid,
        params: &ListContractMethodsParams,
    ) -> Result<PagedResponse<ContractMethod>, OneShotError> {
        self.get(&format!("/business/{}/methods", business_id), params)
            .await
    }

    async fn get_contract_method(&self, method_id: Uuid) -> Result<ContractMethod, OneShotError> {
        self.get(&format!("/methods/{}", method_id), NO_QUERY).await
    }

    async fn search_prompts(&self, query: &str) -> Result<Vec<FullPrompt>, OneShotError> {
        self.post("/prompts/search", &json!({ "query": query }))
            .await
    }

    async fn assure_contract_methods(
        &self,
        business_id: Uuid,
        request: &AssureContractMethodsRequest,
    ) -> Result<Vec<ContractMethod>, OneShotError> {
        self.post(&format!("/business/{}/methods/prompt", business_id), request)
            .await
    }

    async fn encode(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
        options: &EncodeOptions,
    ) -> Result<EncodeResult, OneShotError> {
        let mut body = serde_json::to_value(options)?;
        body["params"] = Value::Object(params.clone());
        self.post(&format!("/methods/{}/encode", method_id), &body)
            .await
    }

    async fn execute(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
        options: &ExecuteOptions,
    ) -> Result<Transaction, OneShotError> {
        let mut body = serde_json::to_value(options)?;
        body["params"] = Value::Object(params.clone());
        self.post(&format!("/methods/{}/execute", method_id), &body)
            .await
    }

    async fn read(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
    ) -> Result<Value, OneShotError> {
        self.post(
            &format!("/methods/{}/read", method_id),
            &json!({ "params": params }),
        )
        .await
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, OneShotError> {
        self.get(&format!("/transactions/{}", transaction_id), NO_QUERY)
            .await
    }
}
