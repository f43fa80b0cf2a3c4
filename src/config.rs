// src/config.rs

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use ethers_core::types::Address;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::delegation::environment::parse_address;
use crate::delegation::DelegationEnvironment;
use crate::lifecycle::PollPolicy;

const DEFAULT_BASE_URL: &str = "https://api.1shotapi.com/v0";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // 1Shot API credentials
    pub api_key: String,
    pub api_secret: SecretString,
    pub business_id: Uuid,
    pub base_url: String,

    /// Local signing identity. When absent the local-wallet and delegation
    /// actions report `SigningIdentityUnavailable`.
    pub local_private_key: Option<SecretString>,
    pub local_rpc_url: Option<String>,
    pub local_chain_id: u64,
    pub local_network_id: String,

    // Transaction polling
    pub poll_interval_ms: u64,
    pub poll_max_attempts: Option<u32>,
    pub poll_deadline_secs: Option<u64>,

    /// Delegation framework deployment used for caveat enforcers and signing.
    pub delegation_environment: DelegationEnvironment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            api_key: String::new(),
            api_secret: SecretString::new(String::new()),
            business_id: Uuid::nil(),
            base_url: DEFAULT_BASE_URL.to_string(),
            local_private_key: None,
            local_rpc_url: None,
            local_chain_id: 84532,
            local_network_id: "base-sepolia".to_string(),
            poll_interval_ms: 2000,
            poll_max_attempts: Some(150),
            poll_deadline_secs: None,
            delegation_environment: DelegationEnvironment::default(),
        }
    }
}

impl Config {
    /// Polling bounds for remote transaction execution.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
            deadline: self.poll_deadline_secs.map(Duration::from_secs),
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let api_key = env::var("ONESHOT_API_KEY").context("ONESHOT_API_KEY must be set")?;
        let api_secret =
            env::var("ONESHOT_API_SECRET").context("ONESHOT_API_SECRET must be set")?;
        let business_id = env::var("ONESHOT_BUSINESS_ID")
            .context("ONESHOT_BUSINESS_ID must be set")?
            .parse::<Uuid>()
            .context("ONESHOT_BUSINESS_ID must be a UUID")?;

        let base_url = env::var("ONESHOT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).context("ONESHOT_BASE_URL must be a valid URL")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let poll_max_attempts = match env::var("POLL_MAX_ATTEMPTS") {
            // 0 disables the attempt bound.
            Ok(v) => match v.parse::<u32>().context("POLL_MAX_ATTEMPTS must be a valid number")? {
                0 => None,
                n => Some(n),
            },
            Err(_) => Some(150),
        };
        let poll_deadline_secs = env::var("POLL_DEADLINE_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("POLL_DEADLINE_SECS must be a valid number")?;

        let mut delegation_environment = DelegationEnvironment::default();
        if let Some(a) = parse_address_var("DELEGATION_MANAGER_ADDRESS")? {
            delegation_environment.delegation_manager = a;
        }
        if let Some(a) = parse_address_var("ALLOWED_TARGETS_ENFORCER_ADDRESS")? {
            delegation_environment.allowed_targets_enforcer = a;
        }
        if let Some(a) = parse_address_var("ALLOWED_METHODS_ENFORCER_ADDRESS")? {
            delegation_environment.allowed_methods_enforcer = a;
        }
        if let Some(a) = parse_address_var("TIMESTAMP_ENFORCER_ADDRESS")? {
            delegation_environment.timestamp_enforcer = a;
        }

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,

            api_key,
            api_secret: SecretString::new(api_secret),
            business_id,
            base_url,

            local_private_key: env::var("LOCAL_PRIVATE_KEY").ok().map(SecretString::new),
            local_rpc_url: env::var("LOCAL_RPC_URL").ok(),
            local_chain_id: env::var("LOCAL_CHAIN_ID")
                .unwrap_or_else(|_| "84532".to_string())
                .parse()
                .context("LOCAL_CHAIN_ID must be a valid number")?,
            local_network_id: env::var("LOCAL_NETWORK_ID")
                .unwrap_or_else(|_| "base-sepolia".to_string()),

            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("POLL_INTERVAL_MS must be a valid number")?,
            poll_max_attempts,
            poll_deadline_secs,

            delegation_environment,
        })
    }
}

fn parse_address_var(name: &str) -> Result<Option<Address>> {
    env::var(name)
        .ok()
        .map(|v| parse_address(name, &v))
        .transpose()
}
