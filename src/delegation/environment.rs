// src/delegation/environment.rs

use std::str::FromStr;

use anyhow::{Context, Result};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Deterministic deployments of the delegation framework (v1.3.0).
pub const DELEGATION_MANAGER: &str = "0xdb9B1e94B5b69Df7e401DDbedE43491141047dB3";
pub const ALLOWED_TARGETS_ENFORCER: &str = "0x7F20f61b1f09b08D970938F6fa563634d65c4EeB";
pub const ALLOWED_METHODS_ENFORCER: &str = "0x2c21fD0Cb9DC8445CB3fb0DC5E7Bb0Aca01842B5";
pub const TIMESTAMP_ENFORCER: &str = "0x1046bb45C8d673d4ea75321280DB34899413c069";

/// Parses a 0x-prefixed address, naming `label` in the error.
pub fn parse_address(label: &str, value: &str) -> Result<Address> {
    Address::from_str(value).with_context(|| format!("{} must be a 0x-prefixed address", label))
}

/// Contract addresses a delegation is built and signed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationEnvironment {
    pub delegation_manager: Address,
    pub allowed_targets_enforcer: Address,
    pub allowed_methods_enforcer: Address,
    pub timestamp_enforcer: Address,
}

impl DelegationEnvironment {
    pub fn from_addresses(
        delegation_manager: &str,
        allowed_targets_enforcer: &str,
        allowed_methods_enforcer: &str,
        timestamp_enforcer: &str,
    ) -> Result<Self> {
        Ok(Self {
            delegation_manager: parse_address("delegation manager", delegation_manager)?,
            allowed_targets_enforcer: parse_address(
                "allowed targets enforcer",
                allowed_targets_enforcer,
            )?,
            allowed_methods_enforcer: parse_address(
                "allowed methods enforcer",
                allowed_methods_enforcer,
            )?,
            timestamp_enforcer: parse_address("timestamp enforcer", timestamp_enforcer)?,
        })
    }

    /// No deployment at all. Signing against it fails with
    /// `SigningIdentityUnavailable`.
    pub fn unconfigured() -> Self {
        Self {
            delegation_manager: Address::zero(),
            allowed_targets_enforcer: Address::zero(),
            allowed_methods_enforcer: Address::zero(),
            timestamp_enforcer: Address::zero(),
        }
    }
}

impl Default for DelegationEnvironment {
    fn default() -> Self {
        match Self::from_addresses(
            DELEGATION_MANAGER,
            ALLOWED_TARGETS_ENFORCER,
            ALLOWED_METHODS_ENFORCER,
            TIMESTAMP_ENFORCER,
        ) {
            Ok(env) => env,
            Err(e) => {
                warn!("Built-in delegation deployment is unusable: {:#}", e);
                Self::unconfigured()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_deterministic_deployment() {
        let env = DelegationEnvironment::default();
        assert_ne!(env, DelegationEnvironment::unconfigured());
        assert_eq!(
            env.delegation_manager,
            "0xdb9B1e94B5b69Df7e401DDbedE43491141047dB3".parse::<Address>().unwrap()
        );
        assert_ne!(env.allowed_targets_enforcer, env.allowed_methods_enforcer);
    }

    #[test]
    fn malformed_address_is_named_in_the_error() {
        let err = DelegationEnvironment::from_addresses(
            DELEGATION_MANAGER,
            "0x7F20",
            ALLOWED_METHODS_ENFORCER,
            TIMESTAMP_ENFORCER,
        )
        .unwrap_err();
        assert!(err.to_string().contains("allowed targets enforcer"));
    }
}
