//! Caveats restrict what a delegate may do with a delegation.
//!
//! Each restriction is optional and additive: adding one narrows the grant,
//! and a delegation with no caveats at all is an unrestricted grant.

use ethers_core::types::{Address, Bytes};
use ethers_core::utils::keccak256;
use serde::{Deserialize, Serialize};

use super::environment::DelegationEnvironment;
use crate::error::DelegationError;

/// Optional validity window, in unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TimeWindow {
    /// `(after, before)` thresholds as understood by the timestamp enforcer,
    /// where 0 leaves that side unbounded. `None` when no bound is given.
    pub fn thresholds(&self) -> Result<Option<(u64, u64)>, DelegationError> {
        match (self.start, self.end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start >= end => {
                Err(DelegationError::InvalidTimeWindow { start, end })
            }
            (start, end) => Ok(Some((start.unwrap_or(0), end.unwrap_or(0)))),
        }
    }
}

/// A restriction before it is bound to an enforcer contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    AllowedTargets { targets: Vec<Address> },
    AllowedMethods { selectors: Vec<[u8; 4]> },
    Timestamp { after: u64, before: u64 },
}

/// An enforcer-bound caveat, as carried in a delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caveat {
    pub enforcer: Address,
    pub terms: Bytes,
    pub args: Bytes,
}

/// Parses a method given either as a 4-byte selector (`0xa9059cbb`) or as a
/// function signature (`transfer(address,uint256)`).
pub fn method_selector(method: &str) -> Result<[u8; 4], DelegationError> {
    let method = method.trim();
    if let Some(hex_part) = method.strip_prefix("0x") {
        let bytes = hex::decode(hex_part)
            .map_err(|e| DelegationError::InvalidMethod(format!("{}: {}", method, e)))?;
        return <[u8; 4]>::try_from(bytes.as_slice()).map_err(|_| {
            DelegationError::InvalidMethod(format!("{}: selector must be 4 bytes", method))
        });
    }

    let signature: String = method.chars().filter(|c| !c.is_whitespace()).collect();
    let well_formed = signature
        .find('(')
        .is_some_and(|open| open > 0 && signature.ends_with(')'));
    if !well_formed {
        return Err(DelegationError::InvalidMethod(format!(
            "{}: expected a selector or a signature like transfer(address,uint256)",
            method
        )));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&keccak256(signature.as_bytes())[0..4]);
    Ok(selector)
}

/// Collects restrictions and binds them to the enforcers of an environment.
#[derive(Debug, Clone)]
pub struct CaveatBuilder<'a> {
    environment: &'a DelegationEnvironment,
    restrictions: Vec<Restriction>,
}

impl<'a> CaveatBuilder<'a> {
    pub fn new(environment: &'a DelegationEnvironment) -> Self {
        Self {
            environment,
            restrictions: Vec::new(),
        }
    }

    /// Skipped when `targets` is empty.
    pub fn allowed_targets(mut self, targets: &[Address]) -> Self {
        if !targets.is_empty() {
            self.restrictions.push(Restriction::AllowedTargets {
                targets: targets.to_vec(),
            });
        }
        self
    }

    /// Skipped when `methods` is empty.
    pub fn allowed_methods(mut self, methods: &[String]) -> Result<Self, DelegationError> {
        if !methods.is_empty() {
            let selectors = methods
                .iter()
                .map(|m| method_selector(m))
                .collect::<Result<Vec<_>, _>>()?;
            self.restrictions
                .push(Restriction::AllowedMethods { selectors });
        }
        Ok(self)
    }

    /// Skipped when the window has neither bound.
    pub fn time_window(mut self, window: TimeWindow) -> Result<Self, DelegationError> {
        if let Some((after, before)) = window.thresholds()? {
            self.restrictions
                .push(Restriction::Timestamp { after, before });
        }
        Ok(self)
    }

    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    /// Binds every restriction to its enforcer. An empty result is valid.
    pub fn build(self) -> Vec<Caveat> {
        self.restrictions
            .iter()
            .map(|r| encode(self.environment, r))
            .collect()
    }
}

fn encode(environment: &DelegationEnvironment, restriction: &Restriction) -> Caveat {
    let (enforcer, terms) = match restriction {
        Restriction::AllowedTargets { targets } => (
            environment.allowed_targets_enforcer,
            targets
                .iter()
                .flat_map(|a| a.as_bytes().to_vec())
                .collect::<Vec<u8>>(),
        ),
        Restriction::AllowedMethods { selectors } => (
            environment.allowed_methods_enforcer,
            selectors.concat(),
        ),
        Restriction::Timestamp { after, before } => {
            // Two packed uint128 thresholds.
            let mut terms = Vec::with_capacity(32);
            terms.extend_from_slice(&u128::from(*after).to_be_bytes());
            terms.extend_from_slice(&u128::from(*before).to_be_bytes());
            (environment.timestamp_enforcer, terms)
        }
    };
    Caveat {
        enforcer,
        terms: Bytes::from(terms),
        args: Bytes::default(),
    }
}
