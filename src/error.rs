// src/error.rs

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::SignerError;
use crate::oneshot::models::StateMutability;

// --- Error types for the 1Shot API facade ---

#[derive(Error, Debug)]
pub enum OneShotError {
    #[error("request to 1Shot API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("1Shot API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to obtain 1Shot API token: {0}")]
    Auth(String),
    #[error("failed to decode 1Shot API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl OneShotError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OneShotError::Api { status: 404, .. })
    }
}

// --- Error types for delegation construction ---

#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("wallet {wallet_id} could not be resolved: {reason}")]
    WalletNotFound { wallet_id: Uuid, reason: String },
    #[error("local signing identity unavailable: {0}")]
    SigningIdentityUnavailable(String),
    #[error("delegation signature rejected: {0}")]
    SignatureRejected(String),
    #[error("failed to store delegation: {0}")]
    RemoteStoreError(#[source] OneShotError),
    #[error("invalid time window: start {start} must be before end {end}")]
    InvalidTimeWindow { start: u64, end: u64 },
    #[error("invalid method restriction {0}")]
    InvalidMethod(String),
}

// --- Error taxonomy surfaced by actions ---

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("invalid arguments: {0}")]
    Validation(String),
    #[error(transparent)]
    RemoteService(#[from] OneShotError),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("local signing identity unavailable: {0}")]
    SigningIdentityUnavailable(String),
    #[error("contract method {method_id} is {actual}, expected {expected}")]
    StateMutabilityMismatch {
        method_id: Uuid,
        expected: &'static str,
        actual: StateMutability,
    },
    #[error("transaction {transaction_id} did not reach a terminal status after {attempts} polls")]
    PollingExhausted { transaction_id: Uuid, attempts: u32 },
    #[error("polling of transaction {transaction_id} was cancelled")]
    Cancelled { transaction_id: Uuid },
    #[error(transparent)]
    Delegation(#[from] DelegationError),
}

/// Stable, machine-readable category of an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RemoteService,
    Signing,
    StateMutabilityMismatch,
    PollingExhausted,
    Cancelled,
    WalletNotFound,
    SigningIdentityUnavailable,
    SignatureRejected,
    RemoteStoreError,
    InvalidTimeWindow,
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Validation(_) => ErrorKind::Validation,
            ActionError::RemoteService(_) => ErrorKind::RemoteService,
            ActionError::Signing(_) => ErrorKind::Signing,
            ActionError::SigningIdentityUnavailable(_) => ErrorKind::SigningIdentityUnavailable,
            ActionError::StateMutabilityMismatch { .. } => ErrorKind::StateMutabilityMismatch,
            ActionError::PollingExhausted { .. } => ErrorKind::PollingExhausted,
            ActionError::Cancelled { .. } => ErrorKind::Cancelled,
            ActionError::Delegation(e) => match e {
                DelegationError::WalletNotFound { .. } => ErrorKind::WalletNotFound,
                DelegationError::SigningIdentityUnavailable(_) => {
                    ErrorKind::SigningIdentityUnavailable
                }
                DelegationError::SignatureRejected(_) => ErrorKind::SignatureRejected,
                DelegationError::RemoteStoreError(_) => ErrorKind::RemoteStoreError,
                DelegationError::InvalidTimeWindow { .. } => ErrorKind::InvalidTimeWindow,
                DelegationError::InvalidMethod(_) => ErrorKind::Validation,
            },
        }
    }
}

impl From<SignerError> for ActionError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Unavailable => ActionError::SigningIdentityUnavailable(err.to_string()),
            other => ActionError::Signing(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ActionError {
    fn from(err: validator::ValidationErrors) -> Self {
        ActionError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegation_failures_keep_their_own_kind() {
        let err = ActionError::from(DelegationError::SignatureRejected("declined".into()));
        assert_eq!(err.kind(), ErrorKind::SignatureRejected);

        let err = ActionError::from(DelegationError::RemoteStoreError(OneShotError::Api {
            status: 500,
            body: "boom".into(),
        }));
        assert_eq!(err.kind(), ErrorKind::RemoteStoreError);
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn missing_local_key_is_an_unavailable_identity() {
        assert_eq!(
            ActionError::from(SignerError::Unavailable).kind(),
            ErrorKind::SigningIdentityUnavailable
        );
        assert_eq!(
            ActionError::from(SignerError::Rejected("declined".into())).kind(),
            ErrorKind::Signing
        );
    }

    #[test]
    fn not_found_is_detected_from_status() {
        let err = OneShotError::Api { status: 404, body: String::new() };
        assert!(err.is_not_found());
        assert!(!OneShotError::Auth("nope".into()).is_not_found());
    }
}
