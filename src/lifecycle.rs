//! Drives contract-method calls to a terminal outcome.
//!
//! Two write paths exist. The direct-signing path encodes the call through
//! 1Shot, signs and submits it with the local wallet and waits for the
//! receipt. The remote path asks 1Shot to execute the call with one of its
//! custodial wallets and then polls the resulting [`Transaction`] until it is
//! `Completed` or `Failed`. A `Failed` transaction is a successful outcome of
//! the poll; callers inspect its status.
//!
//! Reads never poll: one `read` round trip returns the decoded value.

use std::time::Duration;

use ethers_core::types::{Bytes, TransactionReceipt, U256};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::blockchain::{CallRequest, LocalSigner};
use crate::error::{ActionError, OneShotError};
use crate::oneshot::{
    models::{
        ContractMethod, ContractMethodParams, EncodeOptions, ExecuteOptions, StateMutability,
        Transaction,
    },
    ExecutionService,
};

/// Bounds for waiting on a remote transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two status checks.
    pub interval: Duration,
    /// Maximum number of status checks; `None` means unbounded.
    pub max_attempts: Option<u32>,
    /// Maximum total time spent waiting; `None` means unbounded.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: Some(150),
            deadline: None,
        }
    }
}

fn require_mutating(method: &ContractMethod) -> Result<(), ActionError> {
    if method.state_mutability.is_read_only() {
        return Err(ActionError::StateMutabilityMismatch {
            method_id: method.id,
            expected: "nonpayable or payable",
            actual: method.state_mutability,
        });
    }
    Ok(())
}

fn require_read_only(method: &ContractMethod) -> Result<(), ActionError> {
    if !method.state_mutability.is_read_only() {
        return Err(ActionError::StateMutabilityMismatch {
            method_id: method.id,
            expected: "view or pure",
            actual: method.state_mutability,
        });
    }
    Ok(())
}

/// Parses a native-token amount given in wei, decimal or 0x-hex.
pub fn parse_value(value: &str) -> Result<U256, ActionError> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(value).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| ActionError::Validation(format!("invalid value '{}': {}", value, e)))
}

fn check_value(method: &ContractMethod, value: Option<&str>) -> Result<Option<U256>, ActionError> {
    let Some(value) = value else {
        return Ok(None);
    };
    if method.state_mutability != StateMutability::Payable {
        return Err(ActionError::Validation(format!(
            "value is only accepted by payable methods; {} is {}",
            method.function_name, method.state_mutability
        )));
    }
    parse_value(value).map(Some)
}

/// Polls `tx` until it reaches a terminal status.
///
/// Waits `policy.interval` before every check. Gives up with
/// `PollingExhausted` once the attempt or time budget is spent, and with
/// `Cancelled` as soon as `cancel` fires.
pub async fn wait_for_terminal(
    service: &dyn ExecutionService,
    mut tx: Transaction,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Transaction, ActionError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;

    while !tx.status.is_terminal() {
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
        let out_of_time = policy
            .deadline
            .is_some_and(|deadline| started.elapsed() + policy.interval > deadline);
        if out_of_attempts || out_of_time {
            return Err(ActionError::PollingExhausted {
                transaction_id: tx.id,
                attempts,
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ActionError::Cancelled { transaction_id: tx.id });
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }

        attempts += 1;
        let next = service.get_transaction(tx.id).await?;
        if next.status != tx.status {
            info!(
                "Transaction {} moved {:?} -> {:?}",
                tx.id, tx.status, next.status
            );
        } else {
            debug!("Transaction {} still {:?} (poll {})", tx.id, tx.status, attempts);
        }
        tx = next;
    }

    Ok(tx)
}

/// Executes a contract method through a 1Shot custodial wallet and waits for
/// the transaction to finish.
pub async fn execute_with_remote_wallet(
    service: &dyn ExecutionService,
    method_id: Uuid,
    params: &ContractMethodParams,
    options: &ExecuteOptions,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Transaction, ActionError> {
    let method = service.get_contract_method(method_id).await?;
    require_mutating(&method)?;
    check_value(&method, options.value.as_deref())?;

    let tx = service.execute(method_id, params, options).await?;
    info!(
        "Submitted {} via 1Shot as transaction {} ({:?})",
        method.function_name, tx.id, tx.status
    );
    wait_for_terminal(service, tx, policy, cancel).await
}

/// Executes a contract method by signing and submitting it with the local
/// wallet. 1Shot only encodes the call data.
pub async fn execute_with_local_signer(
    service: &dyn ExecutionService,
    signer: &dyn LocalSigner,
    method_id: Uuid,
    params: &ContractMethodParams,
    options: &EncodeOptions,
) -> Result<TransactionReceipt, ActionError> {
    let method = service.get_contract_method(method_id).await?;
    require_mutating(&method)?;
    let value = check_value(&method, options.value.as_deref())?;

    let encoded = service.encode(method_id, params, options).await?;
    let data: Bytes = serde_json::from_value(Value::String(encoded.data))
        .map_err(OneShotError::Decode)?;

    let tx_hash = signer
        .send_transaction(CallRequest {
            to: method.contract_address,
            value,
            data,
        })
        .await?;
    info!(
        "Submitted {} from local wallet as {:?}",
        method.function_name, tx_hash
    );

    let receipt = signer.wait_for_receipt(tx_hash).await?;
    debug!("Receipt for {:?}: status {:?}", tx_hash, receipt.status);
    Ok(receipt)
}

/// Reads a `view` or `pure` contract method.
///
/// Two round trips: the method is fetched first so a mutating method is
/// rejected before `read` is called. Neither is a poll.
pub async fn read_contract_method(
    service: &dyn ExecutionService,
    method_id: Uuid,
    params: &ContractMethodParams,
) -> Result<Value, ActionError> {
    let method = service.get_contract_method(method_id).await?;
    require_read_only(&method)?;
    Ok(service.read(method_id, params).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oneshot::models::TransactionStatus;
    use crate::testing::{contract_method, transaction, FakeExecutionService, FakeSigner};
    use serde_json::json;

    fn params() -> ContractMethodParams {
        json!({ "to": "0x000000000000000000000000000000000000dEaD", "amount": "1" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_two_seconds_until_completed() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Submitted))
            .with_transaction_script(vec![
                transaction(id, TransactionStatus::Pending),
                transaction(id, TransactionStatus::Pending),
                transaction(id, TransactionStatus::Completed),
            ]);

        let started = Instant::now();
        let tx = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(tx.status, TransactionStatus::Completed);
        let polls = service.poll_times();
        assert_eq!(polls.len(), 3);
        assert_eq!(polls[0] - started, Duration::from_millis(2000));
        assert_eq!(polls[1] - polls[0], Duration::from_millis(2000));
        assert_eq!(polls[2] - polls[1], Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_transaction_is_a_terminal_result_not_an_error() {
        let method = contract_method(StateMutability::Payable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Submitted))
            .with_transaction_script(vec![transaction(id, TransactionStatus::Failed)]);

        let options = ExecuteOptions {
            value: Some("1000".into()),
            ..Default::default()
        };
        let tx = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &options,
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn already_terminal_transaction_is_not_polled() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Completed));

        let tx = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(service.poll_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Submitted));

        let policy = PollPolicy {
            max_attempts: Some(3),
            ..PollPolicy::default()
        };
        let err = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            ActionError::PollingExhausted {
                transaction_id,
                attempts,
            } => {
                assert_eq!(transaction_id, id);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.poll_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_total_wait() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Pending));

        let policy = PollPolicy {
            max_attempts: None,
            deadline: Some(Duration::from_secs(5)),
            ..PollPolicy::default()
        };
        let err = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::PollingExhausted { attempts: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Submitted));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &PollPolicy::default(),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Cancelled { transaction_id } if transaction_id == id));
        assert!(service.poll_times().is_empty());
    }

    #[tokio::test]
    async fn execute_rejects_read_only_methods_before_submitting() {
        let method = contract_method(StateMutability::View);
        let service = FakeExecutionService::new().with_method(method.clone());

        let err = execute_with_remote_wallet(
            &service,
            method.id,
            &params(),
            &ExecuteOptions::default(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::StateMutabilityMismatch { .. }));
        assert_eq!(service.call_count("execute"), 0);
    }

    #[tokio::test]
    async fn value_on_nonpayable_method_is_rejected() {
        let method = contract_method(StateMutability::Nonpayable);
        let service = FakeExecutionService::new().with_method(method.clone());
        let signer = FakeSigner::new();

        let options = EncodeOptions {
            value: Some("5".into()),
            ..Default::default()
        };
        let err = execute_with_local_signer(&service, &signer, method.id, &params(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
        assert!(signer.sent().is_empty());
    }

    #[tokio::test]
    async fn read_never_polls() {
        let method = contract_method(StateMutability::View);
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_read_value(json!("1000000"));

        let value = read_contract_method(&service, method.id, &params())
            .await
            .unwrap();
        assert_eq!(value, json!("1000000"));
        assert_eq!(service.call_count("get_contract_method"), 1);
        assert_eq!(service.call_count("read"), 1);
        assert_eq!(service.call_count("get_transaction"), 0);
    }

    #[tokio::test]
    async fn read_rejects_mutating_methods() {
        let method = contract_method(StateMutability::Payable);
        let service = FakeExecutionService::new().with_method(method.clone());

        let err = read_contract_method(&service, method.id, &params())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::StateMutabilityMismatch { actual: StateMutability::Payable, .. }
        ));
        assert_eq!(service.call_count("read"), 0);
    }

    #[tokio::test]
    async fn local_signer_sends_encoded_call_to_contract() {
        let method = contract_method(StateMutability::Payable);
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_encoded("0xa9059cbb0000");
        let signer = FakeSigner::new();

        let options = EncodeOptions {
            value: Some("0x10".into()),
            ..Default::default()
        };
        let receipt = execute_with_local_signer(&service, &signer, method.id, &params(), &options)
            .await
            .unwrap();

        let sent = signer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, method.contract_address);
        assert_eq!(sent[0].value, Some(U256::from(16)));
        assert_eq!(sent[0].data.to_vec(), vec![0xa9, 0x05, 0x9c, 0xbb, 0x00, 0x00]);
        assert_eq!(receipt.transaction_hash, FakeSigner::TX_HASH);
        assert_eq!(service.call_count("get_transaction"), 0);
    }

    #[test]
    fn value_parsing_accepts_decimal_and_hex() {
        assert_eq!(parse_value("1000").unwrap(), U256::from(1000));
        assert_eq!(parse_value("0xff").unwrap(), U256::from(255));
        assert!(matches!(parse_value("ten"), Err(ActionError::Validation(_))));
    }
}
