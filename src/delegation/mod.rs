//! Scoped, time-bounded permission grants from the local wallet to a 1Shot
//! custodial wallet.
//!
//! The local signing identity is wrapped as a stateless EIP-7702 smart
//! account, a delegation restricted by caveats is built and signed with it,
//! and the signed delegation is stored with 1Shot against the receiving
//! wallet.

pub mod account;
pub mod caveats;
pub mod environment;
pub mod model;

pub use account::SmartAccount;
pub use caveats::{Caveat, CaveatBuilder, TimeWindow};
pub use environment::DelegationEnvironment;
pub use model::{Delegation, SignedDelegation};

use ethers::utils::to_checksum;
use ethers_core::types::Address;
use tracing::info;
use uuid::Uuid;

use crate::blockchain::LocalSigner;
use crate::error::{DelegationError, OneShotError};
use crate::oneshot::models::{CreateDelegationRequest, DelegationRecord};
use crate::oneshot::ExecutionService;

/// What the delegate may do, and when.
#[derive(Debug, Clone, Default)]
pub struct DelegationRequest {
    pub wallet_id: Uuid,
    pub contract_addresses: Vec<Address>,
    /// Selectors (`0xa9059cbb`) or signatures (`transfer(address,uint256)`).
    pub methods: Vec<String>,
    pub window: TimeWindow,
}

/// Grants `request.wallet_id` a scoped delegation from the local wallet and
/// stores it with 1Shot.
///
/// Caveats are built before anything touches the network, so a malformed
/// request never reaches the API. Nothing is persisted unless signing
/// succeeded.
pub async fn delegate_to_wallet(
    service: &dyn ExecutionService,
    signer: Option<&dyn LocalSigner>,
    environment: &DelegationEnvironment,
    request: &DelegationRequest,
) -> Result<DelegationRecord, DelegationError> {
    let caveats = CaveatBuilder::new(environment)
        .allowed_targets(&request.contract_addresses)
        .allowed_methods(&request.methods)?
        .time_window(request.window)?
        .build();

    let account = SmartAccount::stateless_7702(signer, environment)?;

    let wallet = service
        .get_wallet(request.wallet_id, false)
        .await
        .map_err(|e| DelegationError::WalletNotFound {
            wallet_id: request.wallet_id,
            reason: e.to_string(),
        })?;

    let delegation = Delegation::new(account.address(), wallet.account_address, caveats);
    let signed = account.sign_delegation(delegation).await?;

    let delegation_data = serde_json::to_string(&signed)
        .map_err(|e| DelegationError::RemoteStoreError(OneShotError::Decode(e)))?;
    let record = service
        .create_delegation(
            request.wallet_id,
            &CreateDelegationRequest {
                delegation_data,
                start_time: request.window.start,
                end_time: request.window.end,
                contract_addresses: request
                    .contract_addresses
                    .iter()
                    .map(|a| to_checksum(a, None))
                    .collect(),
            },
        )
        .await
        .map_err(DelegationError::RemoteStoreError)?;

    info!(
        "Stored delegation {} from {:?} to wallet {} ({:?})",
        record.id,
        account.address(),
        request.wallet_id,
        wallet.account_address
    );
    Ok(record)
}
