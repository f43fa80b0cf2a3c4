// src/delegation/account.rs

use ethers_core::types::{Address, Bytes};
use tracing::debug;

use super::environment::DelegationEnvironment;
use super::model::{Delegation, SignedDelegation};
use crate::blockchain::LocalSigner;
use crate::error::DelegationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implementation {
    /// EIP-7702 account whose code is delegated to a stateless implementation,
    /// so the smart account shares the EOA's address.
    Stateless7702,
}

/// Smart-account view of the local signing identity.
pub struct SmartAccount<'a> {
    signer: &'a dyn LocalSigner,
    environment: &'a DelegationEnvironment,
    implementation: Implementation,
}

impl<'a> SmartAccount<'a> {
    pub fn stateless_7702(
        signer: Option<&'a dyn LocalSigner>,
        environment: &'a DelegationEnvironment,
    ) -> Result<Self, DelegationError> {
        let signer = signer.ok_or_else(|| {
            DelegationError::SigningIdentityUnavailable(
                "no local private key is configured".to_string(),
            )
        })?;
        if environment.delegation_manager.is_zero() {
            return Err(DelegationError::SigningIdentityUnavailable(
                "no DelegationManager deployment is configured".to_string(),
            ));
        }
        Ok(Self {
            signer,
            environment,
            implementation: Implementation::Stateless7702,
        })
    }

    pub fn address(&self) -> Address {
        match self.implementation {
            Implementation::Stateless7702 => self.signer.address(),
        }
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    pub async fn sign_delegation(
        &self,
        delegation: Delegation,
    ) -> Result<SignedDelegation, DelegationError> {
        let chain_id = self.signer.network().chain_id;
        let digest = delegation.signing_hash(chain_id, self.environment.delegation_manager);
        debug!(?digest, chain_id, "Signing delegation");

        let signature = self
            .signer
            .sign_hash(digest)
            .await
            .map_err(|e| DelegationError::SignatureRejected(e.to_string()))?;
        Ok(SignedDelegation::new(
            delegation,
            Bytes::from(signature.to_vec()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::model::ROOT_AUTHORITY;
    use crate::testing::FakeSigner;
    use ethers_core::types::Signature;

    #[test]
    fn missing_signer_is_reported() {
        let env = DelegationEnvironment::default();
        let err = SmartAccount::stateless_7702(None, &env).err().unwrap();
        assert!(matches!(err, DelegationError::SigningIdentityUnavailable(_)));
    }

    #[test]
    fn stateless_account_shares_the_signer_address() {
        let signer = FakeSigner::new();
        let env = DelegationEnvironment::default();
        let account = SmartAccount::stateless_7702(Some(&signer), &env).unwrap();
        assert_eq!(account.implementation(), Implementation::Stateless7702);
        assert_eq!(account.address(), signer.address());
    }

    #[tokio::test]
    async fn delegation_signature_recovers_to_delegator() {
        let signer = FakeSigner::new();
        let env = DelegationEnvironment::default();
        let account = SmartAccount::stateless_7702(Some(&signer), &env).unwrap();

        let delegation = Delegation::new(account.address(), Address::repeat_byte(0x22), vec![]);
        let digest = delegation.signing_hash(84532, env.delegation_manager);
        let signed = account.sign_delegation(delegation).await.unwrap();

        let raw = signed.signature().to_vec();
        let signature = Signature::try_from(raw.as_slice()).unwrap();
        assert_eq!(signature.recover(digest).unwrap(), signer.address());
        assert_eq!(signed.delegation().authority, ROOT_AUTHORITY);
    }
}
