// src/delegation/model.rs

use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use ethers_core::utils::keccak256;
use serde::{Deserialize, Serialize};

use super::caveats::Caveat;

/// Authority of a delegation granted directly by the delegator, not
/// re-delegated from a parent.
pub const ROOT_AUTHORITY: H256 = H256([0xff; 32]);

const DOMAIN_NAME: &str = "DelegationManager";
const DOMAIN_VERSION: &str = "1";
const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const CAVEAT_TYPE: &str = "Caveat(address enforcer,bytes terms)";
const DELEGATION_TYPE: &str = "Delegation(address delegate,address delegator,bytes32 authority,Caveat[] caveats,uint256 salt)Caveat(address enforcer,bytes terms)";

/// A delegation that has not been signed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub delegate: Address,
    pub delegator: Address,
    pub authority: H256,
    pub caveats: Vec<Caveat>,
    pub salt: U256,
}

impl Delegation {
    /// Root delegation from `delegator` to `delegate`.
    pub fn new(delegator: Address, delegate: Address, caveats: Vec<Caveat>) -> Self {
        Self {
            delegate,
            delegator,
            authority: ROOT_AUTHORITY,
            caveats,
            salt: U256::zero(),
        }
    }

    pub fn struct_hash(&self) -> H256 {
        let caveat_hashes: Vec<u8> = self
            .caveats
            .iter()
            .flat_map(|c| caveat_hash(c).to_fixed_bytes())
            .collect();

        H256(keccak256(encode(&[
            Token::FixedBytes(keccak256(DELEGATION_TYPE).to_vec()),
            Token::Address(self.delegate),
            Token::Address(self.delegator),
            Token::FixedBytes(self.authority.as_bytes().to_vec()),
            Token::FixedBytes(keccak256(caveat_hashes).to_vec()),
            Token::Uint(self.salt),
        ])))
    }

    /// EIP-712 digest under the given DelegationManager deployment.
    pub fn signing_hash(&self, chain_id: u64, delegation_manager: Address) -> H256 {
        let domain = domain_separator(chain_id, delegation_manager);
        let mut payload = Vec::with_capacity(66);
        payload.extend_from_slice(&[0x19, 0x01]);
        payload.extend_from_slice(domain.as_bytes());
        payload.extend_from_slice(self.struct_hash().as_bytes());
        H256(keccak256(payload))
    }
}

/// A delegation together with the delegator's signature.
///
/// Only produced by signing, and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDelegation {
    #[serde(flatten)]
    delegation: Delegation,
    signature: Bytes,
}

impl SignedDelegation {
    pub(super) fn new(delegation: Delegation, signature: Bytes) -> Self {
        Self {
            delegation,
            signature,
        }
    }

    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }
}

fn caveat_hash(caveat: &Caveat) -> H256 {
    H256(keccak256(encode(&[
        Token::FixedBytes(keccak256(CAVEAT_TYPE).to_vec()),
        Token::Address(caveat.enforcer),
        Token::FixedBytes(keccak256(&caveat.terms).to_vec()),
    ])))
}

fn domain_separator(chain_id: u64, verifying_contract: Address) -> H256 {
    H256(keccak256(encode(&[
        Token::FixedBytes(keccak256(EIP712_DOMAIN_TYPE).to_vec()),
        Token::FixedBytes(keccak256(DOMAIN_NAME).to_vec()),
        Token::FixedBytes(keccak256(DOMAIN_VERSION).to_vec()),
        Token::Uint(U256::from(chain_id)),
        Token::Address(verifying_contract),
    ])))
}
