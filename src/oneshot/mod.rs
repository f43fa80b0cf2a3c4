//! # 1Shot API facade
//!
//! Typed access to the remote transaction-execution service: chains,
//! wallets, contract methods, transactions and delegation records.
//! Everything above this module talks to the service through the
//! [`ExecutionService`] trait so it can be replaced in tests.

pub mod client;
pub mod models;

pub use client::OneShotClient;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::OneShotError;
use models::*;

#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn list_chains(
        &self,
        params: &ListChainsParams,
    ) -> Result<PagedResponse<ChainInfo>, OneShotError>;

    async fn list_wallets(
        &self,
        business_id: Uuid,
        params: &ListWalletsParams,
    ) -> Result<PagedResponse<Wallet>, OneShotError>;

    async fn get_wallet(&self, wallet_id: Uuid, include_balances: bool)
        -> Result<Wallet, OneShotError>;

    async fn list_delegations(
        &self,
        wallet_id: Uuid,
        params: &PageParams,
    ) -> Result<PagedResponse<DelegationRecord>, OneShotError>;

    async fn create_delegation(
        &self,
        wallet_id: Uuid,
        request: &CreateDelegationRequest,
    ) -> Result<DelegationRecord, OneShotError>;

    async fn list_contract_methods(
        &self,
        business_id: Uuid,
        params: &ListContractMethodsParams,
    ) -> Result<PagedResponse<ContractMethod>, OneShotError>;

    async fn get_contract_method(&self, method_id: Uuid) -> Result<ContractMethod, OneShotError>;

    async fn search_prompts(&self, query: &str) -> Result<Vec<FullPrompt>, OneShotError>;

    /// Idempotent upsert of every contract method described by a prompt.
    async fn assure_contract_methods(
        &self,
        business_id: Uuid,
        request: &AssureContractMethodsRequest,
    ) -> Result<Vec<ContractMethod>, OneShotError>;

    async fn encode(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
        options: &EncodeOptions,
    ) -> Result<EncodeResult, OneShotError>;

    async fn execute(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
        options: &ExecuteOptions,
    ) -> Result<Transaction, OneShotError>;

    async fn read(
        &self,
        method_id: Uuid,
        params: &ContractMethodParams,
    ) -> Result<Value, OneShotError>;

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, OneShotError>;
}
