//! In-memory stand-ins for the 1Shot API and the local signer.

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers_core::types::{Address, Signature, TransactionReceipt, H256, U64};
use ethers_signers::{LocalWallet, Signer};
use serde_json::{json, Value};
use tokio::time::Instant;
use uuid::Uuid;

use crate::actions::ActionContext;
use crate::blockchain::{CallRequest, LocalSigner, NetworkInfo, SignerError};
use crate::config::Config;
use crate::error::OneShotError;
use crate::oneshot::models::*;
use crate::oneshot::ExecutionService;
use crate::session::AgentSession;
use crate::AppState;

/// Application state over `service`, without a local wallet.
pub fn test_state(service: FakeExecutionService) -> AppState {
    let config = Config::default();
    let context = ActionContext::new(&config, Arc::new(service), None);
    AppState {
        config: Arc::new(config),
        session: Arc::new(AgentSession::new(Arc::new(context))),
    }
}

/// First hardhat development account.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn contract_method(state_mutability: StateMutability) -> ContractMethod {
    ContractMethod {
        id: Uuid::new_v4(),
        chain_id: 84532,
        contract_address: Address::repeat_byte(0x33),
        function_name: "transfer".into(),
        state_mutability,
        name: Some("Transfer".into()),
        description: None,
        wallet_id: None,
        prompt_id: None,
        inputs: vec![],
        outputs: vec![],
    }
}

pub fn transaction(id: Uuid, status: TransactionStatus) -> Transaction {
    Transaction {
        id,
        status,
        contract_method_id: None,
        transaction_hash: None,
        chain_id: Some(84532),
        function_name: None,
        memo: None,
        completed_timestamp: None,
    }
}

pub fn wallet(account_address: Address) -> Wallet {
    Wallet {
        id: Uuid::new_v4(),
        account_address,
        chain_id: 84532,
        business_id: None,
        name: Some("escrow".into()),
        description: None,
        account_balance_details: None,
    }
}

pub fn prompt(name: &str, functions: &[&str]) -> FullPrompt {
    FullPrompt {
        id: Uuid::new_v4(),
        name: name.into(),
        description: Some(format!("{} contract", name)),
        contract_address: Some(format!("{:?}", Address::repeat_byte(0x44))),
        chain_id: Some(84532),
        tags: vec![],
        functions: functions.iter().map(|f| json!({ "name": f })).collect(),
    }
}

fn not_found(what: &str, id: Uuid) -> OneShotError {
    OneShotError::Api {
        status: 404,
        body: format!("{} {} not found", what, id),
    }
}

fn page<T: Clone>(items: &[T]) -> PagedResponse<T> {
    PagedResponse {
        response: items.to_vec(),
        page: 1,
        page_size: 25,
        total_results: items.len() as u64,
    }
}

#[derive(Default)]
struct State {
    wallets: Vec<Wallet>,
    methods: Vec<ContractMethod>,
    prompts: Vec<FullPrompt>,
    assured: HashMap<Uuid, Vec<ContractMethod>>,
    execute_result: Option<Transaction>,
    transaction_script: VecDeque<Transaction>,
    read_value: Value,
    encoded: String,
    delegations: Vec<(Uuid, CreateDelegationRequest)>,
    fail_store: bool,
    calls: HashMap<&'static str, usize>,
    poll_times: Vec<Instant>,
}

/// Scriptable [`ExecutionService`].
#[derive(Default)]
pub struct FakeExecutionService {
    state: Mutex<State>,
}

impl FakeExecutionService {
    pub fn new() -> Self {
        let service = Self::default();
        service.state.lock().unwrap().encoded = "0x".into();
        service
    }

    pub fn with_wallet(self, wallet: Wallet) -> Self {
        self.state.lock().unwrap().wallets.push(wallet);
        self
    }

    pub fn with_method(self, method: ContractMethod) -> Self {
        self.state.lock().unwrap().methods.push(method);
        self
    }

    pub fn with_prompt(self, prompt: FullPrompt) -> Self {
        self.state.lock().unwrap().prompts.push(prompt);
        self
    }

    pub fn with_execute_result(self, tx: Transaction) -> Self {
        self.state.lock().unwrap().execute_result = Some(tx);
        self
    }

    /// Statuses returned by successive `get_transaction` calls. Once the
    /// script runs out the transaction stays `Pending`.
    pub fn with_transaction_script(self, script: Vec<Transaction>) -> Self {
        self.state.lock().unwrap().transaction_script = script.into();
        self
    }

    pub fn with_read_value(self, value: Value) -> Self {
        self.state.lock().unwrap().read_value = value;
        self
    }

    pub fn with_encoded(self, data: &str) -> Self {
        self.state.lock().unwrap().encoded = data.into();
        self
    }

    pub fn failing_store(self) -> Self {
        self.state.lock().unwrap().fail_store = true;
        self
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.state.lock().unwrap().calls.get(name).copied().unwrap_or(0)
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().poll_times.clone()
    }

    pub fn stored_delegations(&self) -> Vec<CreateDelegationRequest> {
        let state = self.state.lock().unwrap();
        state.delegations.iter().map(|(_, r)| r.clone()).collect()
    }

    fn record(&self, name: &'static str) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(name).or_default() += 1;
        state
    }
}

#[async_trait]
impl ExecutionService for FakeExecutionService {
    async fn list_chains(
        &self,
        _params: &ListChainsParams,
    ) -> Result<PagedResponse<ChainInfo>, OneShotError> {
        self.record("list_chains");
        Ok(page::<ChainInfo>(&[]))
    }

    async fn list_wallets(
        &self,
        _business_id: Uuid,
        params: &ListWalletsParams,
    ) -> Result<PagedResponse<Wallet>, OneShotError> {
        let state = self.record("list_wallets");
        let wallets: Vec<Wallet> = state
            .wallets
            .iter()
            .filter(|w| params.chain_id.map_or(true, |c| c == w.chain_id))
            .cloned()
            .collect();
        Ok(page(&wallets))
    }

    async fn get_wallet(
        &self,
        wallet_id: Uuid,
        _include_balances: bool,
    ) -> Result<Wallet, OneShotError> {
        let state = self.record("get_wallet");
        state
            .wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .cloned()
            .ok_or_else(|| not_found("wallet", wallet_id))
    }

    async fn list_delegations(
        &self,
        wallet_id: Uuid,
        _params: &PageParams,
    ) -> Result<PagedResponse<DelegationRecord>, OneShotError> {
        let state = self.record("list_delegations");
        let records: Vec<DelegationRecord> = state
            .delegations
            .iter()
            .filter(|(id, _)| *id == wallet_id)
            .map(|(id, r)| stored_record(*id, r))
            .collect();
        Ok(page(&records))
    }

    async fn create_delegation(
        &self,
        wallet_id: Uuid,
        request: &CreateDelegationRequest,
    ) -> Result<DelegationRecord, OneShotError> {
        let mut state = self.record("create_delegation");
        if state.fail_store {
            return Err(OneShotError::Api {
                status: 500,
                body: "delegation store unavailable".into(),
            });
        }
        state.delegations.push((wallet_id, request.clone()));
        Ok(stored_record(wallet_id, request))
    }

    async fn list_contract_methods(
        &self,
        _business_id: Uuid,
        params: &ListContractMethodsParams,
    ) -> Result<PagedResponse<ContractMethod>, OneShotError> {
        let state = self.record("list_contract_methods");
        let methods: Vec<ContractMethod> = state
            .methods
            .iter()
            .chain(state.assured.values().flatten())
            .filter(|m| params.prompt_id.map_or(true, |p| m.prompt_id == Some(p)))
            .cloned()
            .collect();
        Ok(page(&methods))
    }

    async fn get_contract_method(&self, method_id: Uuid) -> Result<ContractMethod, OneShotError> {
        let state = self.record("get_contract_method");
        state
            .methods
            .iter()
            .chain(state.assured.values().flatten())
            .find(|m| m.id == method_id)
            .cloned()
            .ok_or_else(|| not_found("contract method", method_id))
    }

    async fn search_prompts(&self, query: &str) -> Result<Vec<FullPrompt>, OneShotError> {
        let state = self.record("search_prompts");
        let query = query.to_lowercase();
        Ok(state
            .prompts
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            })
            .cloned()
            .collect())
    }

    async fn assure_contract_methods(
        &self,
        _business_id: Uuid,
        request: &AssureContractMethodsRequest,
    ) -> Result<Vec<ContractMethod>, OneShotError> {
        let mut state = self.record("assure_contract_methods");
        if let Some(existing) = state.assured.get(&request.prompt_id) {
            return Ok(existing.clone());
        }
        let prompt = state
            .prompts
            .iter()
            .find(|p| p.id == request.prompt_id)
            .cloned()
            .ok_or_else(|| not_found("prompt", request.prompt_id))?;
        let contract_address = Address::from_str(&request.contract_address)
            .map_err(|e| OneShotError::Api {
                status: 400,
                body: e.to_string(),
            })?;

        let methods: Vec<ContractMethod> = prompt
            .functions
            .iter()
            .map(|f| ContractMethod {
                id: Uuid::new_v4(),
                chain_id: request.chain_id,
                contract_address,
                function_name: f["name"].as_str().unwrap_or("unknown").to_string(),
                state_mutability: StateMutability::Nonpayable,
                name: None,
                description: None,
                wallet_id: request.wallet_id,
                prompt_id: Some(prompt.id),
                inputs: vec![],
                outputs: vec![],
            })
            .collect();
        state.assured.insert(request.prompt_id, methods.clone());
        Ok(methods)
    }

    async fn encode(
        &self,
        _method_id: Uuid,
        _params: &ContractMethodParams,
        _options: &EncodeOptions,
    ) -> Result<EncodeResult, OneShotError> {
        let state = self.record("encode");
        Ok(EncodeResult {
            data: state.encoded.clone(),
        })
    }

    async fn execute(
        &self,
        method_id: Uuid,
        _params: &ContractMethodParams,
        _options: &ExecuteOptions,
    ) -> Result<Transaction, OneShotError> {
        let state = self.record("execute");
        let mut tx = state
            .execute_result
            .clone()
            .unwrap_or_else(|| transaction(Uuid::new_v4(), TransactionStatus::Submitted));
        tx.contract_method_id = Some(method_id);
        Ok(tx)
    }

    async fn read(
        &self,
        _method_id: Uuid,
        _params: &ContractMethodParams,
    ) -> Result<Value, OneShotError> {
        Ok(self.record("read").read_value.clone())
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, OneShotError> {
        let mut state = self.record("get_transaction");
        state.poll_times.push(Instant::now());
        Ok(state
            .transaction_script
            .pop_front()
            .unwrap_or_else(|| transaction(transaction_id, TransactionStatus::Pending)))
    }
}

fn stored_record(wallet_id: Uuid, request: &CreateDelegationRequest) -> DelegationRecord {
    DelegationRecord {
        id: Uuid::new_v4(),
        wallet_id,
        delegation_data: request.delegation_data.clone(),
        start_time: request.start_time,
        end_time: request.end_time,
        contract_addresses: request.contract_addresses.clone(),
        methods: vec![],
        created: None,
    }
}

/// [`LocalSigner`] that signs for real but never touches a node.
pub struct FakeSigner {
    wallet: LocalWallet,
    network: NetworkInfo,
    reject: bool,
    sent: Mutex<Vec<CallRequest>>,
}

impl FakeSigner {
    pub const TX_HASH: H256 = H256([0x42; 32]);

    pub fn new() -> Self {
        let network = NetworkInfo {
            network_id: "base-sepolia".into(),
            chain_id: 84532,
        };
        let wallet = LocalWallet::from_str(TEST_PRIVATE_KEY.trim_start_matches("0x"))
            .unwrap()
            .with_chain_id(network.chain_id);
        Self {
            wallet,
            network,
            reject: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A signer whose every signing request is declined.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<CallRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for FakeSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalSigner for FakeSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn network(&self) -> &NetworkInfo {
        &self.network
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<H256, SignerError> {
        if self.reject {
            return Err(SignerError::Rejected("declined by test signer".into()));
        }
        self.sent.lock().unwrap().push(request);
        Ok(Self::TX_HASH)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, SignerError> {
        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(U64::from(1)),
            ..Default::default()
        })
    }

    async fn sign_hash(&self, hash: H256) -> Result<Signature, SignerError> {
        if self.reject {
            return Err(SignerError::Rejected("declined by test signer".into()));
        }
        self.wallet
            .sign_hash(hash)
            .map_err(|e| SignerError::Rejected(e.to_string()))
    }
}
