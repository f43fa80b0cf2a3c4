// src/actions/registry.rs

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::handlers::{self, Handler};
use super::{schemas, ActionContext, ActionOutcome};

/// One registered capability.
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    handler: Handler,
}

impl ActionSpec {
    fn new(name: &'static str, description: &'static str, input_schema: Value, handler: Handler) -> Self {
        Self {
            name,
            description,
            input_schema,
            handler,
        }
    }

    /// Tool descriptor in the shape MCP hosts expect.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

pub struct ActionRegistry {
    actions: Vec<ActionSpec>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        let actions = vec![
            ActionSpec::new(
                "list-chains",
                "Returns a paged list of the chains supported by 1Shot API. \
                 Defaults to page 1; use a page size of 100 to list every chain.",
                schemas::list_chains(),
                handlers::list_chains,
            ),
            ActionSpec::new(
                "list-wallets",
                "Returns a filtered, paged list of the Wallets in the user's 1Shot business. \
                 Wallets are custodial EOAs controlled by 1Shot and every Contract Method is \
                 associated with one. Only filter by chainId unless you know the other values. \
                 If more pages exist and you have not found what you need, call again.",
                schemas::list_wallets(),
                handlers::list_wallets,
            ),
            ActionSpec::new(
                "list-contract-methods",
                "Returns a filtered, paged list of the Contract Methods in the user's 1Shot \
                 business. Contract Methods are functions on a smart contract that 1Shot can \
                 execute or read. Only filter by chainId or contractAddress unless you know the \
                 other values. If more pages exist and you have not found what you need, call again.",
                schemas::list_contract_methods(),
                handlers::list_contract_methods,
            ),
            ActionSpec::new(
                "list-delegations",
                "Returns a paged list of the Delegations held by a 1Shot Wallet. A Delegation \
                 lets the 1Shot Wallet use the local wallet's funds within its caveats.",
                schemas::list_delegations(),
                handlers::list_delegations,
            ),
            ActionSpec::new(
                "get-wallet",
                "Returns a single 1Shot Wallet, optionally with its native token balance.",
                schemas::get_wallet(),
                handlers::get_wallet,
            ),
            ActionSpec::new(
                "get-transaction",
                "Returns the current state of a 1Shot Transaction. Use it to follow up on an \
                 execution that was still running when polling gave up.",
                schemas::get_transaction(),
                handlers::get_transaction,
            ),
            ActionSpec::new(
                "search-prompts",
                "Searches 1Shot Prompts for smart contracts that fulfil the user's request. A \
                 Prompt describes a contract, which of its methods matter and how to use them. \
                 After choosing a Prompt, call assure-contract-methods.",
                schemas::search_prompts(),
                handlers::search_prompts,
            ),
            ActionSpec::new(
                "assure-contract-methods",
                "Given a Prompt id, makes sure every Contract Method of the Prompt exists in the \
                 business, creating missing ones, and returns them. Calling it again returns the \
                 same methods. There is no need to call list-contract-methods afterwards, but \
                 call list-wallets to find the walletId to use.",
                schemas::assure_contract_methods(),
                handlers::assure_contract_methods,
            ),
            ActionSpec::new(
                "execute-contract-method-with-local-wallet",
                "Submits a transaction signed by the local wallet. 1Shot encodes and checks the \
                 parameters but does not execute the call. Only for nonpayable or payable \
                 methods. Do not pass authorizationList, and only pass value to payable methods.",
                schemas::execute_with_local_wallet(),
                handlers::execute_with_local_wallet,
            ),
            ActionSpec::new(
                "execute-contract-method-with-1shot-wallet",
                "Executes a Contract Method through its 1Shot Wallet and waits until the \
                 Transaction is Completed or Failed, returning the final Transaction. Only for \
                 nonpayable or payable methods. Always provide a memo; leave the other optional \
                 parameters out unless they are needed.",
                schemas::execute_with_remote_wallet(),
                handlers::execute_with_remote_wallet,
            ),
            ActionSpec::new(
                "read-contract-method",
                "Reads the value of a view or pure Contract Method from the blockchain.",
                schemas::read_contract_method(),
                handlers::read_contract_method,
            ),
            ActionSpec::new(
                "delegate-to-1shot-wallet",
                "Has the local wallet sign an ERC-7710 Delegation to a 1Shot Wallet, letting \
                 it execute Contract Methods with the local wallet's funds without access to \
                 its private key. Optionally restrict the contracts, methods and time window.",
                schemas::delegate_to_wallet(),
                handlers::delegate_to_wallet,
            ),
        ];
        Self { actions }
    }

    /// Looks up an action; `snake_case` spellings are accepted.
    pub fn get(&self, name: &str) -> Option<&ActionSpec> {
        let name = name.replace('_', "-");
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn descriptors(&self) -> Vec<Value> {
        self.actions.iter().map(ActionSpec::descriptor).collect()
    }

    /// Runs an action. `None` when no action has that name.
    pub async fn invoke(
        &self,
        ctx: Arc<ActionContext>,
        name: &str,
        args: Value,
    ) -> Option<ActionOutcome> {
        let spec = self.get(name)?;
        info!("Dispatching action {}", spec.name);

        let outcome = ActionOutcome::from((spec.handler)(ctx, args).await);
        match (&outcome.error, &outcome.error_kind) {
            (Some(error), Some(kind)) => warn!("Action {} failed ({:?}): {}", spec.name, kind, error),
            _ => info!("Action {} succeeded", spec.name),
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::oneshot::models::{StateMutability, TransactionStatus};
    use crate::testing::{contract_method, transaction, FakeExecutionService};
    use serde_json::json;
    use uuid::Uuid;

    fn context(service: FakeExecutionService) -> Arc<ActionContext> {
        Arc::new(ActionContext::new(&Config::default(), Arc::new(service), None))
    }

    #[test]
    fn registers_every_action_once() {
        let registry = ActionRegistry::new();
        assert_eq!(registry.len(), 12);
        let mut names: Vec<_> = registry.iter().map(|a| a.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
        assert!(registry.get("search_prompts").is_some());
        assert!(registry.get("transfer-everything").is_none());
    }

    #[tokio::test]
    async fn unknown_action_is_none() {
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new());
        assert!(registry.invoke(ctx, "nope", json!({})).await.is_none());
    }

    #[tokio::test]
    async fn empty_prompt_search_succeeds_with_zero_count() {
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new());

        let outcome = registry
            .invoke(ctx, "search-prompts", json!({ "query": "swap on uniswap" }))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": true, "count": 0, "result": [] })
        );
    }

    #[tokio::test]
    async fn repeated_assure_sends_the_same_request_and_passes_methods_through() {
        use crate::oneshot::OneShotClient;
        use mockito::{mock, Matcher};

        let business_id = Uuid::new_v4();
        let prompt_id = Uuid::new_v4();
        let contract = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";
        let methods = json!([
            { "id": Uuid::new_v4(), "chainId": 84532, "contractAddress": contract,
              "functionName": "transfer", "stateMutability": "nonpayable" },
            { "id": Uuid::new_v4(), "chainId": 84532, "contractAddress": contract,
              "functionName": "balanceOf", "stateMutability": "view" }
        ]);

        let _token = mock("POST", "/assure/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-assure","expires_in":3600}"#)
            .create();
        let assure = mock(
            "POST",
            format!("/assure/business/{}/methods/prompt", business_id).as_str(),
        )
        .match_body(Matcher::Json(json!({
            "chainId": 84532,
            "contractAddress": contract,
            "promptId": prompt_id,
        })))
        .with_status(200)
        .with_body(methods.to_string())
        .expect(2)
        .create();

        let config = Config {
            base_url: format!("{}/assure", mockito::server_url()),
            business_id,
            ..Default::default()
        };
        let service = Arc::new(OneShotClient::from_config(&config));
        let ctx = Arc::new(ActionContext::new(&config, service, None));
        let registry = ActionRegistry::new();
        let args = json!({ "chainId": 84532, "contractAddress": contract, "promptId": prompt_id });

        let first = registry
            .invoke(ctx.clone(), "assure-contract-methods", args.clone())
            .await
            .unwrap();
        let second = registry
            .invoke(ctx, "assure-contract-methods", args)
            .await
            .unwrap();

        assert!(first.success);
        assert_eq!(first.count, Some(2));
        assert_eq!(first.result, second.result);
        assert_eq!(first.result.unwrap()[1]["functionName"], json!("balanceOf"));
        assure.assert();
    }

    #[tokio::test]
    async fn unknown_argument_keys_are_ignored() {
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new());

        let outcome = registry
            .invoke(
                ctx,
                "search-prompts",
                json!({ "query": "swap", "reason": "the user asked for a swap" }),
            )
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn invalid_arguments_become_a_failed_envelope() {
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new());

        let outcome = registry
            .invoke(ctx, "get-wallet", json!({ "walletId": 42 }))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(crate::error::ErrorKind::Validation));
    }

    #[tokio::test]
    async fn local_execution_without_key_reports_unavailable_identity() {
        let method = contract_method(StateMutability::Nonpayable);
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new().with_method(method.clone()));

        let outcome = registry
            .invoke(
                ctx,
                "execute-contract-method-with-local-wallet",
                json!({ "contractMethodId": method.id, "params": {} }),
            )
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.error_kind,
            Some(crate::error::ErrorKind::SigningIdentityUnavailable)
        );
    }

    #[tokio::test]
    async fn delegation_without_key_is_enveloped() {
        let registry = ActionRegistry::new();
        let ctx = context(FakeExecutionService::new());

        let outcome = registry
            .invoke(ctx, "delegate-to-1shot-wallet", json!({ "walletId": Uuid::new_v4() }))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.error_kind,
            Some(crate::error::ErrorKind::SigningIdentityUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn remote_execution_reports_terminal_transaction() {
        let method = contract_method(StateMutability::Nonpayable);
        let id = Uuid::new_v4();
        let service = FakeExecutionService::new()
            .with_method(method.clone())
            .with_execute_result(transaction(id, TransactionStatus::Submitted))
            .with_transaction_script(vec![transaction(id, TransactionStatus::Completed)]);
        let registry = ActionRegistry::new();
        let ctx = context(service);

        let outcome = registry
            .invoke(
                ctx,
                "execute-contract-method-with-1shot-wallet",
                json!({
                    "contractMethodId": method.id,
                    "params": { "to": "0x0000000000000000000000000000000000000001", "amount": "1" },
                    "memo": "test payment"
                }),
            )
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.result.unwrap()["status"], json!("Completed"));
    }
}
