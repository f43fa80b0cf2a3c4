//! Process-wide agent session.
//!
//! The registry and the instructions handed to the agent host are built once
//! and reused by every request. [`reset`] drops the cached session so the
//! next [`get_or_init`] builds a fresh one.

use std::sync::{Arc, Mutex};

use ethers::utils::to_checksum;
use lazy_static::lazy_static;

use crate::actions::{ActionContext, ActionRegistry};

lazy_static! {
    static ref SESSION: Mutex<Option<Arc<AgentSession>>> = Mutex::new(None);
}

pub struct AgentSession {
    pub registry: ActionRegistry,
    pub context: Arc<ActionContext>,
    pub instructions: String,
}

impl AgentSession {
    pub fn new(context: Arc<ActionContext>) -> Self {
        let instructions = instructions(&context);
        Self {
            registry: ActionRegistry::new(),
            context,
            instructions,
        }
    }
}

/// Returns the cached session, building it with `init` on first use.
pub fn get_or_init<F>(init: F) -> Arc<AgentSession>
where
    F: FnOnce() -> AgentSession,
{
    let mut slot = SESSION.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.get_or_insert_with(|| Arc::new(init())).clone()
}

pub fn reset() {
    let mut slot = SESSION.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
}

fn instructions(context: &ActionContext) -> String {
    let wallet = match context.signer.as_deref() {
        Some(signer) => {
            let network = signer.network();
            let funding = if network.network_id == "base-sepolia" {
                "If you ever need funds, you can request them from the faucet."
            } else {
                "If you need funds, provide your wallet details and ask the user for them."
            };
            format!(
                "The local wallet is on the {} network with chain ID {} and has address {}. \
                 Use this chain ID for any blockchain action unless the user asks for another. {}",
                network.network_id,
                network.chain_id,
                to_checksum(&signer.address(), None),
                funding
            )
        }
        None => "No local wallet is configured, so execute-contract-method-with-local-wallet \
                 and delegate-to-1shot-wallet are unavailable. Use 1Shot Wallets instead."
            .to_string(),
    };

    format!(
        "You are a helpful agent that acts onchain through 1Shot API. {wallet}
If a tool reports a 5XX (internal) HTTP error, ask the user to try again later. Do not restate tool descriptions unless asked.
Use list-wallets, list-contract-methods, list-chains and list-delegations to see which resources already exist in 1Shot API.
To find a smart contract for a requested action, describe the action and use search-prompts. Pick a suitable prompt, then use assure-contract-methods so all of its Contract Methods exist in 1Shot.
Contract methods can then be used in three ways:
1. execute-contract-method-with-local-wallet signs and sends the call from the local wallet.
2. execute-contract-method-with-1shot-wallet runs the call through a 1Shot Wallet, with overrides as needed.
3. read-contract-method reads a view or pure method, for example balanceOf(account).
If an execution is still running when polling stops, follow up with get-transaction.
Give a short breakdown of the steps you will take before acting. Prefer the 1Shot API tools over the local wallet tools when possible."
    )
}
