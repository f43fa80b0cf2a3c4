//! # Capability Registry
//!
//! Every capability the agent host can call is an action: a name, a
//! natural-language description, a JSON input schema and a handler. The
//! registry is a plain table built at startup and shared by the MCP and HTTP
//! surfaces.
//!
//! All actions report through [`ActionOutcome`], whether they succeed or
//! fail, so the host never has to tell a thrown error from a returned one.

pub mod args;
pub mod handlers;
pub mod registry;
pub mod schemas;

pub use registry::{ActionRegistry, ActionSpec};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::blockchain::LocalSigner;
use crate::config::Config;
use crate::delegation::DelegationEnvironment;
use crate::error::{ActionError, ErrorKind};
use crate::lifecycle::PollPolicy;
use crate::oneshot::models::PagedResponse;
use crate::oneshot::ExecutionService;

/// Everything a handler needs to do its work.
pub struct ActionContext {
    pub service: Arc<dyn ExecutionService>,
    pub signer: Option<Arc<dyn LocalSigner>>,
    pub business_id: Uuid,
    pub poll_policy: PollPolicy,
    pub delegation: DelegationEnvironment,
    /// Fired on shutdown; aborts in-flight polling.
    pub cancel: CancellationToken,
}

impl ActionContext {
    pub fn new(
        config: &Config,
        service: Arc<dyn ExecutionService>,
        signer: Option<Arc<dyn LocalSigner>>,
    ) -> Self {
        Self {
            service,
            signer,
            business_id: config.business_id,
            poll_policy: config.poll_policy(),
            delegation: config.delegation_environment,
            cancel: CancellationToken::new(),
        }
    }
}

/// Successful payload of a handler, before it is wrapped in an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub result: Value,
    pub count: Option<usize>,
}

impl Payload {
    pub fn single<T: Serialize>(value: T) -> Result<Self, ActionError> {
        Ok(Self {
            result: to_value(value)?,
            count: None,
        })
    }

    pub fn list<T: Serialize>(items: Vec<T>) -> Result<Self, ActionError> {
        let count = items.len();
        Ok(Self {
            result: to_value(items)?,
            count: Some(count),
        })
    }

    /// Keeps the paging metadata; `count` is the size of this page.
    pub fn paged<T: Serialize>(page: PagedResponse<T>) -> Result<Self, ActionError> {
        let count = page.response.len();
        Ok(Self {
            result: to_value(page)?,
            count: Some(count),
        })
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ActionError> {
    serde_json::to_value(value).map_err(|e| {
        ActionError::RemoteService(crate::error::OneShotError::Decode(e))
    })
}

/// Uniform result envelope returned by every action.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ActionOutcome {
    pub fn success(payload: Payload) -> Self {
        Self {
            success: true,
            count: payload.count,
            result: Some(payload.result),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(error: &ActionError) -> Self {
        Self {
            success: false,
            count: None,
            result: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

impl From<Result<Payload, ActionError>> for ActionOutcome {
    fn from(result: Result<Payload, ActionError>) -> Self {
        match result {
            Ok(payload) => ActionOutcome::success(payload),
            Err(e) => ActionOutcome::failure(&e),
        }
    }
}
