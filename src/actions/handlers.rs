// src/actions/handlers.rs

use std::str::FromStr;
use std::sync::Arc;

use ethers_core::types::Address;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::info;

use super::args::{
    check_params, parse, DelegateArgs, ExecuteWithLocalWalletArgs, ExecuteWithRemoteWalletArgs,
    GetTransactionArgs, GetWalletArgs, ListDelegationsArgs, ReadContractMethodArgs,
    SearchPromptsArgs,
};
use super::{ActionContext, Payload};
use crate::blockchain::SignerError;
use crate::delegation::{self, DelegationRequest, TimeWindow};
use crate::error::ActionError;
use crate::lifecycle;
use crate::oneshot::models::{
    AssureContractMethodsRequest, ListChainsParams, ListContractMethodsParams, ListWalletsParams,
    PageParams,
};

pub type ActionResult = Result<Payload, ActionError>;

/// Signature shared by every action handler.
pub type Handler = fn(Arc<ActionContext>, Value) -> BoxFuture<'static, ActionResult>;

pub fn list_chains(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let params: ListChainsParams = parse(args)?;
        Payload::paged(ctx.service.list_chains(&params).await?)
    }
    .boxed()
}

pub fn list_wallets(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let params: ListWalletsParams = parse(args)?;
        Payload::paged(ctx.service.list_wallets(ctx.business_id, &params).await?)
    }
    .boxed()
}

pub fn list_contract_methods(
    ctx: Arc<ActionContext>,
    args: Value,
) -> BoxFuture<'static, ActionResult> {
    async move {
        let params: ListContractMethodsParams = parse(args)?;
        Payload::paged(
            ctx.service
                .list_contract_methods(ctx.business_id, &params)
                .await?,
        )
    }
    .boxed()
}

pub fn list_delegations(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: ListDelegationsArgs = parse(args)?;
        let page = PageParams {
            page: args.page,
            page_size: args.page_size,
        };
        Payload::paged(ctx.service.list_delegations(args.wallet_id, &page).await?)
    }
    .boxed()
}

pub fn get_wallet(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: GetWalletArgs = parse(args)?;
        Payload::single(
            ctx.service
                .get_wallet(args.wallet_id, args.include_balances)
                .await?,
        )
    }
    .boxed()
}

pub fn get_transaction(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: GetTransactionArgs = parse(args)?;
        Payload::single(ctx.service.get_transaction(args.transaction_id).await?)
    }
    .boxed()
}

pub fn search_prompts(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: SearchPromptsArgs = parse(args)?;
        let prompts = ctx.service.search_prompts(&args.query).await?;
        info!("Prompt search '{}' matched {}", args.query, prompts.len());
        Payload::list(prompts)
    }
    .boxed()
}

pub fn assure_contract_methods(
    ctx: Arc<ActionContext>,
    args: Value,
) -> BoxFuture<'static, ActionResult> {
    async move {
        let request: AssureContractMethodsRequest = parse(args)?;
        Address::from_str(&request.contract_address).map_err(|e| {
            ActionError::Validation(format!(
                "invalid contractAddress {}: {}",
                request.contract_address, e
            ))
        })?;
        let methods = ctx
            .service
            .assure_contract_methods(ctx.business_id, &request)
            .await?;
        Payload::list(methods)
    }
    .boxed()
}

pub fn execute_with_local_wallet(
    ctx: Arc<ActionContext>,
    args: Value,
) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: ExecuteWithLocalWalletArgs = parse(args)?;
        check_params(&args.params)?;
        let signer = ctx.signer.as_deref().ok_or(SignerError::Unavailable)?;
        let receipt = lifecycle::execute_with_local_signer(
            ctx.service.as_ref(),
            signer,
            args.contract_method_id,
            &args.params,
            &args.options(),
        )
        .await?;
        Payload::single(receipt)
    }
    .boxed()
}

pub fn execute_with_remote_wallet(
    ctx: Arc<ActionContext>,
    args: Value,
) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: ExecuteWithRemoteWalletArgs = parse(args)?;
        check_params(&args.params)?;
        let tx = lifecycle::execute_with_remote_wallet(
            ctx.service.as_ref(),
            args.contract_method_id,
            &args.params,
            &args.options(),
            &ctx.poll_policy,
            &ctx.cancel,
        )
        .await?;
        Payload::single(tx)
    }
    .boxed()
}

pub fn read_contract_method(
    ctx: Arc<ActionContext>,
    args: Value,
) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: ReadContractMethodArgs = parse(args)?;
        check_params(&args.params)?;
        let value =
            lifecycle::read_contract_method(ctx.service.as_ref(), args.contract_method_id, &args.params)
                .await?;
        Payload::single(value)
    }
    .boxed()
}

pub fn delegate_to_wallet(ctx: Arc<ActionContext>, args: Value) -> BoxFuture<'static, ActionResult> {
    async move {
        let args: DelegateArgs = parse(args)?;
        let contract_addresses = args
            .contract_addresses
            .iter()
            .map(|a| {
                Address::from_str(a).map_err(|e| {
                    ActionError::Validation(format!("invalid contract address {}: {}", a, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request = DelegationRequest {
            wallet_id: args.wallet_id,
            contract_addresses,
            methods: args.methods,
            window: TimeWindow {
                start: args.start_time,
                end: args.end_time,
            },
        };
        let record = delegation::delegate_to_wallet(
            ctx.service.as_ref(),
            ctx.signer.as_deref(),
            &ctx.delegation,
            &request,
        )
        .await?;
        Payload::single(record)
    }
    .boxed()
}
