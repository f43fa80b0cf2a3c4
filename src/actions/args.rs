// src/actions/args.rs

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::error::ActionError;
use crate::oneshot::models::{
    ContractMethodParams, EncodeOptions, Erc7702Authorization, ExecuteOptions,
};

/// Deserializes and validates the arguments of an action. A missing
/// argument object is treated as empty.
pub fn parse<T: DeserializeOwned + Validate>(args: Value) -> Result<T, ActionError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    let parsed: T = serde_json::from_value(args)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Contract method parameters are strings or booleans, objects of those, or
/// arrays of either. Numbers must be passed as strings so large integers
/// survive untouched.
pub fn check_params(params: &ContractMethodParams) -> Result<(), ActionError> {
    fn scalar(v: &Value) -> bool {
        matches!(v, Value::String(_) | Value::Bool(_))
    }
    fn record(v: &Value) -> bool {
        match v {
            Value::Object(map) => map.values().all(scalar),
            _ => false,
        }
    }

    for (name, value) in params {
        let ok = match value {
            Value::Array(items) => items.iter().all(|i| scalar(i) || record(i)),
            other => scalar(other) || record(other),
        };
        if !ok {
            return Err(ActionError::Validation(format!(
                "parameter '{}' must be a string, boolean, object or array of those \
                 (pass numbers as strings)",
                name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListDelegationsArgs {
    pub wallet_id: Uuid,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetWalletArgs {
    pub wallet_id: Uuid,
    #[serde(default)]
    pub include_balances: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionArgs {
    pub transaction_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchPromptsArgs {
    #[validate(length(min = 1))]
    pub query: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWithLocalWalletArgs {
    pub contract_method_id: Uuid,
    #[serde(default)]
    pub params: ContractMethodParams,
    pub authorization_list: Option<Vec<Erc7702Authorization>>,
    pub value: Option<String>,
}

impl ExecuteWithLocalWalletArgs {
    pub fn options(&self) -> EncodeOptions {
        EncodeOptions {
            authorization_list: self.authorization_list.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWithRemoteWalletArgs {
    pub contract_method_id: Uuid,
    #[serde(default)]
    pub params: ContractMethodParams,
    pub wallet_id: Option<Uuid>,
    #[validate(length(max = 1024))]
    pub memo: Option<String>,
    pub authorization_list: Option<Vec<Erc7702Authorization>>,
    pub value: Option<String>,
    #[validate(length(equal = 42))]
    pub contract_address: Option<String>,
}

impl ExecuteWithRemoteWalletArgs {
    pub fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            wallet_id: self.wallet_id,
            memo: self.memo.clone(),
            authorization_list: self.authorization_list.clone(),
            value: self.value.clone(),
            contract_address: self.contract_address.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadContractMethodArgs {
    pub contract_method_id: Uuid,
    #[serde(default)]
    pub params: ContractMethodParams,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DelegateArgs {
    pub wallet_id: Uuid,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    #[serde(default)]
    pub contract_addresses: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_arguments_are_treated_as_empty() {
        let parsed: crate::oneshot::models::ListChainsParams = parse(Value::Null).unwrap();
        assert!(parsed.page.is_none());
    }

    #[test]
    fn malformed_uuid_is_a_validation_error() {
        let err = parse::<GetWalletArgs>(json!({ "walletId": "not-a-uuid" })).unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[test]
    fn range_violations_are_validation_errors() {
        let err = parse::<ListDelegationsArgs>(json!({
            "walletId": Uuid::new_v4(),
            "pageSize": 1000
        }))
        .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[test]
    fn params_accept_nested_strings_and_booleans() {
        let params: ContractMethodParams = serde_json::from_value(json!({
            "to": "0xabc",
            "flag": true,
            "order": { "amount": "10", "fill": false },
            "path": ["0x1", { "pool": "0x2" }]
        }))
        .unwrap();
        assert!(check_params(&params).is_ok());
    }

    #[test]
    fn params_reject_bare_numbers() {
        let params: ContractMethodParams =
            serde_json::from_value(json!({ "amount": 10 })).unwrap();
        let err = check_params(&params).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }
}
