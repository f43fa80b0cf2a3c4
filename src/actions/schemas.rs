//! JSON input schemas advertised to the agent host.

use serde_json::{json, Value};

fn uuid(description: &str) -> Value {
    json!({ "type": "string", "format": "uuid", "description": description })
}

fn page_properties() -> Value {
    json!({
        "page": { "type": "integer", "minimum": 1, "description": "Page to return, starting at 1." },
        "pageSize": { "type": "integer", "minimum": 1, "maximum": 100, "description": "Results per page." }
    })
}

fn object(mut properties: Value, extra: Value, required: &[&str]) -> Value {
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn contract_method_params() -> Value {
    let scalar = json!({ "type": ["string", "boolean"] });
    let record = json!({ "type": "object", "additionalProperties": scalar });
    json!({
        "type": "object",
        "description": "The parameters to pass to the contract method, keyed by name. May be nested. Pass numbers as strings.",
        "additionalProperties": {
            "anyOf": [
                scalar,
                record,
                { "type": "array", "items": { "anyOf": [scalar, record] } }
            ]
        }
    })
}

fn authorization_list() -> Value {
    json!({
        "type": "array",
        "description": "ERC-7702 authorizations. Only needed when turning the sender into a smart wallet.",
        "items": {
            "type": "object",
            "properties": {
                "address": { "type": "string" },
                "nonce": { "type": "string" },
                "chainId": { "type": "integer" },
                "signature": { "type": "string" }
            },
            "required": ["address", "nonce", "chainId", "signature"]
        }
    })
}

fn value_field() -> Value {
    json!({
        "type": "string",
        "description": "Native token amount in wei to send along. Only valid for payable methods."
    })
}

pub fn list_chains() -> Value {
    object(page_properties(), json!({}), &[])
}

pub fn list_wallets() -> Value {
    object(
        page_properties(),
        json!({
            "chainId": { "type": "integer", "description": "Only return wallets on this chain." },
            "name": { "type": "string", "description": "Filter by wallet name." }
        }),
        &[],
    )
}

pub fn list_contract_methods() -> Value {
    object(
        page_properties(),
        json!({
            "chainId": { "type": "integer", "description": "Only return methods on this chain." },
            "name": { "type": "string", "description": "Filter by method name." },
            "contractAddress": { "type": "string", "description": "Only return methods of this contract." },
            "promptId": uuid("Only return methods created from this prompt.")
        }),
        &[],
    )
}

pub fn list_delegations() -> Value {
    object(
        page_properties(),
        json!({ "walletId": uuid("The 1Shot wallet whose delegations to list.") }),
        &["walletId"],
    )
}

pub fn get_wallet() -> Value {
    object(
        json!({ "walletId": uuid("The 1Shot wallet to fetch.") }),
        json!({
            "includeBalances": { "type": "boolean", "description": "Include the native token balance." }
        }),
        &["walletId"],
    )
}

pub fn get_transaction() -> Value {
    object(
        json!({ "transactionId": uuid("The 1Shot transaction to fetch.") }),
        json!({}),
        &["transactionId"],
    )
}

pub fn search_prompts() -> Value {
    object(
        json!({
            "query": { "type": "string", "description": "Description of the action you want a smart contract to perform." }
        }),
        json!({}),
        &["query"],
    )
}

pub fn assure_contract_methods() -> Value {
    object(
        json!({
            "chainId": { "type": "integer", "description": "Chain of the contract." },
            "contractAddress": { "type": "string", "description": "Address of the contract described by the prompt." },
            "promptId": uuid("The prompt chosen from search-prompts.")
        }),
        json!({
            "walletId": uuid("The 1Shot wallet to associate the methods with."),
            "overwriteExisting": { "type": "boolean", "description": "Replace methods that already exist." }
        }),
        &["chainId", "contractAddress", "promptId"],
    )
}

pub fn execute_with_local_wallet() -> Value {
    object(
        json!({
            "contractMethodId": uuid("The contract method to execute."),
            "params": contract_method_params()
        }),
        json!({
            "authorizationList": authorization_list(),
            "value": value_field()
        }),
        &["contractMethodId", "params"],
    )
}

pub fn execute_with_remote_wallet() -> Value {
    object(
        json!({
            "contractMethodId": uuid("The contract method to execute."),
            "params": contract_method_params()
        }),
        json!({
            "walletId": uuid("Override the 1Shot wallet that executes the method."),
            "memo": { "type": "string", "description": "Note stored with the transaction, e.g. why it was executed." },
            "authorizationList": authorization_list(),
            "value": value_field(),
            "contractAddress": { "type": "string", "description": "Override the contract address for this execution." }
        }),
        &["contractMethodId", "params"],
    )
}

pub fn read_contract_method() -> Value {
    object(
        json!({
            "contractMethodId": uuid("The view or pure contract method to read."),
            "params": contract_method_params()
        }),
        json!({}),
        &["contractMethodId", "params"],
    )
}

pub fn delegate_to_wallet() -> Value {
    object(
        json!({ "walletId": uuid("The 1Shot wallet receiving the delegation.") }),
        json!({
            "startTime": { "type": "integer", "description": "Unix seconds before which the delegation is not valid." },
            "endTime": { "type": "integer", "description": "Unix seconds after which the delegation expires." },
            "contractAddresses": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Contracts the 1Shot wallet may call. Empty means any."
            },
            "methods": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Function signatures such as transfer(address,uint256) or 4-byte selectors. Empty means any."
            }
        }),
        &["walletId"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_are_declared() {
        let schema = execute_with_remote_wallet();
        assert_eq!(schema["required"], json!(["contractMethodId", "params"]));
        assert!(schema["properties"]["memo"].is_object());
        // Unknown argument keys are ignored when parsed, so the schema stays open.
        assert!(schema.get("additionalProperties").is_none());
    }
}
