//! JSON-RPC Chain Client
//!
//! Talks to a Tempo node over HTTP JSON-RPC:
//! - `eth_sendTransaction` for token transfers (TIP-20 `transfer(address,uint256)`)
//! - `eth_getTransactionReceipt` for confirmation polling
//! - `tempo_fundAddress` for the testnet faucet
//!
//! The node is expected to hold the sender's signing capability; this client
//! never builds or signs raw transactions.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{ChainError, Faucet, Receipt, ReceiptSource, TransferCall, TransferGateway};
use crate::core_types::{Address, Amount, TxId};
use crate::session::Account;

/// `transfer(address,uint256)` selector
const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// JSON-RPC request structure
#[derive(Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Receipt structure from RPC
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// HTTP JSON-RPC client
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChainError::new(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Make a JSON-RPC call. A `null` result maps to `Ok(None)`.
    async fn rpc_call<T, R>(&self, method: &'static str, params: T) -> Result<Option<R>, ChainError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| transport_error(method, e))?;

        if let Some(error) = rpc_response.error {
            return Err(ChainError::with_short(
                error.message.clone(),
                format!("RPC error {} in {}: {}", error.code, method, error.message),
            ));
        }

        Ok(rpc_response.result)
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::timed_out(method)
    } else {
        ChainError::new(format!("HTTP request failed in {}: {}", method, e))
    }
}

/// ABI-encode `transfer(to, amount)`
pub fn encode_transfer(to: &Address, amount: Amount) -> String {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to.as_bytes());
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&amount.to_be_bytes());
    format!("0x{}", hex::encode(data))
}

/// Parse a 0x-prefixed hex quantity
fn parse_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
}

#[async_trait]
impl TransferGateway for JsonRpcClient {
    fn name(&self) -> &'static str {
        "json-rpc"
    }

    async fn submit_transfer(
        &self,
        account: &Account,
        call: &TransferCall,
    ) -> Result<TxId, ChainError> {
        let mut tx = json!({
            "from": account.address,
            "to": call.token,
            "data": encode_transfer(&call.to, call.amount),
        });
        if let Some(fee_token) = call.fee_token {
            tx["feeToken"] = json!(fee_token);
        }

        debug!(url = %self.url, token = %call.token, amount = %call.amount, "eth_sendTransaction");
        let hash: Option<String> = self.rpc_call("eth_sendTransaction", [tx]).await?;
        let hash = hash.ok_or_else(|| ChainError::new("eth_sendTransaction returned no hash"))?;
        TxId::new(hash).map_err(|e| ChainError::new(e.to_string()))
    }
}

#[async_trait]
impl ReceiptSource for JsonRpcClient {
    async fn get_receipt(&self, tx_id: &TxId) -> Result<Option<Receipt>, ChainError> {
        let receipt: Option<RpcReceipt> = self
            .rpc_call("eth_getTransactionReceipt", [tx_id.as_str()])
            .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };

        let tx_id = TxId::new(receipt.transaction_hash).unwrap_or_else(|_| tx_id.clone());
        Ok(Some(Receipt {
            tx_id,
            block_number: receipt.block_number.as_deref().and_then(parse_quantity),
            success: receipt.status.as_deref() != Some("0x0"),
        }))
    }
}

#[async_trait]
impl Faucet for JsonRpcClient {
    async fn fund(&self, address: &Address) -> Result<(), ChainError> {
        let _: Option<serde_json::Value> = self.rpc_call("tempo_fundAddress", [address]).await?;
        Ok(())
    }
}
