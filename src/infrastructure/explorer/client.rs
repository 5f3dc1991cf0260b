//! Etherscan-compatible account API client.
//!
//! A thin wrapper: one GET per page, the standard `status`/`result`
//! envelope, and string-typed numeric fields parsed into a typed `RawTx`.
//! A `status: "0"` answer with an empty result list means "no transactions
//! found" and is not an error.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ExplorerConfig;
use crate::infrastructure::explorer::error::ExplorerError;

/// Which account transfer list to page through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferList {
    /// Normal (native-token) transactions
    Native,
    /// Token transfer events
    Token,
    /// Internal (contract-initiated) native transfers
    Internal,
}

impl TransferList {
    fn action(&self) -> &'static str {
        match self {
            TransferList::Native => "txlist",
            TransferList::Token => "tokentx",
            TransferList::Internal => "txlistinternal",
        }
    }
}

/// One transaction as reported by the explorer, numerics already parsed
#[derive(Debug, Clone)]
pub struct RawTx {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: i64,
    pub from: String,
    pub to: String,
    /// Raw amount in the token's smallest unit
    pub value: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub token_decimals: Option<u32>,
    pub contract_address: Option<String>,
    pub input: Option<String>,
    /// True when the transfer came from the internal-transactions list
    pub internal: bool,
    pub is_error: bool,
}

impl RawTx {
    /// True when the transaction carries call data beyond a plain transfer
    pub fn has_call_data(&self) -> bool {
        self.input
            .as_deref()
            .map(|i| !i.is_empty() && i != "0x")
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTx {
    hash: String,
    block_number: String,
    time_stamp: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    token_name: Option<String>,
    #[serde(default)]
    token_decimal: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    is_error: Option<String>,
}

/// Client for an Etherscan-compatible block explorer API
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    chain_id: u64,
}

impl ExplorerClient {
    /// Create a new explorer client from configuration
    pub fn new(config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            chain_id: config.chain_id,
        })
    }

    /// Fetch one page of a wallet's transfer list, ascending by block,
    /// starting at `start_block` (inclusive)
    pub async fn list_transactions(
        &self,
        address: &str,
        list: TransferList,
        start_block: u64,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RawTx>, ExplorerError> {
        let chain_id = self.chain_id.to_string();
        let start = start_block.to_string();
        let page_str = page.to_string();
        let offset = page_size.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("module", "account"),
            ("action", list.action()),
            ("address", address),
            ("startblock", &start),
            ("endblock", "99999999"),
            ("sort", "asc"),
            ("page", &page_str),
            ("offset", &offset),
            ("chainid", &chain_id),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        Self::parse_list_response(&body, list)
    }

    /// Parse an account-list envelope into typed transactions
    fn parse_list_response(body: &str, list: TransferList) -> Result<Vec<RawTx>, ExplorerError> {
        let envelope: ApiEnvelope =
            serde_json::from_str(body).map_err(|e| ExplorerError::Parse(e.to_string()))?;

        match envelope.status.as_str() {
            "1" => {}
            "0" => {
                // "No transactions found" comes back as status 0 with an
                // empty result array; anything else is a real API error.
                if envelope.result.as_array().map_or(false, |a| a.is_empty()) {
                    return Ok(Vec::new());
                }
                return Err(ExplorerError::Api(
                    envelope
                        .message
                        .unwrap_or_else(|| "unknown explorer error".to_string()),
                ));
            }
            other => {
                return Err(ExplorerError::Api(format!(
                    "unexpected status '{}'",
                    other
                )));
            }
        }

        let wire: Vec<WireTx> = serde_json::from_value(envelope.result)
            .map_err(|e| ExplorerError::Parse(e.to_string()))?;

        wire.into_iter().map(|tx| Self::to_raw(tx, list)).collect()
    }

    fn to_raw(tx: WireTx, list: TransferList) -> Result<RawTx, ExplorerError> {
        let block_number = tx
            .block_number
            .parse::<u64>()
            .map_err(|e| ExplorerError::Parse(format!("blockNumber: {}", e)))?;
        let timestamp = tx
            .time_stamp
            .parse::<i64>()
            .map_err(|e| ExplorerError::Parse(format!("timeStamp: {}", e)))?;
        let token_decimals = match &tx.token_decimal {
            Some(d) if !d.is_empty() => Some(
                d.parse::<u32>()
                    .map_err(|e| ExplorerError::Parse(format!("tokenDecimal: {}", e)))?,
            ),
            _ => None,
        };

        Ok(RawTx {
            hash: tx.hash,
            block_number,
            timestamp,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            token_symbol: tx.token_symbol,
            token_name: tx.token_name,
            token_decimals,
            contract_address: tx.contract_address.filter(|c| !c.is_empty()),
            input: tx.input,
            internal: list == TransferList::Internal,
            is_error: tx.is_error.as_deref() == Some("1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_transaction_page() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "blockNumber": "123456",
                "timeStamp": "1710504000",
                "hash": "0xabc",
                "from": "0xf00",
                "to": "0xba4",
                "value": "1000000000000000000",
                "input": "0x",
                "isError": "0"
            }]
        }"#;
        let txs = ExplorerClient::parse_list_response(body, TransferList::Native).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].block_number, 123_456);
        assert_eq!(txs[0].timestamp, 1_710_504_000);
        assert!(!txs[0].internal);
        assert!(!txs[0].is_error);
        assert!(!txs[0].has_call_data());
    }

    #[test]
    fn parses_token_transfer_page() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "blockNumber": "99",
                "timeStamp": "1710504000",
                "hash": "0xdef",
                "from": "0xf00",
                "to": "0xba4",
                "value": "2500000",
                "tokenSymbol": "USDC",
                "tokenName": "USD Coin",
                "tokenDecimal": "6",
                "contractAddress": "0xc0ffee"
            }]
        }"#;
        let txs = ExplorerClient::parse_list_response(body, TransferList::Token).unwrap();
        assert_eq!(txs[0].token_decimals, Some(6));
        assert_eq!(txs[0].contract_address.as_deref(), Some("0xc0ffee"));
        assert_eq!(txs[0].token_symbol.as_deref(), Some("USDC"));
    }

    #[test]
    fn empty_result_with_status_zero_is_empty_page() {
        let body = r#"{"status":"0","message":"No transactions found","result":[]}"#;
        let txs = ExplorerClient::parse_list_response(body, TransferList::Native).unwrap();
        assert!(txs.is_empty());
    }

    #[test]
    fn status_zero_with_string_result_is_api_error() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        let err = ExplorerClient::parse_list_response(body, TransferList::Native).unwrap_err();
        assert!(matches!(err, ExplorerError::Api(_)));
    }

    #[test]
    fn malformed_numeric_field_is_parse_error() {
        let body = r#"{
            "status": "1",
            "result": [{
                "blockNumber": "abc",
                "timeStamp": "1710504000",
                "hash": "0xabc",
                "from": "0xf00",
                "to": "0xba4",
                "value": "0"
            }]
        }"#;
        let err = ExplorerClient::parse_list_response(body, TransferList::Native).unwrap_err();
        assert!(matches!(err, ExplorerError::Parse(_)));
    }

    #[test]
    fn internal_list_marks_rows_internal() {
        let body = r#"{
            "status": "1",
            "result": [{
                "blockNumber": "7",
                "timeStamp": "1710504000",
                "hash": "0xabc",
                "from": "0xf00",
                "to": "0xba4",
                "value": "5"
            }]
        }"#;
        let txs = ExplorerClient::parse_list_response(body, TransferList::Internal).unwrap();
        assert!(txs[0].internal);
    }
}
