//! Safe Transaction Service client.
//!
//! Fetches a wallet's executed multisig transactions so stored rows can be
//! enriched with the set of signer addresses that approved them.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::MultisigConfig;
use crate::infrastructure::multisig::error::MultisigError;

/// One executed multisig transaction and the owners that confirmed it
#[derive(Debug, Clone)]
pub struct MultisigExecution {
    pub tx_hash: String,
    /// Signer addresses, sorted
    pub signers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    results: Vec<WireMultisigTx>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMultisigTx {
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    confirmations: Vec<WireConfirmation>,
}

#[derive(Debug, Deserialize)]
struct WireConfirmation {
    owner: String,
}

/// Client for the Safe Transaction Service
#[derive(Debug, Clone)]
pub struct SafeClient {
    client: Client,
    base_url: String,
    fetch_limit: u64,
}

impl SafeClient {
    /// Create a new Safe client from configuration
    pub fn new(config: &MultisigConfig) -> Result<Self, MultisigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MultisigError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            fetch_limit: config.fetch_limit,
        })
    }

    /// Most recent executed multisig transactions for a Safe address
    pub async fn executed_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<MultisigExecution>, MultisigError> {
        let url = format!("{}/safes/{}/multisig-transactions/", self.base_url, address);
        let limit = self.fetch_limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("executed", "true"),
                ("limit", &limit),
                ("ordering", "-executionDate"),
            ])
            .send()
            .await
            .map_err(|e| MultisigError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MultisigError::Network(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MultisigError::Network(e.to_string()))?;
        Self::parse_executions(&body)
    }

    fn parse_executions(body: &str) -> Result<Vec<MultisigExecution>, MultisigError> {
        let envelope: ListEnvelope =
            serde_json::from_str(body).map_err(|e| MultisigError::Parse(e.to_string()))?;

        Ok(envelope
            .results
            .into_iter()
            .filter_map(|tx| {
                let hash = tx.transaction_hash?;
                if tx.confirmations.is_empty() {
                    return None;
                }
                let mut signers: Vec<String> =
                    tx.confirmations.into_iter().map(|c| c.owner).collect();
                signers.sort();
                Some(MultisigExecution {
                    tx_hash: hash,
                    signers,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_executions_with_sorted_signers() {
        let body = r#"{
            "results": [
                {
                    "transactionHash": "0xabc",
                    "confirmations": [
                        {"owner": "0xBBB"},
                        {"owner": "0xAAA"}
                    ]
                },
                {
                    "transactionHash": null,
                    "confirmations": [{"owner": "0xCCC"}]
                },
                {
                    "transactionHash": "0xdef",
                    "confirmations": []
                }
            ]
        }"#;
        let executions = SafeClient::parse_executions(body).unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].tx_hash, "0xabc");
        assert_eq!(executions[0].signers, vec!["0xAAA", "0xBBB"]);
    }
}
