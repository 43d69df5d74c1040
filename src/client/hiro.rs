//! # Chain API Client
//!
//! HTTP implementation of both collaborators against the public chain API:
//! `/v2/contracts/call-read/...` for contract reads and
//! `/extended/v1/address/{addr}/transactions` for history.

use super::{ContractReader, TransferIndexer};
use crate::address::ContractId;
use crate::chain::{TransferRecord, TxKind, TxStatus};
use crate::clarity::ClarityValue;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct HiroClient {
    client: Client,
    api_url: String,
}

#[derive(Serialize, Debug)]
struct CallReadRequest<'a> {
    sender: &'a str,
    arguments: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct CallReadResponse {
    okay: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TransactionsPage {
    results: Vec<ApiTransaction>,
}

#[derive(Deserialize, Debug)]
struct ApiTransaction {
    tx_id: String,
    tx_status: String,
    tx_type: String,
    sender_address: String,
    #[serde(default)]
    token_transfer: Option<ApiTokenTransfer>,
}

#[derive(Deserialize, Debug)]
struct ApiTokenTransfer {
    recipient_address: String,
    amount: String,
    #[serde(default)]
    memo: String,
}

impl HiroClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HiroClient {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// API url extended by path segments, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| Error::QueryUnavailable(format!("api url {}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::QueryUnavailable(format!("api url {} cannot take a path", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ContractReader for HiroClient {
    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[ClarityValue],
        caller: &str,
    ) -> Result<ClarityValue> {
        let address = contract.address_string();
        let url = self.endpoint(&[
            "v2",
            "contracts",
            "call-read",
            &address,
            &contract.name,
            function,
        ])?;
        let body = CallReadRequest {
            sender: caller,
            arguments: args.iter().map(ClarityValue::to_hex).collect(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::QueryUnavailable(format!(
                "{} returned {}",
                function,
                response.status()
            )));
        }

        let parsed: CallReadResponse = response.json().await?;
        parse_call_read(parsed)
    }
}

#[async_trait]
impl TransferIndexer for HiroClient {
    async fn recent_transfers(&self, address: &str, limit: u32) -> Result<Vec<TransferRecord>> {
        let url = self.endpoint(&["extended", "v1", "address", address, "transactions"])?;

        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::QueryUnavailable(format!(
                "history for {} returned {}",
                address,
                response.status()
            )));
        }

        let page: TransactionsPage = response.json().await?;
        Ok(page.results.into_iter().filter_map(to_transfer_record).collect())
    }
}

fn parse_call_read(response: CallReadResponse) -> Result<ClarityValue> {
    if !response.okay {
        return Err(Error::QueryUnavailable(
            response
                .cause
                .unwrap_or_else(|| "read-only call failed".to_string()),
        ));
    }
    let result = response
        .result
        .ok_or_else(|| Error::QueryUnavailable("read-only call returned no result".to_string()))?;
    ClarityValue::from_hex(&result).map_err(|e| Error::QueryUnavailable(e.to_string()))
}

/// `None` for a transfer whose amount does not parse; such entries are dropped
fn to_transfer_record(tx: ApiTransaction) -> Option<TransferRecord> {
    let kind = TxKind::from_api(&tx.tx_type);
    let (recipient, amount, memo) = match (&kind, tx.token_transfer) {
        (TxKind::TokenTransfer, Some(t)) => match t.amount.parse::<u64>() {
            Ok(amount) => (t.recipient_address, amount, t.memo),
            Err(e) => {
                log::warn!("Dropping tx {} with amount '{}': {}", tx.tx_id, t.amount, e);
                return None;
            }
        },
        _ => (String::new(), 0, String::new()),
    };

    Some(TransferRecord {
        tx_id: tx.tx_id,
        status: TxStatus::from_api(&tx.tx_status),
        kind,
        sender: tx.sender_address,
        recipient,
        amount,
        memo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transactions_page() {
        let body = serde_json::json!({
            "limit": 50,
            "offset": 0,
            "total": 2,
            "results": [
                {
                    "tx_id": "0xabc",
                    "tx_status": "success",
                    "tx_type": "token_transfer",
                    "sender_address": "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
                    "fee_rate": "180",
                    "token_transfer": {
                        "recipient_address": "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
                        "amount": "1000000",
                        "memo": "0x5061796d656e7420666f7220636f6e74656e74202337"
                    }
                },
                {
                    "tx_id": "0xdef",
                    "tx_status": "abort_by_response",
                    "tx_type": "contract_call",
                    "sender_address": "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
                    "contract_call": { "contract_id": "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.content-paywall" }
                }
            ]
        });

        let page: TransactionsPage = serde_json::from_value(body).unwrap();
        let records: Vec<TransferRecord> =
            page.results.into_iter().filter_map(to_transfer_record).collect();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_successful_transfer());
        assert_eq!(records[0].amount, 1_000_000);
        assert_eq!(records[0].recipient, "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM");
        assert_eq!(records[1].kind, TxKind::ContractCall);
        assert_eq!(records[1].status, TxStatus::AbortByResponse);
        assert!(records[1].recipient.is_empty());
    }

    #[test]
    fn test_parse_call_read_result() {
        let ok = CallReadResponse {
            okay: true,
            result: Some("0x0703".to_string()),
            cause: None,
        };
        assert_eq!(
            parse_call_read(ok).unwrap(),
            ClarityValue::ResponseOk(Box::new(ClarityValue::Bool(true)))
        );

        let failed = CallReadResponse {
            okay: false,
            result: None,
            cause: Some("Unchecked(NoSuchContract)".to_string()),
        };
        assert_eq!(
            parse_call_read(failed),
            Err(Error::QueryUnavailable("Unchecked(NoSuchContract)".to_string()))
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = CallReadRequest {
            sender: "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
            arguments: vec![ClarityValue::UInt(7).to_hex()],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["arguments"][0], "0x0100000000000000000000000000000007");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HiroClient::new("http://localhost:3999/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_url(), "http://localhost:3999");
    }

    #[tokio::test]
    async fn test_unparseable_amount_is_dropped() {
        use crate::access::{DirectTransferMatcher, MatchRules};

        struct Page(Vec<TransferRecord>);

        #[async_trait]
        impl TransferIndexer for Page {
            async fn recent_transfers(&self, _address: &str, _limit: u32) -> Result<Vec<TransferRecord>> {
                Ok(self.0.clone())
            }
        }

        let body = serde_json::json!({
            "results": [{
                "tx_id": "0xbad",
                "tx_status": "success",
                "tx_type": "token_transfer",
                "sender_address": "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
                "token_transfer": {
                    "recipient_address": "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
                    "amount": "garbage",
                    "memo": "Payment for content #7"
                }
            }]
        });
        let page: TransactionsPage = serde_json::from_value(body).unwrap();
        let records: Vec<TransferRecord> =
            page.results.into_iter().filter_map(to_transfer_record).collect();
        assert!(records.is_empty());

        let matcher = DirectTransferMatcher::new(Page(records), MatchRules::default());
        assert!(
            !matcher
                .verify_direct_transfer(
                    "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
                    "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
                    500,
                    "Payment for content #7",
                )
                .await
        );
    }

    #[test]
    fn test_path_segments_are_escaped() {
        let client = HiroClient::new("http://localhost:3999/", Duration::from_secs(1)).unwrap();
        let url = client
            .endpoint(&["extended", "v1", "address", "../../v2/contracts", "transactions"])
            .unwrap();
        assert_eq!(
            url.path(),
            "/extended/v1/address/..%2F..%2Fv2%2Fcontracts/transactions"
        );

        let prefixed = HiroClient::new("http://localhost:3999/hiro", Duration::from_secs(1)).unwrap();
        let url = prefixed.endpoint(&["v2", "info"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3999/hiro/v2/info");
    }
}
