//! # Transfer Records
//!
//! Transactions as returned by the chain indexer, reduced to the fields the
//! direct-transfer matcher needs.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Pending,
    AbortByResponse,
    AbortByPostCondition,
    #[serde(other)]
    Failed,
}

impl TxStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "success" => TxStatus::Success,
            "pending" => TxStatus::Pending,
            "abort_by_response" => TxStatus::AbortByResponse,
            "abort_by_post_condition" => TxStatus::AbortByPostCondition,
            _ => TxStatus::Failed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Plain native-coin value transfer
    TokenTransfer,
    ContractCall,
    #[serde(other)]
    Other,
}

impl TxKind {
    pub fn from_api(tx_type: &str) -> Self {
        match tx_type {
            "token_transfer" => TxKind::TokenTransfer,
            "contract_call" => TxKind::ContractCall,
            _ => TxKind::Other,
        }
    }
}

/// One entry of an account's recent transaction history
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TransferRecord {
    pub tx_id: String,
    pub status: TxStatus,
    pub kind: TxKind,
    pub sender: String,
    /// Empty unless `kind` is `TokenTransfer`
    pub recipient: String,
    pub amount: u64,
    /// As received: usually `0x` + hex of the zero padded memo bytes
    pub memo: String,
}

impl TransferRecord {
    pub fn is_successful_transfer(&self) -> bool {
        self.status == TxStatus::Success && self.kind == TxKind::TokenTransfer
    }
}

/// Memo text attached to a direct payment for `content_id`
pub fn payment_memo(content_id: u64) -> String {
    format!(
        "{}{}",
        crate::utils::constants::PAYMENT_MEMO_PREFIX,
        content_id
    )
}

/// True when `wire_memo` carries `expected`, either verbatim or hex encoded.
/// Hex forms may carry a `0x` prefix and the chain's trailing zero padding.
pub fn memo_matches(wire_memo: &str, expected: &str) -> bool {
    if wire_memo == expected {
        return true;
    }

    let digits = wire_memo
        .strip_prefix("0x")
        .or_else(|| wire_memo.strip_prefix("0X"))
        .unwrap_or(wire_memo);
    if digits.eq_ignore_ascii_case(&hex::encode(expected)) {
        return true;
    }

    match hex::decode(digits) {
        Ok(bytes) => {
            let trimmed_len = bytes.iter().rposition(|b| *b != 0).map_or(0, |p| p + 1);
            &bytes[..trimmed_len] == expected.as_bytes()
        }
        Err(_) => false,
    }
}
