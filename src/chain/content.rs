//! # Content and Payments
//!
//! Shapes of the paywall contract's records and of the node's own listing
//! and payment ledgers.

use crate::clarity::ClarityValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Who gets paid and how much, for one content id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub creator: String,
    /// Smallest unit of the payment asset
    pub price: u64,
}

impl ContentInfo {
    /// Reads the `{creator, price}` tuple returned by the content-info function.
    /// `(ok …)` and `(some …)` wrappers are accepted; `none` is an error.
    pub fn from_clarity(value: ClarityValue) -> Result<Self> {
        let inner = value
            .unwrap_response_ok()?
            .unwrap_optional()
            .ok_or_else(|| Error::InvalidValue("content not found".to_string()))?;

        let creator = inner
            .tuple_field("creator")
            .and_then(|v| v.as_principal())
            .ok_or_else(|| Error::InvalidValue("content record has no creator".to_string()))?;
        let price = inner
            .tuple_field("price")
            .and_then(|v| v.as_uint())
            .ok_or_else(|| Error::InvalidValue("content record has no price".to_string()))?;
        let price = u64::try_from(price)
            .map_err(|_| Error::InvalidValue(format!("price {} out of range", price)))?;

        Ok(ContentInfo {
            creator: creator.to_string(),
            price,
        })
    }
}

/// Which asset a listing is priced in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "type", content = "contract", rename_all = "snake_case")]
pub enum PaymentAsset {
    #[default]
    Native,
    /// Fungible token contract id (e.g. the bridged stablecoin)
    Token(String),
}

/// Listing submitted by a creator
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewContent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub creator: String,
    pub price: u64,
    #[serde(default)]
    pub asset: PaymentAsset,
    /// Content id of the stored blob
    pub blob_cid: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContentListing {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub creator: String,
    pub price: u64,
    pub asset: PaymentAsset,
    pub blob_cid: String,
    pub created_at: i64,
}

impl ContentListing {
    pub fn from_new(id: u64, new: NewContent) -> Self {
        ContentListing {
            id,
            title: new.title,
            description: new.description,
            creator: new.creator,
            price: new.price,
            asset: new.asset,
            blob_cid: new.blob_cid,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn info(&self) -> ContentInfo {
        ContentInfo {
            creator: self.creator.clone(),
            price: self.price,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    /// Recorded by the paywall contract
    Contract,
    /// Inferred from a wallet-to-wallet transfer
    DirectTransfer,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentRecord {
    pub buyer: String,
    pub creator: String,
    pub content_id: u64,
    pub amount: u64,
    pub memo: String,
    pub source: PaymentSource,
    #[serde(default)]
    pub tx_id: Option<String>,
}
