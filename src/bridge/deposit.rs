//! # Bridge Deposits
//!
//! A deposit observed on (or about to be sent to) the remote chain's bridge
//! contract. Only the recipient field is produced here; the remote call
//! itself is made by the caller.

use super::recipient::{RecipientCoder, RecipientField};
use crate::address::AddressCodec;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BridgeDeposit {
    /// Remote-chain address funding the deposit, if known
    #[serde(default)]
    pub sender: Option<String>,
    /// Smallest unit of the bridged asset
    pub amount: u128,
    pub remote_domain: u32,
    pub recipient: RecipientField,
}

/// Arguments of the remote bridge's deposit call, in call order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteCallArgs {
    pub amount: String,
    pub remote_domain: u32,
    pub recipient: String,
}

impl BridgeDeposit {
    pub fn for_native_recipient<C: AddressCodec>(
        coder: &RecipientCoder<C>,
        native_address: &str,
        amount: u128,
        remote_domain: u32,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(Error::InvalidValue("deposit amount must be positive".to_string()));
        }
        Ok(BridgeDeposit {
            sender: None,
            amount,
            remote_domain,
            recipient: coder.encode(native_address)?,
        })
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Amount is a decimal string so 128-bit values survive JSON
    pub fn remote_call_args(&self) -> RemoteCallArgs {
        RemoteCallArgs {
            amount: self.amount.to_string(),
            remote_domain: self.remote_domain,
            recipient: self.recipient.to_hex(),
        }
    }

    /// Native address the bridge will credit
    pub fn native_recipient<C: AddressCodec>(&self, coder: &RecipientCoder<C>) -> Result<String> {
        coder.decode(&self.recipient)
    }
}
