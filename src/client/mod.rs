//! # Chain Collaborators
//!
//! The two read paths the verifier depends on. Both are injected so the
//! verifier can be driven by fakes in tests and by [`HiroClient`] in the node.

pub mod hiro;

pub use hiro::HiroClient;

use crate::address::ContractId;
use crate::chain::TransferRecord;
use crate::clarity::ClarityValue;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only contract calls
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[ClarityValue],
        caller: &str,
    ) -> Result<ClarityValue>;
}

/// Account history from the chain indexer, most recent first
#[async_trait]
pub trait TransferIndexer: Send + Sync {
    async fn recent_transfers(&self, address: &str, limit: u32) -> Result<Vec<TransferRecord>>;
}

#[async_trait]
impl<T: ContractReader + ?Sized> ContractReader for Arc<T> {
    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[ClarityValue],
        caller: &str,
    ) -> Result<ClarityValue> {
        (**self).call_read_only(contract, function, args, caller).await
    }
}

#[async_trait]
impl<T: TransferIndexer + ?Sized> TransferIndexer for Arc<T> {
    async fn recent_transfers(&self, address: &str, limit: u32) -> Result<Vec<TransferRecord>> {
        (**self).recent_transfers(address, limit).await
    }
}
