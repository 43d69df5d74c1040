//! # Direct Transfer Matching
//!
//! Fallback evidence of payment: a plain value transfer from the buyer to the
//! creator, for the right amount, carrying the purchase memo. Only the most
//! recent `window` transactions are looked at, so an older payment is not
//! found. Two identical transfers cannot be told apart.

use crate::address::{AddressCodec, C32Codec};
use crate::chain::{memo_matches, TransferRecord};
use crate::client::TransferIndexer;
use crate::utils::constants::{DEFAULT_AMOUNT_TOLERANCE, DEFAULT_HISTORY_WINDOW, MAX_TOLERANCE_BPS};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    /// Transactions fetched per scan
    pub window: u32,
    /// Inclusive bound on |actual - expected|, capped at 1% of expected
    pub amount_tolerance: u64,
}

impl MatchRules {
    /// Tolerance that applies to one expected amount
    pub fn tolerance_for(&self, expected: u64) -> u64 {
        let cap = (expected as u128 * MAX_TOLERANCE_BPS as u128 / 10_000) as u64;
        self.amount_tolerance.min(cap)
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules {
            window: DEFAULT_HISTORY_WINDOW,
            amount_tolerance: DEFAULT_AMOUNT_TOLERANCE,
        }
    }
}

/// What a matching transfer must look like
#[derive(Debug, Clone)]
pub struct ExpectedTransfer<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub amount: u64,
    pub memo: &'a str,
}

pub struct DirectTransferMatcher<I> {
    indexer: I,
    codec: Arc<dyn AddressCodec>,
    rules: MatchRules,
}

impl<I: TransferIndexer> DirectTransferMatcher<I> {
    pub fn new(indexer: I, rules: MatchRules) -> Self {
        DirectTransferMatcher {
            indexer,
            codec: Arc::new(C32Codec),
            rules,
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn AddressCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn rules(&self) -> MatchRules {
        self.rules
    }

    /// True if the sender's recent history holds a matching transfer.
    /// A failed history query is reported as no match.
    pub async fn verify_direct_transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: u64,
        memo: &str,
    ) -> bool {
        let expected = ExpectedTransfer {
            sender,
            recipient,
            amount,
            memo,
        };
        self.find_direct_transfer(&expected).await.is_some()
    }

    /// First matching transfer in the window, if any
    pub async fn find_direct_transfer(
        &self,
        expected: &ExpectedTransfer<'_>,
    ) -> Option<TransferRecord> {
        let history = match self
            .indexer
            .recent_transfers(expected.sender, self.rules.window)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                log::warn!(
                    "Transfer history for {} unavailable: {}",
                    expected.sender,
                    e
                );
                return None;
            }
        };

        let scanned = history.len();
        let found = history
            .into_iter()
            .find(|tx| self.transfer_matches(tx, expected));

        match &found {
            Some(tx) => log::debug!(
                "Direct transfer {} matches {} -> {} ({})",
                tx.tx_id,
                expected.sender,
                expected.recipient,
                expected.memo
            ),
            None => log::debug!(
                "No direct transfer among {} recent txs of {} matches {} -> {}",
                scanned,
                expected.sender,
                expected.recipient,
                expected.amount
            ),
        }
        found
    }

    pub fn transfer_matches(&self, tx: &TransferRecord, expected: &ExpectedTransfer<'_>) -> bool {
        tx.is_successful_transfer()
            // History also lists incoming transfers
            && self.codec.same_address(&tx.sender, expected.sender)
            && self.codec.same_address(&tx.recipient, expected.recipient)
            && tx.amount > 0
            && tx.amount.abs_diff(expected.amount) <= self.rules.tolerance_for(expected.amount)
            && memo_matches(&tx.memo, expected.memo)
    }
}
