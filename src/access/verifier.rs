//! # Access Verifier
//!
//! Decides whether a buyer has paid for a content id.
//!
//! 1. Ask the paywall contract for the access flag. `true` grants access;
//!    `false` or a failed query moves on to step 2.
//! 2. Fetch the content's creator and price. If that fails access is denied,
//!    otherwise the buyer's history is scanned for a direct transfer to the
//!    creator with memo `Payment for content #<id>`.
//!
//! Every failure resolves to a denial; [`AccessVerifier::check_access`] never
//! returns an error.

use super::matcher::{DirectTransferMatcher, ExpectedTransfer, MatchRules};
use crate::address::{AddressCodec, C32Codec, ContractId};
use crate::chain::{payment_memo, ContentInfo};
use crate::clarity::ClarityValue;
use crate::client::{ContractReader, TransferIndexer};
use crate::error::{Error, Result};
use crate::utils::constants::*;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub contract: ContractId,
    pub access_function: String,
    pub content_info_function: String,
    pub rules: MatchRules,
}

impl VerifierConfig {
    pub fn new(contract: ContractId) -> Self {
        VerifierConfig {
            contract,
            access_function: DEFAULT_ACCESS_FUNCTION.to_string(),
            content_info_function: DEFAULT_CONTENT_INFO_FUNCTION.to_string(),
            rules: MatchRules::default(),
        }
    }
}

/// How a grant was established
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum AccessGrant {
    Contract,
    DirectTransfer { tx_id: String },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessOutcome {
    Granted(AccessGrant),
    Denied,
}

impl AccessOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessOutcome::Granted(_))
    }
}

pub struct AccessVerifier<R, I> {
    reader: R,
    matcher: DirectTransferMatcher<I>,
    codec: Arc<dyn AddressCodec>,
    config: VerifierConfig,
}

impl<R: ContractReader, I: TransferIndexer> AccessVerifier<R, I> {
    pub fn new(reader: R, indexer: I, config: VerifierConfig) -> Self {
        let codec: Arc<dyn AddressCodec> = Arc::new(C32Codec);
        let matcher = DirectTransferMatcher::new(indexer, config.rules).with_codec(codec.clone());
        AccessVerifier {
            reader,
            matcher,
            codec,
            config,
        }
    }

    /// Address codec for the buyer principal and for transfer address comparison
    pub fn with_codec(mut self, codec: Arc<dyn AddressCodec>) -> Self {
        self.matcher = self.matcher.with_codec(codec.clone());
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub async fn check_access(&self, buyer: &str, content_id: u64) -> bool {
        self.check_access_detailed(buyer, content_id)
            .await
            .is_granted()
    }

    /// Same decision as [`check_access`](Self::check_access), with the path that granted it
    pub async fn check_access_detailed(&self, buyer: &str, content_id: u64) -> AccessOutcome {
        // A panicking collaborator must not grant access or take the caller down
        match AssertUnwindSafe(self.evaluate(buyer, content_id))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!(
                    "Access check for {} on content #{} panicked; denying",
                    buyer,
                    content_id
                );
                AccessOutcome::Denied
            }
        }
    }

    async fn evaluate(&self, buyer: &str, content_id: u64) -> AccessOutcome {
        match self.contract_access(buyer, content_id).await {
            Ok(true) => {
                log::info!("Access granted to {} for content #{} (contract)", buyer, content_id);
                return AccessOutcome::Granted(AccessGrant::Contract);
            }
            Ok(false) => {}
            Err(e) => log::warn!(
                "Access flag for {} on content #{} unknown, trying direct transfer: {}",
                buyer,
                content_id,
                e
            ),
        }

        let info = match self.content_info(buyer, content_id).await {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Content #{} info unavailable, denying: {}", content_id, e);
                return AccessOutcome::Denied;
            }
        };

        let memo = payment_memo(content_id);
        let expected = ExpectedTransfer {
            sender: buyer,
            recipient: &info.creator,
            amount: info.price,
            memo: &memo,
        };
        match self.matcher.find_direct_transfer(&expected).await {
            Some(tx) => {
                log::info!(
                    "Access granted to {} for content #{} (direct transfer {})",
                    buyer,
                    content_id,
                    tx.tx_id
                );
                AccessOutcome::Granted(AccessGrant::DirectTransfer { tx_id: tx.tx_id })
            }
            None => AccessOutcome::Denied,
        }
    }

    /// Contract access flag. `none` counts as not granted; any non-bool is an error.
    /// Records never expire.
    async fn contract_access(&self, buyer: &str, content_id: u64) -> Result<bool> {
        let principal = self.codec.decode_address(buyer)?;
        let args = [
            ClarityValue::Principal(principal),
            ClarityValue::UInt(content_id as u128),
        ];
        let value = self
            .reader
            .call_read_only(
                &self.config.contract,
                &self.config.access_function,
                &args,
                buyer,
            )
            .await?;

        match value.unwrap_response_ok()?.unwrap_optional() {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| {
                Error::InvalidValue(format!("{} returned {:?}", self.config.access_function, v))
            }),
        }
    }

    pub async fn content_info(&self, caller: &str, content_id: u64) -> Result<ContentInfo> {
        let value = self
            .reader
            .call_read_only(
                &self.config.contract,
                &self.config.content_info_function,
                &[ClarityValue::UInt(content_id as u128)],
                caller,
            )
            .await?;
        ContentInfo::from_clarity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::NativeAddress;
    use crate::chain::{TransferRecord, TxKind, TxStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BUYER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";
    const CREATOR: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    #[derive(Clone)]
    enum Reply {
        Value(ClarityValue),
        Fail,
        Panic,
    }

    struct FakeReader {
        access: Reply,
        content: Reply,
        access_calls: AtomicUsize,
        content_calls: AtomicUsize,
    }

    impl FakeReader {
        fn new(access: Reply, content: Reply) -> Arc<Self> {
            Arc::new(FakeReader {
                access,
                content,
                access_calls: AtomicUsize::new(0),
                content_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContractReader for FakeReader {
        async fn call_read_only(
            &self,
            _contract: &ContractId,
            function: &str,
            args: &[ClarityValue],
            _caller: &str,
        ) -> Result<ClarityValue> {
            let reply = if function == DEFAULT_ACCESS_FUNCTION {
                assert_eq!(args.len(), 2);
                self.access_calls.fetch_add(1, Ordering::SeqCst);
                self.access.clone()
            } else {
                assert_eq!(args, &[ClarityValue::UInt(7)]);
                self.content_calls.fetch_add(1, Ordering::SeqCst);
                self.content.clone()
            };
            match reply {
                Reply::Value(v) => Ok(v),
                Reply::Fail => Err(Error::QueryUnavailable("503".to_string())),
                Reply::Panic => panic!("reader blew up"),
            }
        }
    }

    struct FakeIndexer {
        txs: Vec<TransferRecord>,
        calls: AtomicUsize,
    }

    impl FakeIndexer {
        fn new(txs: Vec<TransferRecord>) -> Arc<Self> {
            Arc::new(FakeIndexer {
                txs,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TransferIndexer for FakeIndexer {
        async fn recent_transfers(&self, _address: &str, _limit: u32) -> Result<Vec<TransferRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.txs.clone())
        }
    }

    fn content(price: u128) -> Reply {
        let creator: NativeAddress = CREATOR.parse().unwrap();
        Reply::Value(ClarityValue::Some(Box::new(ClarityValue::tuple([
            ("creator", ClarityValue::Principal(creator)),
            ("price", ClarityValue::UInt(price)),
        ]))))
    }

    fn paid(amount: u64, memo: &str) -> TransferRecord {
        TransferRecord {
            tx_id: "0xfeed".to_string(),
            status: TxStatus::Success,
            kind: TxKind::TokenTransfer,
            sender: BUYER.to_string(),
            recipient: CREATOR.to_string(),
            amount,
            memo: memo.to_string(),
        }
    }

    fn verifier(
        reader: &Arc<FakeReader>,
        indexer: &Arc<FakeIndexer>,
    ) -> AccessVerifier<Arc<FakeReader>, Arc<FakeIndexer>> {
        let contract = DEFAULT_PAYWALL_CONTRACT.parse().unwrap();
        AccessVerifier::new(reader.clone(), indexer.clone(), VerifierConfig::new(contract))
    }

    #[tokio::test]
    async fn test_contract_grant_skips_fallback() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(true)), content(1_000));
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        let v = verifier(&reader, &indexer);

        assert_eq!(
            v.check_access_detailed(BUYER, 7).await,
            AccessOutcome::Granted(AccessGrant::Contract)
        );
        assert_eq!(reader.content_calls.load(Ordering::SeqCst), 0);
        assert_eq!(indexer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ok_wrapped_flag() {
        let flag = ClarityValue::ResponseOk(Box::new(ClarityValue::Bool(true)));
        let reader = FakeReader::new(Reply::Value(flag), Reply::Fail);
        let indexer = FakeIndexer::new(Vec::new());
        assert!(verifier(&reader, &indexer).check_access(BUYER, 7).await);
    }

    #[tokio::test]
    async fn test_false_flag_falls_back_to_transfer() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(false)), content(1_000));
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        let v = verifier(&reader, &indexer);

        assert_eq!(
            v.check_access_detailed(BUYER, 7).await,
            AccessOutcome::Granted(AccessGrant::DirectTransfer {
                tx_id: "0xfeed".to_string()
            })
        );
        assert_eq!(indexer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_primary_error_is_unknown_not_denied() {
        let reader = FakeReader::new(Reply::Fail, content(1_000));
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        assert!(verifier(&reader, &indexer).check_access(BUYER, 7).await);
        assert_eq!(reader.content_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_queries_failing_denies() {
        let reader = FakeReader::new(Reply::Fail, Reply::Fail);
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        assert!(!verifier(&reader, &indexer).check_access(BUYER, 7).await);
        assert_eq!(indexer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_content_denies() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::None), Reply::Value(ClarityValue::None));
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        assert!(!verifier(&reader, &indexer).check_access(BUYER, 7).await);
    }

    #[tokio::test]
    async fn test_panicking_reader_denies() {
        let reader = FakeReader::new(Reply::Panic, Reply::Panic);
        let indexer = FakeIndexer::new(Vec::new());
        assert!(!verifier(&reader, &indexer).check_access(BUYER, 7).await);
    }

    #[tokio::test]
    async fn test_non_bool_flag_treated_as_unknown() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::UInt(1)), content(1_000));
        let indexer = FakeIndexer::new(Vec::new());
        assert!(!verifier(&reader, &indexer).check_access(BUYER, 7).await);
        assert_eq!(reader.content_calls.load(Ordering::SeqCst), 1);
        assert_eq!(indexer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_buyer_still_resolves() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(true)), content(1_000));
        let indexer = FakeIndexer::new(Vec::new());
        assert!(!verifier(&reader, &indexer).check_access("not-an-address", 7).await);
        assert_eq!(reader.access_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_checks_rescan_history() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(false)), content(1_000));
        let indexer = FakeIndexer::new(vec![paid(1_000, "Payment for content #7")]);
        let v = verifier(&reader, &indexer);
        assert!(v.check_access(BUYER, 7).await);
        assert!(v.check_access(BUYER, 7).await);
        assert_eq!(indexer.calls.load(Ordering::SeqCst), 2);
    }

    /// Resolves short account aliases, everything else as c32
    struct AliasCodec;

    impl AddressCodec for AliasCodec {
        fn decode_address(&self, address: &str) -> Result<NativeAddress> {
            match address {
                "alice" => BUYER.parse(),
                "carol" => CREATOR.parse(),
                other => C32Codec.decode_address(other),
            }
        }

        fn encode_address(&self, address: &NativeAddress) -> Result<String> {
            C32Codec.encode_address(address)
        }
    }

    #[tokio::test]
    async fn test_injected_codec_decodes_buyer() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(true)), content(1_000));
        let indexer = FakeIndexer::new(Vec::new());

        assert!(!verifier(&reader, &indexer).check_access("alice", 7).await);
        assert_eq!(reader.access_calls.load(Ordering::SeqCst), 0);

        let v = verifier(&reader, &indexer).with_codec(Arc::new(AliasCodec));
        assert_eq!(
            v.check_access_detailed("alice", 7).await,
            AccessOutcome::Granted(AccessGrant::Contract)
        );
        assert_eq!(reader.access_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_injected_codec_compares_transfer_addresses() {
        let reader = FakeReader::new(Reply::Value(ClarityValue::Bool(false)), content(1_000));
        let mut tx = paid(1_000, "Payment for content #7");
        tx.recipient = "carol".to_string();
        let indexer = FakeIndexer::new(vec![tx]);

        assert!(!verifier(&reader, &indexer).check_access(BUYER, 7).await);

        let v = verifier(&reader, &indexer).with_codec(Arc::new(AliasCodec));
        assert!(v.check_access(BUYER, 7).await);
    }
}
