pub mod access;
pub mod address;
pub mod api;
pub mod bridge;
pub mod chain;
pub mod clarity;
pub mod client;
pub mod error;
pub mod state;
pub mod storage;
pub mod utils;

pub use access::{AccessOutcome, AccessVerifier, DirectTransferMatcher, MatchRules, VerifierConfig};
pub use address::{AddressCodec, C32Codec, ContractId, NativeAddress};
pub use bridge::{decode_recipient, encode_recipient, BridgeDeposit, RecipientCoder, RecipientField};
pub use client::{ContractReader, HiroClient, TransferIndexer};
pub use error::{Error, Result};

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};

/// Starts file logging under `logs/` with a copy on stderr.
/// The returned handle must stay alive for the async writer to flush.
pub fn init_logger(spec: &str) -> std::result::Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(spec)?
        .log_to_file(FileSpec::default().directory("logs").basename("paywall"))
        .duplicate_to_stderr(Duplicate::Info)
        .write_mode(WriteMode::Async)
        .rotate(
            Criterion::Size(10 * 1024 * 1024), // 10MB
            Naming::Timestamps,
            Cleanup::KeepLogFiles(7),
        )
        .start()
}
