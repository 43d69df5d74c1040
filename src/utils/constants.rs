//! # Paywall Constants
//!
//! All global constants used by the codec, the verifier and the node.

// ============================================================================
// Recipient Field Layout
// ============================================================================

/// Total width of the remote-chain recipient field
pub const RECIPIENT_FIELD_LEN: usize = 32;

/// Zero bytes in front of the version byte
pub const RECIPIENT_PADDING_LEN: usize = 11;

/// Offset of the version byte inside the field
pub const RECIPIENT_VERSION_OFFSET: usize = RECIPIENT_PADDING_LEN;

/// Offset of the 20-byte hash inside the field
pub const RECIPIENT_HASH_OFFSET: usize = RECIPIENT_VERSION_OFFSET + 1;

/// Length of an account hash (hash160)
pub const ADDRESS_HASH_LEN: usize = 20;

/// Identifier the bridge uses for the native chain
pub const DEFAULT_REMOTE_DOMAIN: u32 = 10003;

// ============================================================================
// Native Address Versions
// ============================================================================

pub const MAINNET_SINGLE_SIG: u8 = 22;
pub const MAINNET_MULTI_SIG: u8 = 20;
pub const TESTNET_SINGLE_SIG: u8 = 26;
pub const TESTNET_MULTI_SIG: u8 = 21;

/// Length of the c32check checksum
pub const ADDRESS_CHECKSUM_LEN: usize = 4;

/// Longest contract name accepted in a contract identifier
pub const MAX_CONTRACT_NAME_LEN: usize = 128;

// ============================================================================
// Direct Transfer Matching
// ============================================================================

/// How many recent transactions the fallback scan looks at
pub const DEFAULT_HISTORY_WINDOW: u32 = 50;

/// Allowed |actual - expected| in smallest units (inclusive)
pub const DEFAULT_AMOUNT_TOLERANCE: u64 = 1_000;

/// Cap on the tolerance as a share of the expected amount, in basis points
pub const MAX_TOLERANCE_BPS: u64 = 100;

/// Memo attached to a direct payment for a content id
pub const PAYMENT_MEMO_PREFIX: &str = "Payment for content #";

/// Memos on plain transfers are zero padded to this width on chain
pub const MEMO_WIRE_LEN: usize = 34;

// ============================================================================
// Paywall Contract
// ============================================================================

/// Read-only function returning the access flag for (buyer, content)
pub const DEFAULT_ACCESS_FUNCTION: &str = "has-access";

/// Read-only function returning {creator, price} for a content id
pub const DEFAULT_CONTENT_INFO_FUNCTION: &str = "get-content-info";

pub const DEFAULT_PAYWALL_CONTRACT: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.content-paywall";

// ============================================================================
// Node
// ============================================================================

/// Public chain API (contract reads + indexer)
pub const DEFAULT_API_URL: &str = "https://api.testnet.hiro.so";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

pub const DEFAULT_DB_PATH: &str = "paywall.db";

pub const DEFAULT_CONFIG_PATH: &str = "paywall.json";

/// HTTP timeout for chain API calls (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
