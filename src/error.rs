//! # Error Types
//!
//! Every fallible operation in the library returns [`Result`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid recipient field: {0}")]
    InvalidField(String),

    #[error("invalid contract id: {0}")]
    InvalidContractId(String),

    #[error("invalid value encoding: {0}")]
    InvalidValue(String),

    /// Contract read or indexer query failed (network, status, malformed body)
    #[error("query unavailable: {0}")]
    QueryUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::QueryUnavailable(e.to_string())
    }
}

macro_rules! storage_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Error::Storage(e.to_string())
                }
            }
        )*
    };
}

storage_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
