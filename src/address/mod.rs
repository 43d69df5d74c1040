//! # Native Addresses
//!
//! Account identifiers on the native chain, the codec seam used to parse and
//! print them, and contract identifiers built on top.

pub mod c32;

pub use c32::C32Codec;

use crate::error::{Error, Result};
use crate::utils::constants::{ADDRESS_HASH_LEN, MAX_CONTRACT_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A native-chain account: network/kind version plus hash160
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeAddress {
    pub version: u8,
    #[serde(with = "hex_hash")]
    pub hash: [u8; ADDRESS_HASH_LEN],
}

impl NativeAddress {
    pub fn new(version: u8, hash: [u8; ADDRESS_HASH_LEN]) -> Self {
        NativeAddress { version, hash }
    }
}

impl FromStr for NativeAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        C32Codec.decode_address(s)
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match C32Codec.encode_address(self) {
            Ok(s) => f.write_str(&s),
            // Versions without a c32 digit still need a printable form
            Err(_) => write!(f, "{:02x}:{}", self.version, hex::encode(self.hash)),
        }
    }
}

/// String form ⇄ {version, hash}
pub trait AddressCodec: Send + Sync {
    fn decode_address(&self, address: &str) -> Result<NativeAddress>;
    fn encode_address(&self, address: &NativeAddress) -> Result<String>;

    /// Equal when both decode to the same {version, hash}; otherwise exact string match
    fn same_address(&self, a: &str, b: &str) -> bool {
        match (self.decode_address(a), self.decode_address(b)) {
            (Ok(x), Ok(y)) => x == y,
            _ => a == b,
        }
    }
}

/// `<address>.<contract-name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractId {
    pub address: NativeAddress,
    pub name: String,
}

impl ContractId {
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }
}

impl FromStr for ContractId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, name) = s
            .split_once('.')
            .ok_or_else(|| Error::InvalidContractId(format!("'{}' has no '.'", s)))?;
        let address = addr
            .parse::<NativeAddress>()
            .map_err(|e| Error::InvalidContractId(e.to_string()))?;

        if !is_valid_contract_name(name) {
            return Err(Error::InvalidContractId(format!(
                "'{}' is not a valid contract name",
                name
            )));
        }

        Ok(ContractId {
            address,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

fn is_valid_contract_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
    starts_with_letter
        && name.len() <= MAX_CONTRACT_NAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

mod hex_hash {
    use super::ADDRESS_HASH_LEN;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; ADDRESS_HASH_LEN], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; ADDRESS_HASH_LEN], D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("hash must be 20 bytes"))
    }
}
