//! # Remote Recipient Field
//!
//! The 32-byte value a remote-chain bridge contract uses to identify the
//! native-chain destination of a deposit:
//!
//! ```text
//! [ 0x00 × 11 ][ version ][ hash160 × 20 ]
//! ```
//!
//! The 21 meaningful bytes are right aligned. Any other layout resolves to an
//! address the bridge cannot mint to.

use crate::address::{AddressCodec, C32Codec, NativeAddress};
use crate::error::{Error, Result};
use crate::utils::constants::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipientField(pub [u8; RECIPIENT_FIELD_LEN]);

impl RecipientField {
    /// Pack a native address into the field layout
    pub fn from_native(address: &NativeAddress) -> Self {
        let mut buf = [0u8; RECIPIENT_FIELD_LEN];
        buf[RECIPIENT_VERSION_OFFSET] = address.version;
        buf[RECIPIENT_HASH_OFFSET..].copy_from_slice(&address.hash);
        RecipientField(buf)
    }

    /// Read version from byte 11 and hash from bytes 12..32. The padding is not checked.
    pub fn to_native(&self) -> NativeAddress {
        let mut hash = [0u8; ADDRESS_HASH_LEN];
        hash.copy_from_slice(&self.0[RECIPIENT_HASH_OFFSET..]);
        NativeAddress::new(self.0[RECIPIENT_VERSION_OFFSET], hash)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let buf: [u8; RECIPIENT_FIELD_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidField(format!(
                "expected {} bytes, found {}",
                RECIPIENT_FIELD_LEN,
                bytes.len()
            ))
        })?;
        Ok(RecipientField(buf))
    }

    /// Parse `0x` + 64 hex characters (prefix optional). No padding or truncation.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != RECIPIENT_FIELD_LEN * 2 {
            return Err(Error::InvalidField(format!(
                "expected {} hex characters, found {}",
                RECIPIENT_FIELD_LEN * 2,
                digits.len()
            )));
        }
        let bytes = hex::decode(digits).map_err(|e| Error::InvalidField(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; RECIPIENT_FIELD_LEN] {
        &self.0
    }
}

impl fmt::Display for RecipientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RecipientField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for RecipientField {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecipientField {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        RecipientField::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Encoder between native address strings and recipient fields
#[derive(Debug, Clone, Default)]
pub struct RecipientCoder<C = C32Codec> {
    codec: C,
}

impl RecipientCoder<C32Codec> {
    pub fn new() -> Self {
        RecipientCoder { codec: C32Codec }
    }
}

impl<C: AddressCodec> RecipientCoder<C> {
    pub fn with_codec(codec: C) -> Self {
        RecipientCoder { codec }
    }

    /// Address string → field. Fails with `InvalidAddress` if the string does not decode.
    /// Lower case and look-alike input encodes like its canonical form, so
    /// `decode(encode(a)) == a` holds for canonical addresses only.
    pub fn encode(&self, address: &str) -> Result<RecipientField> {
        let native = self.codec.decode_address(address)?;
        Ok(RecipientField::from_native(&native))
    }

    /// Field → address string
    pub fn decode(&self, field: &RecipientField) -> Result<String> {
        self.codec
            .encode_address(&field.to_native())
            .map_err(|e| Error::InvalidField(e.to_string()))
    }

    /// Hex string → address string; rejects anything other than exactly 32 bytes
    pub fn decode_hex(&self, field: &str) -> Result<String> {
        self.decode(&RecipientField::from_hex(field)?)
    }
}

/// `0x`-prefixed recipient field for an address string
pub fn encode_recipient(address: &str) -> Result<String> {
    RecipientCoder::new().encode(address).map(|f| f.to_hex())
}

/// Native address string for a `0x`-prefixed recipient field
pub fn decode_recipient(field: &str) -> Result<String> {
    RecipientCoder::new().decode_hex(field)
}
