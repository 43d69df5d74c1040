//! # c32check
//!
//! Base-32 encoding with a double SHA-256 checksum, used for native account
//! addresses (`S` + version digit + c32(hash ‖ checksum)).

use super::{AddressCodec, NativeAddress};
use crate::error::{Error, Result};
use crate::utils::constants::{ADDRESS_CHECKSUM_LEN, ADDRESS_HASH_LEN};
use sha2::{Digest, Sha256};

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Address prefix shared by every network
const ADDRESS_PREFIX: char = 'S';

/// Encode bytes as a c32 string. Each leading zero byte becomes one leading `0`.
pub fn c32_encode(data: &[u8]) -> String {
    // Digits are collected least significant first
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for &byte in data.iter().rev() {
        acc |= (byte as u32) << bits;
        bits += 8;
        while bits >= 5 {
            digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
            acc >>= 5;
            bits -= 5;
        }
    }
    if bits > 0 {
        digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
    }

    while digits.last() == Some(&b'0') {
        digits.pop();
    }
    let leading_zeros = data.iter().take_while(|b| **b == 0).count();
    digits.extend(std::iter::repeat(b'0').take(leading_zeros));
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Decode a c32 string. Accepts lower case and the `O`/`I`/`L` look-alikes.
pub fn c32_decode(input: &str) -> Result<Vec<u8>> {
    let normalized = normalize(input);

    let mut bytes: Vec<u8> = Vec::with_capacity(normalized.len() * 5 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for c in normalized.chars().rev() {
        let value = digit_value(c)
            .ok_or_else(|| Error::InvalidAddress(format!("invalid c32 character '{}'", c)))?;
        acc |= (value as u32) << bits;
        bits += 5;
        while bits >= 8 {
            bytes.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        bytes.push((acc & 0xff) as u8);
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    let leading_zeros = normalized.chars().take_while(|c| *c == '0').count();
    bytes.extend(std::iter::repeat(0u8).take(leading_zeros));
    bytes.reverse();

    Ok(bytes)
}

/// First four bytes of sha256(sha256(version ‖ data))
fn checksum(version: u8, data: &[u8]) -> [u8; ADDRESS_CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let first = hasher.finalize();
    let second = Sha256::digest(first);

    let mut out = [0u8; ADDRESS_CHECKSUM_LEN];
    out.copy_from_slice(&second[..ADDRESS_CHECKSUM_LEN]);
    out
}

fn normalize(input: &str) -> String {
    input
        .to_ascii_uppercase()
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'L' => '1',
            other => other,
        })
        .collect()
}

fn digit_value(c: char) -> Option<u8> {
    C32_ALPHABET
        .iter()
        .position(|d| *d as char == c)
        .map(|p| p as u8)
}

/// `version digit` + c32(data ‖ checksum)
pub fn c32check_encode(version: u8, data: &[u8]) -> Result<String> {
    if version as usize >= C32_ALPHABET.len() {
        return Err(Error::InvalidAddress(format!(
            "version {} has no c32 digit",
            version
        )));
    }
    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum(version, data));

    let mut out = String::with_capacity(1 + payload.len() * 8 / 5 + 1);
    out.push(C32_ALPHABET[version as usize] as char);
    out.push_str(&c32_encode(&payload));
    Ok(out)
}

pub fn c32check_decode(input: &str) -> Result<(u8, Vec<u8>)> {
    let normalized = normalize(input);
    let mut chars = normalized.chars();
    let version_char = chars
        .next()
        .ok_or_else(|| Error::InvalidAddress("empty c32check string".to_string()))?;
    let version = digit_value(version_char)
        .ok_or_else(|| Error::InvalidAddress(format!("invalid version digit '{}'", version_char)))?;

    let payload = c32_decode(chars.as_str())?;
    if payload.len() < ADDRESS_CHECKSUM_LEN {
        return Err(Error::InvalidAddress("payload shorter than checksum".to_string()));
    }
    let (data, expected) = payload.split_at(payload.len() - ADDRESS_CHECKSUM_LEN);
    if checksum(version, data) != expected {
        return Err(Error::InvalidAddress("checksum mismatch".to_string()));
    }

    Ok((version, data.to_vec()))
}

/// The native chain's standard address format
#[derive(Debug, Clone, Copy, Default)]
pub struct C32Codec;

impl AddressCodec for C32Codec {
    fn decode_address(&self, address: &str) -> Result<NativeAddress> {
        let body = address
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' does not start with 'S'", address)))?;
        if body.len() < 6 {
            return Err(Error::InvalidAddress(format!("'{}' is too short", address)));
        }

        let (version, data) = c32check_decode(body)?;
        let hash: [u8; ADDRESS_HASH_LEN] = data.as_slice().try_into().map_err(|_| {
            Error::InvalidAddress(format!(
                "expected {} hash bytes, found {}",
                ADDRESS_HASH_LEN,
                data.len()
            ))
        })?;

        Ok(NativeAddress::new(version, hash))
    }

    fn encode_address(&self, address: &NativeAddress) -> Result<String> {
        let body = c32check_encode(address.version, &address.hash)?;
        Ok(format!("{}{}", ADDRESS_PREFIX, body))
    }
}
