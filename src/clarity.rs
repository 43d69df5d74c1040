//! # Contract Value Codec
//!
//! Binary serialization of the native chain's typed contract values. Read-only
//! calls take their arguments in this format and return their result in it,
//! both as `0x` hex strings.

use crate::address::NativeAddress;
use crate::error::{Error, Result};
use crate::utils::constants::ADDRESS_HASH_LEN;
use std::collections::BTreeMap;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_OK: u8 = 0x07;
const TYPE_ERR: u8 = 0x08;
const TYPE_NONE: u8 = 0x09;
const TYPE_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

/// Nesting deeper than this is rejected when decoding
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    Principal(NativeAddress),
    ContractPrincipal(NativeAddress, String),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    None,
    Some(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    /// Entries are kept sorted by name, which is also the wire order
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    pub fn tuple<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ClarityValue)>,
        K: Into<String>,
    {
        ClarityValue::Tuple(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            ClarityValue::Int(v) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Buffer(b) => {
                out.push(TYPE_BUFFER);
                write_len_prefixed(out, b);
            }
            ClarityValue::Bool(true) => out.push(TYPE_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_FALSE),
            ClarityValue::Principal(addr) => {
                out.push(TYPE_STANDARD_PRINCIPAL);
                out.push(addr.version);
                out.extend_from_slice(&addr.hash);
            }
            ClarityValue::ContractPrincipal(addr, name) => {
                out.push(TYPE_CONTRACT_PRINCIPAL);
                out.push(addr.version);
                out.extend_from_slice(&addr.hash);
                out.push(name.len() as u8);
                out.extend_from_slice(name.as_bytes());
            }
            ClarityValue::ResponseOk(v) => {
                out.push(TYPE_OK);
                v.write_to(out);
            }
            ClarityValue::ResponseErr(v) => {
                out.push(TYPE_ERR);
                v.write_to(out);
            }
            ClarityValue::None => out.push(TYPE_NONE),
            ClarityValue::Some(v) => {
                out.push(TYPE_SOME);
                v.write_to(out);
            }
            ClarityValue::List(items) => {
                out.push(TYPE_LIST);
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.write_to(out);
                }
            }
            ClarityValue::Tuple(entries) => {
                out.push(TYPE_TUPLE);
                out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
                for (name, value) in entries {
                    out.push(name.len() as u8);
                    out.extend_from_slice(name.as_bytes());
                    value.write_to(out);
                }
            }
            ClarityValue::StringAscii(s) => {
                out.push(TYPE_STRING_ASCII);
                write_len_prefixed(out, s.as_bytes());
            }
            ClarityValue::StringUtf8(s) => {
                out.push(TYPE_STRING_UTF8);
                write_len_prefixed(out, s.as_bytes());
            }
        }
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.read_value(0)?;
        if reader.pos != bytes.len() {
            return Err(Error::InvalidValue(format!(
                "{} trailing bytes",
                bytes.len() - reader.pos
            )));
        }
        Ok(value)
    }

    /// Accepts an optional `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| Error::InvalidValue(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// `(ok v)` → `v`, anything else unchanged. `(err e)` is an error.
    pub fn unwrap_response_ok(self) -> Result<ClarityValue> {
        match self {
            ClarityValue::ResponseOk(v) => Ok(*v),
            ClarityValue::ResponseErr(e) => {
                Err(Error::InvalidValue(format!("contract returned (err {:?})", e)))
            }
            other => Ok(other),
        }
    }

    /// `(some v)` → `Some(v)`, `none` → `None`, anything else → `Some(self)`
    pub fn unwrap_optional(self) -> Option<ClarityValue> {
        match self {
            ClarityValue::Some(v) => Some(*v),
            ClarityValue::None => None,
            other => Some(other),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClarityValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            ClarityValue::UInt(v) => Some(*v),
            ClarityValue::Int(v) if *v >= 0 => Some(*v as u128),
            _ => None,
        }
    }

    pub fn as_principal(&self) -> Option<&NativeAddress> {
        match self {
            ClarityValue::Principal(addr) | ClarityValue::ContractPrincipal(addr, _) => Some(addr),
            _ => None,
        }
    }

    pub fn tuple_field(&self, name: &str) -> Option<&ClarityValue> {
        match self {
            ClarityValue::Tuple(entries) => entries.get(name),
            _ => None,
        }
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                Error::InvalidValue(format!("truncated value: need {} bytes at {}", n, self.pos))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn read_16(&mut self) -> Result<[u8; 16]> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn read_address(&mut self) -> Result<NativeAddress> {
        let version = self.read_u8()?;
        let mut hash = [0u8; ADDRESS_HASH_LEN];
        hash.copy_from_slice(self.take(ADDRESS_HASH_LEN)?);
        Ok(NativeAddress::new(version, hash))
    }

    fn read_name(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| Error::InvalidValue(e.to_string()))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| Error::InvalidValue(e.to_string()))
    }

    fn read_value(&mut self, depth: usize) -> Result<ClarityValue> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidValue("value nested too deeply".to_string()));
        }
        let tag = self.read_u8()?;
        let value = match tag {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.read_16()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.read_16()?)),
            TYPE_BUFFER => {
                let len = self.read_u32()? as usize;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_STANDARD_PRINCIPAL => ClarityValue::Principal(self.read_address()?),
            TYPE_CONTRACT_PRINCIPAL => {
                let addr = self.read_address()?;
                ClarityValue::ContractPrincipal(addr, self.read_name()?)
            }
            TYPE_OK => ClarityValue::ResponseOk(Box::new(self.read_value(depth + 1)?)),
            TYPE_ERR => ClarityValue::ResponseErr(Box::new(self.read_value(depth + 1)?)),
            TYPE_NONE => ClarityValue::None,
            TYPE_SOME => ClarityValue::Some(Box::new(self.read_value(depth + 1)?)),
            TYPE_LIST => {
                let count = self.read_u32()? as usize;
                // Every element is at least one byte
                if count > self.bytes.len() - self.pos {
                    return Err(Error::InvalidValue(format!("list of {} elements is truncated", count)));
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            TYPE_TUPLE => {
                let count = self.read_u32()?;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let name = self.read_name()?;
                    let value = self.read_value(depth + 1)?;
                    entries.insert(name, value);
                }
                ClarityValue::Tuple(entries)
            }
            TYPE_STRING_ASCII => ClarityValue::StringAscii(self.read_string()?),
            TYPE_STRING_UTF8 => ClarityValue::StringUtf8(self.read_string()?),
            other => {
                return Err(Error::InvalidValue(format!("unknown type prefix 0x{:02x}", other)))
            }
        };
        Ok(value)
    }
}
