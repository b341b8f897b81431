//! Canonical CBOR encoding for deterministic record hashing.
//!
//! This module implements the subset of RFC 8949 Core Deterministic Encoding
//! the ledger needs:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are u64 milliseconds)
//!
//! The same record always produces identical bytes, and therefore an
//! identical [`OperationReceipt`], on every platform.

use ciborium::value::Value;

use crate::crypto::Blake3Hash;
use crate::error::CoreError;
use crate::record::DecisionRecord;
use crate::types::{LedgerId, OperationReceipt};

/// Domain separator for operation receipts.
pub const RECEIPT_DOMAIN: &[u8] = b"decision-ledger-receipt-v0:";

/// Record field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const SEQUENCE_ID: u64 = 0;
    pub const CATEGORY: u64 = 1;
    pub const MESSAGE: u64 = 2;
    pub const AUTHOR: u64 = 3;
    pub const RECORDED_AT: u64 = 4;
}

/// Encode a committed record to canonical CBOR bytes.
pub fn canonical_record_bytes(record: &DecisionRecord) -> Result<Vec<u8>, CoreError> {
    let value = record_to_cbor_value(record);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value)?;
    Ok(buf)
}

/// Compute the operation receipt for a record committed to `ledger_id`.
pub fn compute_receipt(
    ledger_id: &LedgerId,
    record: &DecisionRecord,
) -> Result<OperationReceipt, CoreError> {
    let body = canonical_record_bytes(record)?;
    let hash = Blake3Hash::hash_parts(&[RECEIPT_DOMAIN, ledger_id.as_bytes(), &body]);
    Ok(OperationReceipt(*hash.as_bytes()))
}

fn record_to_cbor_value(record: &DecisionRecord) -> Value {
    Value::Map(vec![
        (
            Value::Integer(keys::SEQUENCE_ID.into()),
            Value::Integer(record.sequence_id().value().into()),
        ),
        (
            Value::Integer(keys::CATEGORY.into()),
            Value::Text(record.category().to_owned()),
        ),
        (
            Value::Integer(keys::MESSAGE.into()),
            Value::Text(record.message().to_owned()),
        ),
        (
            Value::Integer(keys::AUTHOR.into()),
            Value::Bytes(record.author().as_bytes().to_vec()),
        ),
        (
            Value::Integer(keys::RECORDED_AT.into()),
            Value::Integer(record.recorded_at().into()),
        ),
    ])
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}
