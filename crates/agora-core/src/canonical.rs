//! Canonical JSON encoding for deterministic serialization.
//!
//! The canonical form is JSON with:
//! - Mapping keys sorted by byte comparison at every depth
//! - No insignificant whitespace
//! - serde_json-compatible string escaping
//! - Shortest-form number rendering
//!
//! The canonical encoding is critical: it ensures that the same expression
//! produces identical bytes (and thus identical addresses) across all
//! platforms. Signing input and address input both carry a versioned domain
//! prefix so the two can never be confused and future encodings stay
//! distinguishable.

use std::io::Write;

use crate::expression::SignedExpression;
use crate::types::{Address, Author, Timestamp};
use crate::value::{CanonicalValue, Value};

/// Domain prefix for the expression signing input.
pub const SIGN_DOMAIN: &[u8] = b"agora-expression-sign-v1:";

/// Domain prefix for address derivation.
pub const ADDRESS_DOMAIN: &[u8] = b"agora-expression-addr-v1:";

/// Encode a payload to canonical JSON bytes.
pub fn payload_bytes(data: &CanonicalValue) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, data.as_value());
    buf
}

/// Construct the signing input for an expression.
///
/// Format: SIGN_DOMAIN || `{"author":…,"data":…,"timestamp":…}` with keys
/// in sorted order. The proof itself is never part of its own input.
pub fn signable_bytes(author: &Author, timestamp: &Timestamp, data: &CanonicalValue) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIGN_DOMAIN.len() + 128);
    buf.extend_from_slice(SIGN_DOMAIN);
    buf.push(b'{');
    write_key(&mut buf, "author");
    write_string(&mut buf, author.id());
    buf.push(b',');
    write_key(&mut buf, "data");
    write_value(&mut buf, data.as_value());
    buf.push(b',');
    write_key(&mut buf, "timestamp");
    write_string(&mut buf, &timestamp.to_rfc3339());
    buf.push(b'}');
    buf
}

/// Encode a complete envelope to canonical JSON bytes.
///
/// Keys in sorted order: author, data, proof (key, signature), timestamp.
pub fn envelope_bytes(expression: &SignedExpression) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.push(b'{');
    write_key(&mut buf, "author");
    write_string(&mut buf, expression.author.id());
    buf.push(b',');
    write_key(&mut buf, "data");
    write_value(&mut buf, expression.data.as_value());
    buf.push(b',');
    write_key(&mut buf, "proof");
    buf.push(b'{');
    write_key(&mut buf, "key");
    write_string(&mut buf, &expression.proof.key);
    buf.push(b',');
    write_key(&mut buf, "signature");
    write_string(&mut buf, &expression.proof.signature.to_hex());
    buf.push(b'}');
    buf.push(b',');
    write_key(&mut buf, "timestamp");
    write_string(&mut buf, &expression.timestamp.to_rfc3339());
    buf.push(b'}');
    buf
}

/// Derive the content address of an envelope.
///
/// Format: Blake3(ADDRESS_DOMAIN || envelope_bytes). Backends assign
/// addresses, but they all derive them here so addresses are predictable
/// from envelope content alone.
pub fn derive_address(expression: &SignedExpression) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ADDRESS_DOMAIN);
    hasher.update(&envelope_bytes(expression));
    Address(*hasher.finalize().as_bytes())
}

/// Write a mapping key followed by the separator.
fn write_key(buf: &mut Vec<u8>, key: &str) {
    write_string(buf, key);
    buf.push(b':');
}

/// Recursively write a value as canonical JSON.
///
/// Mapping entries are sorted here as well, so the writer is deterministic
/// for any input order; `CanonicalValue` additionally guarantees the
/// absence of duplicate keys.
fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(buf, s),
        Value::Sequence(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item);
            }
            buf.push(b']');
        }
        Value::Mapping(entries) => {
            let mut sorted: Vec<&(String, Value)> = entries.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            buf.push(b'{');
            for (i, (key, item)) in sorted.iter().map(|e| (&e.0, &e.1)).enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_key(buf, key);
                write_value(buf, item);
            }
            buf.push(b'}');
        }
    }
}

/// Write a JSON string with serde_json-compatible escaping.
///
/// Short escapes for the usual control characters, `\u00XX` for the rest
/// below 0x20, everything else as raw UTF-8.
fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{08}' => buf.extend_from_slice(b"\\b"),
            '\u{0c}' => buf.extend_from_slice(b"\\f"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}
