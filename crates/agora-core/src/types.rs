//! Strong type definitions for the Agora exchange.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A 32-byte expression address, computed by the backend as
/// Blake3(domain ++ canonical_envelope_bytes).
///
/// This is the content-address of a published expression. Two envelopes
/// with the same content have the same address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex. Accepts upper, lower, or mixed case.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s)
            .map_err(|e| CoreError::MalformedAddress(format!("{s:?}: {e}")))?;
        if bytes.len() != 32 {
            return Err(CoreError::MalformedAddress(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// An opaque author identifier with optional profile metadata.
///
/// Identity is the id string alone: equality, ordering, hashing, and
/// serialization all ignore the metadata, so a display name can never
/// change which inbox a delivery lands in or what bytes get signed.
#[derive(Clone, Debug)]
pub struct Author {
    id: String,
    display_name: Option<String>,
    contact: Option<String>,
}

impl Author {
    /// Create an author from its opaque id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            contact: None,
        }
    }

    /// Attach a display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach contact metadata.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// The opaque id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Contact metadata, if any.
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Author {}

impl PartialOrd for Author {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Author {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Author {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<&str> for Author {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for Author {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for Author {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Author::new(id))
    }
}

/// A UTC instant at millisecond precision.
///
/// Canonical text form is RFC 3339 with exactly three fractional digits
/// and a `Z` suffix, e.g. `2024-03-01T12:30:00.000Z`. Parsing accepts any
/// RFC 3339 offset and normalizes to UTC; sub-millisecond digits are
/// truncated so a round-trip through text is lossless.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time, truncated to milliseconds.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// Parse from RFC 3339 text.
    pub fn from_rfc3339(s: &str) -> Result<Self, CoreError> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::MalformedTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(parsed.with_timezone(&Utc).trunc_subsecs(3)))
    }

    /// Canonical RFC 3339 text.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Build from milliseconds since the Unix epoch.
    pub fn from_millis(ms: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(ms).map(Self)
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The underlying chrono instant.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

/// A pagination request.
///
/// `size == 0` asks for the backend's default page size. `number` is
/// zero-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub size: u32,
    pub number: u32,
}

impl Page {
    pub const fn new(size: u32, number: u32) -> Self {
        Self { size, number }
    }

    /// The first page at the given size.
    pub const fn first(size: u32) -> Self {
        Self { size, number: 0 }
    }
}

/// A half-open time range `[from, until)`. `None` bounds are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<Timestamp>,
    pub until: Option<Timestamp>,
}

impl TimeRange {
    /// Everything at or after `from`.
    pub const fn since(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    /// Everything strictly before `until`.
    pub const fn before(until: Timestamp) -> Self {
        Self {
            from: None,
            until: Some(until),
        }
    }

    /// Whether the instant falls inside the range.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        if let Some(from) = &self.from {
            if ts < from {
                return false;
            }
        }
        if let Some(until) = &self.until {
            if ts >= until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_bytes([0x42; 32]);
        let hex = addr.to_hex();
        let recovered = Address::from_hex(&hex).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn test_address_parse_is_case_insensitive() {
        let addr = Address::from_bytes([0xab; 32]);
        let upper = addr.to_hex().to_uppercase();
        let recovered = Address::from_hex(&upper).unwrap();
        assert_eq!(addr, recovered);
        // Display stays lowercase regardless of how it was parsed.
        assert_eq!(recovered.to_string(), addr.to_hex());
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(Address::from_hex("zz").is_err());
        assert!(Address::from_hex("abcd").is_err());
        assert!(Address::from_hex(&"ab".repeat(33)).is_err());
    }

    #[test]
    fn test_address_debug_is_truncated() {
        let addr = Address::from_bytes([0xcd; 32]);
        let debug = format!("{:?}", addr);
        assert!(debug.starts_with("Address("));
        assert!(debug.len() < 30);
    }

    #[test]
    fn test_author_identity_ignores_metadata() {
        let plain = Author::new("did:key:alice");
        let decorated = Author::new("did:key:alice")
            .with_display_name("Alice")
            .with_contact("alice@example.org");
        assert_eq!(plain, decorated);

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(plain);
        assert!(set.contains(&decorated));
    }

    #[test]
    fn test_author_serializes_as_plain_id() {
        let author = Author::new("did:key:alice").with_display_name("Alice");
        let json = serde_json::to_string(&author).unwrap();
        assert_eq!(json, "\"did:key:alice\"");
        let back: Author = serde_json::from_str(&json).unwrap();
        assert_eq!(back, author);
        assert_eq!(back.display_name(), None);
    }

    #[test]
    fn test_timestamp_canonical_text() {
        let ts = Timestamp::from_rfc3339("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_timestamp_normalizes_offset_to_utc() {
        let ts = Timestamp::from_rfc3339("2024-03-01T14:30:00.500+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:00.500Z");
    }

    #[test]
    fn test_timestamp_truncates_submillis() {
        let ts = Timestamp::from_rfc3339("2024-03-01T00:00:00.123999Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T00:00:00.123Z");
        let roundtrip = Timestamp::from_rfc3339(&ts.to_rfc3339()).unwrap();
        assert_eq!(ts, roundtrip);
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(Timestamp::from_rfc3339("not a time").is_err());
        assert!(Timestamp::from_rfc3339("2024-13-01T00:00:00Z").is_err());
        assert!(Timestamp::from_rfc3339("").is_err());
    }

    #[test]
    fn test_timestamp_millis_roundtrip() {
        let ts = Timestamp::from_rfc3339("2024-03-01T12:30:00.250Z").unwrap();
        let back = Timestamp::from_millis(ts.timestamp_millis()).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn test_time_range_is_half_open() {
        let from = Timestamp::from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let until = Timestamp::from_rfc3339("2024-02-01T00:00:00Z").unwrap();
        let range = TimeRange {
            from: Some(from),
            until: Some(until),
        };
        assert!(range.contains(&from));
        assert!(!range.contains(&until));
        let inside = Timestamp::from_rfc3339("2024-01-15T06:00:00Z").unwrap();
        assert!(range.contains(&inside));
    }

    #[test]
    fn test_time_range_default_is_unbounded() {
        let range = TimeRange::default();
        assert!(range.contains(&Timestamp::now()));
    }
}
