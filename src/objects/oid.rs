//! Object ID (content fingerprint) representation.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// The length of a fingerprint in bytes.
pub const OID_BYTES: usize = 20;

/// The length of a fingerprint as a hexadecimal string.
pub const OID_HEX_LEN: usize = 40;

/// A content fingerprint identifying a blob or a commit.
///
/// Serialized as a 40-character lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    bytes: [u8; OID_BYTES],
}

impl Oid {
    /// Creates an Oid from a 40-character hexadecimal string.
    ///
    /// # Examples
    ///
    /// ```
    /// use minivcs::objects::Oid;
    ///
    /// let oid = Oid::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
    /// assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != OID_HEX_LEN {
            return Err(Error::InvalidOid(hex.to_string()));
        }

        let mut bytes = [0u8; OID_BYTES];

        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let high =
                hex_digit_to_value(chunk[0]).ok_or_else(|| Error::InvalidOid(hex.to_string()))?;
            let low =
                hex_digit_to_value(chunk[1]).ok_or_else(|| Error::InvalidOid(hex.to_string()))?;
            bytes[i] = (high << 4) | low;
        }

        Ok(Oid { bytes })
    }

    /// Creates an Oid from a raw 20-byte digest.
    pub fn from_bytes(bytes: [u8; OID_BYTES]) -> Self {
        Oid { bytes }
    }

    /// Returns the lowercase, 40-character hexadecimal form.
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(OID_HEX_LEN);
        for byte in &self.bytes {
            hex.push(HEX_CHARS[(byte >> 4) as usize]);
            hex.push(HEX_CHARS[(byte & 0x0f) as usize]);
        }
        hex
    }

    /// Returns the first `len` hex digits (clamped to `1..=40`).
    pub fn abbrev(&self, len: usize) -> String {
        let len = len.clamp(1, OID_HEX_LEN);
        self.to_hex()[..len].to_string()
    }

    /// Returns the conventional 7-digit abbreviation.
    pub fn short(&self) -> String {
        self.abbrev(7)
    }

    /// Returns `true` if the hex form starts with `prefix` (case-insensitive).
    pub fn starts_with(&self, prefix: &str) -> bool {
        prefix.len() <= OID_HEX_LEN && self.to_hex().starts_with(&prefix.to_ascii_lowercase())
    }

    /// Returns a reference to the raw digest.
    pub fn as_bytes(&self) -> &[u8; OID_BYTES] {
        &self.bytes
    }
}

/// Returns `true` if `s` is a non-empty run of hex digits no longer than an id.
pub fn is_hex_prefix(s: &str) -> bool {
    !s.is_empty() && s.len() <= OID_HEX_LEN && s.bytes().all(|b| hex_digit_to_value(b).is_some())
}

const HEX_CHARS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

fn hex_digit_to_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short())
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::from_hex(s)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct OidVisitor;

impl<'de> Visitor<'de> for OidVisitor {
    type Value = Oid;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 40-character hex object id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Oid, E> {
        Oid::from_hex(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Oid, D::Error> {
        deserializer.deserialize_str(OidVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn test_from_hex_normalizes_case() {
        let oid = Oid::from_hex(&EMPTY_SHA1.to_uppercase()).unwrap();
        assert_eq!(oid.to_hex(), EMPTY_SHA1);
    }

    #[test]
    fn test_from_hex_invalid_length() {
        assert!(matches!(
            Oid::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd8070"),
            Err(Error::InvalidOid(_))
        ));
        assert!(matches!(Oid::from_hex(""), Err(Error::InvalidOid(_))));
    }

    #[test]
    fn test_from_hex_invalid_chars() {
        assert!(matches!(
            Oid::from_hex("ga39a3ee5e6b4b0d3255bfef95601890afd80709"),
            Err(Error::InvalidOid(_))
        ));
    }

    #[test]
    fn test_abbrev() {
        let oid = Oid::from_hex(EMPTY_SHA1).unwrap();
        assert_eq!(oid.short(), "da39a3e");
        assert_eq!(oid.abbrev(4), "da39");
        assert_eq!(oid.abbrev(0), "d");
        assert_eq!(oid.abbrev(99), EMPTY_SHA1);
    }

    #[test]
    fn test_starts_with() {
        let oid = Oid::from_hex(EMPTY_SHA1).unwrap();
        assert!(oid.starts_with("da39"));
        assert!(oid.starts_with("DA39A3"));
        assert!(oid.starts_with(EMPTY_SHA1));
        assert!(!oid.starts_with("db"));
    }

    #[test]
    fn test_is_hex_prefix() {
        assert!(is_hex_prefix("abc123"));
        assert!(!is_hex_prefix(""));
        assert!(!is_hex_prefix("master"));
        assert!(!is_hex_prefix(&"a".repeat(41)));
    }

    #[test]
    fn test_display_and_debug() {
        let oid = Oid::from_hex(EMPTY_SHA1).unwrap();
        assert_eq!(format!("{}", oid), EMPTY_SHA1);
        assert_eq!(format!("{:?}", oid), "Oid(da39a3e)");
    }

    #[test]
    fn test_serde_as_hex_string() {
        let oid = Oid::from_hex(EMPTY_SHA1).unwrap();
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, format!("\"{}\"", EMPTY_SHA1));

        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, oid);

        assert!(serde_json::from_str::<Oid>("\"nothex\"").is_err());
    }
}
