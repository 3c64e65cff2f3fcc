//! Digest and key types
//!
//! Fixed-width digests produced by the SHA-2 family and the 32-byte ed25519
//! public key used as a witness signing identity. All of them render and
//! serialize as lowercase hex so that textual preimages and config files
//! share one encoding.

use crate::errors::{Result, SortesError};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Serde adapter that encodes fixed-size byte arrays as hex strings.
pub mod serde_hex {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize `bytes` as a lowercase hex string
    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize a hex string of exactly `N` bytes
    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; N];
        hex::decode_to_slice(&text, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

/// 256-bit digest (SHA-256)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest256(#[serde(with = "serde_hex")] pub [u8; 32]);

/// 512-bit digest (SHA-512)
///
/// The all-zero value is the "empty" digest and never a valid commitment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest512(#[serde(with = "serde_hex")] pub [u8; 64]);

impl Digest256 {
    /// Borrow the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Digest512 {
    /// The all-zero digest
    pub const EMPTY: Self = Self([0u8; 64]);

    /// Borrow the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// True for the all-zero digest
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Digest512 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest256({})", self.to_hex())
    }
}

impl fmt::Display for Digest512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest512({}..)", &self.to_hex()[..16])
    }
}

/// SHA-256 of `data`
pub fn sha256(data: &[u8]) -> Digest256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    Digest256(output)
}

/// SHA-512 of `data`
pub fn sha512(data: &[u8]) -> Digest512 {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&hasher.finalize());
    Digest512(output)
}

/// Ed25519 public key identifying a witness's block-signing identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "serde_hex")] pub [u8; 32]);

impl PublicKey {
    /// Borrow the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, also used as the key's textual form in hash preimages
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode into a verifying key, rejecting points that are not valid ed25519 keys
    pub fn to_verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|e| SortesError::crypto(format!("invalid ed25519 public key: {e}")))
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = SortesError;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_known_vector() {
        // SHA-512("abc") from FIPS 180-2
        let digest = sha512(b"abc");
        assert!(digest.to_hex().starts_with("ddaf35a193617aba"));
    }

    #[test]
    fn test_empty_digest() {
        assert!(Digest512::EMPTY.is_empty());
        assert!(Digest512::default().is_empty());
        assert!(!sha512(b"7").is_empty());
    }

    #[test]
    fn test_hex_serde_roundtrip() {
        let digest = sha512(b"seed");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let back: Digest512 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_public_key_parse_rejects_short_input() {
        assert!("abcd".parse::<PublicKey>().is_err());
        let key = PublicKey([9u8; 32]);
        assert_eq!(key.to_hex().parse::<PublicKey>().unwrap(), key);
    }
}
