//! Deterministic witness keys

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use sortes_core::{AccountId, PublicKey};

/// Account id from a literal name
pub fn account(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

/// Key test fixture for consistent witness key generation
#[derive(Debug, Clone)]
pub struct KeyTestFixture {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyTestFixture {
    /// Key derived directly from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Key derived from SHA-256 of a seed string
    pub fn from_seed_string(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self::from_seed(&bytes)
    }

    /// Signing key
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Verifying key
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Public key as registered on chain
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.verifying_key)
    }

    /// Secret key as hex, for config fixtures
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_string_is_deterministic() {
        let a = KeyTestFixture::from_seed_string("init0");
        let b = KeyTestFixture::from_seed_string("init0");
        let c = KeyTestFixture::from_seed_string("init1");
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), c.public_key());
        assert_eq!(a.secret_hex().len(), 64);
    }
}
