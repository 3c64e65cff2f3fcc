//! Local witness signing keys

use crate::config::WitnessNodeConfig;
use crate::errors::SchedulerError;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use sortes_core::{AccountId, PublicKey};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroizing;

/// Signing keys cached for the locally controlled witnesses.
///
/// Keys zeroize on drop. `Debug` lists accounts only.
#[derive(Clone, Default)]
pub struct WitnessKeyring {
    keys: BTreeMap<AccountId, SigningKey>,
}

impl WitnessKeyring {
    /// Empty keyring
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every configured signing key
    pub fn from_config(config: &WitnessNodeConfig) -> Result<Self, SchedulerError> {
        let mut keyring = Self::new();
        for entry in &config.signing_keys {
            let key = decode_secret(&entry.secret_key_hex).map_err(|reason| {
                SchedulerError::Keyring {
                    account: entry.account.clone(),
                    reason,
                }
            })?;
            keyring.insert(entry.account.clone(), key);
        }
        Ok(keyring)
    }

    /// Cache `key` for `account`, replacing any previous key
    pub fn insert(&mut self, account: AccountId, key: SigningKey) {
        self.keys.insert(account, key);
    }

    /// Signing key for `account`
    pub fn signing_key(&self, account: &AccountId) -> Option<&SigningKey> {
        self.keys.get(account)
    }

    /// Public half of `account`'s key
    pub fn public_key(&self, account: &AccountId) -> Option<PublicKey> {
        self.keys
            .get(account)
            .map(|key| PublicKey::from(key.verifying_key()))
    }

    /// Accounts with a cached key
    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.keys.keys()
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is cached
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for WitnessKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitnessKeyring")
            .field("accounts", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn decode_secret(raw: &str) -> Result<SigningKey, String> {
    let decoded = Zeroizing::new(hex::decode(raw.trim()).map_err(|e| e.to_string())?);
    if decoded.len() != SECRET_KEY_LENGTH {
        return Err(format!(
            "expected {SECRET_KEY_LENGTH} bytes, got {}",
            decoded.len()
        ));
    }
    let mut secret = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
    secret.copy_from_slice(&decoded);
    Ok(SigningKey::from_bytes(&secret))
}
