//! Witness node configuration

use serde::{Deserialize, Serialize};
use sortes_core::config::env_override;
use sortes_core::{AccountId, Result, SortesConfig, SortesError};
use std::collections::BTreeSet;
use std::fmt;
use zeroize::Zeroize;

/// Default binomial success probability for reveal offsets
pub const DEFAULT_REVEAL_BIAS: f64 = 0.8;

/// Hex-encoded ed25519 secret key for one witness
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeyEntry {
    /// Witness account
    pub account: AccountId,
    /// 32-byte secret key, hex encoded
    pub secret_key_hex: String,
}

impl fmt::Debug for SigningKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyEntry")
            .field("account", &self.account)
            .field("secret_key_hex", &"<redacted>")
            .finish()
    }
}

impl Drop for SigningKeyEntry {
    fn drop(&mut self) {
        self.secret_key_hex.zeroize();
    }
}

/// Configuration of the local witness scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessNodeConfig {
    /// Whether this node produces blocks; the scheduler is inert otherwise
    pub production_enabled: bool,
    /// Locally controlled witness accounts
    pub witnesses: Vec<AccountId>,
    /// Signing keys for the local witnesses
    pub signing_keys: Vec<SigningKeyEntry>,
    /// Operator-supplied value mixed into the scheduler seed
    pub operator_seed: Option<String>,
    /// Success probability of the reveal offset draw, in `(0, 1]`
    pub reveal_bias: f64,
}

impl Default for WitnessNodeConfig {
    fn default() -> Self {
        Self {
            production_enabled: false,
            witnesses: Vec::new(),
            signing_keys: Vec::new(),
            operator_seed: None,
            reveal_bias: DEFAULT_REVEAL_BIAS,
        }
    }
}

impl WitnessNodeConfig {
    /// Whether the scheduler has anything to do
    pub fn is_active(&self) -> bool {
        self.production_enabled && !self.witnesses.is_empty()
    }
}

impl SortesConfig for WitnessNodeConfig {
    fn merge_with_env(&mut self) -> Result<()> {
        if let Some(enabled) = env_override("PRODUCTION_ENABLED")? {
            self.production_enabled = enabled;
        }
        if let Some(seed) = env_override::<String>("OPERATOR_SEED")? {
            self.operator_seed = Some(seed);
        }
        if let Some(bias) = env_override("REVEAL_BIAS")? {
            self.reveal_bias = bias;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.reveal_bias > 0.0 && self.reveal_bias <= 1.0) {
            return Err(SortesError::config(format!(
                "reveal_bias must be in (0, 1], got {}",
                self.reveal_bias
            )));
        }

        let mut seen = BTreeSet::new();
        for witness in &self.witnesses {
            if !seen.insert(witness) {
                return Err(SortesError::config(format!(
                    "witness {witness} listed twice"
                )));
            }
        }

        let mut keyed = BTreeSet::new();
        for entry in &self.signing_keys {
            if !keyed.insert(&entry.account) {
                return Err(SortesError::config(format!(
                    "signing key for {} listed twice",
                    entry.account
                )));
            }
        }
        Ok(())
    }
}
