//! Commitment hashing
//!
//! Two schemes exist:
//!
//! - **Plain** (v1, v2): `H512(str(value))`
//! - **Chained** (v3):
//!   `H512(str(value) || H256(str(value) || H512(str(prev_seed) || str(witness_key) || H512(str(epoch_marker)))))`
//!
//! Every preimage is text. Numbers are rendered in decimal, keys and nested
//! digests in lowercase hex. Each nested digest and the witness key are fixed
//! width, so the variable-width decimal prefix of every concatenation is
//! recoverable and distinct inputs never share a preimage.

use serde::{Deserialize, Serialize};
use sortes_core::{sha256, sha512, Digest512, PublicKey, Timestamp};
use subtle::ConstantTimeEq;

/// Version-specific inputs bound into a commitment besides the secret value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashInputs {
    /// No binding beyond the value
    Plain,
    /// Bound to the epoch, the witness identity and the previous seed
    Chained {
        /// Epoch the commitment targets
        epoch_marker: Timestamp,
        /// Committing witness's signing key
        witness_key: PublicKey,
        /// Seed aggregated for the previous epoch
        prev_seed: u64,
    },
}

/// `H512(str(value))`
pub fn plain_commitment(value: u64) -> Digest512 {
    sha512(value.to_string().as_bytes())
}

/// Chained v3 commitment.
pub fn chained_commitment(
    value: u64,
    epoch_marker: Timestamp,
    witness_key: &PublicKey,
    prev_seed: u64,
) -> Digest512 {
    let value_text = value.to_string();
    let epoch_digest = sha512(epoch_marker.to_string().as_bytes());
    let anchor = sha512(
        format!("{prev_seed}{}{}", witness_key.to_hex(), epoch_digest.to_hex()).as_bytes(),
    );
    let binding = sha256(format!("{value_text}{}", anchor.to_hex()).as_bytes());
    sha512(format!("{value_text}{}", binding.to_hex()).as_bytes())
}

/// Commitment for `value` under the given scheme
pub fn commitment(value: u64, inputs: &HashInputs) -> Digest512 {
    match inputs {
        HashInputs::Plain => plain_commitment(value),
        HashInputs::Chained {
            epoch_marker,
            witness_key,
            prev_seed,
        } => chained_commitment(value, *epoch_marker, witness_key, *prev_seed),
    }
}

/// Whether `value` opens `stored` under the given scheme.
pub fn matches(value: u64, stored: &Digest512, inputs: &HashInputs) -> bool {
    let computed = commitment(value, inputs);
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}
