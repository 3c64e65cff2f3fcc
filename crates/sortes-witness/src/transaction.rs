//! Signed commit-reveal transactions
//!
//! A transaction wraps one operation with an expiration time. Its canonical
//! encoding is bincode; the transaction id is SHA-256 of that encoding and
//! the witness signs the same bytes.

use crate::errors::BroadcastError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use serde::{Deserialize, Serialize};
use sortes_core::{sha256, PublicKey, Timestamp, TxId};
use sortes_randomness::CommitRevealOperation;

/// Seconds a scheduler-built transaction stays valid
pub const TX_EXPIRATION_SECS: u64 = 30;

/// Unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The single operation carried
    pub operation: CommitRevealOperation,
    /// Latest block time at which the transaction may be included
    pub expiration: Timestamp,
}

impl Transaction {
    /// Build a transaction expiring [`TX_EXPIRATION_SECS`] after `now`
    pub fn new(operation: CommitRevealOperation, now: Timestamp) -> Self {
        Self {
            operation,
            expiration: now.plus(TX_EXPIRATION_SECS),
        }
    }

    /// Canonical bytes that are hashed and signed
    pub fn signing_bytes(&self) -> Result<Vec<u8>, BroadcastError> {
        bincode::serialize(self).map_err(|e| BroadcastError::signing(e.to_string()))
    }

    /// Transaction id
    pub fn id(&self) -> Result<TxId, BroadcastError> {
        Ok(TxId(sha256(&self.signing_bytes()?)))
    }

    /// Sign with the witness's key
    pub fn sign(self, key: &SigningKey) -> Result<SignedTransaction, BroadcastError> {
        let bytes = self.signing_bytes()?;
        let signature = key.sign(&bytes);
        Ok(SignedTransaction {
            id: TxId(sha256(&bytes)),
            transaction: self,
            signer: PublicKey::from(key.verifying_key()),
            signature,
        })
    }
}

/// Transaction plus the signer's key and signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Id of the signed bytes
    pub id: TxId,
    /// Signed content
    pub transaction: Transaction,
    /// Key that produced the signature
    pub signer: PublicKey,
    /// ed25519 signature over the canonical bytes
    pub signature: Signature,
}

impl SignedTransaction {
    /// The carried operation
    pub fn operation(&self) -> &CommitRevealOperation {
        &self.transaction.operation
    }

    /// Check the signature and that `id` matches the content
    pub fn verify(&self) -> Result<(), BroadcastError> {
        let bytes = self.transaction.signing_bytes()?;
        if TxId(sha256(&bytes)) != self.id {
            return Err(BroadcastError::signing("transaction id does not match content"));
        }
        let key = self
            .signer
            .to_verifying_key()
            .map_err(|e| BroadcastError::signing(e.to_string()))?;
        key.verify(&bytes, &self.signature)
            .map_err(|e| BroadcastError::signing(e.to_string()))
    }
}
