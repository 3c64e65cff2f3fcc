//! Recording broadcaster

use sortes_core::TxId;
use sortes_witness::{BroadcastError, SignedTransaction, TransactionBroadcaster};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Captures every submitted transaction; can be switched to fail.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroadcaster {
    submitted: Arc<Mutex<Vec<SignedTransaction>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingBroadcaster {
    /// Empty recorder that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following submission with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Transactions accepted so far, in submission order
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    /// Remove and return the accepted transactions
    pub fn drain(&self) -> Vec<SignedTransaction> {
        std::mem::take(&mut *self.submitted.lock().unwrap())
    }
}

impl TransactionBroadcaster for RecordingBroadcaster {
    fn submit(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BroadcastError::transport("recording broadcaster set to fail"));
        }
        let id = tx.id;
        self.submitted.lock().unwrap().push(tx);
        Ok(id)
    }
}
