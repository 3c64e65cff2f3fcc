//! Broadcast adapter
//!
//! The scheduler runs inside block application and must never wait on the
//! network. It submits through the synchronous [`TransactionBroadcaster`];
//! [`QueuedBroadcaster`] satisfies that by pushing onto an unbounded channel
//! that a tokio task drains into an async [`TransactionSink`].

use crate::errors::BroadcastError;
use crate::transaction::SignedTransaction;
use async_trait::async_trait;
use sortes_core::TxId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Fire-and-forget transaction submission
pub trait TransactionBroadcaster: Send + Sync {
    /// Hand off a signed transaction. Must not block.
    fn submit(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError>;
}

impl<T: TransactionBroadcaster + ?Sized> TransactionBroadcaster for Arc<T> {
    fn submit(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError> {
        (**self).submit(tx)
    }
}

/// Network-facing transaction delivery
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Deliver one transaction to the network
    async fn deliver(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError>;
}

/// Broadcaster backed by an unbounded queue
#[derive(Debug, Clone)]
pub struct QueuedBroadcaster {
    sender: mpsc::UnboundedSender<SignedTransaction>,
}

impl QueuedBroadcaster {
    /// Create a broadcaster and the receiving end of its queue
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignedTransaction>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Create a broadcaster whose queue is drained into `sink` by a spawned task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(sink: S) -> (Self, JoinHandle<()>)
    where
        S: TransactionSink + 'static,
    {
        let (broadcaster, receiver) = Self::new();
        (broadcaster, spawn_submission_task(receiver, sink))
    }
}

impl TransactionBroadcaster for QueuedBroadcaster {
    fn submit(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError> {
        let id = tx.id;
        self.sender
            .send(tx)
            .map_err(|_| BroadcastError::ChannelClosed)?;
        Ok(id)
    }
}

/// Drain `receiver` into `sink` until every sender is dropped.
///
/// Delivery failures are logged and the transaction is dropped.
pub fn spawn_submission_task<S>(
    mut receiver: mpsc::UnboundedReceiver<SignedTransaction>,
    sink: S,
) -> JoinHandle<()>
where
    S: TransactionSink + 'static,
{
    tokio::spawn(async move {
        while let Some(tx) = receiver.recv().await {
            let id = tx.id;
            let account = tx.operation().account().clone();
            match sink.deliver(tx).await {
                Ok(_) => tracing::debug!(tx = %id, account = %account, "transaction delivered"),
                Err(e) => tracing::warn!(
                    tx = %id,
                    account = %account,
                    error = %e,
                    "transaction delivery failed"
                ),
            }
        }
        tracing::debug!("submission queue closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use ed25519_dalek::SigningKey;
    use sortes_core::{AccountId, Timestamp};
    use sortes_randomness::{CommitRevealOperation, ProtocolBinding, RevealOperation};
    use std::sync::Mutex;

    fn signed(value: u64) -> SignedTransaction {
        Transaction::new(
            CommitRevealOperation::Reveal(RevealOperation {
                account: AccountId::new("init0").unwrap(),
                value,
                binding: ProtocolBinding::V1,
            }),
            Timestamp::from_secs(100),
        )
        .sign(&SigningKey::from_bytes(&[5u8; 32]))
        .unwrap()
    }

    #[derive(Default)]
    struct CollectingSink {
        delivered: Mutex<Vec<TxId>>,
    }

    #[async_trait]
    impl TransactionSink for Arc<CollectingSink> {
        async fn deliver(&self, tx: SignedTransaction) -> Result<TxId, BroadcastError> {
            if let CommitRevealOperation::Reveal(op) = tx.operation() {
                if op.value == 0 {
                    return Err(BroadcastError::Rejected {
                        reason: "zero".to_string(),
                    });
                }
            }
            self.delivered.lock().unwrap().push(tx.id);
            Ok(tx.id)
        }
    }

    #[test]
    fn test_submit_returns_id_and_enqueues() {
        let (broadcaster, mut receiver) = QueuedBroadcaster::new();
        let tx = signed(1);
        let id = broadcaster.submit(tx.clone()).unwrap();
        assert_eq!(id, tx.id);
        assert_eq!(receiver.try_recv().unwrap(), tx);
    }

    #[test]
    fn test_submit_after_receiver_dropped() {
        let (broadcaster, receiver) = QueuedBroadcaster::new();
        drop(receiver);
        assert_eq!(broadcaster.submit(signed(1)), Err(BroadcastError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_task_drains_queue_and_survives_failures() {
        let sink = Arc::new(CollectingSink::default());
        let (broadcaster, handle) = QueuedBroadcaster::spawn(sink.clone());

        let first = signed(1);
        let second = signed(2);
        broadcaster.submit(first.clone()).unwrap();
        broadcaster.submit(signed(0)).unwrap();
        broadcaster.submit(second.clone()).unwrap();
        drop(broadcaster);

        handle.await.unwrap();
        assert_eq!(*sink.delivered.lock().unwrap(), vec![first.id, second.id]);
    }
}
