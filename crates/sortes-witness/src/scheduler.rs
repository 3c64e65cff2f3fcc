//! Witness scheduler
//!
//! Driven by block-applied notifications. Once per epoch it draws a commit
//! and a reveal offset for every local witness; on each later block it fires
//! whatever has come due. Delivery is at most once per epoch per witness and
//! half: the pending flag flips before the broadcast is attempted, and a
//! failed broadcast is not retried until the next epoch's schedule.

use crate::broadcast::TransactionBroadcaster;
use crate::config::WitnessNodeConfig;
use crate::errors::SchedulerError;
use crate::keyring::WitnessKeyring;
use crate::schedule::EpochSchedule;
use crate::transaction::Transaction;
use ed25519_dalek::SigningKey;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use sortes_core::{
    AccountId, AppliedBlock, ChainState, Digest512, ProtocolVersion, PublicKey, SortesConfig,
    Timestamp,
};
use sortes_randomness::{
    commitment, CommitOperation, CommitRevealLedger, CommitRevealOperation, EpochClock,
    EpochPhase, EpochWindow, ProtocolBinding, RevealOperation,
};
use std::collections::BTreeMap;

/// Secret committed for the current epoch, kept until its reveal
#[derive(Debug, Clone, PartialEq, Eq)]
struct RememberedSecret {
    value: u64,
    binding: ProtocolBinding,
    commitment: Digest512,
}

/// Times and fires commit/reveal broadcasts for the local witnesses
pub struct WitnessScheduler<B> {
    config: WitnessNodeConfig,
    keyring: WitnessKeyring,
    broadcaster: B,
    rng: ChaCha20Rng,
    schedule: Option<EpochSchedule>,
    secrets: BTreeMap<AccountId, RememberedSecret>,
}

impl<B: TransactionBroadcaster> WitnessScheduler<B> {
    /// Create a scheduler seeded from OS entropy, the operator seed and the
    /// local clock.
    pub fn new(
        config: WitnessNodeConfig,
        keyring: WitnessKeyring,
        broadcaster: B,
    ) -> Result<Self, SchedulerError> {
        let rng = seeded_rng(config.operator_seed.as_deref())?;
        Self::with_rng(config, keyring, broadcaster, rng)
    }

    /// Create a scheduler with a caller-supplied generator
    pub fn with_rng(
        config: WitnessNodeConfig,
        keyring: WitnessKeyring,
        broadcaster: B,
        rng: ChaCha20Rng,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        let idle_keys: Vec<&AccountId> = keyring
            .accounts()
            .filter(|account| !config.witnesses.contains(account))
            .collect();
        if !idle_keys.is_empty() {
            tracing::warn!(
                accounts = ?idle_keys,
                "signing keys cached for accounts that are not configured witnesses"
            );
        }
        tracing::info!(
            production = config.production_enabled,
            witnesses = config.witnesses.len(),
            keys = keyring.len(),
            "witness scheduler created"
        );
        Ok(Self {
            config,
            keyring,
            broadcaster,
            rng,
            schedule: None,
            secrets: BTreeMap::new(),
        })
    }

    /// Offsets drawn for the current epoch, if any
    pub fn schedule(&self) -> Option<&EpochSchedule> {
        self.schedule.as_ref()
    }

    /// The broadcaster transactions are handed to
    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// React to a newly applied block.
    ///
    /// Inert unless production is enabled, witnesses are configured and the
    /// node is synchronized.
    pub fn on_block_applied(
        &mut self,
        block: &AppliedBlock,
        chain: &dyn ChainState,
        ledger: &CommitRevealLedger,
    ) {
        if !self.config.is_active() || !block.synchronized {
            return;
        }

        let clock = match EpochClock::from_chain(chain) {
            Ok(clock) => clock,
            Err(e) => {
                tracing::warn!(error = %e, "unusable chain parameters, scheduler idle");
                return;
            }
        };
        let window = clock.current_window(chain);

        if self.schedule.as_ref().map(|s| s.epoch_marker) != Some(window.marker) {
            self.reschedule(&window);
        }

        match window.phase(block.timestamp) {
            EpochPhase::Commit { index } => {
                let due = self
                    .schedule
                    .as_mut()
                    .map(|s| s.take_due_commits(index))
                    .unwrap_or_default();
                for account in due {
                    self.fire_commit(&account, &window, block.timestamp, chain, ledger);
                }
            }
            EpochPhase::Reveal { index } => {
                let due = self
                    .schedule
                    .as_mut()
                    .map(|s| s.take_due_reveals(index))
                    .unwrap_or_default();
                for account in due {
                    self.fire_reveal(&account, block.timestamp, ledger);
                }
            }
            EpochPhase::Outside => {}
        }
    }

    fn reschedule(&mut self, window: &EpochWindow) {
        let schedule = EpochSchedule::draw(
            &mut self.rng,
            window,
            &self.config.witnesses,
            self.config.reveal_bias,
        );
        tracing::info!(
            epoch = %window.marker,
            commits = ?schedule.commits.iter().map(|e| e.offset).collect::<Vec<_>>(),
            reveals = ?schedule.reveals.iter().map(|e| e.offset).collect::<Vec<_>>(),
            "drew commit-reveal schedule"
        );
        self.secrets.clear();
        self.schedule = Some(schedule);
    }

    fn fire_commit(
        &mut self,
        account: &AccountId,
        window: &EpochWindow,
        now: Timestamp,
        chain: &dyn ChainState,
        ledger: &CommitRevealLedger,
    ) {
        let version = chain.latest_active_version();

        if self.secrets.contains_key(account)
            || already_committed(ledger, version, account, window)
        {
            tracing::debug!(
                account = %account,
                epoch = %window.marker,
                "commit for this epoch exists, skipping"
            );
            return;
        }

        let Some(key) = self.keyring.signing_key(account) else {
            tracing::info!(account = %account, "no signing key cached, skipping commit");
            return;
        };

        let witness_key = PublicKey::from(key.verifying_key());
        let binding = match version {
            ProtocolVersion::V1 => ProtocolBinding::V1,
            ProtocolVersion::V2 => ProtocolBinding::V2 {
                epoch_marker: window.marker,
            },
            ProtocolVersion::V3 => ProtocolBinding::V3 {
                epoch_marker: window.marker,
                witness_key,
            },
        };

        let value = self.rng.gen_range(1..=u64::MAX);
        let secret = RememberedSecret {
            value,
            binding,
            commitment: commitment(value, &binding.hash_inputs(chain.previous_seed())),
        };

        let op = CommitRevealOperation::Commit(CommitOperation {
            account: account.clone(),
            commitment: secret.commitment,
            binding,
        });
        submit(&self.broadcaster, key, op, now);
        self.secrets.insert(account.clone(), secret);
    }

    fn fire_reveal(&self, account: &AccountId, now: Timestamp, ledger: &CommitRevealLedger) {
        let Some(secret) = self.secrets.get(account) else {
            tracing::debug!(account = %account, "no commit made this epoch, skipping reveal");
            return;
        };

        let version = secret.binding.version();
        let record = ledger.find(version, account).filter(|record| {
            !version.has_epoch_marker() || record.epoch_marker == secret.binding.epoch_marker()
        });
        let Some(record) = record else {
            tracing::info!(account = %account, "no matching commit on chain, skipping reveal");
            return;
        };
        if record.is_revealed() {
            tracing::debug!(account = %account, "already revealed, skipping");
            return;
        }
        if record.commitment != secret.commitment {
            tracing::warn!(
                account = %account,
                "stored commitment does not match remembered secret, skipping reveal"
            );
            return;
        }

        let Some(key) = self.keyring.signing_key(account) else {
            tracing::info!(account = %account, "no signing key cached, skipping reveal");
            return;
        };

        let op = CommitRevealOperation::Reveal(RevealOperation {
            account: account.clone(),
            value: secret.value,
            binding: secret.binding,
        });
        submit(&self.broadcaster, key, op, now);
    }
}

fn already_committed(
    ledger: &CommitRevealLedger,
    version: ProtocolVersion,
    account: &AccountId,
    window: &EpochWindow,
) -> bool {
    version.has_epoch_marker()
        && ledger
            .find(version, account)
            .and_then(|record| record.epoch_marker)
            == Some(window.marker)
}

fn submit<B: TransactionBroadcaster>(
    broadcaster: &B,
    key: &SigningKey,
    op: CommitRevealOperation,
    now: Timestamp,
) {
    let account = op.account().clone();
    let kind = op.kind();
    let result = Transaction::new(op, now)
        .sign(key)
        .and_then(|tx| broadcaster.submit(tx));
    match result {
        Ok(id) => tracing::info!(account = %account, kind, tx = %id, "broadcast"),
        Err(e) => tracing::warn!(account = %account, kind, error = %e, "broadcast failed"),
    }
}

fn seeded_rng(operator_seed: Option<&str>) -> Result<ChaCha20Rng, SchedulerError> {
    let mut entropy = [0u8; 32];
    getrandom::getrandom(&mut entropy).map_err(|e| SchedulerError::Entropy {
        message: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(entropy);
    if let Some(seed) = operator_seed {
        hasher.update(seed.as_bytes());
    }
    hasher.update(Timestamp::now().as_secs().to_le_bytes());

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    Ok(ChaCha20Rng::from_seed(seed))
}
