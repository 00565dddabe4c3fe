//! Clock-drift tracking and transaction-identity generation.
//!
//! Ledger nodes reject transactions whose embedded valid-start timestamp
//! falls outside their accepted window. Rather than requiring external time
//! synchronization, the pipeline keeps a process-wide estimate of the
//! offset between the local clock and network-accepted time: the executor
//! feeds an observed correction in whenever a node answers
//! `InvalidTransactionStart`, and every new identity is minted against the
//! corrected clock.
//!
//! The clock is a shared handle rather than a global so tests can run each
//! pipeline against its own instance.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ledger_core::{AccountAddress, Timestamp, TransactionIdentity};

/// Shared handle to a [`LedgerClock`].
pub type SharedClock = Arc<LedgerClock>;

/// Process-wide source of unique timestamps and the clock-drift estimate.
///
/// Both fields are atomics: concurrent submissions mint identities and
/// correct drift without any lock, and a lost drift update is acceptable
/// because the estimate is corrected again on the next rejection.
#[derive(Debug, Default)]
pub struct LedgerClock {
    /// Signed nanosecond offset between the local clock and
    /// network-accepted time. Positive drift means the local clock runs
    /// ahead of the network.
    drift_nanos: AtomicI64,
    /// Last nanosecond value handed out, enforcing strict monotonicity.
    last_nanos: AtomicI64,
}

impl LedgerClock {
    /// Creates a clock with a zero drift estimate.
    pub fn new() -> SharedClock {
        Arc::new(Self::default())
    }

    /// Returns the current wall clock in nanoseconds since the unix epoch,
    /// strictly greater than any value previously returned by this clock.
    ///
    /// Two calls never observe the same value even when invoked
    /// back-to-back or from concurrent tasks; when the wall clock has not
    /// advanced past the last handed-out value the counter steps forward
    /// by one nanosecond instead.
    pub fn unique_nanos(&self) -> i64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as i64)
            .unwrap_or(0);
        let mut last = self.last_nanos.load(Ordering::Relaxed);
        loop {
            let candidate = wall.max(last + 1);
            match self.last_nanos.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(observed) => last = observed,
            }
        }
    }

    /// Atomically adds `delta_nanos` to the drift estimate.
    pub fn adjust_drift(&self, delta_nanos: i64) {
        self.drift_nanos.fetch_add(delta_nanos, Ordering::Relaxed);
    }

    /// The current drift estimate in nanoseconds.
    pub fn drift_nanos(&self) -> i64 {
        self.drift_nanos.load(Ordering::Relaxed)
    }

    /// Returns a unique timestamp, shifted by the drift estimate when
    /// `adjust` is set.
    pub fn unique_timestamp(&self, adjust: bool) -> Timestamp {
        let mut nanos = self.unique_nanos();
        if adjust {
            nanos -= self.drift_nanos();
        }
        Timestamp::from_unix_nanos(nanos)
    }

    /// Mints a new transaction identity for `payer`.
    pub fn new_identity(&self, payer: AccountAddress, adjust: bool) -> TransactionIdentity {
        TransactionIdentity {
            payer,
            valid_start: self.unique_timestamp(adjust),
        }
    }

    /// Returns `existing` unchanged when the caller is reusing an identity
    /// across a retry boundary, otherwise mints a fresh one.
    pub fn identity_for(
        &self,
        payer: AccountAddress,
        existing: Option<&TransactionIdentity>,
        adjust: bool,
    ) -> TransactionIdentity {
        match existing {
            Some(identity) => *identity,
            None => self.new_identity(payer, adjust),
        }
    }
}
