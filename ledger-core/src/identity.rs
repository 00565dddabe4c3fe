//! Timestamps, account addresses, and transaction identities.
//!
//! A [`TransactionIdentity`] is the (payer, valid-start) pair that uniquely
//! names one submitted request for the rest of its life: the node echoes it
//! in prechecks, and receipts are looked up by it after consensus.

use serde::{Deserialize, Serialize};

/// A point in time as the network represents it: whole seconds since the
/// unix epoch plus a sub-second nanosecond remainder.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp {
    /// Whole seconds since the unix epoch.
    pub seconds: i64,
    /// Nanoseconds past `seconds`, in `0..1_000_000_000`.
    pub nanos: i32,
}

impl Timestamp {
    /// Splits a nanosecond count since the unix epoch into the wire shape.
    pub fn from_unix_nanos(nanos: i64) -> Self {
        Self {
            seconds: nanos / 1_000_000_000,
            nanos: (nanos % 1_000_000_000) as i32,
        }
    }

    /// The timestamp as a single nanosecond count since the unix epoch.
    pub fn as_unix_nanos(&self) -> i64 {
        self.seconds * 1_000_000_000 + i64::from(self.nanos)
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// A ledger account address in `shard.realm.num` form.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
)]
pub struct AccountAddress {
    /// Shard holding the account.
    pub shard: u64,
    /// Realm within the shard.
    pub realm: u64,
    /// Account number within the realm.
    pub num: u64,
}

impl AccountAddress {
    /// Builds an address from its three components.
    pub fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl core::fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// The unique name of one submitted transaction: the payer account plus the
/// valid-start timestamp minted for it.
///
/// Identities are immutable once created. Two concurrently minted
/// identities for the same payer never share a valid-start instant; the
/// clock in the submission layer guarantees it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TransactionIdentity {
    /// Account paying the transaction fee.
    pub payer: AccountAddress,
    /// Instant from which the transaction is valid, unique per payer.
    pub valid_start: Timestamp,
}

impl core::fmt::Display for TransactionIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.payer, self.valid_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_splits_and_rejoins_nanos() {
        let ts = Timestamp::from_unix_nanos(1_700_000_123_456_789_012);
        assert_eq!(ts.seconds, 1_700_000_123);
        assert_eq!(ts.nanos, 456_789_012);
        assert_eq!(ts.as_unix_nanos(), 1_700_000_123_456_789_012);
    }

    #[test]
    fn identity_displays_payer_and_instant() {
        let identity = TransactionIdentity {
            payer: AccountAddress::new(0, 0, 1234),
            valid_start: Timestamp {
                seconds: 77,
                nanos: 5,
            },
        };
        assert_eq!(identity.to_string(), "0.0.1234@77.000000005");
    }
}
