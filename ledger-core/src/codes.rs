//! Response codes returned by ledger network nodes.
//!
//! Every reply from a node carries one of these codes twice over: once in
//! the response header (the node's precheck verdict on the request itself)
//! and, for receipt queries, once more as the consensus status of the
//! referenced transaction. The submission pipeline keys all of its retry
//! and outcome classification off this taxonomy.

use serde::{Deserialize, Serialize};

/// Result code reported by a network node for a request or a transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResponseCode {
    /// The request passed precheck and was accepted for processing.
    Ok = 0,
    /// The request body could not be parsed or failed structural checks.
    InvalidTransactionBody = 1,
    /// The payer account named in the transaction identity does not exist.
    PayerAccountNotFound = 2,
    /// The embedded valid-start timestamp was outside the node's accepted
    /// window, usually because the local clock has drifted.
    InvalidTransactionStart = 3,
    /// The transaction's signature set did not satisfy the required keys.
    InvalidSignature = 4,
    /// A transaction with this identity was already submitted.
    DuplicateTransaction = 5,
    /// The payer cannot cover the transaction fee.
    InsufficientPayerBalance = 6,
    /// The transaction expired before the network reached consensus on it.
    TransactionExpired = 7,
    /// The node is overloaded and declined to process the request.
    Busy = 8,
    /// The network has not yet determined an outcome for the transaction.
    Unknown = 9,
    /// No receipt exists for the queried transaction identity.
    ReceiptNotFound = 10,
    /// A record was requested but has already been aged out of the node.
    RecordNotFound = 11,
    /// The transaction reached consensus and was applied.
    Success = 12,
    /// Local sentinel for a transport-level failure; never sent by a node.
    RpcError = 13,
}

impl ResponseCode {
    /// Decodes a raw wire integer, mapping unrecognized values to
    /// [`ResponseCode::Unknown`] rather than failing the whole response.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::InvalidTransactionBody,
            2 => Self::PayerAccountNotFound,
            3 => Self::InvalidTransactionStart,
            4 => Self::InvalidSignature,
            5 => Self::DuplicateTransaction,
            6 => Self::InsufficientPayerBalance,
            7 => Self::TransactionExpired,
            8 => Self::Busy,
            9 => Self::Unknown,
            10 => Self::ReceiptNotFound,
            11 => Self::RecordNotFound,
            12 => Self::Success,
            13 => Self::RpcError,
            _ => Self::Unknown,
        }
    }

    /// True for the codes a signed submission should be retried on: the
    /// node was busy, or it rejected our timestamp as out of window.
    pub fn is_retryable_precheck(self) -> bool {
        matches!(self, Self::Busy | Self::InvalidTransactionStart)
    }

    /// True when the code leaves the transaction's outcome undecided.
    pub fn is_undecided(self) -> bool {
        matches!(self, Self::Busy | Self::Unknown)
    }
}

impl core::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}
