//! # Ledger Core Types
//!
//! Shared protocol vocabulary for the Meridian ledger client: response
//! codes, transaction identities, signed-envelope shapes, and the
//! request/response messages exchanged with a network node.
//!
//! This crate is deliberately free of I/O and async machinery so that both
//! the submission pipeline and any higher-level tooling can depend on it
//! without pulling in a runtime.

/// Response-code taxonomy returned by network nodes.
pub mod codes;

/// Timestamps, account addresses, and transaction identities.
pub mod identity;

/// Signature and signed-envelope wire shapes.
pub mod envelope;

/// Request and response messages exchanged over a channel.
pub mod wire;

/// Parsing helpers for addresses and hex-encoded bytes.
pub mod utils;

pub use codes::ResponseCode;
pub use envelope::{KeyAlgorithm, SignatureMap, SignaturePair, SignedEnvelope};
pub use identity::{AccountAddress, Timestamp, TransactionIdentity};
pub use wire::{OutboundRequest, QueryBody, Receipt, Response};
