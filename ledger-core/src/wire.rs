//! Request and response messages exchanged with a network node.
//!
//! The channel that carries these is an external collaborator; this module
//! only fixes the shapes the submission pipeline needs to distinguish: a
//! state-changing transaction versus a pure read, and the two layers at
//! which a node can answer — the response header and, for receipt queries,
//! the consensus status embedded in the receipt payload.

use serde::Serialize;

use crate::codes::ResponseCode;
use crate::envelope::SignedEnvelope;
use crate::identity::TransactionIdentity;

/// A message bound for a network node.
#[derive(Clone, Debug, Serialize)]
pub enum OutboundRequest {
    /// A signed, state-changing transaction. Resubmitting one of these
    /// after an ambiguous transport failure risks duplicating the state
    /// change, so the executor runs its recovery check first.
    Transaction(SignedEnvelope),
    /// A read-only query; safe to resend at any time.
    Query(QueryBody),
}

impl OutboundRequest {
    /// The transaction identity this request is tracked by, when it has
    /// one. Raw queries are not tracked.
    pub fn identity(&self) -> Option<&TransactionIdentity> {
        match self {
            Self::Transaction(envelope) => Some(&envelope.identity),
            Self::Query(QueryBody::ReceiptStatus(identity)) => Some(identity),
            Self::Query(QueryBody::Raw(_)) => None,
        }
    }

    /// True for requests that change ledger state when accepted.
    pub fn is_state_changing(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}

/// Body of a read-only query.
#[derive(Clone, Debug, Serialize)]
pub enum QueryBody {
    /// Ask for the consensus receipt of a previously submitted
    /// transaction.
    ReceiptStatus(TransactionIdentity),
    /// An opaque query built by a higher layer.
    Raw(Vec<u8>),
}

/// The network's terminal or intermediate status record for a submitted
/// transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Receipt {
    /// Consensus status of the transaction. [`ResponseCode::Unknown`]
    /// means the network has not decided yet.
    pub status: ResponseCode,
    /// Entity-specific payload (created account number, topic sequence,
    /// and so on); opaque to the pipeline.
    pub payload: Vec<u8>,
}

/// A node's reply to an [`OutboundRequest`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Response {
    /// The header-layer verdict: the node's precheck of the request.
    pub precheck: ResponseCode,
    /// For receipt queries, the receipt found for the identity (absent
    /// when the header already says none could be located).
    pub receipt: Option<Receipt>,
    /// Opaque payload for other query kinds.
    pub payload: Vec<u8>,
}

impl Response {
    /// A bare header-only response.
    pub fn precheck_only(precheck: ResponseCode) -> Self {
        Self {
            precheck,
            receipt: None,
            payload: Vec::new(),
        }
    }

    /// A receipt-query response carrying a receipt with the given status.
    pub fn with_receipt_status(precheck: ResponseCode, status: ResponseCode) -> Self {
        Self {
            precheck,
            receipt: Some(Receipt {
                status,
                payload: Vec::new(),
            }),
            payload: Vec::new(),
        }
    }
}
