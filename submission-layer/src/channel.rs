//! The channel seam between the pipeline and the network.
//!
//! Channel construction, pooling, and the actual wire protocol are
//! external collaborators; the pipeline only needs a send primitive and a
//! way to name the node it is talking to. Implementations must support
//! concurrent in-flight calls — one channel is shared by every pipeline
//! submitting through it.

use async_trait::async_trait;
use ledger_core::{OutboundRequest, Response};
use snafu::Snafu;

/// Transport-level failure reported by a channel, before any response
/// header exists to classify.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// The node is unreachable: it may be down, or the connection is
    /// still being established.
    #[snafu(display("node unreachable, it may be down or not reachable: {}", detail))]
    Unavailable {
        /// Transport-layer description of the failure.
        detail: String,
    },

    /// The connection failed in an indeterminate state: the request may
    /// or may not have been delivered before the failure.
    #[snafu(display("connection failed in an indeterminate state: {}", detail))]
    Indeterminate {
        /// Transport-layer description of the failure.
        detail: String,
    },

    /// The transport rejected the request outright; retrying the same
    /// call cannot help.
    #[snafu(display("transport rejected the request: {}", detail))]
    Rejected {
        /// Transport-layer description of the rejection.
        detail: String,
    },
}

impl TransportError {
    /// True when the failure leaves open the possibility that the request
    /// reached the node, which is what forces the executor's
    /// submission-recovery check for state-changing requests.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Indeterminate { .. })
    }
}

/// A reusable connection to one network node.
#[async_trait]
pub trait LedgerChannel: Send + Sync {
    /// Identity of the node this channel targets, for logs and errors.
    fn target(&self) -> String;

    /// Sends one request and awaits the node's reply.
    async fn send(&self, request: &OutboundRequest) -> Result<Response, TransportError>;
}
