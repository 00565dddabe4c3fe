//! Receipt resolution: learning the consensus outcome of a submission.
//!
//! A node can report "not done yet" at two layers — the query header
//! (busy, outcome unknown) and the receipt payload itself (status still
//! the unknown sentinel) — and "permanently rejected" at both as well.
//! The resolver polls through the executor's retry machinery and then
//! folds both layers into one [`ReceiptOutcome`], keeping the
//! consensus-uncertain cases distinct from fatal rejections: the former
//! may still resolve out-of-band after the local wait window closes, the
//! latter never will.

use ledger_core::{OutboundRequest, QueryBody, Receipt, Response, ResponseCode, TransactionIdentity};
use log::{info, warn};

use crate::executor::{execute, Disposition, ExecuteContext};
use crate::error::Result;

/// Classified consensus outcome of a previously submitted transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReceiptOutcome {
    /// The transaction reached consensus and was applied.
    Success(Receipt),
    /// A receipt exists but its status is still the unknown sentinel;
    /// consensus has not been reached yet.
    Pending,
    /// The node is too busy to answer receipt queries.
    Busy,
    /// The node could not locate an outcome for the identity yet.
    Unknown,
    /// The local wait window closed without a decided outcome. The ledger
    /// may still reach consensus on the transaction later.
    ConsensusTimeout {
        /// Identity the receipt was polled for.
        identity: TransactionIdentity,
        /// The last undecided code observed.
        code: ResponseCode,
    },
    /// The ledger terminally rejected the transaction, or no receipt will
    /// ever exist for the identity.
    Fatal {
        /// Identity the receipt was polled for.
        identity: TransactionIdentity,
        /// The terminal code.
        code: ResponseCode,
    },
}

impl ReceiptOutcome {
    /// True when the ledger has decided: the outcome can never change.
    /// [`ReceiptOutcome::ConsensusTimeout`] is deliberately not terminal —
    /// the network may still decide after the local window closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Fatal { .. })
    }
}

/// True when a receipt poll should keep retrying: the header layer left
/// the outcome undecided (busy, result unknown) or the receipt status is
/// still the unknown sentinel.
fn should_retry_poll(response: &Response) -> bool {
    response.precheck.is_undecided()
        || response
            .receipt
            .as_ref()
            .is_some_and(|receipt| receipt.status == ResponseCode::Unknown)
}

/// Classifies one receipt-query response across both layers.
///
/// The intermediate variants (`Pending`, `Busy`, `Unknown`) surface from
/// here so callers polling manually can distinguish them; [`resolve`]
/// folds them into [`ReceiptOutcome::ConsensusTimeout`] once the retry
/// budget is spent.
pub fn classify_receipt_response(
    identity: TransactionIdentity,
    response: &Response,
) -> ReceiptOutcome {
    match response.precheck {
        ResponseCode::Ok => {}
        ResponseCode::Busy => return ReceiptOutcome::Busy,
        ResponseCode::Unknown => return ReceiptOutcome::Unknown,
        code => return ReceiptOutcome::Fatal { identity, code },
    }
    match &response.receipt {
        // An Ok header with no receipt attached is structurally missing.
        None => ReceiptOutcome::Fatal {
            identity,
            code: ResponseCode::ReceiptNotFound,
        },
        Some(receipt) => match receipt.status {
            ResponseCode::Unknown => ReceiptOutcome::Pending,
            ResponseCode::Success => ReceiptOutcome::Success(receipt.clone()),
            code => ReceiptOutcome::Fatal { identity, code },
        },
    }
}

/// Polls the network for the consensus receipt of `identity` and
/// classifies the result.
///
/// Undecided headers (`Busy`, `Unknown`) and undecided receipt statuses
/// are retried within the executor's budget; whatever remains undecided
/// afterwards becomes
/// [`ReceiptOutcome::ConsensusTimeout`]. Transport-level failures surface
/// as [`crate::error::Error::Transport`] like any other call.
pub async fn resolve(
    ctx: ExecuteContext<'_>,
    identity: TransactionIdentity,
) -> Result<ReceiptOutcome> {
    let request = OutboundRequest::Query(QueryBody::ReceiptStatus(identity));
    let response = execute(ctx, &request, |response| {
        if should_retry_poll(response) {
            Disposition::Retry
        } else {
            Disposition::Final
        }
    })
    .await?;

    let outcome = match classify_receipt_response(identity, &response) {
        ReceiptOutcome::Busy => {
            warn!(
                "⚠️ Network is too busy to answer receipt queries for {}; \
                 it may still reach consensus for this transaction",
                identity
            );
            ReceiptOutcome::ConsensusTimeout {
                identity,
                code: ResponseCode::Busy,
            }
        }
        ReceiptOutcome::Unknown => ReceiptOutcome::ConsensusTimeout {
            identity,
            code: ResponseCode::Unknown,
        },
        ReceiptOutcome::Pending => {
            warn!(
                "⚠️ Network did not reach consensus for {} within the \
                 configured retry window; it may still do so later",
                identity
            );
            ReceiptOutcome::ConsensusTimeout {
                identity,
                code: ResponseCode::Unknown,
            }
        }
        ReceiptOutcome::Success(receipt) => {
            info!("✅ Transaction {} reached consensus", identity);
            ReceiptOutcome::Success(receipt)
        }
        fatal @ ReceiptOutcome::Fatal { .. } => fatal,
        terminal @ ReceiptOutcome::ConsensusTimeout { .. } => terminal,
    };
    Ok(outcome)
}
