//! The client: one handle composing the whole submission pipeline.
//!
//! A [`LedgerClient`] owns the shared channel, the process clock, the
//! default retry policy, and an optional context signatory, and walks each
//! submission through the fixed sequence: mint (or reuse) an identity,
//! collect signatures into an invoice, freeze it, execute with retry and
//! drift tracking, then optionally poll for the consensus receipt. Each
//! call is an independent pipeline; nothing here serializes unrelated
//! submissions.

use std::sync::Arc;

use ledger_core::{
    AccountAddress, OutboundRequest, QueryBody, Response, ResponseCode, SignedEnvelope,
    TransactionIdentity,
};
use log::{debug, info};
use tokio::time::Instant;

use crate::channel::LedgerChannel;
use crate::clock::{LedgerClock, SharedClock};
use crate::error::{Error, Result};
use crate::executor::{
    execute, execute_signed, Disposition, ExecuteContext, Observers, ResponseObserver,
    RetryPolicy, SendObserver,
};
use crate::invoice::Invoice;
use crate::receipt::{resolve, ReceiptOutcome};
use crate::signatory::{gather_signatories, sign_with_all, Signatory};

/// Per-call overrides for [`LedgerClient::submit_with`].
#[derive(Clone, Default)]
pub struct SubmitOptions {
    /// Retry policy for this call; the client default when absent.
    pub policy: Option<RetryPolicy>,
    /// Deadline observed at every suspension point.
    pub deadline: Option<Instant>,
    /// Pre-existing identity to reuse across a retry boundary. When set,
    /// no fresh identity is minted and drift tracking is disabled for the
    /// call, since the embedded timestamp is not this clock's to correct.
    pub identity: Option<TransactionIdentity>,
    /// Minimum public-key prefix length for the frozen signature map.
    pub minimum_prefix_len: usize,
}

/// Client-side handle for submitting signed requests to a ledger network
/// and resolving their outcome.
pub struct LedgerClient {
    /// Shared, reusable channel; supports concurrent in-flight calls.
    channel: Arc<dyn LedgerChannel>,
    /// Shared clock for identities and drift correction.
    clock: SharedClock,
    /// Account paying for submissions from this client.
    payer: AccountAddress,
    /// Signatory applied to every submission, ahead of per-call extras.
    signatory: Option<Signatory>,
    /// Default retry budget and pacing.
    policy: RetryPolicy,
    /// Whether minted timestamps are corrected by the drift estimate.
    adjust_for_drift: bool,
    /// Registered telemetry callbacks.
    observers: Observers,
}

impl LedgerClient {
    /// Creates a client over `channel` paying from `payer`, with a fresh
    /// clock, the default retry policy, and drift adjustment enabled.
    pub fn new(channel: Arc<dyn LedgerChannel>, payer: AccountAddress) -> Self {
        Self {
            channel,
            clock: LedgerClock::new(),
            payer,
            signatory: None,
            policy: RetryPolicy::default(),
            adjust_for_drift: true,
            observers: Observers::default(),
        }
    }

    /// Sets the context signatory applied to every submission.
    pub fn with_signatory(mut self, signatory: Signatory) -> Self {
        self.signatory = Some(signatory);
        self
    }

    /// Replaces the default retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares an existing clock instead of the client's own, letting
    /// several clients pool one drift estimate.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Enables or disables drift adjustment of minted timestamps.
    pub fn with_drift_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_for_drift = enabled;
        self
    }

    /// Registers a pre-send telemetry callback, invoked synchronously in
    /// submission order.
    pub fn on_send(&mut self, observer: SendObserver) {
        self.observers.on_send(observer);
    }

    /// Registers a response telemetry callback, invoked synchronously in
    /// submission order with the attempt number.
    pub fn on_response(&mut self, observer: ResponseObserver) {
        self.observers.on_response(observer);
    }

    /// The clock this client mints identities from.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Mints a fresh transaction identity for the context payer.
    pub fn new_identity(&self) -> TransactionIdentity {
        self.clock.new_identity(self.payer, self.adjust_for_drift)
    }

    /// Signs and submits a request body, returning the frozen envelope
    /// once the node accepts it at precheck.
    ///
    /// The envelope carries the identity to poll receipts with. Validation
    /// failures (empty body, no signatories) surface before any network
    /// I/O; a terminal precheck rejection surfaces as
    /// [`Error::PrecheckFailed`].
    pub async fn submit(
        &self,
        body_bytes: Vec<u8>,
        memo: &str,
        extra_signatories: &[&Signatory],
    ) -> Result<SignedEnvelope> {
        self.submit_with(body_bytes, memo, extra_signatories, SubmitOptions::default())
            .await
    }

    /// [`LedgerClient::submit`] with per-call overrides.
    pub async fn submit_with(
        &self,
        body_bytes: Vec<u8>,
        memo: &str,
        extra_signatories: &[&Signatory],
        options: SubmitOptions,
    ) -> Result<SignedEnvelope> {
        // Drift is only trackable for identities this pipeline minted:
        // a reused identity's timestamp predates this call.
        let track_drift = self.adjust_for_drift && options.identity.is_none();
        let identity =
            self.clock
                .identity_for(self.payer, options.identity.as_ref(), self.adjust_for_drift);

        let mut invoice = Invoice::new(body_bytes, memo, identity)?;
        let signatories = gather_signatories(
            self.signatory.as_ref(),
            extra_signatories.iter().copied(),
        );
        sign_with_all(&signatories, &mut invoice).await?;
        let envelope = invoice.freeze(options.minimum_prefix_len)?;

        debug!(
            "Submitting {} ({} signatures) to {}",
            identity,
            envelope.signatures.len(),
            self.channel.target()
        );
        let request = OutboundRequest::Transaction(envelope.clone());
        let ctx = ExecuteContext {
            channel: self.channel.as_ref(),
            policy: options.policy.unwrap_or(self.policy),
            deadline: options.deadline,
            observers: &self.observers,
        };
        let response = execute_signed(ctx, &self.clock, track_drift, &request).await?;

        if response.precheck != ResponseCode::Ok {
            return Err(Error::PrecheckFailed {
                identity,
                code: response.precheck,
            });
        }
        info!("✅ Transaction {} accepted at precheck", identity);
        Ok(envelope)
    }

    /// Polls for the consensus outcome of a previously submitted
    /// transaction using the client's default policy.
    pub async fn await_receipt(&self, identity: TransactionIdentity) -> Result<ReceiptOutcome> {
        self.await_receipt_with(identity, self.policy, None).await
    }

    /// [`LedgerClient::await_receipt`] with an explicit policy and
    /// deadline.
    pub async fn await_receipt_with(
        &self,
        identity: TransactionIdentity,
        policy: RetryPolicy,
        deadline: Option<Instant>,
    ) -> Result<ReceiptOutcome> {
        let ctx = ExecuteContext {
            channel: self.channel.as_ref(),
            policy,
            deadline,
            observers: &self.observers,
        };
        resolve(ctx, identity).await
    }

    /// Submits a body and immediately polls for its consensus outcome:
    /// the full sign → submit → poll pipeline in one call.
    pub async fn submit_and_await(
        &self,
        body_bytes: Vec<u8>,
        memo: &str,
        extra_signatories: &[&Signatory],
    ) -> Result<(SignedEnvelope, ReceiptOutcome)> {
        let envelope = self.submit(body_bytes, memo, extra_signatories).await?;
        let outcome = self.await_receipt(envelope.identity).await?;
        Ok((envelope, outcome))
    }

    /// Sends an unsigned, read-only query built by a higher layer,
    /// retrying only busy responses. Reads are never state-changing, so no
    /// recovery check applies.
    pub async fn query(&self, body: Vec<u8>) -> Result<Response> {
        let request = OutboundRequest::Query(QueryBody::Raw(body));
        let ctx = ExecuteContext {
            channel: self.channel.as_ref(),
            policy: self.policy,
            deadline: None,
            observers: &self.observers,
        };
        execute(ctx, &request, |response| {
            if response.precheck == ResponseCode::Busy {
                Disposition::Retry
            } else {
                Disposition::Final
            }
        })
        .await
    }
}
