//! The network request executor: retries, recovery, and drift feedback.
//!
//! One call to [`execute`] drives a request to a final response: busy and
//! clock-window rejections are retried with a linearly growing backoff,
//! ambiguous transport failures on state-changing requests trigger a
//! receipt-recovery check before any resend, and after the retry budget is
//! spent one last unconditional attempt decides the outcome. The loop is
//! an explicit two-state machine so the backoff accounting stays
//! unambiguous no matter how send failures and recovery probes interleave.

use std::sync::Arc;
use std::time::Duration;

use ledger_core::{OutboundRequest, QueryBody, Response, ResponseCode};
use log::{debug, info, warn};
use tokio::time::{sleep, timeout_at, Instant};

use crate::channel::{LedgerChannel, TransportError};
use crate::clock::LedgerClock;
use crate::error::{Error, Result};

/// Retry budget and pacing for one network call.
///
/// The effective delay before attempt `n` is `base_delay * n`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Number of classified retries before the final unconditional
    /// attempt.
    pub max_retries: u32,
    /// Multiplier for the linear backoff schedule.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Verdict a response classifier renders over a tentative response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// The response is the outcome; hand it back to the caller.
    Final,
    /// The response is transient (busy, clock window); try again.
    Retry,
}

/// What a response observer is shown for one attempt.
#[derive(Clone, Debug)]
pub enum ResponseEvent {
    /// A reply message from the node.
    Message(Response),
    /// A transport-level failure, rendered as text the way it will be
    /// logged.
    TransportNote(String),
}

/// Callback invoked with each outgoing request before transmission.
pub type SendObserver = Arc<dyn Fn(&OutboundRequest) + Send + Sync>;

/// Callback invoked with the attempt number for everything received back,
/// including transport-failure notes and recovery-check responses.
pub type ResponseObserver = Arc<dyn Fn(u32, &ResponseEvent) + Send + Sync>;

/// Registered telemetry callbacks, invoked synchronously in registration
/// order. Callbacks must not block materially; they run on the pipeline's
/// task.
#[derive(Clone, Default)]
pub struct Observers {
    /// Pre-send observers.
    on_send: Vec<SendObserver>,
    /// Response observers.
    on_response: Vec<ResponseObserver>,
}

impl Observers {
    /// Registers a pre-send observer.
    pub fn on_send(&mut self, observer: SendObserver) {
        self.on_send.push(observer);
    }

    /// Registers a response observer.
    pub fn on_response(&mut self, observer: ResponseObserver) {
        self.on_response.push(observer);
    }

    /// Invokes every pre-send observer.
    pub(crate) fn notify_sending(&self, request: &OutboundRequest) {
        for observer in &self.on_send {
            observer(request);
        }
    }

    /// Shows a reply to every response observer. The event is only built
    /// when someone is listening.
    pub(crate) fn notify_message(&self, attempt: u32, response: &Response) {
        if self.on_response.is_empty() {
            return;
        }
        let event = ResponseEvent::Message(response.clone());
        for observer in &self.on_response {
            observer(attempt, &event);
        }
    }

    /// Shows a transport-failure note to every response observer.
    pub(crate) fn notify_note(&self, attempt: u32, note: &str) {
        if self.on_response.is_empty() {
            return;
        }
        let event = ResponseEvent::TransportNote(note.to_string());
        for observer in &self.on_response {
            observer(attempt, &event);
        }
    }
}

/// Everything [`execute`] needs besides the request itself.
#[derive(Clone, Copy)]
pub struct ExecuteContext<'a> {
    /// The shared channel to send over.
    pub channel: &'a dyn LedgerChannel,
    /// Retry budget and pacing.
    pub policy: RetryPolicy,
    /// Optional caller deadline, observed at every suspension point.
    pub deadline: Option<Instant>,
    /// Telemetry callbacks.
    pub observers: &'a Observers,
}

/// Where the retry loop currently stands.
enum LoopState {
    /// Sending (or resending) the caller's request.
    Retrying,
    /// A transport failure left a state-changing request's fate unknown;
    /// probing for an existing receipt before any resend.
    RecoveringAfterTransportFailure,
}

/// What one guarded send produced.
enum SendOutcome {
    /// The node replied.
    Reply(Response),
    /// An ambiguous transport failure worth retrying or recovering from.
    TransportFailure(TransportError),
}

/// Executes `request` until a final response, per `classify`.
///
/// `classify` decides whether a given reply is the outcome or a transient
/// signal; the executor itself never inspects anything beyond the
/// `ReceiptNotFound` header during recovery. Non-ambiguous transport
/// failures are wrapped into [`Error::Transport`] immediately and never
/// retried; after `max_retries` classified retries one final
/// unconditional attempt is made and its reply returned regardless of
/// classification.
pub async fn execute(
    ctx: ExecuteContext<'_>,
    request: &OutboundRequest,
    classify: impl Fn(&Response) -> Disposition,
) -> Result<Response> {
    let node = ctx.channel.target();
    ctx.observers.notify_sending(request);

    // Only state-changing requests risk duplication on a blind resend,
    // so only they get the recovery probe.
    let recovery_query = request
        .is_state_changing()
        .then(|| request.identity().copied())
        .flatten()
        .map(|identity| OutboundRequest::Query(QueryBody::ReceiptStatus(identity)));

    let mut state = LoopState::Retrying;
    let mut attempt: u32 = 0;
    while attempt < ctx.policy.max_retries {
        match state {
            LoopState::Retrying => {
                match guarded_send(ctx, request, &node).await? {
                    SendOutcome::Reply(response) => {
                        ctx.observers.notify_message(attempt, &response);
                        if classify(&response) == Disposition::Final {
                            return Ok(response);
                        }
                        debug!(
                            "Transient response {} from {} on attempt {}, retrying",
                            response.precheck,
                            node,
                            attempt + 1
                        );
                    }
                    SendOutcome::TransportFailure(failure) => {
                        let note =
                            format!("Unable to communicate with network node {node}: {failure}");
                        ctx.observers.notify_note(attempt, &note);
                        warn!("⚠️ Attempt {} failed: {}", attempt + 1, note);
                        if recovery_query.is_some() {
                            state = LoopState::RecoveringAfterTransportFailure;
                        }
                    }
                }
            }
            LoopState::RecoveringAfterTransportFailure => {
                let query = recovery_query.as_ref().expect("recovery implies identity");
                match guarded_send(ctx, query, &node).await? {
                    SendOutcome::Reply(response) => {
                        ctx.observers.notify_message(attempt, &response);
                        if response.precheck != ResponseCode::ReceiptNotFound
                            && classify(&response) == Disposition::Final
                        {
                            info!(
                                "✅ Found receipt for {} after transport failure, \
                                 not resending",
                                query.identity().expect("receipt query has identity")
                            );
                            return Ok(response);
                        }
                        // No receipt on file: the request never landed,
                        // resending is safe.
                        state = LoopState::Retrying;
                    }
                    SendOutcome::TransportFailure(failure) => {
                        let note =
                            format!("Unable to communicate with network node {node}: {failure}");
                        ctx.observers.notify_note(attempt, &note);
                        warn!(
                            "⚠️ Receipt recovery attempt {} failed: {}",
                            attempt + 1,
                            note
                        );
                    }
                }
            }
        }
        attempt += 1;
        backoff(ctx, attempt, &node).await?;
    }

    // Budget spent: one final unconditional attempt, returned as-is.
    match guarded_send(ctx, request, &node).await? {
        SendOutcome::Reply(response) => {
            ctx.observers
                .notify_message(ctx.policy.max_retries, &response);
            Ok(response)
        }
        SendOutcome::TransportFailure(failure) => Err(Error::Transport {
            node,
            detail: failure.to_string(),
        }),
    }
}

/// Executes a signed submission, feeding clock-window rejections back into
/// the drift estimate when `track_drift` is set.
///
/// The delta fed back is the time elapsed between pipeline start and the
/// rejection as measured by the unique clock, which approximates how far
/// outside the node's window the minted timestamp was.
pub async fn execute_signed(
    ctx: ExecuteContext<'_>,
    clock: &LedgerClock,
    track_drift: bool,
    request: &OutboundRequest,
) -> Result<Response> {
    let starting_instant = if track_drift { clock.unique_nanos() } else { 0 };
    execute(ctx, request, |response| {
        if track_drift && response.precheck == ResponseCode::InvalidTransactionStart {
            clock.adjust_drift(clock.unique_nanos() - starting_instant);
        }
        if response.precheck.is_retryable_precheck() {
            Disposition::Retry
        } else {
            Disposition::Final
        }
    })
    .await
}

/// Sends one request, honoring the deadline and splitting transport
/// failures into ambiguous (retryable) and wrapped-terminal.
async fn guarded_send(
    ctx: ExecuteContext<'_>,
    request: &OutboundRequest,
    node: &str,
) -> Result<SendOutcome> {
    let send = ctx.channel.send(request);
    let sent = match ctx.deadline {
        Some(deadline) => timeout_at(deadline, send)
            .await
            .map_err(|_| Error::DeadlineExceeded {
                node: node.to_string(),
            })?,
        None => send.await,
    };
    match sent {
        Ok(response) => Ok(SendOutcome::Reply(response)),
        Err(failure) if failure.is_ambiguous() => Ok(SendOutcome::TransportFailure(failure)),
        Err(failure) => Err(Error::Transport {
            node: node.to_string(),
            detail: failure.to_string(),
        }),
    }
}

/// Sleeps `base_delay * attempt`, honoring the deadline.
async fn backoff(ctx: ExecuteContext<'_>, attempt: u32, node: &str) -> Result<()> {
    let delay = ctx.policy.base_delay * attempt;
    if delay.is_zero() {
        return Ok(());
    }
    match ctx.deadline {
        Some(deadline) => timeout_at(deadline, sleep(delay))
            .await
            .map_err(|_| Error::DeadlineExceeded {
                node: node.to_string(),
            }),
        None => {
            sleep(delay).await;
            Ok(())
        }
    }
}
