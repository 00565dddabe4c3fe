//! Scripted channel double for exercising the pipeline without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledger_core::{
    AccountAddress, OutboundRequest, QueryBody, Response, SignatureMap, SignaturePair,
    SignedEnvelope, Timestamp, TransactionIdentity,
};

use crate::channel::{LedgerChannel, TransportError};

/// One scripted exchange: either a reply or a transport failure.
pub enum ScriptStep {
    /// The node replies with this response.
    Reply(Response),
    /// The transport fails before any response exists.
    Fail(TransportError),
}

/// A channel that replays a fixed script and records everything sent.
pub struct ScriptedChannel {
    /// Remaining scripted steps, consumed front to back.
    script: Mutex<VecDeque<ScriptStep>>,
    /// Every request sent, in order.
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedChannel {
    /// Builds a channel that will play out `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Total number of requests sent through the channel.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of state-changing transaction sends.
    pub fn transaction_sends(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.is_state_changing())
            .count()
    }

    /// Number of receipt-status query sends.
    pub fn receipt_query_sends(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|request| {
                matches!(
                    request,
                    OutboundRequest::Query(QueryBody::ReceiptStatus(_))
                )
            })
            .count()
    }
}

#[async_trait]
impl LedgerChannel for ScriptedChannel {
    fn target(&self) -> String {
        "node0.test:50211".to_string()
    }

    async fn send(&self, request: &OutboundRequest) -> Result<Response, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted channel ran out of steps");
        match step {
            ScriptStep::Reply(response) => Ok(response),
            ScriptStep::Fail(failure) => Err(failure),
        }
    }
}

/// Initializes test logging once so `RUST_LOG` controls output while the
/// suite runs.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A minimal frozen envelope for a payer, good enough for any executor
/// test that never verifies signatures.
pub fn test_envelope(payer: AccountAddress) -> SignedEnvelope {
    SignedEnvelope {
        identity: TransactionIdentity {
            payer,
            valid_start: Timestamp {
                seconds: 1_700_000_000,
                nanos: 1,
            },
        },
        memo: "test envelope".to_string(),
        body_bytes: b"body".to_vec(),
        signatures: SignatureMap {
            pairs: vec![SignaturePair {
                key_prefix: vec![0xAA],
                algorithm: ledger_core::KeyAlgorithm::Ed25519,
                signature: vec![0xBB; 64],
            }],
        },
    }
}
