//! Transaction submitter with single-flight gating and readiness checks

use crate::address::Address;
use crate::error::{CoreError, CoreResult};
use crate::gate::SingleFlightGate;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An opaque protocol message carried to the broadcast collaborator
/// untouched (mint/burn/deposit/redeem payloads are not interpreted here).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnyMessage {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl AnyMessage {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// Outcome reported by the broadcast collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxResponse {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
    pub height: u64,
}

impl TxResponse {
    /// Zero is success in the chain's response convention.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// A submission request that has been accepted but not yet broadcast.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub id: Uuid,
    pub msgs: Vec<AnyMessage>,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingTransaction {
    fn new(msgs: Vec<AnyMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            msgs,
            enqueued_at: Utc::now(),
        }
    }
}

/// Broadcasts a signed transaction to the chain. Implemented by the wallet/
/// RPC layer outside this crate; this core depends only on this narrow
/// async contract.
#[async_trait]
pub trait BroadcastClient: Send + Sync {
    async fn broadcast(&self, sender: &Address, msgs: &[AnyMessage]) -> CoreResult<TxResponse>;
}

/// Exposes the currently connected signing account, if any.
pub trait SignerProvider: Send + Sync {
    fn connected_account(&self) -> Option<Address>;
}

/// Submits transactions one at a time.
///
/// Concurrent `submit()` calls queue behind the gate in FIFO order; at most
/// one broadcast call is in flight per submitter instance. A failed
/// broadcast is surfaced to its caller and never retried automatically, and
/// the gate is released on every exit path so queued callers are unaffected
/// by a prior failure.
pub struct TransactionSubmitter {
    gate: SingleFlightGate,
    client: Arc<dyn BroadcastClient>,
    signer: Arc<dyn SignerProvider>,
}

impl TransactionSubmitter {
    /// Create a submitter over the injected collaborators.
    pub fn new(client: Arc<dyn BroadcastClient>, signer: Arc<dyn SignerProvider>) -> Self {
        Self {
            gate: SingleFlightGate::new(),
            client,
            signer,
        }
    }

    /// Submit a transaction, waiting for any in-flight submission first.
    ///
    /// Fails with `NotReady` before touching the gate when no signing
    /// account is connected, so unready callers never occupy a queue slot.
    pub async fn submit(&self, msgs: Vec<AnyMessage>) -> CoreResult<TxResponse> {
        let account = self.signer.connected_account().ok_or(CoreError::NotReady)?;

        let pending = PendingTransaction::new(msgs);
        debug!(
            tx = %pending.id,
            msgs = pending.msgs.len(),
            queued = self.gate.waiters(),
            "submission requested"
        );

        let _guard = self.gate.acquire().await;

        info!(tx = %pending.id, sender = %account, "broadcasting");
        let response = self.client.broadcast(&account, &pending.msgs).await?;

        if !response.is_success() {
            warn!(
                tx = %pending.id,
                code = response.code,
                log = %response.raw_log,
                "broadcast rejected by chain"
            );
            return Err(CoreError::BroadcastFailed(response.raw_log));
        }

        info!(tx = %pending.id, hash = %response.tx_hash, "broadcast confirmed");
        Ok(response)
    }

    /// Whether a submission is currently in flight (useful for disabling a
    /// submit control in the UI).
    pub fn is_busy(&self) -> bool {
        self.gate.is_held()
    }

    /// Number of submissions waiting behind the in-flight one.
    pub fn queued(&self) -> usize {
        self.gate.waiters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressCodec;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    fn test_account() -> Address {
        AddressCodec::default().from_bytes([0x11; 20])
    }

    struct ConnectedSigner;
    impl SignerProvider for ConnectedSigner {
        fn connected_account(&self) -> Option<Address> {
            Some(test_account())
        }
    }

    struct DisconnectedSigner;
    impl SignerProvider for DisconnectedSigner {
        fn connected_account(&self) -> Option<Address> {
            None
        }
    }

    /// Records broadcast start order and asserts no overlap.
    struct RecordingClient {
        delay: Duration,
        in_flight: AtomicUsize,
        started: Mutex<Vec<usize>>,
        calls: AtomicUsize,
    }

    impl RecordingClient {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                in_flight: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BroadcastClient for RecordingClient {
        async fn broadcast(
            &self,
            _sender: &Address,
            msgs: &[AnyMessage],
        ) -> CoreResult<TxResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            assert_eq!(now, 1, "two broadcasts were in flight at once");

            let tag: usize = msgs[0].type_url.parse().unwrap();
            self.started.lock().unwrap().push(tag);

            sleep(self.delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TxResponse {
                tx_hash: format!("{:064x}", call),
                code: 0,
                raw_log: String::new(),
                height: 100 + call as u64,
            })
        }
    }

    struct FailingClient;

    #[async_trait]
    impl BroadcastClient for FailingClient {
        async fn broadcast(
            &self,
            _sender: &Address,
            _msgs: &[AnyMessage],
        ) -> CoreResult<TxResponse> {
            Err(CoreError::BroadcastFailed("out of gas".to_string()))
        }
    }

    struct RejectingClient;

    #[async_trait]
    impl BroadcastClient for RejectingClient {
        async fn broadcast(
            &self,
            _sender: &Address,
            _msgs: &[AnyMessage],
        ) -> CoreResult<TxResponse> {
            Ok(TxResponse {
                tx_hash: String::new(),
                code: 5,
                raw_log: "insufficient funds".to_string(),
                height: 0,
            })
        }
    }

    fn msg(tag: usize) -> Vec<AnyMessage> {
        vec![AnyMessage::new(tag.to_string(), vec![])]
    }

    #[tokio::test]
    async fn submit_broadcasts_and_returns_response() {
        let client = Arc::new(RecordingClient::new(Duration::from_millis(1)));
        let submitter = TransactionSubmitter::new(client, Arc::new(ConnectedSigner));

        let response = submitter.submit(msg(0)).await.unwrap();
        assert!(response.is_success());
        assert!(!submitter.is_busy());
    }

    #[tokio::test]
    async fn not_ready_without_connected_account() {
        let client = Arc::new(RecordingClient::new(Duration::from_millis(1)));
        let submitter = TransactionSubmitter::new(client.clone(), Arc::new(DisconnectedSigner));

        assert!(matches!(
            submitter.submit(msg(0)).await,
            Err(CoreError::NotReady)
        ));
        // Unready callers never reach the collaborator or the queue.
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(submitter.queued(), 0);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_strictly_sequenced() {
        // Three callers at t=0,1,2 with a 5-unit broadcast: starts observed
        // in submission order, never overlapping.
        let client = Arc::new(RecordingClient::new(Duration::from_millis(50)));
        let submitter = Arc::new(TransactionSubmitter::new(
            client.clone(),
            Arc::new(ConnectedSigner),
        ));

        let mut handles = Vec::new();
        for i in 0..3usize {
            let submitter = submitter.clone();
            handles.push(tokio::spawn(async move {
                submitter.submit(msg(i)).await.unwrap()
            }));
            sleep(Duration::from_millis(10)).await;
        }

        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(*client.started.lock().unwrap(), vec![0, 1, 2]);
        assert!(!submitter.is_busy());
    }

    #[tokio::test]
    async fn failure_releases_the_gate() {
        let submitter = Arc::new(TransactionSubmitter::new(
            Arc::new(FailingClient),
            Arc::new(ConnectedSigner),
        ));

        assert!(matches!(
            submitter.submit(msg(0)).await,
            Err(CoreError::BroadcastFailed(_))
        ));

        // A prior failure leaves subsequent callers unaffected.
        assert!(!submitter.is_busy());
        assert!(matches!(
            submitter.submit(msg(1)).await,
            Err(CoreError::BroadcastFailed(_))
        ));
    }

    #[tokio::test]
    async fn chain_rejection_surfaces_raw_log() {
        let submitter = TransactionSubmitter::new(
            Arc::new(RejectingClient),
            Arc::new(ConnectedSigner),
        );

        match submitter.submit(msg(0)).await {
            Err(CoreError::BroadcastFailed(log)) => assert_eq!(log, "insufficient funds"),
            other => panic!("expected BroadcastFailed, got {:?}", other.map(|_| ())),
        }
        assert!(!submitter.is_busy());
    }

    #[tokio::test]
    async fn busy_flag_tracks_in_flight_submission() {
        let client = Arc::new(RecordingClient::new(Duration::from_millis(50)));
        let submitter = Arc::new(TransactionSubmitter::new(
            client,
            Arc::new(ConnectedSigner),
        ));

        let handle = tokio::spawn({
            let submitter = submitter.clone();
            async move { submitter.submit(msg(0)).await.unwrap() }
        });

        sleep(Duration::from_millis(10)).await;
        assert!(submitter.is_busy());

        handle.await.unwrap();
        assert!(!submitter.is_busy());
    }
}
