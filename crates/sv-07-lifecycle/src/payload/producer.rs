//! Background payload producer.
//!
//! Handshake with the execution client is bounded by `handshake_timeout`;
//! fetching the built payload is retried until it succeeds or the node
//! shuts down. Both retry loops back off exponentially from `base_backoff`
//! up to [`MAX_BACKOFF`], then start over from `base_backoff`.

use super::engine::{ExecutionEngine, ExecutionPayload, PayloadAttributes, PayloadId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use sv_telemetry::{metric_inc, PAYLOAD_BUILD_FAILURES};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Backoff ceiling; reaching it resets the delay to the base.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadProducerConfig {
    pub handshake_timeout_ms: u64,
    pub base_backoff_ms: u64,
}

impl Default for PayloadProducerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 2_000,
            base_backoff_ms: 500,
        }
    }
}

impl PayloadProducerConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms.max(1))
    }
}

/// Delay after `current`: doubled, capped at [`MAX_BACKOFF`], and back to
/// `base` once the cap has been used.
pub fn next_backoff(current: Duration, base: Duration) -> Duration {
    if current >= MAX_BACKOFF {
        base
    } else {
        current.saturating_mul(2).min(MAX_BACKOFF)
    }
}

/// The lifecycle's side of the producer channels.
pub struct PayloadHandle {
    next_block: watch::Sender<Option<PayloadAttributes>>,
    latest: watch::Receiver<Option<ExecutionPayload>>,
}

impl PayloadHandle {
    /// Ask for a payload for the next block. Replaces any pending request.
    pub fn request(&self, attributes: PayloadAttributes) {
        debug!(height = attributes.height, "[sv-07] requesting execution payload");
        self.next_block.send_replace(Some(attributes));
    }

    /// Payload bytes built for `height`, if the latest payload is for it.
    pub fn payload_for(&self, height: i64) -> Option<Vec<u8>> {
        let latest = self.latest.borrow();
        match latest.as_ref() {
            Some(payload) if payload.height == height => Some(payload.data.clone()),
            Some(payload) => {
                warn!(
                    height,
                    payload_height = payload.height,
                    "[sv-07] latest execution payload is stale"
                );
                None
            }
            None => {
                warn!(height, "[sv-07] no execution payload available");
                None
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ExecutionPayload>> {
        self.latest.clone()
    }
}

pub struct PayloadProducer {
    engine: Arc<dyn ExecutionEngine>,
    config: PayloadProducerConfig,
    next_block: watch::Receiver<Option<PayloadAttributes>>,
    latest: watch::Sender<Option<ExecutionPayload>>,
}

impl PayloadProducer {
    /// Create the producer and the handle the lifecycle keeps.
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        config: PayloadProducerConfig,
    ) -> (Self, PayloadHandle) {
        let (next_tx, next_rx) = watch::channel(None);
        let (latest_tx, latest_rx) = watch::channel(None);
        let producer = Self {
            engine,
            config,
            next_block: next_rx,
            latest: latest_tx,
        };
        let handle = PayloadHandle {
            next_block: next_tx,
            latest: latest_rx,
        };
        (producer, handle)
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Build one payload per request until shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[sv-07] payload producer started");

        while !*shutdown.borrow() {
            let changed = tokio::select! {
                _ = shutdown.changed() => None,
                res = self.next_block.changed() => Some(res),
            };
            match changed {
                Some(Ok(())) => {}
                // Shutdown signalled, or the lifecycle dropped its handle
                _ => break,
            }

            let request = self.next_block.borrow_and_update().clone();
            let Some(attributes) = request else {
                continue;
            };
            match self.build(&attributes, &mut shutdown).await {
                Some(payload) => {
                    info!(
                        height = payload.height,
                        size = payload.data.len(),
                        "[sv-07] execution payload ready"
                    );
                    self.latest.send_replace(Some(payload));
                }
                None => break,
            }
        }

        info!("[sv-07] payload producer stopped");
    }

    /// `None` when shutdown interrupted the build.
    async fn build(
        &self,
        attributes: &PayloadAttributes,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<ExecutionPayload> {
        let base = self.config.base_backoff();
        let id = self.handshake(attributes, base, shutdown).await?;

        let mut backoff = base;
        loop {
            match self.engine.get_payload(&id).await {
                Ok(payload) => return Some(payload),
                Err(err) => {
                    metric_inc!(PAYLOAD_BUILD_FAILURES, &["get_payload"]);
                    warn!(
                        height = attributes.height,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "[sv-07] get_payload failed"
                    );
                }
            }
            if !sleep_or_shutdown(backoff, shutdown).await {
                return None;
            }
            backoff = next_backoff(backoff, base);
        }
    }

    async fn handshake(
        &self,
        attributes: &PayloadAttributes,
        base: Duration,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<PayloadId> {
        let mut backoff = base;
        loop {
            let attempt = tokio::time::timeout(
                self.config.handshake_timeout(),
                self.engine.forkchoice_updated(attributes),
            )
            .await;
            match attempt {
                Ok(Ok(id)) => return Some(id),
                Ok(Err(err)) => {
                    metric_inc!(PAYLOAD_BUILD_FAILURES, &["forkchoice"]);
                    warn!(
                        height = attributes.height,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "[sv-07] forkchoice handshake failed"
                    );
                }
                Err(_) => {
                    metric_inc!(PAYLOAD_BUILD_FAILURES, &["timeout"]);
                    warn!(
                        height = attributes.height,
                        timeout_ms = self.config.handshake_timeout_ms,
                        "[sv-07] forkchoice handshake timed out"
                    );
                }
            }
            if !sleep_or_shutdown(backoff, shutdown).await {
                return None;
            }
            backoff = next_backoff(backoff, base);
        }
    }
}

/// `false` if shutdown was signalled first.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.changed() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::engine::EngineError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockEngine {
        forkchoice_calls: AtomicUsize,
        payload_calls: AtomicUsize,
        /// Handshakes that fail before one succeeds
        forkchoice_failures: AtomicUsize,
        /// Handshakes that never answer
        forkchoice_hangs: AtomicUsize,
        payload_failures: AtomicUsize,
        always_fail: bool,
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    #[async_trait]
    impl ExecutionEngine for MockEngine {
        async fn forkchoice_updated(
            &self,
            attributes: &PayloadAttributes,
        ) -> Result<PayloadId, EngineError> {
            self.forkchoice_calls.fetch_add(1, Ordering::SeqCst);
            if take_one(&self.forkchoice_hangs) {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
            }
            if self.always_fail || take_one(&self.forkchoice_failures) {
                return Err(EngineError::Unavailable("connection refused".into()));
            }
            Ok(PayloadId((attributes.height as u64).to_be_bytes()))
        }

        async fn get_payload(&self, id: &PayloadId) -> Result<ExecutionPayload, EngineError> {
            self.payload_calls.fetch_add(1, Ordering::SeqCst);
            if take_one(&self.payload_failures) {
                return Err(EngineError::Rejected("payload not ready".into()));
            }
            let height = u64::from_be_bytes(id.0) as i64;
            Ok(ExecutionPayload {
                height,
                block_hash: vec![height as u8; 32],
                data: vec![0xee, height as u8],
            })
        }
    }

    fn attributes(height: i64) -> PayloadAttributes {
        PayloadAttributes {
            height,
            timestamp: 1_000 + height as u64,
            parent_hash: vec![1; 32],
        }
    }

    async fn next_payload(
        rx: &mut watch::Receiver<Option<ExecutionPayload>>,
    ) -> ExecutionPayload {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone().unwrap()
    }

    #[test]
    fn test_backoff_doubles_then_resets_at_ceiling() {
        let base = Duration::from_secs(1);
        let mut delay = base;
        let mut seen = vec![delay.as_secs()];
        for _ in 0..7 {
            delay = next_backoff(delay, base);
            seen.push(delay.as_secs());
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 60, 1]);
    }

    #[test]
    fn test_config_defaults_and_durations() {
        let config = PayloadProducerConfig::default();
        assert_eq!(config.handshake_timeout(), Duration::from_secs(2));
        assert_eq!(config.base_backoff(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_builds_payload_for_requested_height() {
        let engine = Arc::new(MockEngine::default());
        let (producer, handle) = PayloadProducer::new(engine.clone(), PayloadProducerConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);

        let mut latest = handle.subscribe();
        handle.request(attributes(5));
        let payload = next_payload(&mut latest).await;

        assert_eq!(payload.height, 5);
        assert_eq!(handle.payload_for(5), Some(vec![0xee, 5]));
        assert_eq!(handle.payload_for(6), None);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_payload_before_first_request() {
        let engine = Arc::new(MockEngine::default());
        let (_producer, handle) = PayloadProducer::new(engine, PayloadProducerConfig::default());
        assert_eq!(handle.payload_for(1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_failures_are_retried() {
        let engine = Arc::new(MockEngine {
            forkchoice_failures: AtomicUsize::new(3),
            payload_failures: AtomicUsize::new(2),
            ..Default::default()
        });
        let (producer, handle) = PayloadProducer::new(engine.clone(), PayloadProducerConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);

        let mut latest = handle.subscribe();
        handle.request(attributes(9));
        let payload = next_payload(&mut latest).await;

        assert_eq!(payload.height, 9);
        assert_eq!(engine.forkchoice_calls.load(Ordering::SeqCst), 4);
        assert_eq!(engine.payload_calls.load(Ordering::SeqCst), 3);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_handshake_times_out() {
        let engine = Arc::new(MockEngine {
            forkchoice_hangs: AtomicUsize::new(1),
            ..Default::default()
        });
        let (producer, handle) = PayloadProducer::new(engine.clone(), PayloadProducerConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);

        let started = tokio::time::Instant::now();
        let mut latest = handle.subscribe();
        handle.request(attributes(2));
        next_payload(&mut latest).await;

        assert_eq!(engine.forkchoice_calls.load(Ordering::SeqCst), 2);
        // Timed out after 2s, then waited one base backoff
        assert!(started.elapsed() >= Duration::from_millis(2_500));
        assert!(started.elapsed() < Duration::from_secs(3_600));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins() {
        let engine = Arc::new(MockEngine::default());
        let (producer, handle) = PayloadProducer::new(engine.clone(), PayloadProducerConfig::default());

        handle.request(attributes(3));
        handle.request(attributes(4));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);
        let mut latest = handle.subscribe();
        let payload = next_payload(&mut latest).await;

        assert_eq!(payload.height, 4);
        assert_eq!(engine.forkchoice_calls.load(Ordering::SeqCst), 1);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_backoff() {
        let engine = Arc::new(MockEngine {
            always_fail: true,
            ..Default::default()
        });
        let (producer, handle) = PayloadProducer::new(engine.clone(), PayloadProducerConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);

        handle.request(attributes(7));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(engine.forkchoice_calls.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
        assert_eq!(handle.payload_for(7), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_stops_when_handle_dropped() {
        let engine = Arc::new(MockEngine::default());
        let (producer, handle) = PayloadProducer::new(engine, PayloadProducerConfig::default());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = producer.spawn(shutdown_rx);

        drop(handle);
        task.await.unwrap();
    }
}
