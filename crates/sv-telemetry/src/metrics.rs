//! Prometheus metrics for the validator subsystems.
//!
//! All metrics follow the naming convention: `sv_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SIDE-TX VOTING (sv-02, sv-04)
    // =========================================================================

    /// Votes cast locally by side handlers
    pub static ref SIDE_TX_VOTES: CounterVec = CounterVec::new(
        Opts::new("sv_side_tx_votes_total", "Side-tx votes cast by this validator"),
        &["result"]  // yes/no/unspecified
    ).expect("metric creation failed");

    /// Tally outcomes at PreBlock
    pub static ref SIDE_TX_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("sv_side_tx_outcomes_total", "Tallied side-tx outcomes"),
        &["outcome"]  // approved/rejected/skipped
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE (sv-07)
    // =========================================================================

    /// Proposals rejected at ProcessProposal
    pub static ref PROPOSALS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sv_proposals_rejected_total", "Proposals rejected by ProcessProposal"),
        &["reason"]
    ).expect("metric creation failed");

    /// Vote extensions rejected at VerifyVoteExtension
    pub static ref VOTE_EXTENSIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sv_vote_extensions_rejected_total", "Peer vote extensions rejected"),
        &["reason"]
    ).expect("metric creation failed");

    /// PreBlock duration
    pub static ref PRE_BLOCK_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "sv_pre_block_duration_seconds",
            "Time spent tallying and applying side-tx outcomes"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Last finalized height
    pub static ref LAST_FINALIZED_HEIGHT: Gauge = Gauge::new(
        "sv_last_finalized_height",
        "Height of the last finalized block"
    ).expect("metric creation failed");

    /// Payload producer failures by stage
    pub static ref PAYLOAD_BUILD_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sv_payload_build_failures_total", "Execution payload build failures"),
        &["stage"]  // forkchoice/get_payload/timeout
    ).expect("metric creation failed");

    // =========================================================================
    // CHECKPOINT / MILESTONE (sv-05, sv-06)
    // =========================================================================

    /// Checkpoints acknowledged on the root chain and committed
    pub static ref CHECKPOINTS_ACKED: Counter = Counter::new(
        "sv_checkpoints_acked_total",
        "Checkpoints committed after a root-chain acknowledgement"
    ).expect("metric creation failed");

    /// Accepted no-acks
    pub static ref CHECKPOINT_NO_ACKS: Counter = Counter::new(
        "sv_checkpoint_no_acks_total",
        "Accepted checkpoint no-ack messages"
    ).expect("metric creation failed");

    /// Milestones committed from vote-extension majorities
    pub static ref MILESTONES_COMMITTED: Counter = Counter::new(
        "sv_milestones_committed_total",
        "Milestones committed"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Side-tx voting
        Box::new(SIDE_TX_VOTES.clone()),
        Box::new(SIDE_TX_OUTCOMES.clone()),
        // Lifecycle
        Box::new(PROPOSALS_REJECTED.clone()),
        Box::new(VOTE_EXTENSIONS_REJECTED.clone()),
        Box::new(PRE_BLOCK_DURATION.clone()),
        Box::new(LAST_FINALIZED_HEIGHT.clone()),
        Box::new(PAYLOAD_BUILD_FAILURES.clone()),
        // Checkpoint / milestone
        Box::new(CHECKPOINTS_ACKED.clone()),
        Box::new(CHECKPOINT_NO_ACKS.clone()),
        Box::new(MILESTONES_COMMITTED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
