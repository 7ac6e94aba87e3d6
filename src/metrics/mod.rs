use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::register_histogram_vec;
use prometheus::GaugeVec;
use prometheus::HistogramVec;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;

lazy_static! {
    pub static ref COMMITTED_OPERATIONS: IntCounter = IntCounter::new(
        "committed_operations_total",
        "Operations finalized through commit quorum on this node"
    )
    .expect("metric can not be created");

    pub static ref VIEW_CHANGES_TOTAL: IntCounter = IntCounter::new(
        "view_changes_total",
        "Successful leader changes observed by this node"
    )
    .expect("metric can not be created");

    pub static ref EQUIVOCATION_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "equivocation_events_total",
            "Conflicting pre-prepares detected, by offending node"
        ),
        &["node"]
    )
    .expect("metric can not be created");

    pub static ref CONFLICTS_RESOLVED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "conflicts_resolved_total",
            "Concurrent-write conflict sets resolved, by policy"
        ),
        &["policy"]
    )
    .expect("metric can not be created");

    pub static ref STORAGE_APPLY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "storage_apply_failures_total",
            "apply() callbacks that returned an error, by collection"
        ),
        &["collection"]
    )
    .expect("metric can not be created");

    pub static ref REPLICATION_QUEUE_DEPTH: GaugeVec = GaugeVec::new(
        Opts::new(
            "replication_queue_depth",
            "Records waiting in the outbound queue, by peer link"
        ),
        &["peer"]
    )
    .expect("metric can not be created");

    pub static ref COMMIT_LATENCY_MS: HistogramVec = register_histogram_vec!(
        "commit_latency_ms",
        "Histogram of propose-to-commit latency in ms",
        &["collection"],
        exponential_buckets(1.0, 2.0, 12).expect("bucket layout")
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(COMMITTED_OPERATIONS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(VIEW_CHANGES_TOTAL.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(EQUIVOCATION_EVENTS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(CONFLICTS_RESOLVED.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(STORAGE_APPLY_FAILURES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(REPLICATION_QUEUE_DEPTH.clone()))
            .expect("collector can be registered");
    });
}

/// Text-encoded snapshot of the engine registry, for whatever scraping
/// surface the embedding process exposes.
pub fn gather() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("could not encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
