//! Prometheus metrics collection for solvedd.
//!
//! - `solved_accept_total` / `solved_unaccept_total` - committed transitions
//! - `solved_rejected_total{reason}` - failed requests by error code
//! - `solved_cache_rebuilds_total` / `solved_cache_invalidations_total`
//! - `solved_request_duration_seconds{operation}` - request latency

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Committed accept transitions (including replacements).
pub static ACCEPTS: OnceLock<IntCounter> = OnceLock::new();

/// Committed unaccept transitions.
pub static UNACCEPTS: OnceLock<IntCounter> = OnceLock::new();

/// Requests that failed, by error code.
pub static REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Category cache rebuilds that were installed.
pub static CACHE_REBUILDS: OnceLock<IntCounter> = OnceLock::new();

/// Category cache invalidations.
pub static CACHE_INVALIDATIONS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Accept/unaccept latency by operation.
pub static REQUEST_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before metrics are recorded; until then
/// every recorder is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(ACCEPTS, IntCounter::new("solved_accept_total", "Accepted answers set"));
    register!(UNACCEPTS, IntCounter::new("solved_unaccept_total", "Accepted answers cleared"));
    register!(REJECTED, IntCounterVec::new(Opts::new("solved_rejected_total", "Failed accept/unaccept requests"), &["reason"]));
    register!(CACHE_REBUILDS, IntCounter::new("solved_cache_rebuilds_total", "Category permission cache rebuilds"));
    register!(CACHE_INVALIDATIONS, IntCounter::new("solved_cache_invalidations_total", "Category permission cache invalidations"));
    register!(REQUEST_LATENCY, HistogramVec::new(
        HistogramOpts::new("solved_request_duration_seconds", "Accept/unaccept latency by operation")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
fn inc(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

#[inline]
pub fn record_accept() {
    inc(&ACCEPTS);
}

#[inline]
pub fn record_unaccept() {
    inc(&UNACCEPTS);
}

#[inline]
pub fn record_cache_rebuild() {
    inc(&CACHE_REBUILDS);
}

#[inline]
pub fn record_cache_invalidation() {
    inc(&CACHE_INVALIDATIONS);
}

/// Record a failed request.
#[inline]
pub fn record_rejection(reason: &str) {
    if let Some(c) = REJECTED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

/// Record request latency.
#[inline]
pub fn record_request(operation: &str, duration_secs: f64) {
    if let Some(h) = REQUEST_LATENCY.get() {
        h.with_label_values(&[operation]).observe(duration_secs);
    }
}
