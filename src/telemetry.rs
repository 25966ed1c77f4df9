//! Telemetry metric name constants.
//!
//! Centralised metric names for hugin operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hugin_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `kind` — payload kind (`dashboard`, `signals`, `article`, `articles`)
//! - `provenance` — where a served value came from (`fresh`, `live`, `stale`, `mock`, `unavailable`)
//! - `operation` — upstream call (e.g. `fetch_dashboard`)
//! - `status` — upstream outcome: "ok" or "error"

/// Fresh cache reads that found a value.
///
/// Labels: `kind`.
pub const CACHE_HITS_TOTAL: &str = "hugin_cache_hits_total";

/// Fresh cache reads that found nothing (absent or expired).
///
/// Labels: `kind`.
pub const CACHE_MISSES_TOTAL: &str = "hugin_cache_misses_total";

/// Stale cache reads that found a value after an upstream failure.
///
/// Labels: `kind`.
pub const CACHE_STALE_HITS_TOTAL: &str = "hugin_cache_stale_hits_total";

/// Total upstream requests issued by the HTTP client.
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "hugin_upstream_requests_total";

/// Upstream request duration in seconds.
///
/// Labels: `operation`.
pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str = "hugin_upstream_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "hugin_retries_total";

/// Completed fallback resolutions.
///
/// Labels: `kind`, `provenance`.
pub const RESOLUTIONS_TOTAL: &str = "hugin_resolutions_total";
