//! Metrics definitions for the platform client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const PLATFORM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "platform.request.duration",
    metric_type: MetricType::Histogram,
    description: "Round trip time of a platform API request in seconds, tagged by operation",
};

pub const PLATFORM_REQUEST_FAILED: MetricDef = MetricDef {
    name: "platform.request.failed",
    metric_type: MetricType::Counter,
    description: "Platform API requests that failed at the transport or returned a non-2xx status",
};

pub const ALL_METRICS: &[MetricDef] = &[PLATFORM_REQUEST_DURATION, PLATFORM_REQUEST_FAILED];
