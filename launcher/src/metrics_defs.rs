//! Metrics definitions for the launcher.

use shared::metrics_defs::{MetricDef, MetricType};

pub const BATCH_ITEMS: MetricDef = MetricDef {
    name: "campaigns.batch.items",
    metric_type: MetricType::Counter,
    description: "Processed batch items, tagged by operation (schedule, reschedule, cancel, revert) and outcome",
};

pub const BATCH_DURATION: MetricDef = MetricDef {
    name: "campaigns.batch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to process a whole batch in seconds, tagged by operation",
};

pub const LAUNCH_ITEMS: MetricDef = MetricDef {
    name: "campaigns.launch.items",
    metric_type: MetricType::Counter,
    description: "Launch configurations processed, tagged by outcome",
};

pub const SEGMENT_GROUP_MUTATIONS: MetricDef = MetricDef {
    name: "segment_groups.mutations",
    metric_type: MetricType::Counter,
    description: "Successful segment group writes, tagged by operation",
};

pub const ALL_METRICS: &[MetricDef] = &[
    BATCH_ITEMS,
    BATCH_DURATION,
    LAUNCH_ITEMS,
    SEGMENT_GROUP_MUTATIONS,
];
