//! Media pipeline metrics.

use metrics::{counter, histogram};

pub mod names {
    pub const TOOL_DURATION_SECONDS: &str = "gather_media_tool_duration_seconds";
    pub const RENDITIONS_TOTAL: &str = "gather_media_renditions_total";
}

/// Record how long an external tool invocation took.
pub fn record_tool_duration(tool: &str, success: bool, duration_secs: f64) {
    let labels = [
        ("tool", tool.to_string()),
        ("success", success.to_string()),
    ];
    histogram!(names::TOOL_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record renditions produced for a media category.
pub fn record_renditions(category: &str, count: usize) {
    let labels = [("category", category.to_string())];
    counter!(names::RENDITIONS_TOTAL, &labels).increment(count as u64);
}
