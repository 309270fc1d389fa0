use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of a single benchmark submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub target_url: String,
    pub location: Option<String>,
    pub connectivity: Option<String>,
    pub runs: u32,
    pub first_view_only: bool,
    pub label: String,
}

/// Identifier the benchmark service hands back for a submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options sent with every result fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOptions {
    pub breakdown: bool,
    pub domains: bool,
    pub page_speed: bool,
    pub requests: bool,
    pub median_metric: String,
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self {
            breakdown: false,
            domains: false,
            page_speed: false,
            requests: false,
            median_metric: "SpeedIndex".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMetrics {
    pub first_byte: i64,
    pub start_render: i64,
    pub load: i64,
    pub speed_index: i64,
    pub fully_loaded: i64,
    pub bytes: i64,
    pub requests: i64,
    pub connections: i64,
}

impl ViewMetrics {
    fn values(&self) -> [i64; 8] {
        [
            self.first_byte,
            self.start_render,
            self.load,
            self.speed_index,
            self.fully_loaded,
            self.bytes,
            self.requests,
            self.connections,
        ]
    }
}

/// First-view and repeat-view metrics of one page load (or an aggregate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub first_view: ViewMetrics,
    pub repeat_view: ViewMetrics,
}

impl Metrics {
    /// Values in [`crate::schema::DATA_COLUMNS`] order.
    pub fn values(&self) -> [i64; 16] {
        let mut out = [0; 16];
        out[..8].copy_from_slice(&self.first_view.values());
        out[8..].copy_from_slice(&self.repeat_view.values());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub index: u32,
    pub metrics: Metrics,
}

/// A completed result set as returned by the benchmark service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub id: RunId,
    /// `None` when the service sent no usable status code.
    pub status_code: Option<i64>,
    pub status_text: String,
    pub location: Option<String>,
    pub browser: Option<String>,
    pub connectivity: Option<String>,
    pub aggregate: Metrics,
    pub runs: Vec<RunMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Pending { status_code: i64, status_text: String },
    Complete(BenchmarkResult),
}
