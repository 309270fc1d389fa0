use crate::model::{BenchmarkRequest, PollOutcome, ResultOptions, RunId};
use async_trait::async_trait;

/// A synthetic page-load benchmarking service.
#[async_trait]
pub trait BenchmarkClient: Send + Sync {
    async fn submit_run(&self, request: &BenchmarkRequest) -> anyhow::Result<RunId>;

    /// Fetches the result set once. Never waits for completion.
    async fn poll_result(
        &self,
        id: &RunId,
        options: &ResultOptions,
    ) -> anyhow::Result<PollOutcome>;

    fn provider_name(&self) -> &'static str;
}

pub mod wpt;
