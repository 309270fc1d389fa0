use crate::model::{BenchmarkResult, PollOutcome, ResultOptions, RunId};
use crate::providers::BenchmarkClient;
use tokio::time::{sleep, Duration};

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Lifecycle of a submitted run. There is no failed state: any error while
/// polling aborts the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Submitted,
    Polling,
    Complete,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Submitted => "submitted",
            RunState::Polling => "polling",
            RunState::Complete => "complete",
        }
    }
}

/// Polls until the service reports a final result, sleeping `interval`
/// between attempts. There is no attempt limit.
pub async fn wait_for_result(
    client: &dyn BenchmarkClient,
    id: &RunId,
    options: &ResultOptions,
    interval: Duration,
) -> anyhow::Result<BenchmarkResult> {
    let mut state = RunState::Submitted;
    let mut attempt: u64 = 0;
    loop {
        if state == RunState::Submitted {
            state = RunState::Polling;
        }
        attempt += 1;

        match client.poll_result(id, options).await? {
            PollOutcome::Pending {
                status_code,
                status_text,
            } => {
                tracing::info!(
                    event = "poll_pending",
                    run_id = %id,
                    attempt,
                    status_code,
                    status_text = %status_text,
                    state = state.as_str(),
                    retry_in_secs = interval.as_secs(),
                );
                sleep(interval).await;
            }
            PollOutcome::Complete(result) => {
                state = RunState::Complete;
                if result.status_code.is_some_and(|code| code >= 300) {
                    // Still treated as final; downstream sees whatever data came back.
                    tracing::warn!(
                        event = "poll_complete_with_error_status",
                        run_id = %id,
                        status_code = ?result.status_code,
                        status_text = %result.status_text,
                        "benchmark service returned an error status; treating it as the final result"
                    );
                }
                tracing::info!(
                    event = "poll_complete",
                    run_id = %id,
                    attempts = attempt,
                    status_code = ?result.status_code,
                    runs = result.runs.len(),
                    state = state.as_str(),
                );
                return Ok(result);
            }
        }
    }
}
