use crate::config::WptConfig;
use crate::errors::PipelineError;
use crate::label::run_label;
use crate::model::{BenchmarkRequest, BenchmarkResult, ResultOptions, RunId};
use crate::poll::{wait_for_result, RunState, POLL_INTERVAL};
use crate::providers::BenchmarkClient;
use crate::rows::{run_rows, test_row, TestIdentity};
use crate::schema::{Queries, RUNS_TABLE, TESTS_TABLE};
use crate::storage::Warehouse;
use crate::target::TargetUrl;
use crate::version::{VersionInfo, VersionSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::Duration;

/// Fixed parameters of every benchmark submission.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub runs: u32,
    pub first_view_only: bool,
    pub location: Option<String>,
    pub connectivity: Option<String>,
    pub poll_interval: Duration,
    pub result_options: ResultOptions,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            runs: 15,
            first_view_only: false,
            location: None,
            connectivity: None,
            poll_interval: POLL_INTERVAL,
            result_options: ResultOptions::default(),
        }
    }
}

impl RunSettings {
    pub fn from_config(wpt: &WptConfig) -> Self {
        Self {
            location: wpt.location.clone(),
            connectivity: wpt.connectivity.clone(),
            ..Self::default()
        }
    }
}

/// Everything one invocation produced, in the order it was produced.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub target: TargetUrl,
    pub started_at: DateTime<Utc>,
    pub version: VersionInfo,
    pub request: BenchmarkRequest,
    pub run_id: RunId,
    pub result: BenchmarkResult,
    pub statements_executed: usize,
}

pub struct Runner {
    pub version_source: Arc<dyn VersionSource>,
    pub client: Arc<dyn BenchmarkClient>,
    pub warehouse: Box<dyn Warehouse>,
    pub queries: Queries,
    pub settings: RunSettings,
}

impl Runner {
    /// Runs every step once, in order. The first failure aborts the run.
    pub async fn run(
        &mut self,
        target: TargetUrl,
        started_at: DateTime<Utc>,
    ) -> Result<RunContext, PipelineError> {
        let version = self.fetch_version(&target).await?;
        let request = self.build_request(&target, run_label(started_at, &version.commit));
        let run_id = self.submit(&request).await?;
        let result = self.wait(&run_id).await?;

        let identity = TestIdentity {
            time: started_at,
            label: request.label.clone(),
            location: request.location.clone(),
            connectivity: request.connectivity.clone(),
            git_repo: version.source.clone(),
            git_hash: version.commit.clone(),
        };
        let statements_executed = self.load(&identity, &result).await?;

        Ok(RunContext {
            target,
            started_at,
            version,
            request,
            run_id,
            result,
            statements_executed,
        })
    }

    async fn fetch_version(&self, target: &TargetUrl) -> Result<VersionInfo, PipelineError> {
        let body = self
            .version_source
            .fetch(target)
            .await
            .map_err(PipelineError::from_remote)?;
        let version = VersionInfo::parse(&body)?;
        tracing::info!(
            event = "version_fetched",
            url = %target,
            commit = %version.commit,
            source = ?version.source,
        );
        Ok(version)
    }

    fn build_request(&self, target: &TargetUrl, label: String) -> BenchmarkRequest {
        BenchmarkRequest {
            target_url: target.as_str().to_string(),
            location: self.settings.location.clone(),
            connectivity: self.settings.connectivity.clone(),
            runs: self.settings.runs,
            first_view_only: self.settings.first_view_only,
            label,
        }
    }

    async fn submit(&self, request: &BenchmarkRequest) -> Result<RunId, PipelineError> {
        let run_id = self
            .client
            .submit_run(request)
            .await
            .map_err(PipelineError::from_remote)?;
        tracing::info!(
            event = "run_submitted",
            provider = self.client.provider_name(),
            run_id = %run_id,
            label = %request.label,
            runs = request.runs,
            state = RunState::Submitted.as_str(),
        );
        Ok(run_id)
    }

    async fn wait(&self, run_id: &RunId) -> Result<BenchmarkResult, PipelineError> {
        let result = wait_for_result(
            self.client.as_ref(),
            run_id,
            &self.settings.result_options,
            self.settings.poll_interval,
        )
        .await
        .map_err(PipelineError::from_remote)?;
        tracing::debug!(event = "result", result = ?result);
        Ok(result)
    }

    async fn load(
        &mut self,
        identity: &TestIdentity,
        result: &BenchmarkResult,
    ) -> Result<usize, PipelineError> {
        let tests_insert = self
            .queries
            .insert_tests
            .render(&[test_row(identity, result)]);
        let runs_insert = self.queries.insert_runs.render(&run_rows(result));
        if runs_insert.is_none() {
            tracing::warn!(
                event = "no_runs",
                run_id = %result.id,
                "result has no per-run records; skipping {} insert",
                RUNS_TABLE
            );
        }

        let statements = [
            ("create", TESTS_TABLE, Some(self.queries.create_tests.clone())),
            ("create", RUNS_TABLE, Some(self.queries.create_runs.clone())),
            ("insert", TESTS_TABLE, tests_insert),
            ("insert", RUNS_TABLE, runs_insert),
        ];

        self.warehouse
            .connect()
            .await
            .map_err(PipelineError::Warehouse)?;
        tracing::info!(event = "warehouse_connected");

        let mut executed = 0;
        for (kind, table, sql) in statements {
            let Some(sql) = sql else { continue };
            self.warehouse
                .execute(&sql)
                .await
                .map_err(|e| PipelineError::Warehouse(e.context(format!("{} {}", kind, table))))?;
            executed += 1;
            tracing::info!(event = "warehouse_statement", kind, table);
        }
        Ok(executed)
    }
}
