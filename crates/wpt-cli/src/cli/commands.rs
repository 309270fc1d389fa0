use super::args::Cli;
use super::logging::init_logging;
use std::sync::Arc;
use wpt_core::config::Config;
use wpt_core::engine::runner::{RunSettings, Runner};
use wpt_core::errors::PipelineError;
use wpt_core::providers::wpt::WebPageTestClient;
use wpt_core::schema::Queries;
use wpt_core::storage::redshift::RedshiftWarehouse;
use wpt_core::target::TargetUrl;
use wpt_core::version::HttpVersionSource;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const FAILED: i32 = 1;
}

/// Prints the usage banner and returns the exit code to terminate with.
pub fn usage_error(detail: &str) -> i32 {
    eprintln!("{}", detail.trim_end());
    eprintln!("Usage: wpt-latest TEST_URL");
    eprintln!("TEST_URL should use an IP address so that traffic is routed locally");
    exit_codes::FAILED
}

pub async fn dispatch(cli: Cli) -> Result<i32, PipelineError> {
    let target = match TargetUrl::parse(&cli.test_url) {
        Ok(target) => target,
        Err(e) => return Ok(usage_error(&e.to_string())),
    };

    // Config comes before logging so a broken environment still gets a plain message.
    let cfg = Config::from_env()?;
    init_logging(&cfg.log_level, cfg.log_format);

    tracing::info!(
        event = "start",
        test_url = %target,
        wpt = ?cfg.wpt,
        warehouse = ?cfg.warehouse,
    );

    let http = reqwest::Client::new();
    let mut runner = Runner {
        version_source: Arc::new(HttpVersionSource::new(http.clone())),
        client: Arc::new(WebPageTestClient::new(
            cfg.wpt.base_url()?,
            cfg.wpt.api_key.clone(),
            http,
        )),
        warehouse: Box::new(RedshiftWarehouse::new(cfg.warehouse.clone())),
        queries: Queries::new(),
        settings: RunSettings::from_config(&cfg.wpt),
    };

    let ctx = match runner.run(target, chrono::Utc::now()).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(event = "run_failed", kind = e.kind(), error = %e);
            return Err(e);
        }
    };

    tracing::info!(
        event = "run_complete",
        run_id = %ctx.run_id,
        label = %ctx.request.label,
        runs = ctx.result.runs.len(),
        statements = ctx.statements_executed,
    );
    Ok(exit_codes::OK)
}
