use crate::model::{BenchmarkResult, Metrics, RunMetrics};
use crate::schema::{template_key, DATA_COLUMNS};
use crate::template::{sql_integer, sql_string, sql_timestamp, Params};
use chrono::{DateTime, Utc};

pub const UNKNOWN: &str = "unknown";

/// Identity fields of a `tests` row that do not come from the result itself.
#[derive(Debug, Clone)]
pub struct TestIdentity {
    pub time: DateTime<Utc>,
    pub label: String,
    pub location: Option<String>,
    pub connectivity: Option<String>,
    pub git_repo: Option<String>,
    pub git_hash: String,
}

fn put(params: &mut Params, column: &str, value: String) {
    params.insert(template_key(column), value);
}

fn put_metrics(params: &mut Params, metrics: &Metrics) {
    for (column, value) in DATA_COLUMNS.iter().zip(metrics.values()) {
        put(params, column, sql_integer(value));
    }
}

/// Values from the service win over configured ones.
fn pick(from_result: &Option<String>, configured: &Option<String>) -> String {
    from_result
        .as_deref()
        .or(configured.as_deref())
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn test_row(identity: &TestIdentity, result: &BenchmarkResult) -> Params {
    let mut p = Params::new();
    put(&mut p, "time", sql_timestamp(identity.time));
    put(&mut p, "id", sql_string(result.id.as_str()));
    put(&mut p, "label", sql_string(&identity.label));
    put(
        &mut p,
        "location",
        sql_string(&pick(&result.location, &identity.location)),
    );
    put(
        &mut p,
        "browser",
        sql_string(result.browser.as_deref().unwrap_or(UNKNOWN)),
    );
    put(
        &mut p,
        "connection",
        sql_string(&pick(&result.connectivity, &identity.connectivity)),
    );
    put(&mut p, "runs", sql_integer(result.runs.len() as i64));
    put(
        &mut p,
        "git_repo",
        sql_string(identity.git_repo.as_deref().unwrap_or_default()),
    );
    put(&mut p, "git_hash", sql_string(&identity.git_hash));
    put_metrics(&mut p, &result.aggregate);
    p
}

pub fn run_rows(result: &BenchmarkResult) -> Vec<Params> {
    result.runs.iter().map(|run| run_row(result, run)).collect()
}

fn run_row(result: &BenchmarkResult, run: &RunMetrics) -> Params {
    let mut p = Params::new();
    put(&mut p, "test", sql_string(result.id.as_str()));
    put(&mut p, "index", sql_integer(i64::from(run.index)));
    put_metrics(&mut p, &run.metrics);
    p
}
