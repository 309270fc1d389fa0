use super::BenchmarkClient;
use crate::errors::MalformedResponse;
use crate::model::{
    BenchmarkRequest, BenchmarkResult, Metrics, PollOutcome, ResultOptions, RunId, RunMetrics,
    ViewMetrics,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

/// Status codes below this mean the test is queued or still running.
pub const COMPLETE_STATUS: i64 = 200;

/// HTTP client for a WebPageTest server (`runtest.php` / `jsonResult.php`).
pub struct WebPageTestClient {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub client: reqwest::Client,
}

impl WebPageTestClient {
    pub fn new(base_url: Url, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("building WebPageTest {} url", path))
    }

    pub fn submit_url(&self, request: &BenchmarkRequest) -> anyhow::Result<Url> {
        let mut url = self.endpoint("runtest.php")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("url", &request.target_url);
            q.append_pair("runs", &request.runs.to_string());
            q.append_pair("fvonly", flag(request.first_view_only));
            q.append_pair("label", &request.label);
            if let Some(location) = &request.location {
                q.append_pair("location", location);
            }
            if let Some(connectivity) = &request.connectivity {
                q.append_pair("connectivity", connectivity);
            }
            if let Some(key) = &self.api_key {
                q.append_pair("k", key);
            }
            q.append_pair("f", "json");
        }
        Ok(url)
    }

    pub fn result_url(&self, id: &RunId, options: &ResultOptions) -> anyhow::Result<Url> {
        let mut url = self.endpoint("jsonResult.php")?;
        url.query_pairs_mut()
            .append_pair("test", id.as_str())
            .append_pair("breakdown", flag(options.breakdown))
            .append_pair("domains", flag(options.domains))
            .append_pair("pagespeed", flag(options.page_speed))
            .append_pair("requests", flag(options.requests))
            .append_pair("medianMetric", &options.median_metric);
        Ok(url)
    }

    async fn get_json(&self, url: Url, what: &str) -> anyhow::Result<Value> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("WebPageTest {} request failed", what))?
            .error_for_status()
            .with_context(|| format!("WebPageTest {} returned an error status", what))?;
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading WebPageTest {} body", what))?;
        let json = serde_json::from_str(&body)
            .with_context(|| format!("decoding WebPageTest {} body", what))?;
        Ok(json)
    }
}

#[async_trait]
impl BenchmarkClient for WebPageTestClient {
    async fn submit_run(&self, request: &BenchmarkRequest) -> anyhow::Result<RunId> {
        let url = self.submit_url(request)?;
        let json = self.get_json(url, "runtest").await?;
        parse_submission(&json)
    }

    async fn poll_result(
        &self,
        id: &RunId,
        options: &ResultOptions,
    ) -> anyhow::Result<PollOutcome> {
        let url = self.result_url(id, options)?;
        let json = self.get_json(url, "jsonResult").await?;
        parse_result(id, &json)
    }

    fn provider_name(&self) -> &'static str {
        "webpagetest"
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

fn status_text(json: &Value) -> String {
    json.get("statusText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Extracts the run id from a `runtest.php` response.
pub fn parse_submission(json: &Value) -> anyhow::Result<RunId> {
    let data = json.get("data");
    let id = data
        .and_then(|d| d.get("id").or_else(|| d.get("testId")))
        .and_then(Value::as_str);
    match id {
        Some(id) if !id.is_empty() => Ok(RunId(id.to_string())),
        _ => Err(MalformedResponse(format!(
            "runtest response has no data.id (statusCode={}, statusText={:?})",
            json.get("statusCode").unwrap_or(&Value::Null),
            status_text(json)
        ))
        .into()),
    }
}

/// `statusCode` as a number; numeric strings count too.
fn status_code(json: &Value) -> Option<i64> {
    let code = match json.get("statusCode")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    code.is_finite().then(|| code.round() as i64)
}

/// Interprets a `jsonResult.php` response. Only a status code below 200 means
/// the test is still pending; every other response is treated as final,
/// including error statuses and responses with no usable status code.
pub fn parse_result(requested: &RunId, json: &Value) -> anyhow::Result<PollOutcome> {
    let status_code = status_code(json);
    let status_text = status_text(json);

    if let Some(code) = status_code.filter(|&code| code < COMPLETE_STATUS) {
        return Ok(PollOutcome::Pending {
            status_code: code,
            status_text,
        });
    }

    let data = json.get("data").filter(|d| d.is_object()).ok_or_else(|| {
        MalformedResponse(format!(
            "jsonResult response has no data (statusCode={:?}, statusText={:?})",
            status_code, status_text
        ))
    })?;

    let runs = parse_runs(data.get("runs"));
    let location = str_field(data, "location");
    let browser = location
        .as_deref()
        .and_then(|l| l.split_once(':'))
        .map(|(_, browser)| browser.to_string())
        .filter(|b| !b.is_empty())
        .or_else(|| first_browser_name(data.get("runs")));

    let aggregate = data
        .get("median")
        .or_else(|| data.get("average"))
        .map(parse_metrics)
        .unwrap_or_default();

    Ok(PollOutcome::Complete(BenchmarkResult {
        id: str_field(data, "id")
            .or_else(|| str_field(data, "testId"))
            .map(RunId)
            .unwrap_or_else(|| requested.clone()),
        status_code,
        status_text,
        location,
        browser,
        connectivity: str_field(data, "connectivity"),
        aggregate,
        runs,
    }))
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `runs` is normally an object keyed by run number; older servers send an
/// array instead.
fn parse_runs(runs: Option<&Value>) -> Vec<RunMetrics> {
    let mut out: Vec<RunMetrics> = match runs {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| {
                k.parse::<u32>().ok().map(|index| RunMetrics {
                    index,
                    metrics: parse_metrics(v),
                })
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .zip(1u32..)
            .map(|(v, index)| RunMetrics {
                index,
                metrics: parse_metrics(v),
            })
            .collect(),
        _ => Vec::new(),
    };
    out.sort_by_key(|r| r.index);
    out
}

fn first_browser_name(runs: Option<&Value>) -> Option<String> {
    let first = match runs? {
        Value::Object(map) => map.values().next()?,
        Value::Array(items) => items.first()?,
        _ => return None,
    };
    first
        .get("firstView")
        .and_then(|fv| str_field(fv, "browser_name"))
}

fn parse_metrics(v: &Value) -> Metrics {
    Metrics {
        first_view: v.get("firstView").map(parse_view).unwrap_or_default(),
        repeat_view: v.get("repeatView").map(parse_view).unwrap_or_default(),
    }
}

fn parse_view(v: &Value) -> ViewMetrics {
    ViewMetrics {
        first_byte: metric(v, "TTFB"),
        start_render: metric(v, "render"),
        load: metric(v, "loadTime"),
        speed_index: metric(v, "SpeedIndex"),
        fully_loaded: metric(v, "fullyLoaded"),
        bytes: metric(v, "bytesIn"),
        requests: if v.get("requestsFull").is_some() {
            metric(v, "requestsFull")
        } else {
            metric(v, "requests")
        },
        connections: metric(v, "connections"),
    }
}

/// Averages come back as floats and request lists as arrays; every column is
/// an integer, and absent values count as zero.
fn metric(v: &Value, key: &str) -> i64 {
    match v.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(0),
        Some(Value::Array(items)) => items.len() as i64,
        _ => 0,
    }
}
