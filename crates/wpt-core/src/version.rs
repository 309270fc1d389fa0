use crate::errors::{MalformedResponse, PipelineError};
use crate::target::TargetUrl;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

/// Build metadata published by the target at `/__version__`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionInfo {
    pub commit: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl VersionInfo {
    pub fn parse(body: &str) -> Result<Self, PipelineError> {
        let info: VersionInfo = serde_json::from_str(body)
            .context("decoding /__version__ body")
            .map_err(PipelineError::Parse)?;
        if info.commit.is_empty() {
            return Err(PipelineError::Parse(
                MalformedResponse("/__version__ has an empty commit".into()).into(),
            ));
        }
        Ok(info)
    }

    pub fn short_hash(&self) -> String {
        self.commit.chars().take(7).collect()
    }
}

#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Returns the raw body of the target's version endpoint.
    async fn fetch(&self, target: &TargetUrl) -> anyhow::Result<String>;
}

pub struct HttpVersionSource {
    pub client: reqwest::Client,
}

impl HttpVersionSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn fetch(&self, target: &TargetUrl) -> anyhow::Result<String> {
        let url = target.version_url();
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()
            .with_context(|| format!("GET {}", url))?;
        let body = resp.text().await.context("reading /__version__ body")?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    #[test]
    fn test_parse_full_version_body() -> anyhow::Result<()> {
        let info = VersionInfo::parse(
            r#"{"version":"1.96.0","commit":"abcdef1234567890abcdef1234567890abcdef12","source":"https://github.com/mozilla/fxa-content-server"}"#,
        )?;
        assert_eq!(info.short_hash(), "abcdef1");
        assert_eq!(
            info.source.as_deref(),
            Some("https://github.com/mozilla/fxa-content-server")
        );
        Ok(())
    }

    #[test]
    fn test_parse_commit_only() -> anyhow::Result<()> {
        let info = VersionInfo::parse(r#"{"commit":"abc"}"#)?;
        assert_eq!(info.short_hash(), "abc");
        assert!(info.source.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_commit_is_parse_error() {
        let err = VersionInfo::parse(r#"{"version":"1.0.0"}"#).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_html_body_is_parse_error() {
        let err = VersionInfo::parse("<html>Not Found</html>").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_empty_commit_is_parse_error() {
        let err = VersionInfo::parse(r#"{"commit":""}"#).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn test_http_fetch_returns_body() -> anyhow::Result<()> {
        let (port, server) = serve_once("200 OK", r#"{"commit":"abcdef1234567890"}"#).await?;
        let target = TargetUrl::parse(&format!("http://127.0.0.1:{}/", port))?;

        let body = HttpVersionSource::new(reqwest::Client::new())
            .fetch(&target)
            .await?;
        assert_eq!(VersionInfo::parse(&body)?.short_hash(), "abcdef1");

        let head = server.await??;
        assert!(head.starts_with("GET /__version__ HTTP/1.1"), "{}", head);
        Ok(())
    }

    #[tokio::test]
    async fn test_http_error_status_is_network_error() -> anyhow::Result<()> {
        let (port, server) = serve_once("404 Not Found", r#"{"commit":"abc"}"#).await?;
        let target = TargetUrl::parse(&format!("http://127.0.0.1:{}/", port))?;

        let err = HttpVersionSource::new(reqwest::Client::new())
            .fetch(&target)
            .await
            .unwrap_err();
        server.await??;
        let err = PipelineError::from_remote(err);
        assert_eq!(err.kind(), "network");
        assert!(err.to_string().contains("404"), "{}", err);
        Ok(())
    }
}
