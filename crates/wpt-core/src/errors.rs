use thiserror::Error;

/// Every failure the pipeline can hit. None of them are recovered: the
/// binary prints the error and exits with [`PipelineError::exit_code`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Usage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0:#}")]
    Network(anyhow::Error),

    #[error("parse error: {0:#}")]
    Parse(anyhow::Error),

    #[error("warehouse error: {0:#}")]
    Warehouse(anyhow::Error),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Usage(_) => "usage",
            PipelineError::Config(_) => "config",
            PipelineError::Network(_) => "network",
            PipelineError::Parse(_) => "parse",
            PipelineError::Warehouse(_) => "warehouse",
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Classifies a failure reported by a remote service. A JSON decode error
    /// anywhere in the cause chain means the service answered but the body was
    /// unusable; everything else is a transport failure.
    pub fn from_remote(err: anyhow::Error) -> Self {
        let decode_failure = err
            .chain()
            .any(|cause| cause.is::<serde_json::Error>() || cause.is::<MalformedResponse>());
        if decode_failure {
            PipelineError::Parse(err)
        } else {
            PipelineError::Network(err)
        }
    }
}

/// A response that decoded as JSON but lacks a field the pipeline needs.
#[derive(Debug, Error)]
#[error("malformed response: {0}")]
pub struct MalformedResponse(pub String);
