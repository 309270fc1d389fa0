use crate::errors::PipelineError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

// IP literals only, so that traffic to the target is routed locally.
const URL_FORMAT: &str =
    r"^https?://[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}(?::[0-9]+)?/$";

fn url_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_FORMAT).expect("URL_FORMAT is a valid regex"))
}

/// The page under test, e.g. `http://10.0.0.5:3030/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        if url_format().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(PipelineError::Usage(format!("invalid TEST_URL {:?}", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The target's build metadata endpoint. The URL is guaranteed to end in
    /// `/`, so the path is appended directly.
    pub fn version_url(&self) -> String {
        format!("{}__version__", self.0)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
