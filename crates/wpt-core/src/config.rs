use crate::errors::PipelineError;
use reqwest::Url;
use std::env;

pub const REQUIRED_ENV_VARS: [&str; 6] = [
    "FXA_REDSHIFT_HOST",
    "FXA_REDSHIFT_PORT",
    "FXA_REDSHIFT_DB_NAME",
    "FXA_REDSHIFT_USER",
    "FXA_REDSHIFT_PASSWORD",
    "FXA_WPT_HOST",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub wpt: WptConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Shape of the log lines on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        match raw.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(PipelineError::Config(format!(
                "$FXA_WPT_LOG_FORMAT must be json or text, got {:?}",
                raw
            ))),
        }
    }
}

#[derive(Clone)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct WptConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub location: Option<String>,
    pub connectivity: Option<String>,
}

impl std::fmt::Debug for WptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WptConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("location", &self.location)
            .field("connectivity", &self.connectivity)
            .finish_non_exhaustive()
    }
}

impl WptConfig {
    /// `https://[user:password@]host[:port]/`. Credentials are only embedded
    /// when both halves are present.
    pub fn base_url(&self) -> Result<Url, PipelineError> {
        let mut url = Url::parse(&format!("https://{}/", self.host)).map_err(|e| {
            PipelineError::Config(format!("invalid FXA_WPT_HOST {:?}: {}", self.host, e))
        })?;

        if let Some(port) = self.port {
            url.set_port(Some(port))
                .map_err(|_| PipelineError::Config(format!("cannot set port {}", port)))?;
        }

        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            url.set_username(user)
                .and_then(|_| url.set_password(Some(password)))
                .map_err(|_| PipelineError::Config("cannot embed WPT credentials".into()))?;
        }

        Ok(url)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values are
    /// treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|&key| get(key).is_none())
            .map(|key| format!("You must set ${}", key))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::Config(missing.join("; ")));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let warehouse = WarehouseConfig {
            host: required("FXA_REDSHIFT_HOST"),
            port: parse_port("FXA_REDSHIFT_PORT", &required("FXA_REDSHIFT_PORT"))?,
            database: required("FXA_REDSHIFT_DB_NAME"),
            user: required("FXA_REDSHIFT_USER"),
            password: required("FXA_REDSHIFT_PASSWORD"),
        };

        let wpt = WptConfig {
            host: required("FXA_WPT_HOST"),
            port: get("FXA_WPT_PORT")
                .map(|v| parse_port("FXA_WPT_PORT", &v))
                .transpose()?,
            user: get("FXA_WPT_USER"),
            password: get("FXA_WPT_PASSWORD"),
            api_key: get("FXA_WPT_API_KEY"),
            location: get("FXA_WPT_LOCATION"),
            connectivity: get("FXA_WPT_CONNECTIVITY"),
        };

        Ok(Self {
            warehouse,
            wpt,
            log_level: get("FXA_WPT_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: get("FXA_WPT_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, PipelineError> {
    raw.parse()
        .map_err(|_| PipelineError::Config(format!("${} must be a port number, got {:?}", key, raw)))
}
