// src/config.rs
use reqwest::Url;
use std::{env, fmt, str::FromStr, time::Duration};
use thiserror::Error;

/// When writes become visible to searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Refresh the affected shards before responding.
    Immediate,
    /// Respond once a scheduled refresh has made the write visible.
    WaitFor,
    /// Leave visibility to the engine's refresh interval.
    None,
}

impl RefreshPolicy {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Immediate => "true",
            Self::WaitFor => "wait_for",
            Self::None => "false",
        }
    }
}

impl FromStr for RefreshPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "immediate" => Ok(Self::Immediate),
            "wait_for" => Ok(Self::WaitFor),
            "false" | "none" => Ok(Self::None),
            other => Err(ConfigError::Invalid(format!(
                "ELASTICSEARCH_REFRESH must be true, false or wait_for (got `{other}`)"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Connection settings for the search engine. Passed explicitly to the
/// client and repository; nothing here is process-global.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    url: Url,
    index: String,
    refresh: RefreshPolicy,
    timeout: Duration,
    credentials: Option<Credentials>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_url() -> String {
    "http://localhost:9200".into()
}

fn default_index() -> String {
    "blog".into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl EngineConfig {
    pub fn new(url: &str, index: impl Into<String>) -> Result<Self, ConfigError> {
        let index = index.into();
        validate_index(&index)?;
        Ok(Self {
            url: parse_url(url)?,
            index,
            refresh: RefreshPolicy::Immediate,
            timeout: Duration::from_secs(default_timeout_secs()),
            credentials: None,
        })
    }

    /// Build configuration from environment variables, loading a `.env` file
    /// first when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("ELASTICSEARCH_URL").unwrap_or_else(default_url);
        let index = lookup("ELASTICSEARCH_INDEX").unwrap_or_else(default_index);

        let refresh = lookup("ELASTICSEARCH_REFRESH")
            .map(|v| v.parse::<RefreshPolicy>())
            .transpose()?
            .unwrap_or(RefreshPolicy::Immediate);

        let timeout_secs = match lookup("ELASTICSEARCH_TIMEOUT_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "ELASTICSEARCH_TIMEOUT_SECONDS must be a whole number (got `{raw}`)"
                ))
            })?,
            None => default_timeout_secs(),
        };

        let username = lookup("ELASTICSEARCH_USERNAME").filter(|v| !v.is_empty());
        let password = lookup("ELASTICSEARCH_PASSWORD").filter(|v| !v.is_empty());
        let credentials = match (username, password) {
            (Some(username), password) => Some(Credentials { username, password }),
            (None, Some(_)) => return Err(ConfigError::Missing("ELASTICSEARCH_USERNAME")),
            (None, None) => None,
        };

        Ok(Self::new(&url, index)?
            .with_refresh(refresh)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_credentials(credentials))
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_credentials(Some(Credentials {
            username: username.into(),
            password: Some(password.into()),
        }))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn refresh(&self) -> RefreshPolicy {
        self.refresh
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::Invalid(format!("ELASTICSEARCH_URL `{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "ELASTICSEARCH_URL must use http or https (got `{}`)",
            url.scheme()
        )));
    }
    Ok(url)
}

// Index names must be lowercase and may not contain path separators.
fn validate_index(index: &str) -> Result<(), ConfigError> {
    if index.is_empty() {
        return Err(ConfigError::Invalid("ELASTICSEARCH_INDEX cannot be empty".into()));
    }
    let invalid = index.starts_with(['-', '_', '+'])
        || index
            .chars()
            .any(|c| c.is_uppercase() || c.is_whitespace() || "\\/*?\"<>|,#:".contains(c));
    if invalid {
        return Err(ConfigError::Invalid(format!(
            "ELASTICSEARCH_INDEX `{index}` is not a valid index name"
        )));
    }
    Ok(())
}
