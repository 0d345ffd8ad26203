use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_END_DATE, DEFAULT_SINK_PATH, DEFAULT_START_DATE, DEFAULT_TABLE};
use crate::error::{EtlError, Result};

/// Settings for one pipeline run. Built once at startup and passed to each stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub api: ApiConfig,
    pub sink: SinkConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timeout_seconds: u64,
}

impl ApiConfig {
    /// The API endpoint; only the extract stage needs it.
    pub fn endpoint(&self) -> Result<&str> {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| EtlError::Config("API_URL is not set".to_string()))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            start_date: NaiveDate::from_str(DEFAULT_START_DATE).unwrap_or_default(),
            end_date: NaiveDate::from_str(DEFAULT_END_DATE).unwrap_or_default(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Sqlite,
    Json,
}

impl FromStr for SinkKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(SinkKind::Sqlite),
            "json" => Ok(SinkKind::Json),
            other => Err(EtlError::Config(format!("Unknown sink kind '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub path: PathBuf,
    pub table: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Sqlite,
            path: PathBuf::from(DEFAULT_SINK_PATH),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: u32,
    pub delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            delay_seconds: 300,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EtlError::Config(format!("Invalid value for {}: '{}'", name, value)))
}

impl EtlConfig {
    /// Loads defaults, then the optional TOML file, then process environment
    /// overrides (after reading `.env` if present), and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides from a variable lookup (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("API_URL") {
            self.api.url = Some(v);
        }
        if let Some(v) = lookup("API_KEY") {
            self.api.api_key = Some(v);
        }
        if let Some(v) = lookup("ETL_START_DATE") {
            self.api.start_date = parse_var("ETL_START_DATE", &v)?;
        }
        if let Some(v) = lookup("ETL_END_DATE") {
            self.api.end_date = parse_var("ETL_END_DATE", &v)?;
        }
        if let Some(v) = lookup("ETL_HTTP_TIMEOUT_SECONDS") {
            self.api.timeout_seconds = parse_var("ETL_HTTP_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = lookup("ETL_SINK_KIND") {
            self.sink.kind = v.parse()?;
        }
        if let Some(v) = lookup("ETL_SINK_PATH") {
            self.sink.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ETL_TABLE") {
            self.sink.table = v;
        }
        if let Some(v) = lookup("ETL_RETRIES") {
            self.retry.retries = parse_var("ETL_RETRIES", &v)?;
        }
        if let Some(v) = lookup("ETL_RETRY_DELAY_SECONDS") {
            self.retry.delay_seconds = parse_var("ETL_RETRY_DELAY_SECONDS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.start_date > self.api.end_date {
            return Err(EtlError::Config(format!(
                "start_date {} is after end_date {}",
                self.api.start_date, self.api.end_date
            )));
        }
        if !is_sql_identifier(&self.sink.table) {
            return Err(EtlError::Config(format!(
                "Table name '{}' is not a plain SQL identifier",
                self.sink.table
            )));
        }
        Ok(())
    }
}

pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
