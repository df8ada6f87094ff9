use std::env;
use std::time::Duration;

use crate::error::{MchatError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const ENDPOINT_VAR: &str = "MCHAT_ENDPOINT";
const TIMEOUT_VAR: &str = "MCHAT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`ChatConfig::from_env`], with `endpoint` taking precedence over
    /// `MCHAT_ENDPOINT` when given.
    pub fn resolve(endpoint: Option<&str>) -> Result<Self> {
        Self::from_lookup(|key| match (key, endpoint) {
            (ENDPOINT_VAR, Some(endpoint)) => Some(endpoint.to_string()),
            _ => env::var(key).ok(),
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Precedence:
        // 1) --endpoint (see `resolve`)
        // 2) MCHAT_ENDPOINT
        // 3) http://localhost:8000
        let endpoint = lookup(ENDPOINT_VAR)
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| Ok(DEFAULT_ENDPOINT.to_string()), |value| normalize_endpoint(&value))?;

        let timeout = match lookup(TIMEOUT_VAR).filter(|value| !value.trim().is_empty()) {
            Some(value) => parse_timeout(&value)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self { endpoint, timeout })
    }
}

fn normalize_endpoint(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let has_host = ["http://", "https://"]
        .iter()
        .any(|scheme| trimmed.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));
    if !has_host {
        return Err(MchatError::InvalidEndpoint(value.to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_timeout(value: &str) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(MchatError::InvalidConfig(format!(
            "{TIMEOUT_VAR} must be a positive number of seconds, got {value:?}"
        ))),
    }
}
