//! Client configuration.
//!
//! Loaded from `SITEKIT_*` environment variables with sensible defaults; the
//! CLI layers its own flags on top.

use std::time::Duration;

use crate::error::ConfigError;

/// Base URL used when neither a flag nor `SITEKIT_URL` is set.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_USER_AGENT: &str = concat!("sitekit/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`HttpBackend`](crate::HttpBackend).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site origin, without a trailing slash. Default: `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Per-request timeout. `None` lets a request run until it completes or
    /// fails, which is the default.
    pub timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SITEKIT_URL`: site origin (default: `http://127.0.0.1:8000`)
    /// - `SITEKIT_TIMEOUT_SECS`: request timeout in seconds, `0` or unset for none
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either variable is set to something unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = first_non_empty(&[
            &std::env::var("SITEKIT_URL").unwrap_or_default(),
            DEFAULT_BASE_URL,
        ]);
        let timeout = parse_timeout(std::env::var("SITEKIT_TIMEOUT_SECS").ok().as_deref())?;

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout,
            ..Self::default()
        })
    }

    /// Replace the base URL, validating and normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL is empty or not http(s).
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(url)?;
        Ok(self)
    }

    /// Replace the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }
}

/// Trim whitespace and trailing slashes and insist on an http(s) scheme.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "empty".to_owned(),
        });
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "missing scheme".to_owned(),
        });
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme '{scheme}'"),
        });
    }
    if rest.is_empty() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "missing host".to_owned(),
        });
    }
    Ok(url.to_owned())
}

/// Parse a timeout in whole seconds; unset, blank, or `0` mean no timeout.
pub(crate) fn parse_timeout(raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidTimeout {
        value: value.to_owned(),
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn first_non_empty(vals: &[&str]) -> String {
    for v in vals {
        if !v.trim().is_empty() {
            return (*v).to_owned();
        }
    }
    String::new()
}
