use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// How the client proves who it is.
///
/// The two deployments are alternatives; a client runs exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `Authorization: Bearer <token>`, token kept in the marker store
    #[default]
    Bearer,
    /// Same-site session cookie plus CSRF priming before writes
    Cookie,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "token" => Ok(Self::Bearer),
            "cookie" | "sanctum" => Ok(Self::Cookie),
            other => Err(ConfigError::Validation(format!(
                "Unknown auth mode: {other}. Valid modes: bearer, cookie"
            ))),
        }
    }
}

/// Client configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: Url,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Where the user is sent when the session is missing or expired.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Where the user is sent after a successful login.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,

    /// Overrides the identity endpoint used by the session check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_path: Option<String>,

    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,

    /// No timeout unless set; transport defaults apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_landing_path() -> String {
    "/dashboard".to_string()
}

fn default_csrf_path() -> String {
    "/sanctum/csrf-cookie".to_string()
}

impl ClientConfig {
    /// Creates a configuration with default paths for `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth_mode: AuthMode::default(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            identity_path: None,
            csrf_path: default_csrf_path(),
            request_timeout_ms: None,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_identity_path(mut self, path: impl Into<String>) -> Self {
        self.identity_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        // Round sub-millisecond timeouts up; only an explicit zero is rejected.
        self.request_timeout_ms = Some(if timeout.is_zero() { 0 } else { millis.max(1) });
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "base_url must be http or https, got {}",
                self.base_url.scheme()
            )));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Validation(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        for (name, path) in [
            ("login_path", &self.login_path),
            ("landing_path", &self.landing_path),
            ("csrf_path", &self.csrf_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{name} must start with '/', got {path:?}"
                )));
            }
        }
        Ok(())
    }

    /// Identity endpoint for the session check.
    pub fn identity_path(&self) -> &str {
        match (&self.identity_path, self.auth_mode) {
            (Some(path), _) => path,
            (None, AuthMode::Cookie) => "/auth/check",
            (None, AuthMode::Bearer) => "/user",
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Appends `path` to the base URL, keeping any path prefix of the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = ClientConfig::from_toml_str(r#"base_url = "https://portal.test/api""#).unwrap();
        assert_eq!(config.auth_mode, AuthMode::Bearer);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.landing_path, "/dashboard");
        assert_eq!(config.csrf_path, "/sanctum/csrf-cookie");
        assert_eq!(config.identity_path(), "/user");
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_cookie_mode_identity_path() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://portal.test"
            auth_mode = "cookie"
            request_timeout_ms = 15000
            "#,
        )
        .unwrap();
        assert_eq!(config.identity_path(), "/auth/check");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));

        let overridden = config.with_identity_path("/me");
        assert_eq!(overridden.identity_path(), "/me");
    }

    #[test]
    fn test_request_timeout_keeps_sub_second_precision() {
        let config = ClientConfig::parse("https://portal.test")
            .unwrap()
            .with_request_timeout(Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(500)));
        assert!(config.validate().is_ok());

        let tiny = ClientConfig::parse("https://portal.test")
            .unwrap()
            .with_request_timeout(Duration::from_micros(10));
        assert_eq!(tiny.request_timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let zero = ClientConfig::parse("https://portal.test")
            .unwrap()
            .with_request_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ConfigError::Validation(_))));

        let err = ClientConfig::from_toml_str(
            r#"
            base_url = "https://portal.test"
            request_timeout_ms = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let config = ClientConfig::parse("https://portal.test/api/").unwrap();
        assert_eq!(
            config.endpoint("/admin/doctors/4/verify").unwrap().as_str(),
            "https://portal.test/api/admin/doctors/4/verify"
        );
    }

    #[test]
    fn test_validation_rejects_relative_paths() {
        let err = ClientConfig::from_toml_str(
            r#"
            base_url = "https://portal.test"
            landing_path = "dashboard"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = ClientConfig::from_toml_str(r#"base_url = "ftp://portal.test""#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_auth_mode_from_str() {
        assert_eq!("Cookie".parse::<AuthMode>().unwrap(), AuthMode::Cookie);
        assert_eq!("token".parse::<AuthMode>().unwrap(), AuthMode::Bearer);
        assert!("basic".parse::<AuthMode>().is_err());
    }
}
