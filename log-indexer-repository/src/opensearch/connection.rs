//! Connection settings for the OpenSearch cluster.

use std::fmt;

/// Address and credentials of the search cluster.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// The cluster URL (e.g., "http://localhost:9200").
    pub url: String,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Create a configuration without credentials.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Attach basic auth credentials.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Basic auth pair, only when both parts are present.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_requires_both_parts() {
        let mut config = ConnectionConfig::new("http://localhost:9200");
        assert!(config.basic_auth().is_none());

        config.username = Some("elastic".to_string());
        assert!(config.basic_auth().is_none());

        let config = config.with_basic_auth("elastic", "changeme");
        assert_eq!(config.basic_auth(), Some(("elastic", "changeme")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::new("http://localhost:9200").with_basic_auth("elastic", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
