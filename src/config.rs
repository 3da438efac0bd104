//! OAuth application configuration.
//!
//! Client credentials are injected at startup (CLI flags or environment
//! variables) and carried through the pipeline by value. Nothing here is
//! persisted.

/// Settings for the OAuth2 authorization-code flow.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Client id of the registered DeviantArt application.
    pub client_id: String,
    /// Client secret of the registered DeviantArt application.
    pub client_secret: String,
    /// Loopback port the redirect listener binds.
    pub redirect_port: u16,
    /// Seconds to wait for the browser redirect before giving up.
    pub auth_timeout_secs: u64,
}

impl AuthConfig {
    /// Default loopback port for the redirect listener.
    pub const DEFAULT_REDIRECT_PORT: u16 = 8080;
    /// Default wait for the browser redirect, in seconds.
    pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

    /// Creates a configuration with default listener settings.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_port: Self::DEFAULT_REDIRECT_PORT,
            auth_timeout_secs: Self::DEFAULT_AUTH_TIMEOUT_SECS,
        }
    }

    /// Redirect URI as registered with the OAuth application.
    ///
    /// Must match the listener port, otherwise the provider rejects the
    /// authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.redirect_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::new("id", "secret");
        assert_eq!(config.redirect_port, AuthConfig::DEFAULT_REDIRECT_PORT);
        assert_eq!(
            config.auth_timeout_secs,
            AuthConfig::DEFAULT_AUTH_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_auth_config_redirect_uri_tracks_port() {
        let mut config = AuthConfig::new("id", "secret");
        config.redirect_port = 9321;
        assert_eq!(config.redirect_uri(), "http://localhost:9321");
    }
}
