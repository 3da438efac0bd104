//! OAuth2 authentication against the DeviantArt platform.
//!
//! The [`OAuthProvider`] drives the authorization-code flow: it builds the
//! authorize URL for the user to open, captures the redirect on a one-shot
//! loopback listener, and exchanges the captured code for an access token.
//! The pipeline never starts without a token.

mod redirect;

pub use redirect::wait_for_code;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::AuthConfig;

/// Default DeviantArt OAuth2 base URL.
const DEFAULT_AUTH_BASE_URL: &str = "https://www.deviantart.com";

/// Scope requested for gallery browsing.
const AUTH_SCOPE: &str = "browse";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while acquiring an access token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token endpoint returned a non-success status.
    #[error("token exchange failed with HTTP {status}: {body}")]
    TokenExchange {
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },
    /// Token response parsed but carried no usable access token.
    #[error("token response did not contain an access token")]
    MissingToken,
    /// Network-level error talking to the OAuth endpoints.
    #[error("network error during token exchange: {0}")]
    Network(#[from] reqwest::Error),
    /// The redirect listener could not be bound or read.
    #[error("redirect listener error: {0}")]
    RedirectListener(#[from] std::io::Error),
    /// The redirect listener stopped before a code arrived.
    #[error("redirect listener closed before receiving an authorization code")]
    ListenerClosed,
    /// No authorization code arrived before the timeout.
    #[error("timed out after {0} seconds waiting for the authorization redirect")]
    Timeout(u64),
    /// The authorize URL could not be constructed.
    #[error("invalid authorize URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A bearer token for the gallery API.
///
/// `Debug` output is redacted so tokens never leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Source of access tokens for the export pipeline.
///
/// Implemented by [`OAuthProvider`] for the real flow; tests substitute
/// stub providers.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Runs the full authorization flow and yields a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the flow fails at any step; callers treat
    /// every variant as fatal.
    async fn authorize(&self) -> Result<AccessToken, AuthError>;
}

/// OAuth2 authorization-code provider.
///
/// The user opens the authorize URL in a browser; the provider waits on a
/// loopback listener for the redirect, then exchanges the captured code at
/// the token endpoint.
pub struct OAuthProvider {
    config: AuthConfig,
    http: Client,
    base_url: String,
}

impl OAuthProvider {
    /// Creates a provider against the real DeviantArt endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if HTTP client construction fails.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        Self::build(config, DEFAULT_AUTH_BASE_URL.to_string())
    }

    /// Creates a provider with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if HTTP client construction fails.
    pub fn with_base_url(
        config: AuthConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Self::build(config, base_url.into())
    }

    fn build(config: AuthConfig, base_url: String) -> Result<Self, AuthError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(concat!("da-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AuthError::Network)?;

        Ok(Self {
            config,
            http,
            base_url,
        })
    }

    /// The URL the user must open to grant access.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] when the configured base URL does
    /// not parse.
    pub fn authorize_url(&self) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!("{}/oauth2/authorize", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri())
            .append_pair("scope", AUTH_SCOPE);
        Ok(url)
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`] on a non-success status and
    /// [`AuthError::MissingToken`] when the success payload has no token.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError> {
        let token_url = format!("{}/oauth2/token", self.base_url);
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri()),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ];

        let response = self.http.post(&token_url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = response.json().await?;
        payload
            .access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
            .ok_or(AuthError::MissingToken)
    }
}

impl fmt::Debug for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthProvider")
            .field("base_url", &self.base_url)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for OAuthProvider {
    async fn authorize(&self) -> Result<AccessToken, AuthError> {
        let url = self.authorize_url()?;
        info!("Open the following URL in your browser to authorize access:");
        info!(%url);

        let code = wait_for_code(
            self.config.redirect_port,
            Duration::from_secs(self.config.auth_timeout_secs),
        )
        .await?;
        debug!("authorization code captured");

        self.exchange_code(&code).await
    }
}

/// Success payload from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}
