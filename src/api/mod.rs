//! DeviantArt gallery API client.
//!
//! This module provides bearer-authenticated access to the three endpoints
//! the exporter needs: gallery folder listings, deviation listings (all or
//! scoped to one folder), and batched deviation metadata.
//!
//! # Failure policy
//!
//! A non-success status surfaces as [`ApiError::RequestFailed`]. Walks over
//! paginated listings treat any error as "no more data": the items fetched
//! so far are kept and the request is not retried, so a mid-walk failure
//! truncates the result set (see [`fetch_all_pages`]).

mod metadata;
mod models;
mod pagination;

pub use metadata::{DEFAULT_BATCH_SIZE, fetch_metadata};
pub use models::{
    DEFAULT_DESCRIPTION, DEFAULT_IMAGE_URL, DEFAULT_TITLE, Deviation, DeviationContent,
    DeviationMetadata, Folder, MetadataEntry, Page,
};
pub use pagination::fetch_all_pages;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::auth::AccessToken;

use models::MetadataResponse;

/// Default DeviantArt API base URL.
const DEFAULT_BASE_URL: &str = "https://www.deviantart.com/api/v1/oauth2";

/// Page size for folder listings.
pub const FOLDER_PAGE_LIMIT: u64 = 50;
/// Page size for deviation listings.
pub const DEVIATION_PAGE_LIMIT: u64 = 24;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur calling the gallery API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Endpoint returned a non-success status.
    #[error("request to {endpoint} failed with HTTP {status}: {body}")]
    RequestFailed {
        /// The endpoint that failed.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },
    /// Network-level error (DNS resolution, connection refused, TLS, timeout).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// The endpoint that failed.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },
    /// Response body was not the expected JSON shape.
    #[error("invalid JSON from {endpoint}: {source}")]
    InvalidJson {
        /// The endpoint that answered.
        endpoint: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// HTTP client construction failed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Bearer-authenticated client for the gallery endpoints.
pub struct GalleryClient {
    http: Client,
    base_url: String,
    token: AccessToken,
}

impl GalleryClient {
    /// Creates a client against the real DeviantArt API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if HTTP client construction fails.
    pub fn new(token: AccessToken) -> Result<Self, ApiError> {
        Self::build(token, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if HTTP client construction fails.
    pub fn with_base_url(
        token: AccessToken,
        base_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Self::build(token, base_url.into())
    }

    fn build(token: AccessToken, base_url: String) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(concat!("da-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// One page of the user's gallery folders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on non-success status, network failure, or an
    /// unexpected payload shape.
    #[instrument(skip(self), fields(listing = "gallery/folders"))]
    pub async fn folders(&self, username: &str, offset: u64) -> Result<Page<Folder>, ApiError> {
        let endpoint = format!("{}/gallery/folders", self.base_url);
        self.get_json(
            &endpoint,
            &[
                ("username", username.to_string()),
                ("limit", FOLDER_PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// One page of deviations, optionally scoped to a single folder.
    ///
    /// `scope = None` lists the whole gallery through the `gallery/all`
    /// endpoint; `Some(folderid)` lists one folder.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on non-success status, network failure, or an
    /// unexpected payload shape.
    #[instrument(skip(self), fields(scope = scope.unwrap_or("all")))]
    pub async fn deviations(
        &self,
        username: &str,
        scope: Option<&str>,
        offset: u64,
    ) -> Result<Page<Deviation>, ApiError> {
        let endpoint = match scope {
            Some(folderid) => format!("{}/gallery/{folderid}", self.base_url),
            None => format!("{}/gallery/all", self.base_url),
        };
        self.get_json(
            &endpoint,
            &[
                ("username", username.to_string()),
                ("limit", DEVIATION_PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// Metadata for a batch of deviation ids in a single call.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on non-success status, network failure, or an
    /// unexpected payload shape.
    #[instrument(skip_all, fields(ids = ids.len()))]
    pub async fn metadata(&self, ids: &[&str]) -> Result<Vec<MetadataEntry>, ApiError> {
        let endpoint = format!("{}/deviation/metadata", self.base_url);
        let params: Vec<(&str, String)> = ids
            .iter()
            .map(|id| ("deviationids[]", (*id).to_string()))
            .collect();
        let response: MetadataResponse = self.get_json(&endpoint, &params).await?;
        Ok(response.metadata)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(endpoint).bearer_auth(self.token.as_str());
        for (key, value) in params {
            request = request.query(&[(key, value.as_str())]);
        }

        let response = request.send().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|source| ApiError::InvalidJson {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for GalleryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
