//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::api::{CharactersApi, HealthApi};
use crate::error::{Error, ErrorResponse, Result};

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the project API key.
const API_KEY_HEADER: HeaderName = HeaderName::from_static("apikey");

/// Diary backend client.
///
/// # Example
///
/// ```no_run
/// use diary_client::DiaryClient;
///
/// # async fn example() -> diary_client::Result<()> {
/// let client = DiaryClient::builder()
///     .base_url("http://localhost:8080")
///     .api_key("secret")
///     .build()?;
///
/// let roster = client.characters().roster(&"user-1".into()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DiaryClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl DiaryClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings pointing to localhost.
    pub fn localhost() -> Result<Self> {
        Self::builder().base_url("http://127.0.0.1:8080").build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the characters API.
    pub fn characters(&self) -> CharactersApi {
        CharactersApi::new(self.clone())
    }

    /// Access the health API.
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL under `api/v1/` from path segments.
    ///
    /// Each segment is percent-encoded on its own, so an id can never add
    /// segments, a query or a fragment.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::InvalidPath(bad.to_string()));
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self
            .inner
            .http
            .get(url)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Make a POST request with a JSON body.
    pub(crate) async fn post<T, B>(&self, path: &[&str], body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self
            .inner
            .http
            .post(url)
            .json(body)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Make a POST request without a body.
    pub(crate) async fn post_empty<T: serde::de::DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self
            .inner
            .http
            .post(url)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(err) => match status {
                404 => Error::NotFound(err.message),
                401 => Error::Auth(err.message),
                _ => Error::Api {
                    status,
                    code: err.code,
                    message: err.message,
                },
            },
            Err(_) => match status {
                404 => Error::NotFound(format!("HTTP {}", status)),
                401 => Error::Auth(format!("HTTP {}", status)),
                _ => Error::Api {
                    status,
                    code: "unknown".to_string(),
                    message: format!("HTTP {}", status),
                },
            },
        }
    }
}

/// Builder for creating a [`DiaryClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the base URL for the backend.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key, sent both as `apikey` and as a bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<DiaryClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        let mut base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base_url is not a base URL: {}", base_url)));
        }
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            let invalid = || Error::Config("Invalid API key".to_string());
            let mut raw = HeaderValue::from_str(key).map_err(|_| invalid())?;
            raw.set_sensitive(true);
            let mut bearer =
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| invalid())?;
            bearer.set_sensitive(true);
            headers.insert(API_KEY_HEADER, raw);
            headers.insert(AUTHORIZATION, bearer);
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("diary-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(DiaryClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
