//! Shared HTTP session used by every network call.
//!
//! A [`Session`] wraps one `reqwest::Client` with a persistent cookie store,
//! transparent redirect following and a fixed set of browser-like headers.
//! It is built once per run and shared by reference, so the cookies set while
//! logging in authenticate every later request.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, ORIGIN, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::{BlinkpressError, Result};

/// Desktop Chrome user agent the site serves the full reader to.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3021.0 Safari/537.36";

/// HTTP client configuration for the session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Site root every request path is resolved against.
    pub base_url: Url,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum number of redirects followed per request.
    pub redirect_limit: usize,
}

impl SessionConfig {
    pub fn new(base_url: Url) -> Self {
        Self { base_url, user_agent: BROWSER_USER_AGENT.to_string(), timeout: None, redirect_limit: 10 }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut session_config = Self::new(config.site_url()?);
        session_config.timeout = config.timeout();
        Ok(session_config)
    }
}

/// A request issued through the [`Session`].
#[derive(Debug, Clone)]
pub struct SessionRequest {
    method: Method,
    path: String,
    headers: Vec<(HeaderName, String)>,
    form: Option<Vec<(String, String)>>,
    require_success: bool,
}

impl SessionRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: Vec::new(), form: None, require_success: true }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a header on top of the session's fixed header set.
    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Sends the fields as an `application/x-www-form-urlencoded` body.
    pub fn form<K: Into<String>, V: Into<String>>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self {
        self.form = Some(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Whether a non-success status is turned into [`BlinkpressError::HttpStatus`] (default: true).
    pub fn require_success(mut self, value: bool) -> Self {
        self.require_success = value;
        self
    }
}

/// Full response to a [`SessionRequest`].
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub status: StatusCode,
    /// URL of the last response after following redirects.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: String,
}

/// Cookie-persisting HTTP client for one run.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let headers = default_headers(&config)?;

        let mut builder = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(config.redirect_limit))
            .default_headers(headers);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(BlinkpressError::NetworkError)?;

        Ok(Self { client, base_url: config.base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a site-relative path (or absolute URL) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BlinkpressError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Issues a request and returns the full response.
    pub async fn request(&self, request: SessionRequest) -> Result<SessionResponse> {
        let url = self.url(&request.path)?;
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(fields) = &request.form {
            builder = builder.form(fields);
        }

        let response = builder.send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        debug!(status = status.as_u16(), url = %final_url, "received response");

        if request.require_success && !status.is_success() {
            return Err(BlinkpressError::HttpStatus { status: status.as_u16(), url: final_url.to_string() });
        }

        let body = response.text().await?;

        Ok(SessionResponse { status, url: final_url, headers, body })
    }

    /// GETs a path that must succeed and returns its body.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.request(SessionRequest::get(path)).await?.body)
    }
}

fn default_headers(config: &SessionConfig) -> Result<HeaderMap> {
    let origin = config.base_url.origin().ascii_serialization();
    let host = config
        .base_url
        .host_str()
        .ok_or_else(|| BlinkpressError::InvalidUrl(format!("{} has no host", config.base_url)))?;

    let invalid = |what: &str| BlinkpressError::InvalidUrl(format!("cannot use {} as a header value", what));

    let mut headers = HeaderMap::new();
    headers.insert(ORIGIN, HeaderValue::from_str(&origin).map_err(|_| invalid(&origin))?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|_| invalid(&config.user_agent))?,
    );
    headers.insert(
        HeaderName::from_static("authority"),
        HeaderValue::from_str(host).map_err(|_| invalid(host))?,
    );
    headers.insert(HeaderName::from_static("upgrade-insecure-requests"), HeaderValue::from_static("1"));

    Ok(headers)
}
