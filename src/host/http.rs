//! HTTP transport for production use
//!
//! Sends requests with `reqwest`. Session cookies live in a cookie jar that
//! can be mirrored into a [`KeyValueStore`] so that consecutive processes
//! share one login.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, warn};

use portal_protocol::{Method, JSON_CONTENT_TYPE};

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the session cookie header
pub const SESSION_COOKIE_KEY: &str = "session.cookie";

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Server root, e.g. `http://127.0.0.1:8000/`
    pub base_url: Url,
    /// Connection timeout
    pub connect_timeout: Duration,
}

/// HTTP transport backed by `reqwest`
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl HttpTransport {
    /// Create a transport with an in-memory cookie jar
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url),
            jar,
            store: None,
        })
    }

    /// Restore the session from `store` and keep it updated after every response
    pub fn with_session_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        if let Err(e) = restore_cookies(&self.jar, store.as_ref(), &self.base_url) {
            warn!("Could not restore session cookie: {}", e);
        }
        self.store = Some(store);
        self
    }

    /// The server root requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.resolve(&request.path)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(to_reqwest(request.method), url);
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!(status, "response received");

        if let Some(store) = &self.store {
            if let Err(e) = persist_cookies(&self.jar, store.as_ref(), &self.base_url) {
                warn!("Could not persist session cookie: {}", e);
            }
        }

        Ok(HttpResponse { status, body })
    }
}

/// Load a saved cookie header into the jar
pub fn restore_cookies(
    jar: &Jar,
    store: &dyn KeyValueStore,
    url: &Url,
) -> Result<(), StorageError> {
    if let Some(header) = store.get(SESSION_COOKIE_KEY)? {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            jar.add_cookie_str(pair, url);
        }
    }
    Ok(())
}

/// Save the jar's cookies for `url`, or clear the saved header when none are left
pub fn persist_cookies(jar: &Jar, store: &dyn KeyValueStore, url: &Url) -> Result<(), StorageError> {
    match jar.cookies(url).and_then(|v| v.to_str().ok().map(str::to_string)) {
        Some(header) if !header.is_empty() => store.set(SESSION_COOKIE_KEY, &header),
        _ => store.remove(SESSION_COOKIE_KEY).map(|_| ()),
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::ConnectionTimeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
