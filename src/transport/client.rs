//! Production HTTP client implementation using reqwest.

use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Connection settings for [`ReqwestClient::with_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-attempt timeout covering connect, send and body read.
    pub timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_size: usize,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_size: 100,
            verify_tls: true,
        }
    }
}

/// Production HTTP client using reqwest.
///
/// This is a thin wrapper around `reqwest::Client` that implements
/// the [`HttpClient`] trait. The wrapped client owns the connection pool,
/// which lives as long as this value (and its clones).
///
/// # Example
///
/// ```no_run
/// use wa_cloud::transport::{ReqwestClient, HttpClient, HttpRequest};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new();
/// let url = Url::parse("https://graph.facebook.com/v23.0/me")?;
/// let response = client.request(HttpRequest::get(url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new HTTP client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Creates an HTTP client with the given connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Setup`] if the TLS backend cannot be initialized.
    pub fn with_options(options: &ClientOptions) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.pool_size)
            .danger_accept_invalid_certs(!options.verify_tls)
            .build()
            .map_err(|e| HttpError::Setup(Box::new(e)))?;

        Ok(Self { inner })
    }

    /// Creates an HTTP client from an existing reqwest client.
    ///
    /// Useful when you need custom configuration (proxies, TLS roots, etc.).
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.inner.request(req.method, req.url.as_str());

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(map_send_error)?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}

fn map_send_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_builder() {
        HttpError::InvalidUrl(e.to_string())
    } else {
        HttpError::Connection(Box::new(e))
    }
}
