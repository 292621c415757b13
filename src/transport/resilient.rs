//! The resilient transport: auth, throttling, retries and classification.

use std::fmt;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use url::Url;

use crate::time::{Sleeper, TokioSleeper};

use super::{
    ApiErrorDetail, HttpClient, HttpError, HttpRequest, HttpResponse, MultipartForm, RateLimiter,
    RequestDescriptor, RetryPolicy, TransportError,
};

/// A decoded JSON object, the success payload of JSON calls.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Outcome of one logical transport call, after retries.
pub type TransportResult<T> = Result<T, TransportError>;

/// Issues Graph API calls with bearer auth, throttling and retries.
///
/// Every attempt first waits on the [`RateLimiter`], then goes through the
/// [`HttpClient`]. Connection failures, timeouts and statuses listed in the
/// [`RetryPolicy`] are retried with exponential backoff; anything else is
/// classified into a [`TransportError`] at once. Only the first success or
/// the last failure is returned.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used for backoff delays (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use wa_cloud::transport::{ReqwestClient, RequestDescriptor, Transport};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Transport::new(
///     ReqwestClient::new(),
///     Url::parse("https://graph.facebook.com")?,
///     "v23.0",
///     "EAAG...",
/// )?;
/// let me = transport.send(&RequestDescriptor::get("me")).await?;
/// println!("{me:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Transport<H, S = TokioSleeper> {
    client: H,
    sleeper: S,
    base_url: Url,
    api_version: String,
    authorization: HeaderValue,
    retry_policy: RetryPolicy,
    rate_limiter: RateLimiter,
}

impl<H> Transport<H, TokioSleeper> {
    /// Creates a transport with the default retry policy and rate limit.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Validation`] if the access token is empty or
    /// not a valid header value, and [`TransportError::InvalidUrl`] if
    /// `base_url` cannot carry a path.
    pub fn new(
        client: H,
        base_url: Url,
        api_version: impl Into<String>,
        access_token: &str,
    ) -> Result<Self, TransportError> {
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }

        let api_version = api_version.into();
        if api_version.trim().is_empty() {
            return Err(TransportError::Validation(
                "API version must not be empty".to_string(),
            ));
        }

        if access_token.trim().is_empty() {
            return Err(TransportError::Validation(
                "access token must not be empty".to_string(),
            ));
        }
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| {
                TransportError::Validation(
                    "access token contains characters not allowed in a header".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            sleeper: TokioSleeper,
            base_url,
            api_version,
            authorization,
            retry_policy: RetryPolicy::default(),
            rate_limiter: RateLimiter::default(),
        })
    }
}

impl<H, S> Transport<H, S> {
    /// Sets a custom sleeper for retry delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Transport<H, S2> {
        Transport {
            client: self.client,
            sleeper,
            base_url: self.base_url,
            api_version: self.api_version,
            authorization: self.authorization,
            retry_policy: self.retry_policy,
            rate_limiter: self.rate_limiter,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Replaces the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the API version path segment.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the rate limiter.
    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Resolves a Graph path to `{base_url}/{api_version}/{path}`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Validation`] for an empty path.
    pub fn resolve(&self, path: &str) -> TransportResult<Url> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(TransportError::Validation(
                "request path must not be empty".to_string(),
            ));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::InvalidUrl(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push(&self.api_version)
            .extend(trimmed.split('/'));

        Ok(url)
    }

    fn build_request(
        &self,
        method: Method,
        url: Url,
        descriptor: Option<&RequestDescriptor>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, url);

        if let Some(descriptor) = descriptor {
            for (name, value) in descriptor.headers() {
                request.headers.append(name, value.clone());
            }
        }

        request.with_header(AUTHORIZATION, self.authorization.clone())
    }

    fn descriptor_url(&self, descriptor: &RequestDescriptor) -> TransportResult<Url> {
        let mut url = self.resolve(descriptor.path())?;
        if !descriptor.query().is_empty() {
            url.query_pairs_mut().extend_pairs(descriptor.query());
        }
        Ok(url)
    }
}

impl<H: HttpClient, S: Sleeper> Transport<H, S> {
    /// Sends a JSON call and decodes the JSON object response.
    ///
    /// An empty success body yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`]; see [`TransportError::kind`] for the
    /// categories.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> TransportResult<JsonMap> {
        let url = self.descriptor_url(descriptor)?;
        let mut request = self.build_request(descriptor.method().clone(), url, Some(descriptor));

        if let Some(json) = descriptor.json() {
            let body = serde_json::to_vec(json).map_err(|e| {
                TransportError::Validation(format!("failed to encode JSON body: {e}"))
            })?;
            request = request
                .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .with_body(body);
        }

        let response = self.dispatch(request).await?;
        parse_json_map(&response)
    }

    /// Sends `form` as a `multipart/form-data` body and decodes the JSON
    /// object response.
    ///
    /// Method, path, query and extra headers come from `descriptor`; a JSON
    /// body on the descriptor is not sent.
    ///
    /// # Errors
    ///
    /// Same as [`Transport::send`].
    pub async fn send_multipart(
        &self,
        descriptor: &RequestDescriptor,
        form: &MultipartForm,
    ) -> TransportResult<JsonMap> {
        let url = self.descriptor_url(descriptor)?;
        let content_type = HeaderValue::from_str(&form.content_type()).map_err(|_| {
            TransportError::Validation(format!("invalid multipart boundary '{}'", form.boundary()))
        })?;

        let request = self
            .build_request(descriptor.method().clone(), url, Some(descriptor))
            .with_header(CONTENT_TYPE, content_type)
            .with_body(form.encode());

        let response = self.dispatch(request).await?;
        parse_json_map(&response)
    }

    /// Downloads raw bytes with a GET.
    ///
    /// `url_or_path` is either an absolute `http(s)` URL (media download
    /// links live on a different host) or a Graph path.
    ///
    /// # Errors
    ///
    /// Same as [`Transport::send`], except that no JSON parsing happens.
    pub async fn fetch_binary(&self, url_or_path: &str) -> TransportResult<Vec<u8>> {
        let url = if is_absolute_http_url(url_or_path) {
            Url::parse(url_or_path.trim())
                .map_err(|e| TransportError::InvalidUrl(format!("{url_or_path}: {e}")))?
        } else {
            self.resolve(url_or_path)?
        };

        let request = self.build_request(Method::GET, url, None);
        let response = self.dispatch(request).await?;
        Ok(response.body)
    }

    /// Runs the attempt loop for an encoded request.
    async fn dispatch(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let max_attempts = self.retry_policy.max_attempts;
        let mut attempt = 1;

        loop {
            self.rate_limiter.acquire().await;
            tracing::debug!(
                "{} {} (attempt {attempt}/{max_attempts})",
                request.method,
                request.url
            );

            let failure = match self.client.request(request.clone()).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => AttemptFailure::Status(response),
                Err(e) => AttemptFailure::Http(e),
            };

            if !failure.is_retryable(&self.retry_policy) || !self.retry_policy.should_retry(attempt)
            {
                tracing::debug!("{} {} failed: {failure}", request.method, request.url);
                return Err(failure.into_error(attempt, &self.retry_policy));
            }

            let delay = self.backoff_delay(attempt, &failure);
            tracing::warn!(
                "Attempt {attempt}/{max_attempts} for {} failed ({failure}), retrying in {delay:?}",
                request.url.path()
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff_delay(&self, attempt: u32, failure: &AttemptFailure) -> Duration {
        let policy = &self.retry_policy;
        let delay = policy.jittered(policy.delay_for_retry(attempt - 1));

        match failure {
            AttemptFailure::Status(response) if response.status == StatusCode::TOO_MANY_REQUESTS => {
                response
                    .retry_after()
                    .map_or(delay, |wait| delay.max(wait).min(policy.max_delay))
            }
            _ => delay,
        }
    }
}

/// Outcome of a single failed attempt, before classification.
enum AttemptFailure {
    Http(HttpError),
    Status(HttpResponse),
}

impl AttemptFailure {
    fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            Self::Http(e) => e.is_transient(),
            Self::Status(response) => policy.is_retryable_status(response.status),
        }
    }

    fn into_error(self, attempts: u32, policy: &RetryPolicy) -> TransportError {
        match self {
            Self::Http(HttpError::InvalidUrl(reason)) => TransportError::InvalidUrl(reason),
            Self::Http(source) => TransportError::Network { attempts, source },
            Self::Status(response) => classify_status(&response, attempts, policy),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "{e}"),
            Self::Status(response) => write!(f, "HTTP {}", response.status),
        }
    }
}

fn classify_status(
    response: &HttpResponse,
    attempts: u32,
    policy: &RetryPolicy,
) -> TransportError {
    let detail = ApiErrorDetail::from_response(response.status, &response.body);

    if detail.is_auth_failure() {
        TransportError::Authentication { detail }
    } else if response.status == StatusCode::TOO_MANY_REQUESTS {
        TransportError::RateLimited {
            attempts,
            retry_after: response.retry_after(),
            detail,
        }
    } else if policy.is_retryable_status(response.status) {
        TransportError::RetriesExhausted { attempts, detail }
    } else {
        TransportError::Api { detail }
    }
}

fn parse_json_map(response: &HttpResponse) -> TransportResult<JsonMap> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonMap::new());
    }

    serde_json::from_slice(&response.body).map_err(|source| TransportError::Parse {
        status: response.status,
        source,
    })
}

fn is_absolute_http_url(value: &str) -> bool {
    let value = value.trim_start();
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
