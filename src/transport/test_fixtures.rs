//! Shared test fixtures for code built on the transport.

use super::{HttpClient, HttpError, HttpRequest, HttpResponse, RateLimiter, RetryPolicy, Transport};
use crate::time::Sleeper;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted HTTP client that replays responses in order and captures requests.
///
/// Panics if called more often than it has responses.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client answering every listed status with the same body.
    pub fn statuses(statuses: &[u16], body: &str) -> Self {
        Self::new(
            statuses
                .iter()
                .map(|&status| Ok(response(status, body)))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockClient ran out of scripted responses")
    }
}

/// Sleeper that records the requested delays and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub const TEST_TOKEN: &str = "test-token-123";

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse::new(
        http::StatusCode::from_u16(status).unwrap(),
        http::HeaderMap::new(),
        body.as_bytes().to_vec(),
    )
}

pub fn response_with_header(status: u16, body: &str, name: &'static str, value: &str) -> HttpResponse {
    let mut resp = response(status, body);
    resp.headers.insert(
        http::HeaderName::from_static(name),
        http::HeaderValue::from_str(value).unwrap(),
    );
    resp
}

pub fn base_url() -> url::Url {
    url::Url::parse("https://graph.example.com").unwrap()
}

/// A transport over `client` with fast, deterministic retries.
pub fn transport(client: Arc<MockClient>) -> Transport<Arc<MockClient>, RecordingSleeper> {
    Transport::new(client, base_url(), "v23.0", TEST_TOKEN)
        .unwrap()
        .with_retry_policy(
            RetryPolicy::new()
                .with_max_attempts(3)
                .with_initial_delay(Duration::from_millis(100))
                .with_max_delay(Duration::from_secs(2)),
        )
        .with_rate_limiter(RateLimiter::per_second(1000))
        .with_sleeper(RecordingSleeper::default())
}
