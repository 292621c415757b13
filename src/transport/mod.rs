//! Resilient HTTP transport for the Graph API.
//!
//! This module provides types and traits for:
//! - Describing API calls ([`RequestDescriptor`])
//! - Single HTTP exchanges ([`HttpRequest`], [`HttpResponse`], [`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Retry policy configuration ([`RetryPolicy`])
//! - Client-side throttling ([`RateLimiter`])
//! - Upload bodies ([`MultipartForm`])
//! - Auth, retries and error classification ([`Transport`])

mod client;
mod descriptor;
mod error;
mod http;
mod multipart;
mod rate_limit;
mod resilient;
mod retry;

#[cfg(test)]
mod resilient_tests;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use client::{ClientOptions, ReqwestClient};
pub use descriptor::RequestDescriptor;
pub use error::{ApiErrorDetail, ErrorKind, HttpError, TransportError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use multipart::{DEFAULT_MIME_TYPE, FilePart, MultipartForm, Part, PartContent};
pub use rate_limit::RateLimiter;
pub use resilient::{JsonMap, Transport, TransportResult};
pub use retry::RetryPolicy;
