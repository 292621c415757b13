//! Description of one API call.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;

/// An immutable description of a Graph API call.
///
/// Built with consuming `with_*` methods and then only read. The
/// [`Transport`](super::Transport) borrows it, so the caller keeps
/// ownership and the value never changes underneath a retry.
///
/// `path` is relative to `{base_url}/{api_version}/`.
///
/// # Example
///
/// ```
/// use wa_cloud::transport::RequestDescriptor;
/// use serde_json::json;
///
/// let descriptor = RequestDescriptor::post("1234567890/messages")
///     .with_json(json!({"messaging_product": "whatsapp"}));
///
/// assert_eq!(descriptor.path(), "1234567890/messages");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    json: Option<Value>,
    headers: HeaderMap,
}

impl RequestDescriptor {
    /// Creates a descriptor without body, query or extra headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            json: None,
            headers: HeaderMap::new(),
        }
    }

    /// Creates a GET descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST descriptor.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a DELETE descriptor.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Adds an extra header.
    ///
    /// `Authorization` and `Content-Type` are owned by the transport and
    /// are overwritten when the request is built.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path relative to the versioned base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Returns the extra headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
