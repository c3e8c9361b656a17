//! Per-request context shared by interceptors and handlers.

use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderValue, Uri};
use http::header::IntoHeaderName;

/// One inbound request and the response headers accumulated for it.
///
/// The body is buffered before dispatch starts, so reading it never blocks
/// the pipeline. Routes that bind neither the body nor the context get an
/// empty one. Interceptors receive `&mut RequestContext`
/// and may stash typed values in [`extensions`](Self::extensions_mut) or add
/// response headers; handlers see it read-only through a
/// [`Binding::Context`](crate::Binding::Context) argument.
#[derive(Debug)]
pub struct RequestContext {
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    response_headers: HeaderMap,
    extensions: Extensions,
    received_at: Instant,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(method: http::Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            response_headers: HeaderMap::new(),
            extensions: Extensions::new(),
            received_at: Instant::now(),
            deadline: None,
        }
    }

    /// Backdates arrival to `at`, the moment the transport first saw the
    /// request. A deadline already set moves with it.
    pub fn with_received_at(mut self, at: Instant) -> Self {
        if let Some(deadline) = self.deadline {
            self.deadline = Some(at + deadline.saturating_duration_since(self.received_at));
        }
        self.received_at = at;
        self
    }

    /// Caps the time this request may take, counted from arrival.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(self.received_at + timeout);
        self
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn received_at(&self) -> Instant { self.received_at }
    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// Raw query string without the leading `?`, empty when absent.
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Adds a header to the success response. `content-type` is always
    /// overwritten with `application/json` at write time.
    pub fn insert_response_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    pub fn response_headers(&self) -> &HeaderMap { &self.response_headers }

    pub(crate) fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.response_headers)
    }

    #[cfg(test)]
    pub(crate) fn get(path_and_query: &str) -> Self {
        Self::new(
            http::Method::GET,
            path_and_query.parse().expect("test uri"),
            HeaderMap::new(),
            Bytes::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_empty_when_absent() {
        assert_eq!(RequestContext::get("/exams").query(), "");
        assert_eq!(RequestContext::get("/exams?a=1&b").query(), "a=1&b");
    }

    #[test]
    fn deadline_in_the_past_is_exceeded() {
        let ctx = RequestContext::get("/").with_timeout(Duration::ZERO);
        assert!(ctx.deadline_exceeded());
        assert!(!RequestContext::get("/").deadline_exceeded());
    }

    #[test]
    fn deadline_counts_from_arrival() {
        let arrived = Instant::now() - Duration::from_millis(100);
        let ctx = RequestContext::get("/")
            .with_received_at(arrived)
            .with_timeout(Duration::from_millis(50));
        assert_eq!(ctx.received_at(), arrived);
        assert!(ctx.deadline_exceeded());

        let ctx = RequestContext::get("/")
            .with_timeout(Duration::from_millis(50))
            .with_received_at(arrived);
        assert_eq!(ctx.deadline(), Some(arrived + Duration::from_millis(50)));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc"));
        let ctx = RequestContext::new(http::Method::GET, Uri::from_static("/"), headers, Bytes::new());
        assert_eq!(ctx.header("X-Request-Id"), Some("abc"));
    }
}
