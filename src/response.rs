//! Outgoing HTTP response type.
//!
//! Every response gantry produces is JSON: a serialized handler result on the
//! success path, an [`ErrorResponse`](crate::ErrorResponse) on every other
//! path. A `Response` is built once, fully, and handed to hyper in one piece,
//! so nothing is ever written before the pipeline has finished.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

fn application_json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// A fully materialised response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `application/json` response with the given status.
    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, application_json());
        Self { status, headers, body: body.into() }
    }

    /// Merges extra headers in. `content-type` stays `application/json`.
    pub(crate) fn with_headers(mut self, extra: HeaderMap) -> Self {
        for (name, value) in extra {
            if let Some(name) = name {
                self.headers.insert(name, value);
            }
        }
        self.headers.insert(CONTENT_TYPE, application_json());
        self
    }

    pub(crate) fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decodes the body, mostly useful in tests.
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_headers_cannot_override_content_type() {
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        extra.insert("x-trace", HeaderValue::from_static("1"));
        let res = Response::json(StatusCode::CREATED, "{}").with_headers(extra);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("x-trace"), Some("1"));
    }

    #[test]
    fn into_inner_keeps_status_and_headers() {
        let inner = Response::json(StatusCode::ACCEPTED, "[]").into_inner();
        assert_eq!(inner.status(), StatusCode::ACCEPTED);
        assert_eq!(inner.headers()[CONTENT_TYPE], "application/json");
    }
}
