//! Failure taxonomy and its mapping onto the wire.
//!
//! Every failure raised while serving a request, from the path lookup to
//! the last post-hook, is a [`DispatchError`]. Each kind owns a fixed status
//! and machine-readable `code`; the client always receives an
//! [`ErrorResponse`] body with `statusCode` mirroring the response status.

use http::header::{ALLOW, HeaderValue};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binding::QueryShape;
use crate::handler::HandlerError;
use crate::method::Method;
use crate::middleware::InterceptorError;
use crate::response::Response;

/// JSON error body: `{"message": …, "code": …, "statusCode": …}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
    pub status_code: u16,
}

/// Everything that can go wrong between accepting a request and writing its
/// response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no endpoint registered for path {0}")]
    NotFound(String),

    #[error("{inbound} method not allowed for this endpoint")]
    MethodNotAllowed { inbound: http::Method, allowed: Method },

    #[error("required query parameter `{0}` is missing")]
    MissingRequiredParameter(String),

    #[error("query parameter `{name}` value `{value}` is not a valid {shape}")]
    ParameterCoercion { name: String, value: String, shape: QueryShape },

    #[error("request body is not a valid {shape}: {source}")]
    BodyDecode {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("request body could not be read: {0}")]
    BodyRead(String),

    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    Interceptor(InterceptorError),

    #[error("{0}")]
    Handler(HandlerError),

    #[error("handler result could not be serialized: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("server is at capacity, retry later")]
    Overloaded,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_)                 => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. }     => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingRequiredParameter(_)
            | Self::ParameterCoercion { .. }
            | Self::BodyDecode { .. }
            | Self::BodyRead(_)               => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. }      => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Interceptor(e)              => e.status(),
            Self::Handler(_)
            | Self::Serialization(_)          => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Overloaded
            | Self::DeadlineExceeded          => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NotFound(_)                 => "not found",
            Self::MethodNotAllowed { .. }     => "method not allowed",
            Self::MissingRequiredParameter(_) => "missing parameter",
            Self::ParameterCoercion { .. }    => "invalid parameter",
            Self::BodyDecode { .. }
            | Self::BodyRead(_)               => "invalid body",
            Self::PayloadTooLarge { .. }      => "payload too large",
            Self::Interceptor(e)              => e.code(),
            Self::Handler(_)                  => "handler error",
            Self::Serialization(_)            => "serialization error",
            Self::Overloaded                  => "overloaded",
            Self::DeadlineExceeded            => "deadline exceeded",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
            code: self.code().to_owned(),
            status_code: self.status().as_u16(),
        }
    }

    /// Renders the failure as the response the client receives.
    pub fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::to_vec(&self.to_error_response()).unwrap_or_else(|_| {
            format!(r#"{{"message":"internal error","code":"serialization error","statusCode":{}}}"#, status.as_u16())
                .into_bytes()
        });
        let res = Response::json(status, body);
        match self {
            Self::MethodNotAllowed { allowed, .. } => {
                res.with_header(ALLOW, HeaderValue::from_static(allowed.as_str()))
            }
            _ => res,
        }
    }
}
