//! Interceptors: ordered pre/post hooks around every dispatch.
//!
//! Interceptors are the place for cross-cutting concerns that do not belong
//! to any single endpoint: request tracing, header checks, tagging the
//! response. They are built once, shared by every concurrent request, and
//! therefore must not hold unsynchronised per-request state.
//!
//! ```rust
//! use gantry::middleware::{Interceptor, InterceptorError};
//! use gantry::RequestContext;
//! use http::StatusCode;
//!
//! struct RequireApiKey;
//!
//! impl Interceptor for RequireApiKey {
//!     fn pre_handle(&self, ctx: &mut RequestContext) -> Result<(), InterceptorError> {
//!         match ctx.header("x-api-key") {
//!             Some(_) => Ok(()),
//!             None => Err(InterceptorError::new("missing api key")
//!                 .with_status(StatusCode::UNAUTHORIZED)
//!                 .with_code("unauthorized")),
//!         }
//!     }
//! }
//! ```

mod chain;
pub mod trace;

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

use http::StatusCode;

use crate::context::RequestContext;

pub use chain::InterceptorChain;

/// A hook pair run around every dispatch.
pub trait Interceptor: Send + Sync + 'static {
    /// Runs before argument resolution. An error aborts the request.
    fn pre_handle(&self, ctx: &mut RequestContext) -> Result<(), InterceptorError>;

    /// Runs after the handler result has been serialized and before anything
    /// is written. An error replaces the success response with an error one.
    fn post_handle(
        &self,
        _ctx: &mut RequestContext,
        _result: &serde_json::Value,
    ) -> Result<(), InterceptorError> {
        Ok(())
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// Plain functions and closures work as pre-only interceptors.
impl<F> Interceptor for F
where
    F: Fn(&mut RequestContext) -> Result<(), InterceptorError> + Send + Sync + 'static,
{
    fn pre_handle(&self, ctx: &mut RequestContext) -> Result<(), InterceptorError> {
        self(ctx)
    }
}

/// Failure reported by an interceptor. Defaults to `500` and the code
/// `interceptor rejected`.
#[derive(Clone, Debug)]
pub struct InterceptorError {
    status: StatusCode,
    code: Cow<'static, str>,
    message: String,
}

impl InterceptorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: Cow::Borrowed("interceptor rejected"),
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = code.into();
        self
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn code(&self) -> &str { &self.code }
    pub fn message(&self) -> &str { &self.message }
}

impl fmt::Display for InterceptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InterceptorError {}
