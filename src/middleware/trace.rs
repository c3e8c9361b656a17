//! Per-request tracing.

use tracing::{debug, info};

use crate::context::RequestContext;
use crate::middleware::{Interceptor, InterceptorError};

/// Logs the latency of each handled request, measured from arrival. Register
/// it with the lowest order so it also sees requests the other interceptors
/// reject.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceInterceptor;

impl Interceptor for TraceInterceptor {
    fn pre_handle(&self, ctx: &mut RequestContext) -> Result<(), InterceptorError> {
        debug!(method = %ctx.method(), uri = %ctx.uri(), "entering interceptors");
        Ok(())
    }

    fn post_handle(&self, ctx: &mut RequestContext, _result: &serde_json::Value) -> Result<(), InterceptorError> {
        let elapsed = ctx.received_at().elapsed();
        info!(
            method = %ctx.method(),
            path = ctx.path(),
            latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "request handled"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "trace"
    }
}
