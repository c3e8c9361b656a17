//! The per-request pipeline.
//!
//! ```text
//! MethodCheck → PreIntercept → ResolveArgs → Invoke → Serialize → PostIntercept → WriteResponse
//!      └──────────────┴─────────────┴──────────┴──────────┴─────────────┴──→ Fail
//! ```
//!
//! Stages run strictly in sequence. Nothing is written until the last stage,
//! so any failure, including one from a post-hook, still produces a clean
//! error response. The request deadline, when set, is checked on entry to
//! every stage.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, warn};

use crate::binding;
use crate::context::RequestContext;
use crate::failure::DispatchError;
use crate::handler::{Args, HandlerError};
use crate::middleware::{InterceptorChain, InterceptorError};
use crate::registry::RouteDefinition;
use crate::response::Response;

/// Pipeline stage, used in logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    MethodCheck,
    PreIntercept,
    ResolveArgs,
    Invoke,
    Serialize,
    PostIntercept,
    WriteResponse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MethodCheck   => "method check",
            Self::PreIntercept  => "pre-intercept",
            Self::ResolveArgs   => "resolve args",
            Self::Invoke        => "invoke",
            Self::Serialize     => "serialize",
            Self::PostIntercept => "post-intercept",
            Self::WriteResponse => "write response",
        };
        f.write_str(name)
    }
}

/// Runs routes through the interceptor chain and into their handlers.
pub struct Dispatcher {
    chain: InterceptorChain,
}

impl Dispatcher {
    pub fn new(chain: InterceptorChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Serves one request on an already matched route. Never fails: every
    /// error, and any panic raised by a hook, handler or `Serialize` impl,
    /// becomes a JSON error response.
    pub fn dispatch(&self, route: &RouteDefinition, mut ctx: RequestContext) -> Response {
        let mut stage = Stage::MethodCheck;
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(route, &mut ctx, &mut stage)))
            .unwrap_or_else(|panic| Err(panicked(stage, panic.as_ref())));
        match outcome {
            Ok(res) => res,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    error!(path = route.full_path(), %stage, %status, "dispatch failed: {err}");
                } else {
                    warn!(path = route.full_path(), %stage, %status, "request rejected: {err}");
                }
                err.into_response()
            }
        }
    }

    fn run(
        &self,
        route: &RouteDefinition,
        ctx: &mut RequestContext,
        stage: &mut Stage,
    ) -> Result<Response, DispatchError> {
        enter(Stage::MethodCheck, ctx, stage)?;
        if !route.method().matches(ctx.method()) {
            return Err(DispatchError::MethodNotAllowed {
                inbound: ctx.method().clone(),
                allowed: route.method(),
            });
        }

        enter(Stage::PreIntercept, ctx, stage)?;
        self.chain.run_pre(ctx)?;

        enter(Stage::ResolveArgs, ctx, stage)?;
        let args = binding::resolve(route.bindings(), ctx)?;

        enter(Stage::Invoke, ctx, stage)?;
        let args = Args::new(ctx, args);
        let reply = (route.invoke)(args).map_err(DispatchError::Handler)?;

        enter(Stage::Serialize, ctx, stage)?;
        let value = reply.encode().map_err(DispatchError::Serialization)?;
        let bytes = serde_json::to_vec(&value).map_err(DispatchError::Serialization)?;

        enter(Stage::PostIntercept, ctx, stage)?;
        self.chain.run_post(ctx, &value)?;

        enter(Stage::WriteResponse, ctx, stage)?;
        Ok(Response::json(route.success_status(), bytes).with_headers(ctx.take_response_headers()))
    }
}

fn enter(next: Stage, ctx: &RequestContext, stage: &mut Stage) -> Result<(), DispatchError> {
    *stage = next;
    if ctx.deadline_exceeded() {
        return Err(DispatchError::DeadlineExceeded);
    }
    debug!(path = ctx.path(), stage = %next, "dispatch stage");
    Ok(())
}

/// Hook panics are interceptor failures; anything else is charged to the handler.
fn panicked(stage: Stage, payload: &(dyn std::any::Any + Send)) -> DispatchError {
    let message = panic_message(payload);
    match stage {
        Stage::PreIntercept | Stage::PostIntercept => {
            DispatchError::Interceptor(InterceptorError::new(format!("interceptor panicked: {message}")))
        }
        _ => DispatchError::Handler(HandlerError::msg(message)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned())
}
