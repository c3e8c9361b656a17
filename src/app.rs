//! The assembled application: route table, interceptors, limits.
//!
//! [`App::handle`] is the whole request path short of the socket. The
//! [`Server`](crate::Server) calls it for every request hyper parses, and
//! tests call it directly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use matchit::Router as MatchitRouter;
use tracing::{info, warn};

use crate::admission::Admission;
use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::dispatcher::Dispatcher;
use crate::endpoint::GroupDescriptor;
use crate::error::Error;
use crate::failure::DispatchError;
use crate::middleware::{Interceptor, InterceptorChain};
use crate::registry::{Registry, RouteDefinition, RouteTable};
use crate::response::Response;

/// Collects groups, interceptors and limits, then builds an [`App`].
pub struct AppBuilder {
    registry: Registry,
    chain: InterceptorChain,
    config: ServerConfig,
}

impl AppBuilder {
    pub fn group(mut self, group: impl Into<GroupDescriptor>) -> Self {
        self.registry = self.registry.group(group);
        self
    }

    /// Adds an interceptor. Lower orders run first; equal orders run in
    /// registration order.
    pub fn interceptor(mut self, order: i32, interceptor: impl Interceptor) -> Self {
        self.chain.add(order, interceptor);
        self
    }

    /// Takes request limits (body size, concurrency, timeout) from `config`.
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn build(self) -> Result<App, Error> {
        let table = self.registry.build()?;

        let mut router = MatchitRouter::new();
        for route in table.iter() {
            // Full paths are literal; braces must not turn into matchit parameters.
            let pattern = route.full_path().replace('{', "{{").replace('}', "}}");
            router.insert(pattern, Arc::clone(route)).map_err(|source| Error::Route {
                path: route.full_path().to_owned(),
                source,
            })?;
        }

        Ok(App {
            router,
            table,
            dispatcher: Dispatcher::new(self.chain),
            admission: Admission::new(self.config.max_in_flight(), self.config.max_queued),
            max_body_size: self.config.max_body_size,
            request_timeout: self.config.request_timeout(),
        })
    }
}

/// Routes, interceptors and limits, shared read-only by every request.
pub struct App {
    router: MatchitRouter<Arc<RouteDefinition>>,
    table: RouteTable,
    dispatcher: Dispatcher,
    admission: Admission,
    max_body_size: usize,
    request_timeout: Option<Duration>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder {
            registry: Registry::new(),
            chain: InterceptorChain::new(),
            config: ServerConfig::default(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    fn lookup(&self, path: &str) -> Option<Arc<RouteDefinition>> {
        self.router.at(path).ok().map(|matched| Arc::clone(matched.value))
    }

    /// Serves one request end to end. Every outcome, including unknown paths
    /// and overload, is a JSON response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match self.try_handle(req).await {
            Ok(res) => res,
            Err(err) => {
                warn!(status = %err.status(), "request rejected before dispatch: {err}");
                err.into_response()
            }
        }
    }

    async fn try_handle<B>(&self, req: http::Request<B>) -> Result<Response, DispatchError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let received_at = Instant::now();
        let (parts, body) = req.into_parts();
        info!(method = %parts.method, uri = %parts.uri, "handling request");

        let route = self
            .lookup(parts.uri.path())
            .ok_or_else(|| DispatchError::NotFound(parts.uri.path().to_owned()))?;
        if !route.method().matches(&parts.method) {
            return Err(DispatchError::MethodNotAllowed { inbound: parts.method, allowed: route.method() });
        }

        let _permit = self.admission.admit().await?;

        let body = if route.reads_body() {
            Limited::new(body, self.max_body_size)
                .collect()
                .await
                .map_err(|e| match e.downcast_ref::<LengthLimitError>() {
                    Some(_) => DispatchError::PayloadTooLarge { limit: self.max_body_size },
                    None => DispatchError::BodyRead(e.to_string()),
                })?
                .to_bytes()
        } else {
            Bytes::new()
        };

        let mut ctx = RequestContext::new(parts.method, parts.uri, parts.headers, body)
            .with_received_at(received_at);
        if let Some(timeout) = self.request_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        Ok(self.dispatcher.dispatch(&route, ctx))
    }
}
