//! Endpoint declarations and handler groups.
//!
//! A handler group is an instance (a service, a controller, a plain struct)
//! plus the endpoints it serves under one base path. Groups describe
//! themselves through [`HandlerGroup`], or are assembled by hand with
//! [`GroupDescriptor::new`]; either way the registry only ever sees
//! [`GroupDescriptor`]s.
//!
//! ```rust
//! use gantry::{Binding, Endpoint, HandlerGroup, QueryShape};
//!
//! struct Exams;
//!
//! impl HandlerGroup for Exams {
//!     fn base_path(&self) -> &str { "/exams" }
//!
//!     fn endpoints(&self) -> Vec<Endpoint<Self>> {
//!         vec![
//!             Endpoint::get("").to(|_: &Exams, _| Ok(vec!["algebra", "biology"])),
//!             Endpoint::get("/count")
//!                 .bind(Binding::query("min", QueryShape::Int).default_value("0"))
//!                 .to(|_: &Exams, mut args| Ok(args.query_int()?.unwrap_or(0) + 2)),
//!         ]
//!     }
//! }
//! ```

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::binding::Binding;
use crate::handler::{Args, HandlerError, Invoke, Reply};
use crate::method::Method;

type Target<H> =
    Arc<dyn Fn(&H, Args<'_>) -> Result<Box<dyn Reply>, HandlerError> + Send + Sync + 'static>;

/// One endpoint of a handler group of type `H`.
pub struct Endpoint<H> {
    sub_path: String,
    method: Method,
    status: StatusCode,
    bindings: Vec<Binding>,
    target: Target<H>,
}

impl Endpoint<()> {
    /// Starts an endpoint declaration. Status defaults to `200 OK`.
    pub fn new(method: Method, sub_path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            sub_path: sub_path.into(),
            method,
            status: StatusCode::OK,
            bindings: Vec::new(),
        }
    }

    pub fn get(sub_path: impl Into<String>) -> EndpointBuilder { Self::new(Method::Get, sub_path) }
    pub fn post(sub_path: impl Into<String>) -> EndpointBuilder { Self::new(Method::Post, sub_path) }
    pub fn put(sub_path: impl Into<String>) -> EndpointBuilder { Self::new(Method::Put, sub_path) }
    pub fn patch(sub_path: impl Into<String>) -> EndpointBuilder { Self::new(Method::Patch, sub_path) }
    pub fn delete(sub_path: impl Into<String>) -> EndpointBuilder { Self::new(Method::Delete, sub_path) }
}

impl<H> Endpoint<H> {
    pub fn sub_path(&self) -> &str { &self.sub_path }
    pub fn method(&self) -> Method { self.method }
    pub fn status(&self) -> StatusCode { self.status }
    pub fn bindings(&self) -> &[Binding] { &self.bindings }
}

/// Endpoint metadata waiting for its invocation target.
#[derive(Clone, Debug)]
pub struct EndpointBuilder {
    sub_path: String,
    method: Method,
    status: StatusCode,
    bindings: Vec<Binding>,
}

impl EndpointBuilder {
    /// Status written on success.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends the binding for the handler's next argument.
    pub fn bind(mut self, binding: impl Into<Binding>) -> Self {
        self.bindings.push(binding.into());
        self
    }

    /// Finishes the endpoint with its invocation target.
    ///
    /// The target receives the group instance and the resolved arguments and
    /// returns anything serializable.
    pub fn to<H, F, R>(self, target: F) -> Endpoint<H>
    where
        H: Send + Sync + 'static,
        F: Fn(&H, Args<'_>) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Serialize + Send + 'static,
    {
        let target: Target<H> = Arc::new(move |group: &H, args: Args<'_>| {
            target(group, args).map(|reply| Box::new(reply) as Box<dyn Reply>)
        });
        Endpoint {
            sub_path: self.sub_path,
            method: self.method,
            status: self.status,
            bindings: self.bindings,
            target,
        }
    }
}

/// Implemented by types that declare their own endpoints.
pub trait HandlerGroup: Send + Sync + Sized + 'static {
    fn base_path(&self) -> &str;
    fn endpoints(&self) -> Vec<Endpoint<Self>>;
}

/// An endpoint with its group instance bound into the target.
pub(crate) struct BoundEndpoint {
    pub(crate) sub_path: String,
    pub(crate) method: Method,
    pub(crate) status: StatusCode,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) invoke: Invoke,
}

/// A handler group ready for registration: base path, instance, endpoints.
pub struct GroupDescriptor {
    base_path: String,
    endpoints: Vec<BoundEndpoint>,
}

impl GroupDescriptor {
    pub fn new<H>(base_path: impl Into<String>, instance: impl Into<Arc<H>>, endpoints: Vec<Endpoint<H>>) -> Self
    where
        H: Send + Sync + 'static,
    {
        let instance: Arc<H> = instance.into();
        let endpoints = endpoints
            .into_iter()
            .map(|ep| {
                let group = Arc::clone(&instance);
                let target = ep.target;
                let invoke: Invoke = Arc::new(move |args: Args<'_>| target(&group, args));
                BoundEndpoint {
                    sub_path: ep.sub_path,
                    method: ep.method,
                    status: ep.status,
                    bindings: ep.bindings,
                    invoke,
                }
            })
            .collect();
        Self { base_path: base_path.into(), endpoints }
    }

    pub fn base_path(&self) -> &str { &self.base_path }
    pub fn len(&self) -> usize { self.endpoints.len() }
    pub fn is_empty(&self) -> bool { self.endpoints.is_empty() }

    pub(crate) fn into_parts(self) -> (String, Vec<BoundEndpoint>) {
        (self.base_path, self.endpoints)
    }
}

impl<G: HandlerGroup> From<G> for GroupDescriptor {
    fn from(group: G) -> Self {
        let base_path = group.base_path().to_owned();
        let endpoints = group.endpoints();
        Self::new(base_path, group, endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::QueryShape;

    struct Counter {
        start: i64,
    }

    impl HandlerGroup for Counter {
        fn base_path(&self) -> &str { "/counter" }

        fn endpoints(&self) -> Vec<Endpoint<Self>> {
            vec![
                Endpoint::get("").to(|c: &Counter, _| Ok(c.start)),
                Endpoint::post("/bump")
                    .status(StatusCode::CREATED)
                    .bind(Binding::query("by", QueryShape::Int).required())
                    .to(|c: &Counter, mut args| Ok(c.start + args.query_int()?.unwrap_or(0))),
            ]
        }
    }

    #[test]
    fn declared_metadata_survives_binding() {
        let group = Counter { start: 1 };
        let endpoints = group.endpoints();
        assert_eq!(endpoints[1].sub_path(), "/bump");
        assert_eq!(endpoints[1].method(), Method::Post);
        assert_eq!(endpoints[1].status(), StatusCode::CREATED);
        assert_eq!(endpoints[1].bindings().len(), 1);

        let descriptor = GroupDescriptor::from(group);
        assert_eq!(descriptor.base_path(), "/counter");
        assert_eq!(descriptor.len(), 2);
    }

    #[test]
    fn bound_target_sees_the_instance() {
        let (_, endpoints) = GroupDescriptor::from(Counter { start: 41 }).into_parts();
        let ctx = crate::context::RequestContext::get("/counter");
        let reply = (endpoints[0].invoke)(Args::new(&ctx, Vec::new())).unwrap();
        assert_eq!(reply.encode().unwrap(), serde_json::json!(41));
    }
}
