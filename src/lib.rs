//! # gantry
//!
//! Declarative endpoint routing and dispatch on top of hyper.
//!
//! Handler groups declare their endpoints (sub-path, method, success status,
//! argument bindings) up front. At startup gantry turns them into a route
//! table; at request time every request runs the same fixed pipeline:
//!
//! ```text
//! method check → pre-hooks → resolve args → invoke → serialize → post-hooks → write
//! ```
//!
//! Every failure along the way, and every unknown path, becomes a JSON error
//! body `{"message", "code", "statusCode"}` with the matching status.
//!
//! What gantry intentionally ignores: TLS, authentication, streaming bodies.
//! Put a proxy in front for those.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gantry::{App, Binding, Endpoint, HandlerGroup, QueryShape, Server, ServerConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewExam { title: String }
//!
//! struct Exams;
//!
//! impl HandlerGroup for Exams {
//!     fn base_path(&self) -> &str { "/exams" }
//!
//!     fn endpoints(&self) -> Vec<Endpoint<Self>> {
//!         vec![
//!             Endpoint::get("")
//!                 .bind(Binding::query("limit", QueryShape::Int).default_value("10"))
//!                 .to(|_: &Exams, mut args| {
//!                     let limit = args.query_int()?.unwrap_or(10);
//!                     Ok(vec!["algebra"; limit as usize])
//!                 }),
//!             Endpoint::post("/add")
//!                 .bind(Binding::body::<NewExam>())
//!                 .to(|_: &Exams, mut args| Ok(args.body::<NewExam>()?.title)),
//!         ]
//!     }
//! }
//!
//! fn main() -> Result<(), gantry::Error> {
//!     let config = ServerConfig::load_from("gantry")?;
//!     let app = App::builder()
//!         .config(&config)
//!         .interceptor(0, gantry::middleware::trace::TraceInterceptor)
//!         .group(Exams)
//!         .build()?;
//!     Server::run(&config, app)
//! }
//! ```

mod admission;
mod app;
mod binding;
mod config;
mod context;
mod dispatcher;
mod endpoint;
mod error;
mod failure;
mod handler;
mod method;
mod registry;
mod response;
mod server;

pub mod middleware;

pub use app::{App, AppBuilder};
pub use binding::{Binding, BodyShape, DATE_FORMAT, QueryParam, QueryShape, QueryValue, parse_query, resolve};
pub use config::ServerConfig;
pub use context::RequestContext;
pub use dispatcher::{Dispatcher, Stage};
pub use endpoint::{Endpoint, EndpointBuilder, GroupDescriptor, HandlerGroup};
pub use error::Error;
pub use failure::{DispatchError, ErrorResponse};
pub use handler::{Arg, Args, HandlerError, Reply};
pub use method::Method;
pub use registry::{Registry, RouteDefinition, RouteTable, build};
pub use response::Response;
pub use server::{Server, serve_with_shutdown};
