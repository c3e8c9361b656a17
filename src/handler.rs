//! Invocation targets and type erasure.
//!
//! # How typed handlers are stored
//!
//! The route table holds endpoints from many handler groups, each with its
//! own instance type and its own return type, in one `HashMap`. As in any
//! heterogeneous collection, the concrete types are hidden behind trait
//! objects:
//!
//! ```text
//! |g: &Exams, mut args| Ok(g.create(args.body()?))   ← user writes this
//!        ↓ Endpoint::post("/add").to(closure)
//! Arc<dyn Fn(&Exams, Args) -> Result<Box<dyn Reply>, _>>   ← return type erased
//!        ↓ GroupDescriptor::new(base, exams, endpoints)
//! Arc<dyn Fn(Args) -> Result<Box<dyn Reply>, _>>     ← instance bound, type erased
//! ```
//!
//! Arguments travel the opposite way: the resolver produces one [`Arg`] per
//! binding and the handler pulls them off [`Args`] in declaration order.

use std::any::{Any, type_name};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::binding::QueryValue;
use crate::context::RequestContext;

// ── Handler results ───────────────────────────────────────────────────────────

/// A handler's return value, serializable without knowing its type.
pub trait Reply: Send {
    fn encode(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: Serialize + Send> Reply for T {
    fn encode(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// A bound invocation target: handler instance captured, types erased.
pub(crate) type Invoke =
    Arc<dyn Fn(Args<'_>) -> Result<Box<dyn Reply>, HandlerError> + Send + Sync + 'static>;

// ── HandlerError ──────────────────────────────────────────────────────────────

/// The failure a handler raises.
///
/// Any `std::error::Error` converts into it with `?`. When rendered, only the
/// innermost cause of the error's `source()` chain is shown, so wrapping
/// layers never leak into the response.
pub struct HandlerError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self { inner: Box::new(error) }
    }

    /// A failure with a plain message and no underlying error.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self { inner: message.into() }
    }

    /// The deepest error in the `source()` chain.
    pub fn innermost(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self.inner.as_ref();
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.innermost(), f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError").field("inner", &self.inner).finish()
    }
}

// ── Arguments ─────────────────────────────────────────────────────────────────

/// One resolved argument.
pub enum Arg {
    /// Placeholder for the request context; [`Args::context`] hands out the reference.
    Context,
    Body(Box<dyn Any + Send>),
    Query(Option<QueryValue>),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Self::Context => "request context",
            Self::Body(_) => "request body",
            Self::Query(_) => "query parameter",
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(v) => f.debug_tuple("Query").field(v).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Resolved arguments, consumed front to back in binding order.
///
/// Taking an argument of the wrong kind is a programming error in the
/// endpoint declaration; it surfaces as a [`HandlerError`] (500).
pub struct Args<'a> {
    ctx: &'a RequestContext,
    values: std::vec::IntoIter<Arg>,
    position: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("argument {position}: expected {expected}, found {found}")]
struct ArgumentMismatch {
    position: usize,
    expected: &'static str,
    found: &'static str,
}

impl<'a> Args<'a> {
    pub(crate) fn new(ctx: &'a RequestContext, values: Vec<Arg>) -> Self {
        Self { ctx, values: values.into_iter(), position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn next_arg(&mut self, expected: &'static str) -> Result<Arg, HandlerError> {
        let position = self.position;
        self.position += 1;
        self.values
            .next()
            .ok_or_else(|| ArgumentMismatch { position, expected, found: "nothing" }.into())
    }

    fn mismatch(&self, expected: &'static str, found: &Arg) -> HandlerError {
        ArgumentMismatch { position: self.position - 1, expected, found: found.kind() }.into()
    }

    /// Takes a [`Binding::Context`](crate::Binding::Context) argument.
    pub fn context(&mut self) -> Result<&'a RequestContext, HandlerError> {
        match self.next_arg("request context")? {
            Arg::Context => Ok(self.ctx),
            other => Err(self.mismatch("request context", &other)),
        }
    }

    /// Takes a [`Binding::body`](crate::Binding::body) argument decoded as `T`.
    pub fn body<T: 'static>(&mut self) -> Result<T, HandlerError> {
        match self.next_arg(type_name::<T>())? {
            Arg::Body(value) => value
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| self.mismatch(type_name::<T>(), &Arg::Body(Box::new(())))),
            other => Err(self.mismatch(type_name::<T>(), &other)),
        }
    }

    /// Takes a [`Binding::query`](crate::Binding::query) argument.
    pub fn query(&mut self) -> Result<Option<QueryValue>, HandlerError> {
        match self.next_arg("query parameter")? {
            Arg::Query(value) => Ok(value),
            other => Err(self.mismatch("query parameter", &other)),
        }
    }

    pub fn query_str(&mut self) -> Result<Option<String>, HandlerError> {
        self.typed_query("string", |v| match v {
            QueryValue::Str(s) => Ok(s),
            other => Err(other),
        })
    }

    pub fn query_int(&mut self) -> Result<Option<i64>, HandlerError> {
        self.typed_query("integer", |v| match v {
            QueryValue::Int(i) => Ok(i),
            other => Err(other),
        })
    }

    pub fn query_bool(&mut self) -> Result<Option<bool>, HandlerError> {
        self.typed_query("boolean", |v| match v {
            QueryValue::Bool(b) => Ok(b),
            other => Err(other),
        })
    }

    pub fn query_date(&mut self) -> Result<Option<chrono::NaiveDate>, HandlerError> {
        self.typed_query("date", |v| match v {
            QueryValue::Date(d) => Ok(d),
            other => Err(other),
        })
    }

    fn typed_query<T>(
        &mut self,
        expected: &'static str,
        pick: impl FnOnce(QueryValue) -> Result<T, QueryValue>,
    ) -> Result<Option<T>, HandlerError> {
        let position = self.position;
        match self.query()? {
            None => Ok(None),
            Some(value) => pick(value).map(Some).map_err(|other| {
                ArgumentMismatch { position, expected, found: other.shape().as_str() }.into()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer wrapper")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn innermost_cause_wins() {
        let err = HandlerError::from(Outer(std::io::Error::other("root cause")));
        assert_eq!(err.to_string(), "root cause");
    }

    #[test]
    fn message_errors_display_verbatim() {
        assert_eq!(HandlerError::msg("nope").to_string(), "nope");
    }

    #[test]
    fn args_are_consumed_in_order() {
        let ctx = RequestContext::get("/exams?x=1");
        let values = vec![
            Arg::Context,
            Arg::Body(Box::new(String::from("midterm"))),
            Arg::Query(Some(QueryValue::Int(7))),
        ];
        let mut args = Args::new(&ctx, values);
        assert_eq!(args.context().unwrap().path(), "/exams");
        assert_eq!(args.body::<String>().unwrap(), "midterm");
        assert_eq!(args.query_int().unwrap(), Some(7));
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn wrong_kind_is_a_handler_error() {
        let ctx = RequestContext::get("/");
        let mut args = Args::new(&ctx, vec![Arg::Query(Some(QueryValue::Bool(true)))]);
        let err = args.query_int().unwrap_err();
        assert_eq!(err.to_string(), "argument 0: expected integer, found boolean");

        let mut args = Args::new(&ctx, vec![Arg::Body(Box::new(1_u8))]);
        assert!(args.body::<String>().is_err());

        let mut args = Args::new(&ctx, Vec::new());
        assert_eq!(args.context().unwrap_err().to_string(), "argument 0: expected request context, found nothing");
    }
}
