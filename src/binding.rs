//! Parameter bindings and the argument resolver.
//!
//! A [`Binding`] says where one handler argument comes from. Bindings are
//! declared on the endpoint in the order the handler takes its arguments and
//! resolved strictly left to right; the first failure aborts resolution
//! before the handler runs.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::RequestContext;
use crate::failure::DispatchError;
use crate::handler::Arg;

/// Textual form of [`QueryShape::Date`] values, e.g. `2024-01-31`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Bindings ──────────────────────────────────────────────────────────────────

/// How one handler argument is populated.
#[derive(Clone, Debug)]
pub enum Binding {
    /// The [`RequestContext`] itself.
    Context,
    /// The request body decoded as JSON.
    Body(BodyShape),
    /// A single query-string parameter.
    Query(QueryParam),
}

impl Binding {
    pub fn context() -> Self {
        Self::Context
    }

    /// Decode the body as `T`. Unknown JSON fields are ignored; fields
    /// missing from the body fall back to `T`'s serde defaults.
    pub fn body<T>() -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::Body(BodyShape { type_name: type_name::<T>(), decode: decode_as::<T> })
    }

    /// An optional query parameter with no default. Chain
    /// [`QueryParam::required`] or [`QueryParam::default_value`] to tighten it.
    pub fn query(name: impl Into<String>, shape: QueryShape) -> QueryParam {
        QueryParam { name: name.into(), shape, required: false, default: None }
    }
}

impl From<QueryParam> for Binding {
    fn from(param: QueryParam) -> Self {
        Self::Query(param)
    }
}

type DecodeFn = fn(&[u8]) -> serde_json::Result<Box<dyn Any + Send>>;

/// The target type of a [`Binding::Body`], captured as its decoder.
#[derive(Clone, Copy)]
pub struct BodyShape {
    type_name: &'static str,
    decode: DecodeFn,
}

impl BodyShape {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BodyShape").field(&self.type_name).finish()
    }
}

fn decode_as<T>(bytes: &[u8]) -> serde_json::Result<Box<dyn Any + Send>>
where
    T: DeserializeOwned + Send + 'static,
{
    serde_json::from_slice::<T>(bytes).map(|v| Box::new(v) as Box<dyn Any + Send>)
}

/// A query-string parameter binding.
#[derive(Clone, Debug)]
pub struct QueryParam {
    name: String,
    shape: QueryShape,
    required: bool,
    default: Option<String>,
}

impl QueryParam {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Used when the parameter is absent or empty. Coerced like a real value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn shape(&self) -> QueryShape { self.shape }
    pub fn is_required(&self) -> bool { self.required }

    fn resolve(&self, query: &HashMap<&str, &str>) -> Result<Option<QueryValue>, DispatchError> {
        let raw = match query.get(self.name.as_str()).copied().filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => match (&self.default, self.required) {
                (Some(default), _) => default.as_str(),
                (None, true) => return Err(DispatchError::MissingRequiredParameter(self.name.clone())),
                (None, false) => return Ok(None),
            },
        };
        self.shape.coerce(raw).map(Some).ok_or_else(|| DispatchError::ParameterCoercion {
            name: self.name.clone(),
            value: raw.to_owned(),
            shape: self.shape,
        })
    }
}

// ── Query values ──────────────────────────────────────────────────────────────

/// The type a query parameter is converted to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryShape {
    Str,
    /// Decimal `i64`, optional leading sign.
    Int,
    /// Exactly `true` or `false`.
    Bool,
    /// Calendar date in [`DATE_FORMAT`].
    Date,
}

impl QueryShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str  => "string",
            Self::Int  => "integer",
            Self::Bool => "boolean",
            Self::Date => "date",
        }
    }

    pub fn coerce(self, raw: &str) -> Option<QueryValue> {
        match self {
            Self::Str  => Some(QueryValue::Str(raw.to_owned())),
            Self::Int  => raw.parse().ok().map(QueryValue::Int),
            Self::Bool => match raw {
                "true"  => Some(QueryValue::Bool(true)),
                "false" => Some(QueryValue::Bool(false)),
                _       => None,
            },
            Self::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT).ok().map(QueryValue::Date),
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => f.write_str("date (YYYY-MM-DD)"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A coerced query parameter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
}

impl QueryValue {
    pub fn shape(&self) -> QueryShape {
        match self {
            Self::Str(_)  => QueryShape::Str,
            Self::Int(_)  => QueryShape::Int,
            Self::Bool(_) => QueryShape::Bool,
            Self::Date(_) => QueryShape::Date,
        }
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Splits a raw query string into a flat map.
///
/// Pairs are separated by `&` and split on the first `=`; a pair without `=`
/// maps its key to `""`. The first occurrence of a key wins. Values are taken
/// verbatim, without percent-decoding.
pub fn parse_query(raw: &str) -> HashMap<&str, &str> {
    let mut map = HashMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.entry(key).or_insert(value);
    }
    map
}

/// Produces the handler's arguments, one per binding, in binding order.
pub fn resolve(bindings: &[Binding], ctx: &RequestContext) -> Result<Vec<Arg>, DispatchError> {
    let mut query = None;
    let mut args = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let arg = match binding {
            Binding::Context => Arg::Context,
            Binding::Body(shape) => {
                let value = (shape.decode)(ctx.body()).map_err(|source| DispatchError::BodyDecode {
                    shape: shape.type_name,
                    source,
                })?;
                Arg::Body(value)
            }
            Binding::Query(param) => {
                let query = query.get_or_insert_with(|| parse_query(ctx.query()));
                Arg::Query(param.resolve(query)?)
            }
        };
        args.push(arg);
    }
    Ok(args)
}
