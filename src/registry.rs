//! Route table construction.
//!
//! Runs once at startup. Each endpoint's full path is the verbatim
//! concatenation of its group's base path and its own sub-path, and a full
//! path can be claimed by exactly one endpoint, whatever its method.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::info;

use crate::binding::Binding;
use crate::endpoint::GroupDescriptor;
use crate::error::Error;
use crate::handler::Invoke;
use crate::method::Method;

/// Everything needed to serve one path.
pub struct RouteDefinition {
    full_path: String,
    method: Method,
    success_status: StatusCode,
    bindings: Vec<Binding>,
    pub(crate) invoke: Invoke,
}

impl RouteDefinition {
    pub fn full_path(&self) -> &str { &self.full_path }
    pub fn method(&self) -> Method { self.method }
    pub fn success_status(&self) -> StatusCode { self.success_status }
    pub fn bindings(&self) -> &[Binding] { &self.bindings }

    /// True when some argument can see the request body, either decoded or
    /// through the raw context. Other routes never read it.
    pub fn reads_body(&self) -> bool {
        self.bindings.iter().any(|b| matches!(b, Binding::Body(_) | Binding::Context))
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("full_path", &self.full_path)
            .field("method", &self.method)
            .field("success_status", &self.success_status)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

/// Read-only map from full path to route. Accessed by exact key only.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<RouteDefinition>>,
}

impl RouteTable {
    pub fn get(&self, full_path: &str) -> Option<&Arc<RouteDefinition>> {
        self.routes.get(full_path)
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    /// Routes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDefinition>> {
        self.routes.values()
    }
}

/// Collects handler groups and builds the [`RouteTable`].
#[derive(Default)]
pub struct Registry {
    groups: Vec<GroupDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<GroupDescriptor>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn build(self) -> Result<RouteTable, Error> {
        build(self.groups)
    }
}

/// Builds the route table, failing on the first full path claimed twice.
pub fn build(descriptors: impl IntoIterator<Item = GroupDescriptor>) -> Result<RouteTable, Error> {
    let mut routes = HashMap::new();
    for descriptor in descriptors {
        let (base_path, endpoints) = descriptor.into_parts();
        for endpoint in endpoints {
            let full_path = format!("{base_path}{}", endpoint.sub_path);
            let slot = match routes.entry(full_path) {
                Entry::Occupied(taken) => return Err(Error::DuplicateRoute(taken.key().clone())),
                Entry::Vacant(slot) => slot,
            };
            info!(
                method = %endpoint.method,
                path = slot.key().as_str(),
                status = endpoint.status.as_u16(),
                "route registered"
            );
            let route = RouteDefinition {
                full_path: slot.key().clone(),
                method: endpoint.method,
                success_status: endpoint.status,
                bindings: endpoint.bindings,
                invoke: endpoint.invoke,
            };
            slot.insert(Arc::new(route));
        }
    }
    Ok(RouteTable { routes })
}
