//! The ordered interceptor chain.

use std::sync::Arc;

use tracing::debug;

use crate::context::RequestContext;
use crate::failure::DispatchError;
use crate::middleware::Interceptor;

struct Entry {
    order: i32,
    interceptor: Arc<dyn Interceptor>,
}

/// Interceptors sorted ascending by `order`, ties kept in registration order.
///
/// The order is fixed when the chain is assembled; dispatch only walks it.
#[derive(Default)]
pub struct InterceptorChain {
    entries: Vec<Entry>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after every entry with an order less than or equal to `order`.
    pub fn add(&mut self, order: i32, interceptor: impl Interceptor) {
        let at = self.entries.partition_point(|e| e.order <= order);
        self.entries.insert(at, Entry { order, interceptor: Arc::new(interceptor) });
    }

    pub fn with(mut self, order: i32, interceptor: impl Interceptor) -> Self {
        self.add(order, interceptor);
        self
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Orders in execution sequence.
    pub fn orders(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.order).collect()
    }

    /// Runs every pre-hook in order, stopping at the first failure.
    pub fn run_pre(&self, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        for entry in &self.entries {
            if let Err(e) = entry.interceptor.pre_handle(ctx) {
                debug!(interceptor = entry.interceptor.name(), order = entry.order, "pre-hook rejected request");
                return Err(DispatchError::Interceptor(e));
            }
        }
        Ok(())
    }

    /// Runs every post-hook in the same ascending order, stopping at the first failure.
    pub fn run_post(&self, ctx: &mut RequestContext, result: &serde_json::Value) -> Result<(), DispatchError> {
        for entry in &self.entries {
            if let Err(e) = entry.interceptor.post_handle(ctx, result) {
                debug!(interceptor = entry.interceptor.name(), order = entry.order, "post-hook failed");
                return Err(DispatchError::Interceptor(e));
            }
        }
        Ok(())
    }
}
