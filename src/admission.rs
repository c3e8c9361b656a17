//! Bounded admission.
//!
//! Two semaphores: one caps requests being dispatched, the other caps
//! requests dispatched *or waiting*. When the second is exhausted a new
//! request is turned away with `503` instead of queueing without limit.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::failure::DispatchError;

pub(crate) struct Admission {
    slots: Arc<Semaphore>,
    workers: Arc<Semaphore>,
}

/// Held for the lifetime of one dispatch.
pub(crate) struct Permit {
    _slot: OwnedSemaphorePermit,
    _worker: OwnedSemaphorePermit,
}

impl Admission {
    pub(crate) fn new(max_in_flight: usize, max_queued: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max_in_flight + max_queued)),
            workers: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    pub(crate) async fn admit(&self) -> Result<Permit, DispatchError> {
        let slot = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|_| DispatchError::Overloaded)?;
        let worker = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::Overloaded)?;
        Ok(Permit { _slot: slot, _worker: worker })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn rejects_once_workers_and_queue_are_full() {
        let admission = Arc::new(Admission::new(1, 1));
        let running = admission.admit().await.unwrap();

        // Takes the only queue slot and waits for the worker.
        let waiting = {
            let admission = Arc::clone(&admission);
            tokio::spawn(async move { admission.admit().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(admission.admit().await, Err(DispatchError::Overloaded)));

        drop(running);
        waiting.await.unwrap().unwrap();
        assert!(admission.admit().await.is_ok());
    }
}
