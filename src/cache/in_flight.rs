use tokio::sync::{Notify, OnceCell};

use crate::error::ResolveError;
use crate::models::StreamDescriptor;

pub(super) type FlightResult = Result<StreamDescriptor, ResolveError>;

/// Single-flight slot for one content ID.
///
/// The leader publishes exactly one result; every waiter gets a clone of it.
#[derive(Debug)]
pub(super) struct InFlight {
    result: OnceCell<FlightResult>,
    notify: Notify,
}

impl InFlight {
    pub(super) fn new() -> Self {
        Self {
            result: OnceCell::new(),
            notify: Notify::new(),
        }
    }

    /// Publish the outcome. Later calls are ignored.
    pub(super) fn complete(&self, result: FlightResult) {
        let _ = self.result.set(result);
        self.notify.notify_waiters();
    }

    pub(super) async fn wait(&self) -> FlightResult {
        loop {
            if let Some(result) = self.result.get() {
                return result.clone();
            }

            // Register before re-checking so a completion in between is not missed.
            let notified = self.notify.notified();
            if let Some(result) = self.result.get() {
                return result.clone();
            }

            notified.await;
        }
    }
}
