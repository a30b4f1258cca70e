use core::time::Duration;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::{deliver, Dispatch, DispatchHandle, DispatchState, TimeListener, TimeSource};
use crate::{Error, TransactionRecord};

#[cfg(feature = "log")]
use crate::log::error;

const WORKER_NAME: &str = "msntp-worker";

/// Dispatcher that spawns a dedicated thread per request
///
/// The listener is called from the worker thread, not from the thread that called
/// [`Dispatch::dispatch`]. Anything the listener does that must happen on a specific
/// thread is up to the listener; prefer [`ScheduledDispatcher`](super::ScheduledDispatcher)
/// when the callback has to run on the caller's own thread.
#[derive(Debug, Clone)]
pub struct ThreadDispatcher {
    name: String,
}

impl ThreadDispatcher {
    /// Create a dispatcher naming its workers `msntp-worker`
    #[must_use]
    pub fn new() -> Self {
        ThreadDispatcher {
            name: WORKER_NAME.to_owned(),
        }
    }

    /// Use `name` for worker threads
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for ThreadDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener shared between the caller and the worker, taken by whoever delivers
struct ListenerSlot<L>(Arc<Mutex<Option<L>>>);

impl<L> ListenerSlot<L> {
    fn new(listener: L) -> Self {
        ListenerSlot(Arc::new(Mutex::new(Some(listener))))
    }

    fn share(&self) -> Self {
        ListenerSlot(Arc::clone(&self.0))
    }

    fn take(&self) -> Option<L> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Dispatch for ThreadDispatcher {
    fn dispatch<S, L>(
        &self,
        source: Arc<S>,
        host: &str,
        timeout: Duration,
        listener: L,
    ) -> DispatchHandle
    where
        S: TimeSource + ?Sized,
        L: TimeListener,
    {
        let handle = DispatchHandle::new();
        let slot = ListenerSlot::new(listener);
        let worker_slot = slot.share();
        let worker_state = handle.clone();
        let host = host.to_owned();

        let spawned = thread::Builder::new().name(self.name.clone()).spawn(move || {
            worker_state.set(DispatchState::Running);
            let record = panic::catch_unwind(AssertUnwindSafe(|| {
                source.request_time(&host, timeout)
            }))
            .unwrap_or_else(|_| {
                #[cfg(feature = "log")]
                error!("exchange with {} panicked", host);
                TransactionRecord::failed(0, Error::Aborted)
            });

            worker_state.set(if record.is_success() {
                DispatchState::Delivering
            } else {
                DispatchState::Failed
            });

            if let Some(listener) = worker_slot.take() {
                deliver(&record, &listener);
            }
        });

        if let Err(_err) = spawned {
            #[cfg(feature = "log")]
            error!("unable to spawn {} thread: {}", self.name, _err);
            handle.set(DispatchState::Failed);

            if let Some(listener) = slot.take() {
                deliver(&TransactionRecord::failed(0, Error::Aborted), &listener);
            }
        }

        handle
    }
}
