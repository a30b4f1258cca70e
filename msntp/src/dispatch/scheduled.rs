use core::time::Duration;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task;

use super::{
    deliver, CallerContext, Dispatch, DispatchHandle, DispatchState, TimeListener, TimeSource,
};
use crate::{Error, TransactionRecord};

#[cfg(feature = "log")]
use crate::log::{error, warn};

/// Dispatcher running exchanges on a Tokio blocking pool
///
/// The exchange runs on `pool` via [`task::spawn_blocking`]; its outcome is posted
/// to `context`, so the listener runs wherever the context runs its tasks. With a
/// [`LooperHandle`](super::LooperHandle) that is the thread draining the matching
/// [`Looper`](super::Looper).
///
/// If the runtime shuts down before the exchange completes, the listener still
/// receives [`Error::Aborted`] through the context.
#[derive(Debug, Clone)]
pub struct ScheduledDispatcher<X: CallerContext> {
    pool: Handle,
    context: X,
}

impl<X: CallerContext> ScheduledDispatcher<X> {
    /// Run exchanges on `pool` and post callbacks to `context`
    pub fn new(pool: Handle, context: X) -> Self {
        ScheduledDispatcher { pool, context }
    }

    /// Returns the context callbacks are posted to
    pub fn context(&self) -> &X {
        &self.context
    }
}

/// Owner of the listener until the outcome is posted
///
/// Dropping it unposted, e.g. with the task during runtime shutdown, posts
/// [`Error::Aborted`] instead.
struct Completion<L: TimeListener, X: CallerContext> {
    listener: Option<L>,
    context: X,
    state: DispatchHandle,
}

impl<L: TimeListener, X: CallerContext> Completion<L, X> {
    fn complete(mut self, record: TransactionRecord) {
        self.post(record);
    }

    fn post(&mut self, record: TransactionRecord) {
        let Some(listener) = self.listener.take() else {
            return;
        };

        self.state.set(DispatchState::Completing);
        let posted = self
            .context
            .post(Box::new(move || deliver(&record, &listener)));

        if !posted {
            #[cfg(feature = "log")]
            error!("caller context is gone, dropping {:?}", record.outcome);
        }
    }
}

impl<L: TimeListener, X: CallerContext> Drop for Completion<L, X> {
    fn drop(&mut self) {
        if self.listener.is_some() {
            #[cfg(feature = "log")]
            warn!("exchange dropped before completing");
            self.post(TransactionRecord::failed(0, Error::Aborted));
        }
    }
}

impl<X: CallerContext> Dispatch for ScheduledDispatcher<X> {
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
        let completion = Completion {
            listener: Some(listener),
            context: self.context.clone(),
            state: handle.clone(),
        };
        let worker_state = handle.clone();
        let host = host.to_owned();

        handle.set(DispatchState::Scheduled);
        self.pool.spawn(async move {
            let exchange = task::spawn_blocking(move || {
                worker_state.set(DispatchState::Running);
                source.request_time(&host, timeout)
            });
            let record = exchange.await.unwrap_or_else(|_err| {
                #[cfg(feature = "log")]
                error!("exchange did not finish: {}", _err);
                TransactionRecord::failed(0, Error::Aborted)
            });

            completion.complete(record);
        });

        handle
    }
}
