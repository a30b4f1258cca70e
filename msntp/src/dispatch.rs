//! Running exchanges off the calling thread
//!
//! [`SntpClient::request_time`](crate::SntpClient::request_time) blocks for up to the
//! receive deadline, which is unacceptable on a UI or event loop thread. The
//! dispatchers in this module run the exchange elsewhere and report back through a
//! [`TimeListener`]:
//!
//! - [`ThreadDispatcher`] spawns a worker thread per request and calls the listener
//!   from that worker thread
//! - [`ScheduledDispatcher`] (feature `tokio`) runs the exchange on a Tokio blocking
//!   pool and posts the callback to a [`CallerContext`], typically the
//!   [`Looper`] drained by the thread that started the request
//!
//! Whatever happens to the exchange, every dispatch ends with exactly one call to
//! either [`TimeListener::on_time_received`] or [`TimeListener::on_error`], as long
//! as the callback has somewhere to run. The one exception is a [`CallerContext`]
//! that no longer accepts tasks, e.g. a dropped [`Looper`]: the listener is then
//! dropped without being called. There is no cancellation: a pending request always
//! runs until the response arrives or the receive deadline passes.
use core::fmt::{self, Debug, Formatter};
use core::time::Duration;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::{Error, NtpClock, NtpNetwork, SntpClient, TransactionRecord};

#[cfg(feature = "log")]
use crate::log::debug;

#[cfg(feature = "tokio")]
mod looper;
#[cfg(feature = "tokio")]
mod scheduled;
mod thread;

#[cfg(feature = "tokio")]
pub use looper::{looper, CallerContext, Looper, LooperHandle, Task};
#[cfg(feature = "tokio")]
pub use scheduled::ScheduledDispatcher;
pub use thread::ThreadDispatcher;

/// Receiver of the outcome of a dispatched request
///
/// All times are milliseconds; `request_time` and `ntp_time` count from UNIX epoch.
pub trait TimeListener: Send + 'static {
    /// Called once the server answered
    ///
    /// * `request_time` - local wall clock time the request was sent
    /// * `ntp_time` - network corrected time at the moment the response arrived
    /// * `clock_offset` - server clock minus local clock
    fn on_time_received(&self, request_time: i64, ntp_time: i64, clock_offset: i64);

    /// Called when the request failed. `request_time` is `0` if the failure
    /// happened before anything was sent
    fn on_error(&self, request_time: i64, cause: Error);
}

impl<L: TimeListener + Sync> TimeListener for Arc<L> {
    fn on_time_received(&self, request_time: i64, ntp_time: i64, clock_offset: i64) {
        L::on_time_received(self, request_time, ntp_time, clock_offset);
    }

    fn on_error(&self, request_time: i64, cause: Error) {
        L::on_error(self, request_time, cause);
    }
}

/// Something able to perform a blocking exchange
pub trait TimeSource: Send + Sync + 'static {
    /// Perform one exchange with `host`, see [`SntpClient::request_time`]
    fn request_time(&self, host: &str, timeout: Duration) -> TransactionRecord;
}

impl<N, C> TimeSource for SntpClient<N, C>
where
    N: NtpNetwork + Send + Sync + 'static,
    C: NtpClock + Send + Sync + 'static,
{
    fn request_time(&self, host: &str, timeout: Duration) -> TransactionRecord {
        SntpClient::request_time(self, host, timeout)
    }
}

/// Strategy for running a [`TimeSource`] away from the calling thread
pub trait Dispatch {
    /// Start one exchange with `host` and report its outcome to `listener`
    ///
    /// Returns immediately. The listener is consumed: it receives exactly one
    /// callback and is dropped afterwards.
    ///
    /// If the callback is handed to a [`CallerContext`] that refuses it, because
    /// the [`Looper`] behind it was dropped, the listener receives no callback at
    /// all and is dropped unrun.
    fn dispatch<S, L>(
        &self,
        source: Arc<S>,
        host: &str,
        timeout: Duration,
        listener: L,
    ) -> DispatchHandle
    where
        S: TimeSource + ?Sized,
        L: TimeListener;
}

/// Progress of a single dispatched request
///
/// [`ThreadDispatcher`] goes `Idle → Running → Delivering | Failed`,
/// [`ScheduledDispatcher`] goes `Idle → Scheduled → Running → Completing`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatchState {
    /// Created, nothing started yet
    Idle = 0,
    /// Waiting for a pool thread
    Scheduled = 1,
    /// Exchange in progress
    Running = 2,
    /// Exchange succeeded, success callback is being delivered
    Delivering = 3,
    /// Exchange failed, error callback is being delivered
    Failed = 4,
    /// Exchange finished, callback handed to the caller context
    Completing = 5,
}

impl DispatchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DispatchState::Scheduled,
            2 => DispatchState::Running,
            3 => DispatchState::Delivering,
            4 => DispatchState::Failed,
            5 => DispatchState::Completing,
            _ => DispatchState::Idle,
        }
    }

    /// Returns `true` once the exchange is over and only the callback remains
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            DispatchState::Delivering | DispatchState::Failed | DispatchState::Completing
        )
    }
}

/// Observer of a dispatched request
#[derive(Clone, Default)]
pub struct DispatchHandle {
    state: Arc<AtomicU8>,
}

impl DispatchHandle {
    pub(crate) fn new() -> Self {
        DispatchHandle::default()
    }

    /// Returns the current state of the request
    #[must_use]
    pub fn state(&self) -> DispatchState {
        DispatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: DispatchState) {
        #[cfg(feature = "log")]
        debug!("dispatch {:?} -> {:?}", self.state(), state);
        self.state.store(state as u8, Ordering::Release);
    }
}

impl Debug for DispatchHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Invoke the one callback matching the outcome of `record`
pub(crate) fn deliver<L: TimeListener + ?Sized>(record: &TransactionRecord, listener: &L) {
    match record.cause() {
        None => listener.on_time_received(
            record.request_time,
            record.ntp_time,
            record.clock_offset,
        ),
        Some(cause) => listener.on_error(record.request_time, cause),
    }
}
