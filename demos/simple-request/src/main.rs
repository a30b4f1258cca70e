//! Demonstrates how to request the time from a NTP server without blocking the
//! calling thread
//!
//! The exchange runs on a worker thread spawned by [`ThreadDispatcher`]; the listener
//! is called from that worker and forwards the outcome to `main` over a channel.
use msntp::dispatch::{Dispatch, ThreadDispatcher, TimeListener};
use msntp::{DEFAULT_TIMEOUT, Error, NtpContext, SntpClient, StdClock, StdNetwork};

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};

const POOL_NTP_ADDR: &str = "pool.ntp.org";
const GOOGLE_NTP_ADDR: &str = "time.google.com";

struct PrintListener {
    host: &'static str,
    done: Sender<bool>,
}

impl TimeListener for PrintListener {
    fn on_time_received(&self, request_time: i64, ntp_time: i64, clock_offset: i64) {
        println!("Got time from [{}]: {ntp_time} ms", self.host);
        println!("Requested at {request_time} ms, offset {clock_offset} ms");
        let _ = self.done.send(true);
    }

    fn on_error(&self, request_time: i64, cause: Error) {
        println!("Err from [{}] at {request_time}: {cause}", self.host);
        let _ = self.done.send(false);
    }
}

fn main() {
    #[cfg(feature = "log")]
    if cfg!(debug_assertions) {
        simple_logger::init_with_level(log::Level::Trace).unwrap();
    } else {
        simple_logger::init_with_level(log::Level::Info).unwrap();
    }

    let client = Arc::new(SntpClient::new(StdNetwork, NtpContext::new(StdClock::new())));
    let dispatcher = ThreadDispatcher::new();

    for host in [POOL_NTP_ADDR, GOOGLE_NTP_ADDR] {
        let (done, finished) = mpsc::channel();
        let handle = dispatcher.dispatch(
            Arc::clone(&client),
            host,
            DEFAULT_TIMEOUT,
            PrintListener { host, done },
        );
        println!("Request to [{host}] dispatched: {:?}", handle.state());

        if finished.recv().unwrap_or(false) {
            break;
        }
    }
}
