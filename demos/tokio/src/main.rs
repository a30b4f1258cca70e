//! Demonstrates callback delivery on the thread that started the request
//!
//! The exchange runs on the Tokio blocking pool through [`ScheduledDispatcher`], and
//! the callback is posted back to a [`Looper`](msntp::dispatch::Looper) drained by
//! `main`.
//!
//! ```
//! cargo run -p demo-tokio -- -s pool.ntp.org -p 123 -t 2000
//! ```
use msntp::dispatch::{Dispatch, ScheduledDispatcher, TimeListener, looper};
use msntp::utils::{format_rfc3339, to_local};
use msntp::{Error, NtpContext, SntpClient, StdClock, StdNetwork};

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Handle;

const GOOGLE_NTP_ADDR: &str = "time.google.com";

#[derive(Parser)]
#[command(name = "tokio")]
#[command(version)]
struct Cli {
    /// NTP server hostname
    #[arg(short, long, default_value = GOOGLE_NTP_ADDR)]
    server: String,

    /// NTP server port
    #[arg(short, long, default_value = "123")]
    port: u16,

    /// Response timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,
}

struct PrintListener;

impl TimeListener for PrintListener {
    fn on_time_received(&self, request_time: i64, ntp_time: i64, clock_offset: i64) {
        println!("Callback on {:?}", thread::current().name());
        println!(
            "Requested at: {}",
            format_rfc3339(request_time).unwrap_or_default()
        );
        println!("NTP time:     {}", format_rfc3339(ntp_time).unwrap_or_default());
        if let Some(local) = to_local(ntp_time) {
            println!("Local time:   {local}");
        }
        println!("Offset:       {clock_offset} ms");
    }

    fn on_error(&self, request_time: i64, cause: Error) {
        println!("Callback on {:?}", thread::current().name());
        println!("ERROR: {cause} (request time {request_time})");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    #[cfg(feature = "log")]
    if cfg!(debug_assertions) {
        simple_logger::init_with_level(log::Level::Trace).unwrap();
    } else {
        simple_logger::init_with_level(log::Level::Info).unwrap();
    }

    let client = SntpClient::new(StdNetwork, NtpContext::new(StdClock::new())).with_port(cli.port);
    let (context, mut looper) = looper();
    let dispatcher = ScheduledDispatcher::new(Handle::current(), context);

    let handle = dispatcher.dispatch(
        Arc::new(client),
        &cli.server,
        Duration::from_millis(cli.timeout),
        PrintListener,
    );
    println!("Request dispatched from {:?}: {:?}", thread::current().name(), handle.state());

    looper.run_once().await;
}
