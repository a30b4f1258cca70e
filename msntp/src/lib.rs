//! Minimal SNTP client
//!
//! # Overview
//!
//! This crate sends a single client request to an NTP server, processes the
//! response and reports the estimated clock offset, the round trip time and the
//! resulting network time. Requests are SNTP client mode, version 3, as described in
//! [RFC 4330](https://datatracker.ietf.org/doc/html/rfc4330).
//!
//! # Usage
//!
//! Put this in your `Cargo.toml`:
//! ```cargo
//! [dependencies]
//! msntp = "0.1"
//! ```
//!
//! ## Features
//!
//! `msntp` supports several features:
//! - `std-socket`: add [`NtpUdpSocket`] implementation for `std::net::UdpSocket` and
//!   the [`StdNetwork`] resolver/socket factory
//! - `tokio`: enables [`dispatch::ScheduledDispatcher`] which runs exchanges on a Tokio
//!   blocking pool and hands results back to the caller's own thread
//! - `log`: enables library debug output during execution
//! - `utils`: `chrono` based helpers to present the resulting time
//!
//! # Details
//!
//! The crate is split into three layers:
//! - [`codec`] encodes requests and decodes the timestamps of responses. Pure
//!   functions, no I/O
//! - [`SntpClient::request_time`] performs one blocking exchange and returns a
//!   [`TransactionRecord`] describing either the computed timing or the failure cause
//! - [`dispatch`] runs the blocking exchange away from the calling thread and
//!   delivers exactly one callback of a [`dispatch::TimeListener`] per request
//!
//! Network access and clocks are abstracted through the [`NtpNetwork`],
//! [`NtpUdpSocket`] and [`NtpClock`] traits, so the exchange can run against
//! anything that can send and receive datagrams.
//!
//! ## Logging support
//!
//! Library debug logs can be enabled in executables by enabling `log` feature. Server
//! addresses, response payload will be printed.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "std-socket")]
//! # fn main() {
//! use msntp::{NtpContext, SntpClient, StdClock, StdNetwork, DEFAULT_TIMEOUT};
//!
//! let client = SntpClient::new(StdNetwork, NtpContext::new(StdClock::new()));
//! let record = client.request_time("time.google.com", DEFAULT_TIMEOUT);
//!
//! match record.cause() {
//!     None => println!(
//!         "Offset: {} ms, round trip: {} ms",
//!         record.clock_offset, record.round_trip_time
//!     ),
//!     Some(err) => eprintln!("Error: {err}"),
//! }
//! # }
//! # #[cfg(not(feature = "std-socket"))]
//! # fn main() {}
//! ```
//!
//! For callback based usage from an application thread, see the
//! [`dispatch`] module and the `demos` directory.
#![deny(unsafe_code)]

pub mod codec;
pub mod dispatch;
#[cfg(feature = "utils")]
pub mod utils;

mod log;
#[cfg(test)]
mod mock;
mod socket;
mod types;

#[cfg(feature = "std-socket")]
pub use crate::socket::*;
pub use crate::types::*;

use core::time::Duration;

use crate::codec::RawNtpPacket;
#[cfg(feature = "log")]
use crate::log::debug;

/// Network types used by the `msntp` crate
pub mod net {
    pub use core::net::SocketAddr;

    pub use std::net::UdpSocket;
}

/// SNTP client performing one blocking exchange per [`SntpClient::request_time`] call
///
/// The client holds no per-request state: every call resolves the server, opens
/// its own socket and returns its own [`TransactionRecord`], so a single client may
/// be shared between threads.
#[derive(Debug, Clone)]
pub struct SntpClient<N: NtpNetwork, C: NtpClock> {
    network: N,
    context: NtpContext<C>,
    port: u16,
}

impl<N: NtpNetwork, C: NtpClock> SntpClient<N, C> {
    /// Create a client that talks to servers on the standard NTP port
    pub fn new(network: N, context: NtpContext<C>) -> Self {
        SntpClient {
            network,
            context,
            port: NTP_PORT,
        }
    }

    /// Use `port` instead of the standard NTP port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the server port requests are sent to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Sends an SNTP request to the given host and processes the response.
    ///
    /// Blocks for at most about `timeout` waiting for the response. Every failure
    /// (name resolution, socket errors, timeout, malformed response) is reported
    /// through the returned record rather than as an `Err`, and the socket is
    /// closed before returning whichever step failed.
    ///
    /// # Arguments
    ///
    /// * `host` - server host name or address literal
    /// * `timeout` - receive deadline for the response
    pub fn request_time(&self, host: &str, timeout: Duration) -> TransactionRecord {
        let mut record = TransactionRecord::default();

        match self.exchange(host, timeout, &mut record) {
            Ok(()) => record.outcome = Outcome::Success,
            Err(err) => {
                #[cfg(feature = "log")]
                debug!("request to {} failed: {:?}", host, err);
                record.outcome = Outcome::Failure(err);
            }
        }

        record
    }

    fn exchange(
        &self,
        host: &str,
        timeout: Duration,
        record: &mut TransactionRecord,
    ) -> Result<()> {
        let dest = self.network.resolve(host, self.port)?;
        #[cfg(feature = "log")]
        debug!("send request - Address: {:?}", dest);
        let socket = self.network.open(dest, timeout)?;
        let clock = &self.context.clock;

        record.request_time = clock.wall_millis();
        record.request_tick = clock.tick_millis();
        let request = codec::encode_request(record.request_time);
        send_request(dest, &request, &socket)?;

        let mut response = RawNtpPacket::default();
        let (size, src) = socket.recv_from(&mut response.0)?;
        record.response_tick = clock.tick_millis();
        #[cfg(feature = "log")]
        debug!("Response: {} bytes from {}", size, src);

        if src != dest {
            return Err(Error::ResponseAddressMismatch);
        }

        let timestamps = codec::decode_response(&response.0[..size])?;
        #[cfg(feature = "log")]
        debug_ntp_packet(&response, &timestamps, record);

        *record = process_response(*record, timestamps);

        #[cfg(feature = "log")]
        debug!(
            "Roundtrip delay: {} ms. Offset: {} ms",
            record.round_trip_time, record.clock_offset
        );

        Ok(())
    }
}

fn send_request<U: NtpUdpSocket>(
    dest: net::SocketAddr,
    request: &RawNtpPacket,
    socket: &U,
) -> Result<()> {
    let size = socket.send_to(&request.0, dest)?;

    if size == request.0.len() {
        Ok(())
    } else {
        Err(Error::Network(std::io::ErrorKind::WriteZero))
    }
}

/// Complete a record whose request was answered with the given server timestamps
///
/// `request_time`, `request_tick` and `response_tick` must already be set. The time
/// the response arrived is reconstructed as `request_time` plus the monotonic time
/// elapsed since, so a wall clock step during the exchange does not affect it.
///
/// Clock offset and round trip follow the usual symmetric delay model:
///
/// ```text
/// receive  = originate + transit + skew
/// response = transmit  + transit - skew
/// offset   = ((receive - originate) + (transmit - response)) / 2 = skew
/// rtt      = (response - request) - (transmit - receive)
/// ```
///
/// The offset is halved with integer division, rounding toward zero.
#[must_use]
pub fn process_response(
    mut record: TransactionRecord,
    server: ResponseTimestamps,
) -> TransactionRecord {
    let elapsed = record.response_tick.saturating_sub(record.request_tick);
    let response_time = record.request_time.saturating_add(elapsed);
    let server_processing = server.transmit.saturating_sub(server.receive);

    record.round_trip_time = elapsed.saturating_sub(server_processing);
    record.clock_offset = server
        .receive
        .saturating_sub(server.originate)
        .saturating_add(server.transmit.saturating_sub(response_time))
        / 2;
    record.ntp_time = response_time.saturating_add(record.clock_offset);
    record.outcome = Outcome::Success;

    record
}

#[cfg(feature = "log")]
fn debug_ntp_packet(
    packet: &RawNtpPacket,
    timestamps: &ResponseTimestamps,
    record: &TransactionRecord,
) {
    let delimiter = "=".repeat(64);

    debug!("{}", delimiter);
    debug!("| Mode:\t\t{}", packet.mode());
    debug!("| Version:\t{}", packet.version());
    debug!("| Stratum:\t{}", packet.0[1]);
    debug!("| Request time        (client):\t{:>16}", record.request_time);
    debug!("| Origin timestamp    (client):\t{:>16}", timestamps.originate);
    debug!("| Receive timestamp   (server):\t{:>16}", timestamps.receive);
    debug!("| Transmit timestamp  (server):\t{:>16}", timestamps.transmit);
    debug!(
        "| Elapsed ticks       (client):\t{:>16}",
        record.response_tick - record.request_tick
    );
    debug!("{}", delimiter);
}
