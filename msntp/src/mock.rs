//! Test doubles for the network, the clock and the whole exchange
use crate::codec::{read_u32_be, write_u32_be};
use crate::dispatch::{TimeListener, TimeSource};
use crate::net::SocketAddr;
use crate::{
    Error, NtpClock, NtpNetwork, NtpUdpSocket, Result, TransactionRecord,
    FRACTION_SCALE, NTP_PACKET_SIZE, NTP_TIMESTAMP_DELTA, ORIGINATE_TIME_OFFSET,
    RECEIVE_TIME_OFFSET, TRANSMIT_TIME_OFFSET,
};

use core::net::{IpAddr, Ipv4Addr};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Write `time_ms` so that it decodes back to exactly `time_ms`
///
/// The fraction is rounded up instead of down, which keeps the decoder's
/// truncation from losing a millisecond.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn write_exact(buf: &mut [u8], offset: usize, time_ms: i64) {
    let seconds = (time_ms.div_euclid(1_000) + i64::from(NTP_TIMESTAMP_DELTA)) as u32;
    let millis = time_ms.rem_euclid(1_000) as u64;
    let fraction = (millis * FRACTION_SCALE).div_ceil(1_000) as u32;

    write_u32_be(buf, offset, seconds);
    write_u32_be(buf, offset + 4, fraction);
}

/// Server response with the given originate, receive and transmit times
pub(crate) fn response_packet(
    originate: i64,
    receive: i64,
    transmit: i64,
) -> [u8; NTP_PACKET_SIZE] {
    let mut buf = [0u8; NTP_PACKET_SIZE];
    buf[0] = 0x1c;
    buf[1] = 1;
    write_exact(&mut buf, ORIGINATE_TIME_OFFSET, originate);
    write_exact(&mut buf, RECEIVE_TIME_OFFSET, receive);
    write_exact(&mut buf, TRANSMIT_TIME_OFFSET, transmit);
    buf
}

/// Clock with a fixed wall time and scripted monotonic readings
///
/// The last tick repeats once the script is exhausted.
#[derive(Debug)]
pub(crate) struct StepClock {
    wall: i64,
    ticks: Mutex<VecDeque<i64>>,
}

impl StepClock {
    pub(crate) fn new(wall: i64, ticks: &[i64]) -> Self {
        StepClock {
            wall,
            ticks: Mutex::new(ticks.iter().copied().collect()),
        }
    }
}

impl NtpClock for StepClock {
    fn wall_millis(&self) -> i64 {
        self.wall
    }

    fn tick_millis(&self) -> i64 {
        let mut ticks = self.ticks.lock().expect("clock lock");
        if ticks.len() > 1 {
            ticks.pop_front().unwrap_or_default()
        } else {
            ticks.front().copied().unwrap_or_default()
        }
    }
}

/// What the fake socket does when asked for a datagram
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Bytes(Vec<u8>),
    /// Copy the request transmit timestamp into originate, like a real server
    Echo { receive: i64, transmit: i64 },
    Timeout,
    Io(ErrorKind),
}

impl Reply {
    pub(crate) fn packet(packet: [u8; NTP_PACKET_SIZE]) -> Self {
        Reply::Bytes(packet.to_vec())
    }
}

#[derive(Debug, Default)]
struct Journal {
    resolved: Mutex<Vec<(String, u16)>>,
    timeouts: Mutex<Vec<Duration>>,
    sent: Mutex<Vec<Vec<u8>>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Scriptable [`NtpNetwork`] that records what the engine does with it
#[derive(Debug, Clone)]
pub(crate) struct FakeNetwork {
    reply: Reply,
    resolvable: bool,
    open_error: Option<ErrorKind>,
    send_error: Option<ErrorKind>,
    short_send: bool,
    foreign_source: bool,
    journal: Arc<Journal>,
}

pub(crate) const SERVER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 123);

impl FakeNetwork {
    pub(crate) fn new(reply: Reply) -> Self {
        FakeNetwork {
            reply,
            resolvable: true,
            open_error: None,
            send_error: None,
            short_send: false,
            foreign_source: false,
            journal: Arc::default(),
        }
    }

    pub(crate) fn unresolvable() -> Self {
        FakeNetwork {
            resolvable: false,
            ..FakeNetwork::new(Reply::Timeout)
        }
    }

    pub(crate) fn unopenable(kind: ErrorKind) -> Self {
        FakeNetwork {
            open_error: Some(kind),
            ..FakeNetwork::new(Reply::Timeout)
        }
    }

    pub(crate) fn with_send_error(mut self, kind: ErrorKind) -> Self {
        self.send_error = Some(kind);
        self
    }

    pub(crate) fn with_short_send(mut self) -> Self {
        self.short_send = true;
        self
    }

    pub(crate) fn with_foreign_source(mut self) -> Self {
        self.foreign_source = true;
        self
    }

    pub(crate) fn opened(&self) -> usize {
        self.journal.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.journal.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.journal.sent.lock().expect("journal lock").clone()
    }

    pub(crate) fn resolved(&self) -> Vec<(String, u16)> {
        self.journal.resolved.lock().expect("journal lock").clone()
    }

    pub(crate) fn timeouts(&self) -> Vec<Duration> {
        self.journal.timeouts.lock().expect("journal lock").clone()
    }
}

impl NtpNetwork for FakeNetwork {
    type Socket = FakeSocket;

    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr> {
        self.journal
            .resolved
            .lock()
            .expect("journal lock")
            .push((host.to_owned(), port));

        if self.resolvable {
            Ok(SocketAddr::new(SERVER.ip(), port))
        } else {
            Err(Error::AddressResolve)
        }
    }

    fn open(&self, dest: SocketAddr, timeout: Duration) -> Result<FakeSocket> {
        self.journal.timeouts.lock().expect("journal lock").push(timeout);

        if let Some(kind) = self.open_error {
            return Err(Error::Network(kind));
        }

        self.journal.opened.fetch_add(1, Ordering::SeqCst);
        let source = if self.foreign_source {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)), dest.port())
        } else {
            dest
        };

        Ok(FakeSocket {
            network: self.clone(),
            source,
            request: Mutex::new(None),
        })
    }
}

/// Socket handed out by [`FakeNetwork`]; counts itself as closed when dropped
#[derive(Debug)]
pub(crate) struct FakeSocket {
    network: FakeNetwork,
    source: SocketAddr,
    request: Mutex<Option<Vec<u8>>>,
}

impl NtpUdpSocket for FakeSocket {
    fn send_to(&self, buf: &[u8], _addr: SocketAddr) -> Result<usize> {
        if let Some(kind) = self.network.send_error {
            return Err(Error::Network(kind));
        }

        self.network
            .journal
            .sent
            .lock()
            .expect("journal lock")
            .push(buf.to_vec());
        *self.request.lock().expect("request lock") = Some(buf.to_vec());

        Ok(if self.network.short_send {
            buf.len() / 2
        } else {
            buf.len()
        })
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let bytes = match &self.network.reply {
            Reply::Timeout => return Err(Error::Timeout),
            Reply::Io(kind) => return Err(Error::Network(*kind)),
            Reply::Bytes(bytes) => bytes.clone(),
            Reply::Echo { receive, transmit } => {
                let request = self
                    .request
                    .lock()
                    .expect("request lock")
                    .clone()
                    .unwrap_or_default();
                let mut packet = response_packet(0, *receive, *transmit);
                for word in [0, 4] {
                    let value = read_u32_be(&request, TRANSMIT_TIME_OFFSET + word)
                        .unwrap_or_default();
                    write_u32_be(&mut packet, ORIGINATE_TIME_OFFSET + word, value);
                }
                packet.to_vec()
            }
        };
        let size = bytes.len().min(buf.len());
        buf[..size].copy_from_slice(&bytes[..size]);

        Ok((size, self.source))
    }
}

impl Drop for FakeSocket {
    fn drop(&mut self) {
        self.network.journal.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`TimeSource`] returning a prepared record after an optional delay
#[derive(Debug)]
pub(crate) struct ScriptedSource {
    record: TransactionRecord,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(record: TransactionRecord) -> Self {
        ScriptedSource {
            record,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TimeSource for ScriptedSource {
    fn request_time(&self, _host: &str, _timeout: Duration) -> TransactionRecord {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.record
    }
}

/// [`TimeSource`] whose exchange panics
#[derive(Debug)]
pub(crate) struct PanickingSource;

impl TimeSource for PanickingSource {
    fn request_time(&self, _host: &str, _timeout: Duration) -> TransactionRecord {
        panic!("exchange blew up");
    }
}

/// Callback as observed by [`RecordingListener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Callback {
    TimeReceived {
        request_time: i64,
        ntp_time: i64,
        clock_offset: i64,
    },
    Error {
        request_time: i64,
        cause: Error,
    },
}

/// Listener forwarding every callback, with the calling thread, to a channel
#[derive(Debug)]
pub(crate) struct RecordingListener {
    tx: mpsc::Sender<(Callback, ThreadId)>,
}

impl RecordingListener {
    pub(crate) fn new() -> (Self, mpsc::Receiver<(Callback, ThreadId)>) {
        let (tx, rx) = mpsc::channel();
        (RecordingListener { tx }, rx)
    }
}

impl TimeListener for RecordingListener {
    fn on_time_received(&self, request_time: i64, ntp_time: i64, clock_offset: i64) {
        let callback = Callback::TimeReceived {
            request_time,
            ntp_time,
            clock_offset,
        };
        let _ = self.tx.send((callback, thread::current().id()));
    }

    fn on_error(&self, request_time: i64, cause: Error) {
        let callback = Callback::Error {
            request_time,
            cause,
        };
        let _ = self.tx.send((callback, thread::current().id()));
    }
}
