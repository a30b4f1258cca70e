use core::fmt::{self, Display, Formatter};
use core::time::Duration;

use crate::net::SocketAddr;

/// Standard NTP server port
pub const NTP_PORT: u16 = 123;
/// Size of an SNTP packet without extension fields or authenticator
pub const NTP_PACKET_SIZE: usize = 48;
/// Receive deadline suggested for a single exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Reference timestamp offset within a packet
pub const REFERENCE_TIME_OFFSET: usize = 16;
/// Originate timestamp offset within a packet
pub const ORIGINATE_TIME_OFFSET: usize = 24;
/// Receive timestamp offset within a packet
pub const RECEIVE_TIME_OFFSET: usize = 32;
/// Transmit timestamp offset within a packet
pub const TRANSMIT_TIME_OFFSET: usize = 40;

/// Seconds between 1900-01-01 and 1970-01-01: 70 years plus 17 leap days
pub const NTP_TIMESTAMP_DELTA: u32 = 2_208_988_800;

/// SNTP mode value bit mask
pub(crate) const MODE_MASK: u8 = 0b0000_0111;
/// SNTP version value bit mask
pub(crate) const VERSION_MASK: u8 = 0b0011_1000;
/// SNTP version bit mask shift value
pub(crate) const VERSION_SHIFT: u8 = 3;
/// Client association mode
pub(crate) const NTP_MODE_CLIENT: u8 = 3;
/// Protocol version sent in requests
pub(crate) const NTP_VERSION: u8 = 3;
/// SNTP milliseconds in second constant
pub(crate) const MSEC_IN_SEC: i64 = 1_000;
/// 2^32, the resolution of the timestamp fraction field
pub(crate) const FRACTION_SCALE: u64 = 1 << 32;

/// SNTP library result type
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for SNTP client
/// Errors originate on network layer, while decoding a response or while
/// dispatching an exchange
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A NTP server address can not be resolved
    AddressResolve,
    /// No response arrived before the receive deadline
    Timeout,
    /// Socket level failure while opening, sending or receiving
    Network(std::io::ErrorKind),
    /// Response is too short or structurally invalid
    MalformedPacket,
    /// A NTP server address response has been received from does not match
    /// to the address the request was sent to
    ResponseAddressMismatch,
    /// The exchange never produced an outcome (worker could not start or panicked)
    Aborted,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::AddressResolve => write!(f, "unable to resolve NTP server address"),
            Error::Timeout => write!(f, "no response from NTP server before deadline"),
            Error::Network(kind) => write!(f, "network error: {kind}"),
            Error::MalformedPacket => write!(f, "malformed NTP packet"),
            Error::ResponseAddressMismatch => {
                write!(f, "response came from an unexpected address")
            }
            Error::Aborted => write!(f, "exchange aborted before completion"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            // platforms disagree on which kind an expired read timeout yields
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                Error::Timeout
            }
            kind => Error::Network(kind),
        }
    }
}

/// Server timestamps carried by a response, in milliseconds since UNIX epoch
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResponseTimestamps {
    /// Request transmit time echoed back by the server
    pub originate: i64,
    /// Time the request arrived at the server
    pub receive: i64,
    /// Time the server sent the response
    pub transmit: i64,
}

/// Terminal state of a single exchange
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Exchange has not finished yet
    #[default]
    Pending,
    /// All timing fields are populated
    Success,
    /// Exchange failed, timing fields past the failing step are meaningless
    Failure(Error),
}

/// Result of one request/response exchange
///
/// All times are milliseconds: `request_time` and `ntp_time` since UNIX epoch,
/// the ticks on the monotonic clock of the [`NtpClock`] that produced them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TransactionRecord {
    /// Wall clock time the request was sent, `0` if nothing was sent
    pub request_time: i64,
    /// Monotonic reading taken together with `request_time`
    pub request_tick: i64,
    /// Monotonic reading taken when the response arrived
    pub response_tick: i64,
    /// Network round trip without the server processing time
    pub round_trip_time: i64,
    /// Estimated server clock minus local clock
    pub clock_offset: i64,
    /// Network corrected time at `response_tick`
    pub ntp_time: i64,
    /// How the exchange ended
    pub outcome: Outcome,
}

impl TransactionRecord {
    /// Create a record that failed with the given cause
    #[must_use]
    pub fn failed(request_time: i64, cause: Error) -> Self {
        TransactionRecord {
            request_time,
            outcome: Outcome::Failure(cause),
            ..TransactionRecord::default()
        }
    }

    /// Returns `true` if the exchange finished successfully
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Returns the failure cause. A record that never left `Pending` reports
    /// [`Error::Aborted`]
    #[must_use]
    pub fn cause(&self) -> Option<Error> {
        match self.outcome {
            Outcome::Success => None,
            Outcome::Pending => Some(Error::Aborted),
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Monotonic reading that corresponds to `ntp_time`
    #[must_use]
    pub fn ntp_time_reference(&self) -> i64 {
        self.response_tick
    }

    /// Network corrected time for another reading of the same monotonic clock,
    /// so the result of one exchange can be reused without asking the server
    /// again
    #[must_use]
    pub fn current_time(&self, now_tick: i64) -> Option<i64> {
        self.is_success().then(|| {
            self.ntp_time
                .saturating_add(now_tick.saturating_sub(self.response_tick))
        })
    }
}

/// A trait encapsulating the clocks an exchange needs
///
/// Two clocks are involved: the wall clock stamps the outgoing request, while the
/// monotonic clock measures the round trip, so that clock adjustments made while
/// the request is in flight do not leak into the results.
pub trait NtpClock {
    /// Returns wall clock time in milliseconds since UNIX EPOCH
    fn wall_millis(&self) -> i64;

    /// Returns monotonic clock reading in milliseconds. Origin is arbitrary,
    /// only differences between readings are meaningful
    fn tick_millis(&self) -> i64;
}

/// Supplementary module to implement some `msntp` boilerplate that environments with
/// `std` have to re-implement.
mod sup {
    use std::time::{Instant, SystemTime};

    use crate::NtpClock;

    /// Standard library clock that relies on `std::time` to provide wall clock
    /// and monotonic readings during SNTP client operations
    #[derive(Copy, Clone, Debug)]
    pub struct StdClock {
        origin: Instant,
    }

    impl StdClock {
        /// Create a clock whose monotonic readings start at zero now
        #[must_use]
        pub fn new() -> Self {
            StdClock {
                origin: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl NtpClock for StdClock {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        fn wall_millis(&self) -> i64 {
            match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
                Ok(since) => since.as_millis() as i64,
                Err(before) => -(before.duration().as_millis() as i64),
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        fn tick_millis(&self) -> i64 {
            self.origin.elapsed().as_millis() as i64
        }
    }
}

pub use sup::*;

/// A trait encapsulating UDP socket interface required for SNTP client operations
///
/// Both methods block. The deadline for `recv_from` is configured when the socket
/// is opened through [`NtpNetwork::open`]; the socket is closed when dropped.
pub trait NtpUdpSocket {
    /// Send the given buffer to an address provided. On success, returns the number
    /// of bytes written.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an underlying UDP send fails
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize>;

    /// Receives a single datagram message on the socket. On success, returns the number
    /// of bytes read and the origin.
    ///
    /// # Errors
    ///
    /// Will return [`Error::Timeout`] if nothing arrives before the deadline and
    /// `Err` if an underlying UDP receive fails
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;
}

/// A trait encapsulating name resolution and socket creation
pub trait NtpNetwork {
    /// Socket type produced by [`NtpNetwork::open`]
    type Socket: NtpUdpSocket;

    /// Resolve a host name to a single server address
    ///
    /// # Errors
    ///
    /// Will return [`Error::AddressResolve`] if the name yields no address
    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr>;

    /// Open a fresh socket able to reach `dest`, with `timeout` as the receive
    /// deadline
    ///
    /// # Errors
    ///
    /// Will return `Err` if the socket can not be created or configured
    fn open(&self, dest: SocketAddr, timeout: Duration) -> Result<Self::Socket>;
}

/// SNTP client context that contains of objects that may be required for client's
/// operation
#[derive(Copy, Clone, Debug, Default)]
pub struct NtpContext<C: NtpClock> {
    pub clock: C,
}

impl<C: NtpClock> NtpContext<C> {
    /// Create SNTP client context with the given clock
    pub fn new(clock: C) -> Self {
        NtpContext { clock }
    }
}
