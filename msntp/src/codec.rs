//! SNTP packet encoding and decoding
//!
//! Only the fields a client needs are touched: the flags byte of a request, its
//! transmit timestamp, and the originate/receive/transmit timestamps of a
//! response. Every multi-byte field is big-endian and every 32-bit word is read
//! as unsigned before any arithmetic happens.
use crate::types::{
    Error, ResponseTimestamps, Result, FRACTION_SCALE, MODE_MASK, MSEC_IN_SEC,
    NTP_MODE_CLIENT, NTP_PACKET_SIZE, NTP_TIMESTAMP_DELTA, NTP_VERSION,
    ORIGINATE_TIME_OFFSET, RECEIVE_TIME_OFFSET, TRANSMIT_TIME_OFFSET,
    VERSION_MASK, VERSION_SHIFT,
};

/// Size of a single NTP timestamp on the wire
const TIMESTAMP_SIZE: usize = 8;

/// Raw 48-byte SNTP packet
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawNtpPacket(pub [u8; NTP_PACKET_SIZE]);

impl Default for RawNtpPacket {
    fn default() -> Self {
        RawNtpPacket([0u8; NTP_PACKET_SIZE])
    }
}

impl AsRef<[u8]> for RawNtpPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl RawNtpPacket {
    /// Association mode from the flags byte
    #[must_use]
    pub fn mode(&self) -> u8 {
        self.0[0] & MODE_MASK
    }

    /// Protocol version from the flags byte
    #[must_use]
    pub fn version(&self) -> u8 {
        (self.0[0] & VERSION_MASK) >> VERSION_SHIFT
    }
}

/// Build a client request carrying `send_time_ms` as its transmit timestamp
///
/// The low-order byte of the fraction is random. It lies below the millisecond
/// resolution of the input.
#[must_use]
pub fn encode_request(send_time_ms: i64) -> RawNtpPacket {
    let mut packet = RawNtpPacket::default();

    packet.0[0] = NTP_MODE_CLIENT | (NTP_VERSION << VERSION_SHIFT);
    write_timestamp(&mut packet.0, TRANSMIT_TIME_OFFSET, send_time_ms);
    packet.0[TRANSMIT_TIME_OFFSET + TIMESTAMP_SIZE - 1] = rand::random::<u8>();

    packet
}

/// Decode the server timestamps of a response
///
/// # Errors
///
/// Returns [`Error::MalformedPacket`] if `buf` is shorter than an SNTP packet
pub fn decode_response(buf: &[u8]) -> Result<ResponseTimestamps> {
    if buf.len() < NTP_PACKET_SIZE {
        return Err(Error::MalformedPacket);
    }

    Ok(ResponseTimestamps {
        originate: decode_timestamp(buf, ORIGINATE_TIME_OFFSET)?,
        receive: decode_timestamp(buf, RECEIVE_TIME_OFFSET)?,
        transmit: decode_timestamp(buf, TRANSMIT_TIME_OFFSET)?,
    })
}

/// Read the NTP timestamp at `offset` as milliseconds since UNIX epoch
///
/// # Errors
///
/// Returns [`Error::MalformedPacket`] if the timestamp does not fit into `buf`
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn decode_timestamp(buf: &[u8], offset: usize) -> Result<i64> {
    let seconds = i64::from(read_u32_be(buf, offset)?);
    let fraction_offset = offset.checked_add(4).ok_or(Error::MalformedPacket)?;
    let fraction = u64::from(read_u32_be(buf, fraction_offset)?);
    // fraction < 2^32, so the scaled value is below 1000
    let millis = (fraction * MSEC_IN_SEC as u64 / FRACTION_SCALE) as i64;

    Ok((seconds - i64::from(NTP_TIMESTAMP_DELTA)) * MSEC_IN_SEC + millis)
}

/// Write `time_ms` (milliseconds since UNIX epoch) as an NTP timestamp at `offset`
///
/// Seconds wrap modulo 2^32 the same way NTP eras do.
///
/// # Panics
///
/// Panics if the timestamp does not fit into `buf`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn write_timestamp(buf: &mut [u8], offset: usize, time_ms: i64) {
    let seconds = time_ms
        .div_euclid(MSEC_IN_SEC)
        .wrapping_add(i64::from(NTP_TIMESTAMP_DELTA)) as u32;
    let millis = time_ms.rem_euclid(MSEC_IN_SEC) as u64;
    let fraction = (millis * FRACTION_SCALE / MSEC_IN_SEC as u64) as u32;

    write_u32_be(buf, offset, seconds);
    write_u32_be(buf, offset + 4, fraction);
}

/// Read an unsigned 32-bit big-endian number at `offset`
///
/// # Errors
///
/// Returns [`Error::MalformedPacket`] if four bytes are not available at `offset`
pub fn read_u32_be(buf: &[u8], offset: usize) -> Result<u32> {
    let bytes = offset
        .checked_add(4)
        .and_then(|end| buf.get(offset..end))
        .ok_or(Error::MalformedPacket)?;

    Ok(u32::from(bytes[0]) << 24
        | u32::from(bytes[1]) << 16
        | u32::from(bytes[2]) << 8
        | u32::from(bytes[3]))
}

/// Write `value` as an unsigned 32-bit big-endian number at `offset`
///
/// # Panics
///
/// Panics if four bytes are not available at `offset`
pub fn write_u32_be(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
