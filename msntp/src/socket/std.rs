use crate::net::{SocketAddr, UdpSocket};
use crate::{Error, NtpNetwork, NtpUdpSocket, Result};

use core::net::{Ipv4Addr, Ipv6Addr};
use core::time::Duration;
use std::net::ToSocketAddrs;

#[cfg(feature = "log")]
use crate::log::debug;

impl NtpUdpSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize> {
        UdpSocket::send_to(self, buf, addr).map_err(Error::from)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).map_err(Error::from)
    }
}

/// [`NtpNetwork`] backed by the operating system resolver and `std::net` sockets
///
/// Every [`NtpNetwork::open`] call binds a new ephemeral socket of the same address
/// family as the destination.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdNetwork;

impl NtpNetwork for StdNetwork {
    type Socket = UdpSocket;

    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_e| {
                #[cfg(feature = "log")]
                debug!("resolve {}: {:?}", host, _e);
                Error::AddressResolve
            })?
            .next()
            .ok_or(Error::AddressResolve)?;

        #[cfg(feature = "log")]
        debug!("resolved {} to {}", host, addr);

        Ok(addr)
    }

    fn open(&self, dest: SocketAddr, timeout: Duration) -> Result<UdpSocket> {
        let local: SocketAddr = if dest.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        // a zero duration is rejected by std with InvalidInput
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;

        Ok(socket)
    }
}
