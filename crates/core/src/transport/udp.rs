use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;

use crate::error::{Result, RtspError};
use crate::media::{BufferPool, PacketSource, RtpPacket};
use crate::media::rtp::rtcp_bye;

/// Find a free even/odd UDP port pair for RTP/RTCP (RFC 3550 §11).
///
/// Probes even candidates from `start` upwards: binds the RTP port, then
/// the RTCP port right above it. Both probe sockets are closed before
/// returning, so the pair can be re-bound once SETUP has succeeded.
pub fn find_available_rtp_port(start: u16) -> Result<(u16, u16)> {
    let mut candidate = (start & !1).max(2);

    loop {
        let rtcp_port = candidate + 1;
        match UdpSocket::bind(("0.0.0.0", candidate)) {
            Ok(rtp) => match UdpSocket::bind(("0.0.0.0", rtcp_port)) {
                Ok(rtcp) => {
                    drop(rtcp);
                    drop(rtp);
                    tracing::debug!(rtp_port = candidate, rtcp_port, "found RTP port pair");
                    return Ok((candidate, rtcp_port));
                }
                Err(e) => tracing::trace!(port = rtcp_port, error = %e, "RTCP port busy"),
            },
            Err(e) => tracing::trace!(port = candidate, error = %e, "RTP port busy"),
        }

        candidate = match candidate.checked_add(2) {
            Some(next) if next < u16::MAX => next,
            _ => {
                tracing::warn!(start, "RTP port range exhausted");
                return Err(RtspError::PortRangeExhausted);
            }
        };
    }
}

/// RTP over a client UDP port pair.
///
/// Both sockets are non-blocking; each poll drains every queued datagram.
/// RTCP from the server is read and discarded.
pub struct UdpSource {
    rtp: UdpSocket,
    rtcp: UdpSocket,
    server_rtcp: Option<SocketAddr>,
    pool: Arc<BufferPool>,
}

impl UdpSource {
    /// Bind the negotiated client ports.
    ///
    /// `server_host` and `server_rtcp_port` address the RTCP BYE; a host
    /// that does not resolve only disables the BYE.
    pub fn bind(
        rtp_port: u16,
        rtcp_port: u16,
        server_host: &str,
        server_rtcp_port: u16,
        pool: Arc<BufferPool>,
    ) -> Result<Self> {
        let rtp = UdpSocket::bind(("0.0.0.0", rtp_port)).map_err(RtspError::Rtp)?;
        let rtcp = UdpSocket::bind(("0.0.0.0", rtcp_port)).map_err(RtspError::Rtp)?;
        rtp.set_nonblocking(true).map_err(RtspError::Rtp)?;
        rtcp.set_nonblocking(true).map_err(RtspError::Rtp)?;

        let server_rtcp = (server_host, server_rtcp_port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .filter(|_| server_rtcp_port != 0);

        tracing::debug!(rtp_port, rtcp_port, ?server_rtcp, "UDP RTP source bound");

        Ok(Self {
            rtp,
            rtcp,
            server_rtcp,
            pool,
        })
    }
}

/// `Ok(None)` once the socket has nothing more to read.
fn recv_nonblocking(socket: &UdpSocket, buffer: &mut [u8]) -> io::Result<Option<usize>> {
    loop {
        match socket.recv(buffer) {
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            // ICMP port unreachable from an earlier send.
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}

impl PacketSource for UdpSource {
    fn poll_packets(&mut self) -> io::Result<Vec<RtpPacket>> {
        let mut packets = Vec::new();

        loop {
            let mut buffer = self.pool.take();
            let Some(len) = recv_nonblocking(&self.rtp, &mut buffer)? else {
                self.pool.put(buffer);
                break;
            };
            // recv() silently cuts a datagram to the buffer; a full buffer
            // means the tail may be gone.
            if len == buffer.len() {
                tracing::warn!(len, "dropping RTP datagram that filled the receive buffer");
                self.pool.put(buffer);
                continue;
            }
            buffer.truncate(len);
            match RtpPacket::parse(buffer) {
                Ok(packet) => packets.push(packet),
                Err(e) => tracing::warn!(len, error = %e, "dropping RTP datagram"),
            }
        }

        let mut scratch = [0u8; 1500];
        while let Some(len) = recv_nonblocking(&self.rtcp, &mut scratch)? {
            tracing::trace!(len, "RTCP datagram ignored");
        }

        Ok(packets)
    }

    fn send_bye(&mut self, ssrc: u32) -> io::Result<()> {
        let Some(server) = self.server_rtcp else {
            return Ok(());
        };
        self.rtcp.send_to(&rtcp_bye(ssrc), server)?;
        tracing::debug!(%server, "RTCP BYE sent");
        Ok(())
    }

    fn close(&mut self) {
        tracing::debug!(
            rtp = ?self.rtp.local_addr().ok(),
            "UDP RTP source closed"
        );
    }
}
