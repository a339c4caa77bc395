//! Sockets behind the RTSP client.
//!
//! - **Control** ([`tcp`]): the RTSP request/response channel, either one
//!   TCP connection or an HTTP GET/POST tunnel pair.
//! - **UDP RTP** ([`udp`]): client port-pair probing and the datagram
//!   [`PacketSource`](crate::media::PacketSource).
//! - **Interleaved RTP** ([`interleaved`]): `$`-framed RTP read from the
//!   control stream once it has been handed over (RFC 2326 §10.12).

pub mod interleaved;
pub mod tcp;
pub mod udp;

pub use interleaved::InterleavedSource;
pub use tcp::{ConnectOptions, ControlConnection, ControlWriter};
pub use udp::{UdpSource, find_available_rtp_port};
