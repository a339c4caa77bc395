//! RTP reception and payload reassembly.
//!
//! Once a media is playing, an [`RtpReceiver`](receiver::RtpReceiver) runs a
//! packet-arrival thread that polls a [`PacketSource`] (UDP sockets or the
//! interleaved RTSP stream) and pushes decoded [`RtpPacket`]s into a
//! [`PayloadQueue`](queue::PayloadQueue). The caller drains payload bytes
//! from the queue at its own pace.
//!
//! ```text
//! socket ──► PacketSource::poll_packets ──► PayloadQueue::push
//!                                                │
//!               caller ◄── PayloadQueue::fetch ◄─┘
//!                                                │
//!                BufferPool ◄── PacketRelease ◄──┘ (drained packets)
//! ```

pub mod pool;
pub mod queue;
pub mod receiver;
pub mod rtp;

use std::io;

pub use pool::BufferPool;
pub use queue::PayloadQueue;
pub use receiver::RtpReceiver;
pub use rtp::RtpPacket;

/// Where the packet-arrival thread gets its packets from.
///
/// Implementations must not block for long in
/// [`poll_packets`](Self::poll_packets): the receive loop checks its stop
/// flag between polls.
pub trait PacketSource: Send {
    /// Every packet received since the last poll, possibly none.
    ///
    /// An error ends the receive loop.
    fn poll_packets(&mut self) -> io::Result<Vec<RtpPacket>>;

    /// Announce to the server that this receiver is leaving (RTCP BYE).
    fn send_bye(&mut self, ssrc: u32) -> io::Result<()>;

    fn close(&mut self);
}

/// Takes back packets the consumer has fully drained.
pub trait PacketRelease: Send + Sync {
    fn release(&self, packet: RtpPacket);
}
