use std::io::{self, Read};
use std::net::TcpStream;
use std::sync::Arc;

use crate::media::rtp::rtcp_bye;
use crate::media::{BufferPool, PacketSource, RtpPacket};
use crate::protocol::response::RtspResponse;
use crate::transport::tcp::ControlWriter;

const FRAME_HEADER_LEN: usize = 4;
const RESPONSE_PREFIX: &[u8] = b"RTSP/";

/// What sits at the front of the pending bytes.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// A complete `$` frame: channel and body range.
    Data { channel: u8, body: std::ops::Range<usize> },
    /// A complete in-band RTSP response (head and body) of this length.
    Response(usize),
    /// Bytes that belong to neither, up to the next `$`.
    Garbage(usize),
    Incomplete,
}

/// RTP interleaved on the RTSP stream (RFC 2326 §10.12).
///
/// ```text
/// +-----+---------+----------------+-----------------+
/// | '$' | channel | length (16 BE) | RTP/RTCP packet |
/// +-----+---------+----------------+-----------------+
/// ```
///
/// Frames on the RTP channel become packets; the RTCP channel is dropped.
/// Responses to requests sent after the hand-off also arrive here and are
/// skipped whole, body included.
pub struct InterleavedSource {
    stream: TcpStream,
    pending: Vec<u8>,
    rtp_channel: u8,
    rtcp_channel: u8,
    writer: ControlWriter,
    pool: Arc<BufferPool>,
    max_header_len: usize,
}

impl InterleavedSource {
    /// `buffered` holds bytes read past the last response head; `stream`
    /// should have a short read timeout. An in-band response head longer
    /// than `max_header_len` is discarded as garbage.
    pub fn new(
        stream: TcpStream,
        buffered: Vec<u8>,
        channels: (u8, u8),
        writer: ControlWriter,
        pool: Arc<BufferPool>,
        max_header_len: usize,
    ) -> Self {
        Self {
            stream,
            pending: buffered,
            rtp_channel: channels.0,
            rtcp_channel: channels.1,
            writer,
            pool,
            max_header_len,
        }
    }

    fn next_frame(&self) -> Frame {
        let pending = &self.pending;
        let Some(&first) = pending.first() else {
            return Frame::Incomplete;
        };

        if first == b'$' {
            if pending.len() < FRAME_HEADER_LEN {
                return Frame::Incomplete;
            }
            let len = u16::from_be_bytes([pending[2], pending[3]]) as usize;
            let end = FRAME_HEADER_LEN + len;
            if pending.len() < end {
                return Frame::Incomplete;
            }
            return Frame::Data {
                channel: pending[1],
                body: FRAME_HEADER_LEN..end,
            };
        }

        let prefix = pending.len().min(RESPONSE_PREFIX.len());
        if pending[..prefix] == RESPONSE_PREFIX[..prefix] {
            if prefix < RESPONSE_PREFIX.len() {
                return Frame::Incomplete;
            }
            let head_end = match pending.windows(4).position(|w| w == b"\r\n\r\n") {
                Some(end) if end + 4 <= self.max_header_len => end + 4,
                None if pending.len() <= self.max_header_len => return Frame::Incomplete,
                _ => {
                    tracing::warn!(limit = self.max_header_len, "in-band response head too long");
                    return Frame::Garbage(skip_to_frame(pending));
                }
            };
            let head = String::from_utf8_lossy(&pending[..head_end]);
            let response = RtspResponse::parse(&head);
            let total = head_end + response.content_length().unwrap_or(0);
            if pending.len() < total {
                return Frame::Incomplete;
            }
            tracing::debug!(
                status = response.status_code,
                cseq = ?response.cseq(),
                "in-band RTSP response skipped"
            );
            return Frame::Response(total);
        }

        Frame::Garbage(skip_to_frame(pending))
    }

    fn drain_frames(&mut self, packets: &mut Vec<RtpPacket>) {
        loop {
            match self.next_frame() {
                Frame::Incomplete => return,
                Frame::Data { channel, body } => {
                    let consumed = body.end;
                    if channel == self.rtp_channel {
                        let mut buffer = self.pool.take();
                        buffer.clear();
                        buffer.extend_from_slice(&self.pending[body]);
                        match RtpPacket::parse(buffer) {
                            Ok(packet) => packets.push(packet),
                            Err(e) => tracing::warn!(channel, error = %e, "dropping interleaved RTP frame"),
                        }
                    } else {
                        tracing::trace!(channel, len = consumed - FRAME_HEADER_LEN, "interleaved frame ignored");
                    }
                    self.pending.drain(..consumed);
                }
                Frame::Response(len) => {
                    self.pending.drain(..len);
                }
                Frame::Garbage(len) => {
                    tracing::warn!(len, "discarding unframed bytes on interleaved stream");
                    self.pending.drain(..len);
                }
            }
        }
    }
}

/// Bytes to discard before the next `$` after the first byte.
fn skip_to_frame(pending: &[u8]) -> usize {
    pending[1..]
        .iter()
        .position(|&b| b == b'$')
        .map_or(pending.len(), |at| at + 1)
}

impl PacketSource for InterleavedSource {
    fn poll_packets(&mut self) -> io::Result<Vec<RtpPacket>> {
        let mut packets = Vec::new();
        self.drain_frames(&mut packets);

        let mut chunk = [0u8; 4096];
        match self.stream.read(&mut chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "RTSP stream closed by server",
                ));
            }
            Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e),
        }

        self.drain_frames(&mut packets);
        Ok(packets)
    }

    fn send_bye(&mut self, ssrc: u32) -> io::Result<()> {
        let bye = rtcp_bye(ssrc);
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + bye.len());
        frame.push(b'$');
        frame.push(self.rtcp_channel);
        frame.extend_from_slice(&(bye.len() as u16).to_be_bytes());
        frame.extend_from_slice(&bye);
        self.writer
            .send(&frame)
            .map_err(|e| io::Error::other(e.to_string()))?;
        tracing::debug!(channel = self.rtcp_channel, "RTCP BYE sent interleaved");
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Read);
        tracing::debug!(discarded = self.pending.len(), "interleaved RTP source closed");
        self.pending.clear();
    }
}
