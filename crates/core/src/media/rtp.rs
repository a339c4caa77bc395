use crate::error::{ParseErrorKind, Result, RtspError};

/// Size of the RTP fixed header.
pub const RTP_HEADER_LEN: usize = 12;

const RTCP_BYE: u8 = 203;

/// A received RTP packet (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |                  CSRC list (CC x 32 bits)                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |        header extension (if X), payload, padding (if P)       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Owns the receive buffer; [`payload`](Self::payload) is a view into it
/// with the header, CSRCs, extension and padding stripped. The buffer is
/// handed back through [`into_buffer`](Self::into_buffer) for reuse.
#[derive(Debug)]
pub struct RtpPacket {
    buffer: Vec<u8>,
    payload_start: usize,
    payload_end: usize,
    pub payload_type: u8,
    pub marker: bool,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

fn truncated() -> RtspError {
    RtspError::Parse {
        kind: ParseErrorKind::TruncatedRtpPacket,
    }
}

impl RtpPacket {
    /// Decode a datagram (or interleaved frame body) holding one packet.
    pub fn parse(buffer: Vec<u8>) -> Result<Self> {
        if buffer.len() < RTP_HEADER_LEN {
            return Err(truncated());
        }
        if buffer[0] >> 6 != 2 {
            return Err(RtspError::Parse {
                kind: ParseErrorKind::BadRtpVersion,
            });
        }

        let padding = buffer[0] & 0x20 != 0;
        let extension = buffer[0] & 0x10 != 0;
        let csrc_count = (buffer[0] & 0x0f) as usize;

        let mut payload_start = RTP_HEADER_LEN + csrc_count * 4;
        if extension {
            // 16-bit profile id, 16-bit length in 32-bit words.
            let ext = buffer
                .get(payload_start..payload_start + 4)
                .ok_or_else(truncated)?;
            let words = u16::from_be_bytes([ext[2], ext[3]]) as usize;
            payload_start += 4 + words * 4;
        }
        if payload_start > buffer.len() {
            return Err(truncated());
        }

        let mut payload_end = buffer.len();
        if padding {
            let pad = buffer[buffer.len() - 1] as usize;
            if pad == 0 || payload_start + pad > payload_end {
                return Err(RtspError::Parse {
                    kind: ParseErrorKind::BadRtpPadding,
                });
            }
            payload_end -= pad;
        }

        Ok(Self {
            payload_type: buffer[1] & 0x7f,
            marker: buffer[1] & 0x80 != 0,
            sequence: u16::from_be_bytes([buffer[2], buffer[3]]),
            timestamp: u32::from_be_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]),
            ssrc: u32::from_be_bytes([buffer[8], buffer[9], buffer[10], buffer[11]]),
            payload_start,
            payload_end,
            buffer,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer[self.payload_start..self.payload_end]
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}

/// RTCP BYE for a single source (RFC 3550 §6.6).
pub fn rtcp_bye(ssrc: u32) -> [u8; 8] {
    let mut packet = [0u8; 8];
    packet[0] = (2 << 6) | 1;
    packet[1] = RTCP_BYE;
    // Length in 32-bit words minus one.
    packet[2..4].copy_from_slice(&1u16.to_be_bytes());
    packet[4..8].copy_from_slice(&ssrc.to_be_bytes());
    packet
}
