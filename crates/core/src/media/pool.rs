use parking_lot::Mutex;

use super::PacketRelease;
use super::rtp::RtpPacket;

/// Largest UDP datagram; the default receive buffer size.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

const MAX_POOLED: usize = 64;

/// Recycles packet buffers between the receive loop and the payload queue.
///
/// The receive loop [`take`](Self::take)s a buffer per datagram; the queue
/// hands it back through [`PacketRelease`] once the payload is drained.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    buffer_size: usize,
}

impl BufferPool {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            buffer_size,
        }
    }

    /// A zeroed buffer of `buffer_size` bytes, reused when one is available.
    pub fn take(&self) -> Vec<u8> {
        let mut buffer = self.buffers.lock().pop().unwrap_or_default();
        buffer.clear();
        buffer.resize(self.buffer_size, 0);
        buffer
    }

    pub fn put(&self, buffer: Vec<u8>) {
        let mut buffers = self.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buffer);
        }
    }

    pub fn pooled(&self) -> usize {
        self.buffers.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(MAX_DATAGRAM_SIZE)
    }
}

impl PacketRelease for BufferPool {
    fn release(&self, packet: RtpPacket) {
        self.put(packet.into_buffer());
    }
}
