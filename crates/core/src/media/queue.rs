use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::PacketRelease;
use super::rtp::RtpPacket;

/// A received packet whose payload is not yet fully consumed.
#[derive(Debug)]
struct PendingPayload {
    packet: RtpPacket,
    offset: usize,
}

impl PendingPayload {
    fn remaining(&self) -> &[u8] {
        &self.packet.payload()[self.offset..]
    }
}

/// Byte-stream view over RTP payloads in arrival order.
///
/// The packet-arrival thread [`push`](Self::push)es; a single consumer
/// drains with [`fetch`](Self::fetch). Every operation, including handing
/// drained packets back to the [`PacketRelease`], runs under one lock.
pub struct PayloadQueue {
    pending: Mutex<VecDeque<PendingPayload>>,
    ready: Condvar,
    release: Arc<dyn PacketRelease>,
    wait: Duration,
}

impl PayloadQueue {
    /// `wait` bounds how long [`fetch`](Self::fetch) sleeps on an empty queue.
    pub fn new(release: Arc<dyn PacketRelease>, wait: Duration) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            release,
            wait,
        }
    }

    pub fn push(&self, packet: RtpPacket) {
        self.pending
            .lock()
            .push_back(PendingPayload { packet, offset: 0 });
        self.ready.notify_one();
    }

    pub fn push_batch(&self, packets: Vec<RtpPacket>) {
        if packets.is_empty() {
            return;
        }
        let mut pending = self.pending.lock();
        pending.extend(packets.into_iter().map(|packet| PendingPayload { packet, offset: 0 }));
        drop(pending);
        self.ready.notify_one();
    }

    /// Copy up to `buf.len()` payload bytes, returning how many were copied.
    ///
    /// Waits at most the configured interval for a first packet, then drains
    /// whatever is queued without waiting again, so a call may return fewer
    /// bytes than requested (0 on timeout). A payload larger than the space
    /// left stays at the head with its cursor advanced.
    pub fn fetch(&self, buf: &mut [u8]) -> usize {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            self.ready
                .wait_while_for(&mut pending, |pending| pending.is_empty(), self.wait);
        }

        let mut fetched = 0;
        while fetched < buf.len() {
            let Some(head) = pending.front_mut() else {
                break;
            };
            let needed = buf.len() - fetched;
            let remaining = head.remaining();

            if remaining.len() > needed {
                buf[fetched..].copy_from_slice(&remaining[..needed]);
                head.offset += needed;
                fetched += needed;
            } else {
                let len = remaining.len();
                buf[fetched..fetched + len].copy_from_slice(remaining);
                fetched += len;
                if let Some(done) = pending.pop_front() {
                    self.release.release(done.packet);
                }
            }
        }

        tracing::trace!(fetched, requested = buf.len(), queued = pending.len(), "payload fetch");
        fetched
    }

    /// Release every queued packet and empty the queue.
    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        let cleared = pending.len();
        for payload in pending.drain(..) {
            self.release.release(payload.packet);
        }
        if cleared > 0 {
            tracing::debug!(cleared, "payload queue cleared");
        }
    }

    /// Number of packets not yet fully consumed.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
