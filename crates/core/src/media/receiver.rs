use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::queue::PayloadQueue;
use super::{PacketRelease, PacketSource};
use crate::error::{Result, RtspError};

/// Receives RTP for one media on a background thread.
///
/// Created by [`crate::RtspClient::rtp_receiver`] after SETUP. The worker
/// polls its [`PacketSource`] until [`close`](Self::close) (or drop), which
/// also sends an RTCP BYE and releases everything still queued.
pub struct RtpReceiver {
    media_type: String,
    clock_rate: u32,
    ssrc: u32,
    queue: Arc<PayloadQueue>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<Box<dyn PacketSource>>>,
}

impl RtpReceiver {
    /// Spawn the packet-arrival thread.
    pub fn start(
        media_type: &str,
        clock_rate: u32,
        source: Box<dyn PacketSource>,
        release: Arc<dyn PacketRelease>,
        fetch_wait: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let queue = Arc::new(PayloadQueue::new(release, fetch_wait));
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let queue = queue.clone();
            let running = running.clone();
            let media = media_type.to_string();
            thread::Builder::new()
                .name(format!("rtp-{media_type}"))
                .spawn(move || receive_loop(&media, source, &queue, &running, poll_interval))
                .map_err(RtspError::Rtp)?
        };

        let ssrc = rand::random::<u32>();
        tracing::info!(
            media_type,
            clock_rate,
            ssrc = format_args!("{:#010X}", ssrc),
            "RTP receiver started"
        );

        Ok(Self {
            media_type: media_type.to_string(),
            clock_rate,
            ssrc,
            queue,
            running,
            worker: Some(worker),
        })
    }

    /// See [`PayloadQueue::fetch`].
    pub fn fetch(&self, buf: &mut [u8]) -> usize {
        self.queue.fetch(buf)
    }

    pub fn clear(&self) {
        self.queue.clear();
    }

    /// RTP clock rate of the media, in Hz.
    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the worker, send BYE, close the source and drop queued packets.
    pub fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);

        match worker.join() {
            Ok(mut source) => {
                if let Err(e) = source.send_bye(self.ssrc) {
                    tracing::debug!(media_type = %self.media_type, error = %e, "RTCP BYE not sent");
                }
                source.close();
            }
            Err(_) => tracing::warn!(media_type = %self.media_type, "RTP receive thread panicked"),
        }

        self.queue.clear();
        tracing::info!(media_type = %self.media_type, "RTP receiver closed");
    }
}

impl Drop for RtpReceiver {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(
    media_type: &str,
    mut source: Box<dyn PacketSource>,
    queue: &PayloadQueue,
    running: &AtomicBool,
    poll_interval: Duration,
) -> Box<dyn PacketSource> {
    let mut received: u64 = 0;

    while running.load(Ordering::SeqCst) {
        match source.poll_packets() {
            Ok(packets) if packets.is_empty() => thread::sleep(poll_interval),
            Ok(packets) => {
                received += packets.len() as u64;
                tracing::trace!(media_type, count = packets.len(), "RTP packets received");
                queue.push_batch(packets);
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(media_type, error = %e, "RTP receive failed");
                }
                running.store(false, Ordering::SeqCst);
            }
        }
    }

    tracing::debug!(media_type, received, "receive loop exited");
    source
}
