//! Decoded video frames as delivered by the external media transport.

use tokio::sync::mpsc;

/// One decoded RGB frame.
///
/// `data` holds tightly packed 8-bit RGB pixels (`width * height * 3`
/// bytes). `timestamp_us` is the capture timestamp in microseconds from a
/// monotonic clock owned by the transport. Frames live only as long as
/// processing needs them; they are never stored.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_us: i64,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_us: i64) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_us,
        }
    }

    /// Capture timestamp in milliseconds, the unit the estimator expects.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_us / 1000
    }
}

/// Receiving end of a frame stream. The stream ends when the producer
/// stops or drops its sender.
pub type FrameReceiver = mpsc::Receiver<VideoFrame>;

/// Sending end of a frame stream, held by the transport adapter.
pub type FrameSender = mpsc::Sender<VideoFrame>;

/// Create a frame channel with a small buffer. The pipeline's latest-frame
/// slot is what actually bounds latency; this buffer only decouples the
/// transport callback from the intake task.
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    mpsc::channel(capacity)
}
