//! Best-effort landmark publication for frontend overlay rendering.
//!
//! Raw landmark positions go out on an unreliable, low-priority channel so
//! the UI can draw a skeleton overlay. Consumers must tolerate gaps and
//! reordering; the pipeline throttles publication and swallows every
//! transport failure.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::pose::landmark::{Landmark, PoseEstimate};

/// One landmark in the compact wire form: position rounded to 4 decimals,
/// visibility to 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub v: f64,
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

impl From<&Landmark> for LandmarkPoint {
    fn from(lm: &Landmark) -> Self {
        Self {
            x: round_to(lm.x, 4),
            y: round_to(lm.y, 4),
            z: round_to(lm.z, 4),
            v: round_to(lm.visibility, 2),
        }
    }
}

/// The published payload: all 33 landmarks under a single short key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub l: Vec<LandmarkPoint>,
}

impl LandmarkFrame {
    pub fn from_estimate(estimate: &PoseEstimate) -> Self {
        Self {
            l: estimate.landmarks.iter().map(LandmarkPoint::from).collect(),
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, PublishError> {
        serde_json::to_vec(self).map_err(|e| PublishError::Encode(e.to_string()))
    }
}

/// Publication failures. All of these are swallowed by the pipeline and
/// only logged.
#[derive(Debug)]
pub enum PublishError {
    Encode(String),
    /// The channel is full; the frame is dropped.
    ChannelFull,
    /// The consumer went away.
    Closed,
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Encode(e) => write!(f, "encode failed: {e}"),
            PublishError::ChannelFull => write!(f, "observer channel full"),
            PublishError::Closed => write!(f, "observer channel closed"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Sink for landmark frames. Implementations adapt whatever out-of-band
/// transport the host provides.
pub trait LandmarkPublisher: Send {
    fn publish(&mut self, frame: &LandmarkFrame) -> Result<(), PublishError>;
}

/// In-process publisher over a bounded tokio channel. `try_send` keeps it
/// lossy: a slow consumer drops frames instead of backing up the pipeline.
pub struct ChannelPublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelPublisher {
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl LandmarkPublisher for ChannelPublisher {
    fn publish(&mut self, frame: &LandmarkFrame) -> Result<(), PublishError> {
        let payload = frame.to_payload()?;
        match self.tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(PublishError::ChannelFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PublishError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::LandmarkIndex;

    #[test]
    fn test_point_rounding() {
        let lm = Landmark::new(0.123456, 0.654321, -0.00009, 0.876);
        let p = LandmarkPoint::from(&lm);
        assert_eq!(p.x, 0.1235);
        assert_eq!(p.y, 0.6543);
        assert_eq!(p.z, -0.0001);
        assert_eq!(p.v, 0.88);
    }

    #[test]
    fn test_frame_payload_shape() {
        let estimate = PoseEstimate::default();
        let frame = LandmarkFrame::from_estimate(&estimate);
        assert_eq!(frame.l.len(), LandmarkIndex::COUNT);

        let payload = frame.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["l"].as_array().unwrap().len(), 33);
    }

    #[tokio::test]
    async fn test_channel_publisher_is_lossy() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut publisher = ChannelPublisher::new(tx);
        let frame = LandmarkFrame::from_estimate(&PoseEstimate::default());

        assert!(publisher.publish(&frame).is_ok());
        // Buffer full: the second publish drops rather than blocks.
        assert!(matches!(
            publisher.publish(&frame),
            Err(PublishError::ChannelFull)
        ));

        rx.recv().await.unwrap();
        drop(rx);
        assert!(matches!(publisher.publish(&frame), Err(PublishError::Closed)));
    }
}
