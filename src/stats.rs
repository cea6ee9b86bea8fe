//! Per-session pipeline statistics.
//!
//! Counters only - no frame data, no landmark data, nothing persisted.
//! They document the lossy backpressure policy (dropped = received -
//! processed) and back the zero-storage claim with auditable numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Live counters for one pipeline session.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Frames delivered by the transport.
    frames_received: AtomicU64,
    /// Frames that made it through the processor.
    frames_processed: AtomicU64,
    /// Frames with no detectable subject.
    no_subject_frames: AtomicU64,
    /// Frames classified as camera-covered.
    covered_frames: AtomicU64,
    /// Landmark frames actually handed to the observer channel.
    landmarks_published: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_processed(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_subject(&self) {
        self.no_subject_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_covered(&self) {
        self.covered_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_landmarks_published(&self) {
        self.landmarks_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let received = self.frames_received.load(Ordering::Relaxed);
        let processed = self.frames_processed.load(Ordering::Relaxed);
        StatsSnapshot {
            frames_received: received,
            frames_processed: processed,
            frames_dropped: received.saturating_sub(processed),
            no_subject_frames: self.no_subject_frames.load(Ordering::Relaxed),
            covered_frames: self.covered_frames.load(Ordering::Relaxed),
            landmarks_published: self.landmarks_published.load(Ordering::Relaxed),
        }
    }

    /// Display summary for the CLI.
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Frames received: {}\n\
             - Frames processed: {}\n\
             - Frames dropped (backpressure): {}\n\
             - Frames without a subject: {}\n\
             - Camera-covered frames: {}\n\
             - Landmark frames published: {}\n\
             \n\
             Zero-Storage Guarantee:\n\
             - No video or image data retained\n\
             - Landmarks discarded after each frame\n\
             - Only the latest metrics snapshot kept in memory",
            s.frames_received,
            s.frames_processed,
            s.frames_dropped,
            s.no_subject_frames,
            s.covered_frames,
            s.landmarks_published
        )
    }
}

/// Copyable view of [`SessionStats`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub no_subject_frames: u64,
    pub covered_frames: u64,
    pub landmarks_published: u64,
}

/// Counters shared between the intake and process tasks.
pub type SharedSessionStats = Arc<SessionStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_is_received_minus_processed() {
        let stats = SessionStats::new();
        for _ in 0..10 {
            stats.record_frame_received();
        }
        for _ in 0..4 {
            stats.record_frame_processed();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_received, 10);
        assert_eq!(snapshot.frames_processed, 4);
        assert_eq!(snapshot.frames_dropped, 6);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new();
        stats.record_frame_received();
        let summary = stats.summary();

        assert!(summary.contains("Frames received: 1"));
        assert!(summary.contains("Zero-Storage Guarantee"));
    }
}
