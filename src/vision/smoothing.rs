//! Moving-average smoothing for per-frame angle readings.
//!
//! The estimator jitters frame to frame; a short moving average damps that
//! without the lag of a heavier filter. When a frame yields no reading for
//! a signal (occluded landmarks), the filter holds its last stable value
//! instead of snapping to a neutral one.

use std::collections::VecDeque;

/// Default number of recent readings averaged per signal.
pub const DEFAULT_WINDOW: usize = 5;

/// Fixed-capacity moving-average window over one scalar signal.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    history: VecDeque<f64>,
    capacity: usize,
    last_output: f64,
}

impl SmoothingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            last_output: 0.0,
        }
    }

    /// Feed one reading and get the stable value back.
    ///
    /// `Some(value)` appends to the history (evicting the oldest entry at
    /// capacity) and returns the arithmetic mean of the history.
    /// `None` leaves the history untouched and returns the last stable
    /// value, or 0.0 if no reading has ever arrived.
    pub fn push(&mut self, value: Option<f64>) -> f64 {
        let value = match value {
            Some(v) => v,
            None => return self.last_output,
        };

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(value);

        let mean = self.history.iter().sum::<f64>() / self.history.len() as f64;
        self.last_output = mean;
        mean
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
