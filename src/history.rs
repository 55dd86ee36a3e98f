//! # Confidence History
//! Bounded FIFO of recent confidence values for one class.
//!
//! Oldest values are evicted once the capacity is exceeded, so the smoothing
//! window never grows past `cap` entries.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ConfidenceHistory {
    buf: VecDeque<f64>,
    cap: usize,
}

impl ConfidenceHistory {
    /// Capacity is clamped to at least 1.
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            buf: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append the newest value, dropping the oldest past capacity.
    /// Non-finite values are ignored.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.buf.push_back(value);
        while self.buf.len() > self.cap {
            self.buf.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Recency-weighted mean: the i-th value (1-based, oldest first) weighs i.
    /// `None` while the history is empty.
    ///
    /// The result is clamped to the window's min..=max, so a constant stream
    /// smooths to exactly that constant despite rounding in the sums.
    pub fn weighted_mean(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }

        let mut weighted_sum = 0.0f64;
        let mut total_weight = 0.0f64;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (i, &v) in self.buf.iter().enumerate() {
            let w = (i + 1) as f64;
            weighted_sum += v * w;
            total_weight += w;
            lo = lo.min(v);
            hi = hi.max(v);
        }

        Some((weighted_sum / total_weight).clamp(lo, hi))
    }

    /// Values oldest → newest (diagnostics).
    pub fn values(&self) -> Vec<f64> {
        self.buf.iter().copied().collect()
    }
}
