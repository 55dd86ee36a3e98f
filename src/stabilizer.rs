//! # Prediction Stabilizer
//! Pure, synchronous filter between the raw per-frame classifier output and
//! the renderer. No I/O.
//!
//! Per frame:
//! 1. push each class's raw confidence into its bounded history,
//! 2. smooth every non-empty history with a linear recency ramp
//!    (`sum(v_i * i) / sum(i)`, `i` = 1 for the oldest entry),
//! 3. pick the strict maximum in ascending class order (ties keep the lower
//!    index),
//! 4. gate it on the confidence threshold: `< threshold` ⇒ [`NO_DECISION`](crate::prediction::NO_DECISION).

use std::collections::BTreeMap;

use metrics::counter;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::StabilizerConfig;
use crate::history::ConfidenceHistory;
use crate::prediction::{ClassIndex, RawPrediction, StabilizedPrediction, MAX_CLASS_INDEX};

pub const METRIC_FRAMES: &str = "stabilizer_frames_total";
pub const METRIC_UNCERTAIN: &str = "stabilizer_uncertain_total";
pub const METRIC_PASSTHROUGH: &str = "stabilizer_passthrough_total";
pub const METRIC_RESETS: &str = "stabilizer_class_resets_total";

#[derive(Debug, Clone)]
pub struct PredictionStabilizer {
    cfg: StabilizerConfig,
    history: BTreeMap<ClassIndex, ConfidenceHistory>,
}

impl Default for PredictionStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

impl PredictionStabilizer {
    pub fn new(cfg: StabilizerConfig) -> Self {
        Self {
            cfg: cfg.sanitized(),
            history: BTreeMap::new(),
        }
    }

    /// Start with empty histories for `classes` already declared.
    /// Unknown indices are still accepted later.
    pub fn with_classes(cfg: StabilizerConfig, classes: impl IntoIterator<Item = ClassIndex>) -> Self {
        let mut s = Self::new(cfg);
        for idx in classes {
            s.declare_class(idx);
        }
        s
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.cfg
    }

    /// Make sure `index` has a (possibly empty) history.
    pub fn declare_class(&mut self, index: ClassIndex) {
        let cap = self.cfg.history_size;
        self.history
            .entry(index)
            .or_insert_with(|| ConfidenceHistory::with_capacity(cap));
    }

    /// Feed one frame and get the stabilized decision.
    pub fn ingest(&mut self, raw: &RawPrediction) -> StabilizedPrediction {
        counter!(METRIC_FRAMES).increment(1);

        let cap = self.cfg.history_size;
        for (&idx, &conf) in &raw.confidences {
            if idx > MAX_CLASS_INDEX {
                debug!(class = idx, "class index out of range, ignoring");
                continue;
            }
            self.history
                .entry(idx)
                .or_insert_with(|| ConfidenceHistory::with_capacity(cap))
                .push(conf);
        }

        let smoothed: BTreeMap<ClassIndex, f64> = self
            .history
            .iter()
            .filter_map(|(&idx, h)| h.weighted_mean().map(|m| (idx, m)))
            .collect();

        // BTreeMap iterates in ascending index order, so only a strictly
        // greater value replaces the leader.
        let mut leader: Option<ClassIndex> = None;
        let mut leader_conf = 0.0f64;
        for (&idx, &conf) in &smoothed {
            if conf > leader_conf {
                leader_conf = conf;
                leader = Some(idx);
            }
        }

        match leader {
            Some(idx) if leader_conf >= self.cfg.confidence_threshold => {
                trace!(class = idx, confidence = leader_conf, "stabilized decision");
                StabilizedPrediction::decided(idx, smoothed)
            }
            _ => {
                counter!(METRIC_UNCERTAIN).increment(1);
                debug!(
                    leader = ?leader,
                    confidence = leader_conf,
                    threshold = self.cfg.confidence_threshold,
                    "below threshold, no decision"
                );
                StabilizedPrediction::uncertain(smoothed)
            }
        }
    }

    /// Typed pass-through: an absent frame stays absent and leaves the
    /// history untouched.
    pub fn ingest_opt(&mut self, raw: Option<&RawPrediction>) -> Option<StabilizedPrediction> {
        match raw {
            Some(r) => Some(self.ingest(r)),
            None => {
                counter!(METRIC_PASSTHROUGH).increment(1);
                None
            }
        }
    }

    /// JSON entry point used by the HTTP host. Anything that does not parse
    /// as a [`RawPrediction`] is returned unchanged.
    pub fn ingest_value(&mut self, value: Value) -> Value {
        let Some(raw) = RawPrediction::from_value(&value) else {
            counter!(METRIC_PASSTHROUGH).increment(1);
            debug!("malformed prediction, passing through");
            return value;
        };
        let out = self.ingest(&raw);
        serde_json::to_value(&out).unwrap_or(value)
    }

    /// Forget the history of one class (its training data was deleted).
    /// Unknown indices are a no-op.
    pub fn reset_class(&mut self, index: ClassIndex) {
        if let Some(h) = self.history.get_mut(&index) {
            h.clear();
            counter!(METRIC_RESETS).increment(1);
            debug!(class = index, "confidence history reset");
        }
    }

    /// Current history length of a class (0 when unknown).
    pub fn history_len(&self, index: ClassIndex) -> usize {
        self.history.get(&index).map_or(0, ConfidenceHistory::len)
    }

    pub fn known_classes(&self) -> Vec<ClassIndex> {
        self.history.keys().copied().collect()
    }

    /// Smoothed value of one class from its current history, without ingesting.
    pub fn smoothed(&self, index: ClassIndex) -> Option<f64> {
        self.history.get(&index).and_then(ConfidenceHistory::weighted_mean)
    }
}
