//! prediction.rs: Raw and stabilized prediction shapes.
//!
//! `RawPrediction` is what the external k-NN classifier hands us once per
//! frame; `StabilizedPrediction` is what the renderer consumes. Both travel
//! as JSON between the browser and the host, so the wire names follow the
//! classifier's own (`classIndex`, `confidences`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index of a trainable class (dense, starting at 0).
pub type ClassIndex = usize;

/// Sentinel for "no class cleared the confidence threshold".
pub const NO_DECISION: i32 = -1;

/// Largest index that still fits the wire's signed `classIndex`.
pub const MAX_CLASS_INDEX: ClassIndex = i32::MAX as ClassIndex;

/// One frame of classifier output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub confidences: BTreeMap<ClassIndex, f64>,
}

impl RawPrediction {
    pub fn new(confidences: BTreeMap<ClassIndex, f64>) -> Self {
        Self { confidences }
    }

    /// Build from dense values where position = class index.
    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            confidences: values.iter().copied().enumerate().collect(),
        }
    }

    /// Tolerant parse of the classifier's JSON.
    ///
    /// Accepts `{"confidences": {"0": 0.9, "1": 0.1}}` or
    /// `{"confidences": [0.9, 0.1]}`; other members (e.g. the classifier's own
    /// `classIndex`) are ignored. Returns `None` for anything malformed:
    /// a missing or null `confidences`, non-integer keys or keys above
    /// [`MAX_CLASS_INDEX`], non-numeric or non-finite values.
    pub fn from_value(v: &Value) -> Option<Self> {
        let conf = v.as_object()?.get("confidences")?;
        let mut out = BTreeMap::new();

        match conf {
            Value::Object(map) => {
                for (k, val) in map {
                    let idx: ClassIndex = k.trim().parse().ok()?;
                    if idx > MAX_CLASS_INDEX {
                        return None;
                    }
                    out.insert(idx, finite(val)?);
                }
            }
            Value::Array(arr) => {
                for (idx, val) in arr.iter().enumerate() {
                    out.insert(idx, finite(val)?);
                }
            }
            _ => return None,
        }

        Some(Self { confidences: out })
    }
}

fn finite(v: &Value) -> Option<f64> {
    let f = v.as_f64()?;
    f.is_finite().then_some(f)
}

/// Smoothed decision handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizedPrediction {
    /// Winning class, or [`NO_DECISION`].
    #[serde(rename = "classIndex")]
    pub class_index: i32,
    /// Recency-weighted mean per class. Independent means, so the values do
    /// not sum to 1; see [`StabilizedPrediction::distribution`].
    #[serde(rename = "confidences")]
    pub smoothed_confidences: BTreeMap<ClassIndex, f64>,
}

impl StabilizedPrediction {
    pub fn uncertain(smoothed_confidences: BTreeMap<ClassIndex, f64>) -> Self {
        Self {
            class_index: NO_DECISION,
            smoothed_confidences,
        }
    }

    /// An index above [`MAX_CLASS_INDEX`] cannot be reported and yields an
    /// uncertain prediction.
    pub fn decided(index: ClassIndex, smoothed_confidences: BTreeMap<ClassIndex, f64>) -> Self {
        Self {
            class_index: i32::try_from(index).unwrap_or(NO_DECISION),
            smoothed_confidences,
        }
    }

    /// The selected class, if any. Callers must go through this (or compare
    /// against [`NO_DECISION`]) before acting on `class_index`.
    pub fn selected(&self) -> Option<ClassIndex> {
        usize::try_from(self.class_index).ok()
    }

    pub fn is_uncertain(&self) -> bool {
        self.class_index == NO_DECISION
    }

    /// Smoothed confidence of one class (0.0 when it has no history).
    pub fn confidence_of(&self, index: ClassIndex) -> f64 {
        self.smoothed_confidences.get(&index).copied().unwrap_or(0.0)
    }

    /// Renormalized copy of the smoothed confidences that sums to 1.
    /// All-zero input stays all-zero.
    pub fn distribution(&self) -> BTreeMap<ClassIndex, f64> {
        let total: f64 = self.smoothed_confidences.values().sum();
        if total <= 0.0 {
            return self.smoothed_confidences.clone();
        }
        self.smoothed_confidences
            .iter()
            .map(|(&k, &v)| (k, v / total))
            .collect()
    }
}
