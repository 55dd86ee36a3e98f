//! # Session
//! Owner of one stabilizer plus the class metadata and output trigger around
//! it. All frames for one camera go through a single session, in order.
//!
//! Lifecycle rules: deleting a class's training data resets that class's
//! confidence history before the next frame is ingested; output unlocks the
//! first time every class is trained and stays unlocked.

use serde::Serialize;
use tracing::{debug, info};

use crate::classes::{ClassError, ClassInfo, ClassRegistry};
use crate::config::AppConfig;
use crate::output::{OutputTrigger, Selection};
use crate::prediction::{ClassIndex, RawPrediction, StabilizedPrediction};
use crate::stabilizer::PredictionStabilizer;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    pub prediction: StabilizedPrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    pub output_enabled: bool,
}

#[derive(Debug)]
pub struct Session {
    stabilizer: PredictionStabilizer,
    classes: ClassRegistry,
    output: OutputTrigger,
    output_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Session {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let classes = ClassRegistry::from_config(&cfg.classes);
        let stabilizer = PredictionStabilizer::with_classes(cfg.stabilizer, classes.indices());
        Self {
            stabilizer,
            classes,
            output: OutputTrigger::new(),
            output_enabled: false,
        }
    }

    /// Entries for indices at or past `max_classes` are dropped before
    /// ingesting, so they never get a history slot.
    pub fn on_frame(&mut self, raw: &RawPrediction) -> FrameOutcome {
        let limit = self.classes.max_classes();
        let prediction = if raw.confidences.keys().all(|&i| i < limit) {
            self.stabilizer.ingest(raw)
        } else {
            let kept = RawPrediction::new(
                raw.confidences
                    .iter()
                    .filter(|&(&i, _)| i < limit)
                    .map(|(&i, &v)| (i, v))
                    .collect(),
            );
            debug!(
                dropped = raw.confidences.len() - kept.confidences.len(),
                max_classes = limit,
                "frame carried class indices past the limit"
            );
            self.stabilizer.ingest(&kept)
        };
        let selection = if self.output_enabled {
            self.output.on_prediction(&prediction, &self.classes)
        } else {
            None
        };
        FrameOutcome {
            prediction,
            selection,
            output_enabled: self.output_enabled,
        }
    }

    pub fn add_class(&mut self) -> Result<ClassInfo, ClassError> {
        let info = self.classes.add_class()?.clone();
        self.stabilizer.declare_class(info.index);
        info!(class = info.index, name = %info.name, "class added");
        Ok(info)
    }

    /// Returns the new example count for the class.
    pub fn record_example(&mut self, index: ClassIndex) -> Result<u32, ClassError> {
        let n = self.classes.record_example(index)?;
        if !self.output_enabled && self.classes.all_trained() {
            self.output_enabled = true;
            info!("all classes trained, enabling output");
        }
        Ok(n)
    }

    pub fn delete_class_data(&mut self, index: ClassIndex) -> Result<(), ClassError> {
        self.output.suspend();
        let res = self.classes.clear_examples(index);
        if res.is_ok() {
            self.stabilizer.reset_class(index);
            info!(class = index, "class data deleted");
        }
        self.output.resume();
        res
    }

    pub fn set_emoji(&mut self, index: ClassIndex, emoji: &str) -> Result<(), ClassError> {
        self.classes.set_emoji(index, emoji)
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn stabilizer(&self) -> &PredictionStabilizer {
        &self.stabilizer
    }

    /// Direct access for hosts that speak raw JSON (pass-through semantics).
    pub fn stabilizer_mut(&mut self) -> &mut PredictionStabilizer {
        &mut self.stabilizer
    }

    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }
}
