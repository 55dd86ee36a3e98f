//! output.rs: "class selected" trigger for the output panel.
//!
//! Fires only for stabilized predictions that carry a decision. While a
//! clearing operation is in progress the trigger is suspended: nothing fires
//! and the current selection is dropped.

use serde::Serialize;
use tracing::debug;

use crate::classes::ClassRegistry;
use crate::prediction::{ClassIndex, StabilizedPrediction};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub class_index: ClassIndex,
    pub class_name: String,
    pub emoji: String,
    pub color: String,
    /// Differs from the previously emitted selection.
    pub changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OutputTrigger {
    current: Option<ClassIndex>,
    suspended: bool,
}

impl OutputTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prediction(
        &mut self,
        prediction: &StabilizedPrediction,
        classes: &ClassRegistry,
    ) -> Option<Selection> {
        if self.suspended {
            return None;
        }
        let index = prediction.selected()?;
        let Ok(info) = classes.get(index) else {
            debug!(class = index, "decision for unregistered class, not triggering");
            return None;
        };

        let changed = self.current != Some(index);
        self.current = Some(index);
        if changed {
            debug!(class = index, name = %info.name, "output selection changed");
        }

        Some(Selection {
            class_index: index,
            class_name: info.name.clone(),
            emoji: info.emoji.clone(),
            color: info.color.clone(),
            changed,
        })
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
        self.current = None;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn current(&self) -> Option<ClassIndex> {
        self.current
    }
}
