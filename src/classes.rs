//! # Class Registry
//!
//! Explicit per-class metadata for a training session: display name, color,
//! output emoji, trained flag and example count.
//!
//! - Starts from the configured initial classes (default green/purple/orange).
//! - Grows at runtime from a fixed pool of extra names, up to `max_classes`.
//! - Colors and emojis come from a built-in seed keyed by position; classes
//!   beyond the seed fall back to defaults.

use serde::Serialize;
use thiserror::Error;

use crate::config::ClassesConfig;
use crate::prediction::ClassIndex;

const FALLBACK_COLOR: &str = "#2baa5e";
const FALLBACK_EMOJI: &str = "😀";

/// Colors by class position.
const SEED_COLORS: [&str; 4] = ["#2baa5e", "#c95ac5", "#dd4d31", "#fbbc04"];

/// Emoji sets by class position; the first entry is the default output.
const SEED_EMOJIS: [&[&str]; 4] = [
    &["🟢", "🥝", "🥑", "🥬", "🥒", "🫒", "🍏", "🍐", "🌵", "🌲"],
    &["🟣", "🍇", "🔮", "💜", "☂️", "🪁", "🧞", "👾", "🦄", "🍆"],
    &["🟠", "🧡", "🦊", "🍊", "🥕", "🏀", "🔶", "🟧", "🦁", "🍑"],
    &["🟡", "💛", "🌟", "⭐", "🌻", "🍋", "🍌", "🐤", "🌞", "🟨"],
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassError {
    #[error("unknown class index {0}")]
    UnknownClass(ClassIndex),
    #[error("maximum number of classes reached ({0})")]
    LimitReached(usize),
    #[error("no more predefined class names available")]
    NamesExhausted,
    #[error("emoji must not be empty")]
    EmptyEmoji,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub index: ClassIndex,
    pub name: String,
    pub color: String,
    pub emoji: String,
    pub trained: bool,
    pub examples: u32,
}

#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: Vec<ClassInfo>,
    extra_pool: Vec<String>,
    max_classes: usize,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::from_config(&ClassesConfig::default())
    }
}

impl ClassRegistry {
    pub fn from_config(cfg: &ClassesConfig) -> Self {
        let mut reg = Self {
            classes: Vec::with_capacity(cfg.max_classes),
            extra_pool: cfg.extra.clone(),
            max_classes: cfg.max_classes.max(cfg.initial.len()),
        };
        for name in &cfg.initial {
            reg.push(name.clone());
        }
        reg
    }

    fn push(&mut self, name: String) -> ClassIndex {
        let index = self.classes.len();
        self.classes.push(ClassInfo {
            index,
            name,
            color: default_color(index).to_string(),
            emoji: default_emoji(index).to_string(),
            trained: false,
            examples: 0,
        });
        index
    }

    /// Add the next class from the extra-name pool.
    pub fn add_class(&mut self) -> Result<&ClassInfo, ClassError> {
        if self.classes.len() >= self.max_classes {
            return Err(ClassError::LimitReached(self.max_classes));
        }
        let next = self
            .extra_pool
            .iter()
            .find(|n| !self.classes.iter().any(|c| &c.name == *n))
            .cloned()
            .ok_or(ClassError::NamesExhausted)?;
        let index = self.push(next);
        Ok(&self.classes[index])
    }

    pub fn get(&self, index: ClassIndex) -> Result<&ClassInfo, ClassError> {
        self.classes.get(index).ok_or(ClassError::UnknownClass(index))
    }

    fn get_mut(&mut self, index: ClassIndex) -> Result<&mut ClassInfo, ClassError> {
        self.classes
            .get_mut(index)
            .ok_or(ClassError::UnknownClass(index))
    }

    /// One more training example captured for `index`.
    pub fn record_example(&mut self, index: ClassIndex) -> Result<u32, ClassError> {
        let c = self.get_mut(index)?;
        c.examples = c.examples.saturating_add(1);
        c.trained = true;
        Ok(c.examples)
    }

    /// Training data for `index` was deleted.
    pub fn clear_examples(&mut self, index: ClassIndex) -> Result<(), ClassError> {
        let c = self.get_mut(index)?;
        c.examples = 0;
        c.trained = false;
        Ok(())
    }

    pub fn set_emoji(&mut self, index: ClassIndex, emoji: &str) -> Result<(), ClassError> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ClassError::EmptyEmoji);
        }
        self.get_mut(index)?.emoji = emoji.to_string();
        Ok(())
    }

    pub fn all_trained(&self) -> bool {
        !self.classes.is_empty() && self.classes.iter().all(|c| c.trained)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn max_classes(&self) -> usize {
        self.max_classes
    }

    pub fn indices(&self) -> impl Iterator<Item = ClassIndex> + '_ {
        self.classes.iter().map(|c| c.index)
    }

    pub fn snapshot(&self) -> Vec<ClassInfo> {
        self.classes.clone()
    }
}

fn default_color(index: ClassIndex) -> &'static str {
    SEED_COLORS.get(index).copied().unwrap_or(FALLBACK_COLOR)
}

fn default_emoji(index: ClassIndex) -> &'static str {
    SEED_EMOJIS
        .get(index)
        .and_then(|set| set.first().copied())
        .unwrap_or(FALLBACK_EMOJI)
}

/// Emoji choices offered for a class position (empty beyond the seed).
pub fn emoji_choices(index: ClassIndex) -> &'static [&'static str] {
    SEED_EMOJIS.get(index).copied().unwrap_or(&[])
}
