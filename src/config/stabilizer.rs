// src/config/stabilizer.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/stabilizer.toml";
pub const DEFAULT_HISTORY_SIZE: usize = 10;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;
pub const DEFAULT_MAX_CLASSES: usize = 6;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

pub const ENV_CONFIG_PATH: &str = "STABILIZER_CONFIG_PATH";
pub const ENV_THRESHOLD: &str = "STABILIZER_THRESHOLD";
pub const ENV_HISTORY_SIZE: &str = "STABILIZER_HISTORY_SIZE";
pub const ENV_MAX_CLASSES: &str = "STABILIZER_MAX_CLASSES";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}
fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_max_classes() -> usize {
    DEFAULT_MAX_CLASSES
}
fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
fn default_initial_classes() -> Vec<String> {
    ["green", "purple", "orange"].map(String::from).to_vec()
}
fn default_extra_classes() -> Vec<String> {
    ["red", "blue", "yellow", "teal"].map(String::from).to_vec()
}

/// Smoothing window and decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Per-class history length `H`.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Smoothed confidences below this value yield "no decision".
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl StabilizerConfig {
    /// Replace out-of-range values with defaults.
    pub fn sanitized(mut self) -> Self {
        if self.history_size == 0 {
            warn!(history_size = self.history_size, "history_size must be >= 1, using default");
            self.history_size = DEFAULT_HISTORY_SIZE;
        }
        if !self.confidence_threshold.is_finite() || !(0.0..=1.0).contains(&self.confidence_threshold) {
            warn!(
                threshold = self.confidence_threshold,
                "confidence_threshold outside <0,1>, using default"
            );
            self.confidence_threshold = DEFAULT_CONFIDENCE_THRESHOLD;
        }
        self
    }
}

/// Class names the session starts with and may grow into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassesConfig {
    #[serde(default = "default_initial_classes")]
    pub initial: Vec<String>,
    /// Pool of names handed out, in order, when a class is added at runtime.
    #[serde(default = "default_extra_classes")]
    pub extra: Vec<String>,
    #[serde(default = "default_max_classes")]
    pub max_classes: usize,
}

impl Default for ClassesConfig {
    fn default() -> Self {
        Self {
            initial: default_initial_classes(),
            extra: default_extra_classes(),
            max_classes: DEFAULT_MAX_CLASSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub classes: ClassesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parse stabilizer config TOML")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading stabilizer config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Resolve config in this order:
    /// 1) $STABILIZER_CONFIG_PATH (must exist)
    /// 2) config/stabilizer.toml
    /// 3) built-in defaults
    ///
    /// then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let base = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from_file(&pb)?
                } else {
                    info!("no stabilizer config file found, using defaults");
                    Self::default()
                }
            }
        };
        Ok(base.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(t) = parse_threshold_env(std::env::var(ENV_THRESHOLD).ok()) {
            self.stabilizer.confidence_threshold = t;
        }
        if let Some(h) = parse_usize_env(std::env::var(ENV_HISTORY_SIZE).ok()) {
            self.stabilizer.history_size = h;
        }
        if let Some(m) = parse_usize_env(std::env::var(ENV_MAX_CLASSES).ok()) {
            self.classes.max_classes = m;
        }
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            if !addr.trim().is_empty() {
                self.server.bind_addr = addr.trim().to_string();
            }
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.stabilizer = self.stabilizer.sanitized();
        let floor = self.classes.initial.len().max(1);
        if self.classes.max_classes < floor {
            warn!(
                max_classes = self.classes.max_classes,
                initial = self.classes.initial.len(),
                "max_classes below initial class count, raising"
            );
            self.classes.max_classes = floor;
        }
        self
    }
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

fn parse_usize_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
}
