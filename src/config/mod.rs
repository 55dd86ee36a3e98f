//! Runtime configuration (TOML file + env overrides).

pub mod stabilizer;

pub use stabilizer::{AppConfig, ClassesConfig, ServerConfig, StabilizerConfig};
