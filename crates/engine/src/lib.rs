//! Services handle for the interception and identity core.
//!
//! An [`Engine`] owns the metadata caches, the model initializer and the
//! identity registry of one container and is passed to whatever needs them.
//! There is no process-wide state: two engines never share an entry.

mod config;
mod engine;
mod error;

pub use config::{EngineConfig, IdentityConfig, MetadataConfig};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, Result};
