//! Error types for engine configuration and operation.

use std::path::PathBuf;

use thiserror::Error;
use weave_identity::IdentityError;
use weave_intercept::ModelError;

/// Errors raised while loading an [`crate::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// File that was being read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or does not match the config schema.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The `[identity]` prefixes cannot be used to decode identifiers.
	#[error("invalid identifier prefixes: {0}")]
	Identity(#[from] IdentityError),
}

/// Errors surfaced by [`crate::Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
	/// The engine was given an unusable configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Interception metadata or a model could not be produced.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// An identifier could not be decoded or resolved.
	#[error(transparent)]
	Identity(#[from] IdentityError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
