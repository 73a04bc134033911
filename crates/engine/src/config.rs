use std::path::Path;

use serde::{Deserialize, Serialize};
use weave_identity::IdentifierFormat;

use crate::ConfigError;

/// Engine settings, usually read from a TOML file.
///
/// ```toml
/// [identity]
/// generated_prefix = "WEAVE_G#"
/// stable_prefix = "WEAVE_S#"
///
/// [metadata]
/// release_bootstrap_caches = true
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	pub identity: IdentityConfig,
	pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
	pub generated_prefix: String,
	pub stable_prefix: String,
}

impl Default for IdentityConfig {
	fn default() -> Self {
		Self {
			generated_prefix: IdentifierFormat::DEFAULT_GENERATED_PREFIX.to_string(),
			stable_prefix: IdentifierFormat::DEFAULT_STABLE_PREFIX.to_string(),
		}
	}
}

impl IdentityConfig {
	pub fn format(&self) -> Result<IdentifierFormat, ConfigError> {
		Ok(IdentifierFormat::new(&self.generated_prefix, &self.stable_prefix)?)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
	/// Release bootstrap-only metadata when initialization ends.
	pub release_bootstrap_caches: bool,
}

impl Default for MetadataConfig {
	fn default() -> Self {
		Self {
			release_bootstrap_caches: true,
		}
	}
}

impl EngineConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.identity.format()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}
}
