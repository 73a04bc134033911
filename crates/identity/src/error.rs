use thiserror::Error;

use crate::ComponentIdentifier;

/// Failures of the identity registry and of identifier decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
	/// No descriptor is registered under the identifier. Usually a stale
	/// reference from a previous run or a cleared registry.
	#[error("no component registered for identifier {0:?}")]
	UnknownIdentifier(ComponentIdentifier),

	/// The input starts with neither prefix of the decoding format, or its
	/// generated part is not a sequence number.
	#[error("malformed component identifier {input:?}")]
	Malformed {
		/// The string that failed to decode.
		input: String,
	},

	/// The configured prefixes cannot be told apart while decoding.
	#[error("identifier prefixes {generated:?} and {stable:?} overlap")]
	AmbiguousPrefixes {
		/// Prefix requested for generated identifiers.
		generated: String,
		/// Prefix requested for stable identifiers.
		stable: String,
	},
}
