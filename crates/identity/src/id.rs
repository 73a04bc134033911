use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Identifier standing in for a component descriptor.
///
/// Ordering and equality never mix the two spaces: `Generated(1)` and
/// `Stable("1")` are different identifiers.
///
/// The serde form is tagged by space (`{"generated":3}`) and carries no
/// prefix. The prefixed string form belongs to an [`IdentifierFormat`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentIdentifier {
	/// Sequence number issued by a registry.
	Generated(u64),
	/// Passivation id carried by the descriptor itself.
	Stable(Arc<str>),
}

impl ComponentIdentifier {
	pub fn stable(id: impl Into<Arc<str>>) -> Self {
		Self::Stable(id.into())
	}

	pub fn is_generated(&self) -> bool {
		matches!(self, Self::Generated(_))
	}
}

/// Prefixes of the encoded identifier form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierFormat {
	generated_prefix: Arc<str>,
	stable_prefix: Arc<str>,
}

impl IdentifierFormat {
	pub const DEFAULT_GENERATED_PREFIX: &'static str = "WEAVE_G#";
	pub const DEFAULT_STABLE_PREFIX: &'static str = "WEAVE_S#";

	/// Fails if either prefix is empty or starts the other, since decoding
	/// could then not tell the spaces apart.
	pub fn new(generated_prefix: &str, stable_prefix: &str) -> Result<Self, IdentityError> {
		let overlapping = generated_prefix.is_empty()
			|| stable_prefix.is_empty()
			|| generated_prefix.starts_with(stable_prefix)
			|| stable_prefix.starts_with(generated_prefix);
		if overlapping {
			return Err(IdentityError::AmbiguousPrefixes {
				generated: generated_prefix.to_string(),
				stable: stable_prefix.to_string(),
			});
		}
		Ok(Self {
			generated_prefix: generated_prefix.into(),
			stable_prefix: stable_prefix.into(),
		})
	}

	pub fn generated_prefix(&self) -> &str {
		&self.generated_prefix
	}

	pub fn stable_prefix(&self) -> &str {
		&self.stable_prefix
	}

	pub fn render(&self, id: &ComponentIdentifier) -> String {
		match id {
			ComponentIdentifier::Generated(n) => format!("{}{n}", self.generated_prefix),
			ComponentIdentifier::Stable(s) => format!("{}{s}", self.stable_prefix),
		}
	}

	pub fn parse(&self, input: &str) -> Result<ComponentIdentifier, IdentityError> {
		let malformed = || IdentityError::Malformed {
			input: input.to_string(),
		};
		if let Some(n) = input.strip_prefix(&*self.generated_prefix) {
			return n.parse().map(ComponentIdentifier::Generated).map_err(|_| malformed());
		}
		match input.strip_prefix(&*self.stable_prefix) {
			Some(s) => Ok(ComponentIdentifier::stable(s)),
			None => Err(malformed()),
		}
	}
}

impl Default for IdentifierFormat {
	fn default() -> Self {
		Self {
			generated_prefix: Self::DEFAULT_GENERATED_PREFIX.into(),
			stable_prefix: Self::DEFAULT_STABLE_PREFIX.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(ComponentIdentifier::Generated(0), "WEAVE_G#0")]
	#[case(ComponentIdentifier::Generated(42), "WEAVE_G#42")]
	#[case(ComponentIdentifier::stable("orders.Cart"), "WEAVE_S#orders.Cart")]
	#[case(ComponentIdentifier::stable("WEAVE_G#7"), "WEAVE_S#WEAVE_G#7")]
	fn default_encoding(#[case] id: ComponentIdentifier, #[case] encoded: &str) {
		let format = IdentifierFormat::default();
		assert_eq!(format.render(&id), encoded);
		assert_eq!(format.parse(encoded).unwrap(), id);
	}

	#[rstest]
	#[case("")]
	#[case("orders.Cart")]
	#[case("WEAVE_G#")]
	#[case("WEAVE_G#-1")]
	#[case("WEAVE_G#abc")]
	fn malformed_input(#[case] input: &str) {
		assert_eq!(
			IdentifierFormat::default().parse(input).unwrap_err(),
			IdentityError::Malformed {
				input: input.to_string()
			}
		);
	}

	#[rstest]
	#[case("", "s:")]
	#[case("id", "id")]
	#[case("id", "id:stable")]
	#[case("gen:x", "gen:")]
	fn overlapping_prefixes_are_rejected(#[case] generated: &str, #[case] stable: &str) {
		assert!(matches!(
			IdentifierFormat::new(generated, stable),
			Err(IdentityError::AmbiguousPrefixes { .. })
		));
	}

	#[test]
	fn custom_format_routes_by_prefix() {
		let format = IdentifierFormat::new("g/", "s/").unwrap();
		assert_eq!(format.render(&ComponentIdentifier::Generated(3)), "g/3");
		assert_eq!(format.parse("s/cart").unwrap(), ComponentIdentifier::stable("cart"));
		assert!(format.parse("WEAVE_G#3").is_err());
	}

	#[test]
	fn serde_form_is_prefix_neutral() {
		let json = serde_json::to_string(&ComponentIdentifier::Generated(9)).unwrap();
		assert_eq!(json, r#"{"generated":9}"#);
		let back: ComponentIdentifier = serde_json::from_str(r#"{"stable":"cart"}"#).unwrap();
		assert_eq!(back, ComponentIdentifier::stable("cart"));
		assert!(serde_json::from_str::<ComponentIdentifier>(r#""WEAVE_S#cart""#).is_err());
	}

	#[test]
	fn serde_round_trip_survives_custom_prefixes() {
		let format = IdentifierFormat::new("g/", "s/").unwrap();
		let id = ComponentIdentifier::Generated(0);
		let json = serde_json::to_string(&id).unwrap();
		assert!(!json.contains("WEAVE"));
		let back: ComponentIdentifier = serde_json::from_str(&json).unwrap();
		assert_eq!(format.render(&back), "g/0");
	}

	proptest! {
		#[test]
		fn stable_ids_survive_encoding(raw in ".*") {
			let format = IdentifierFormat::default();
			let id = ComponentIdentifier::stable(raw.as_str());
			prop_assert_eq!(format.parse(&format.render(&id)).unwrap(), id);
		}
	}
}
