use core::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::{Contextual, ContextualStore, IdentityError};

/// Serialized stand-in for a component descriptor.
///
/// Holds only the encoded identifier, in the format of the store that
/// captured it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassivationHandle {
	id: String,
}

impl PassivationHandle {
	pub fn capture<D>(store: &ContextualStore<D>, descriptor: &D) -> Self
	where
		D: Contextual + Eq + Hash + Clone,
	{
		Self {
			id: store.format().render(&store.id_of(descriptor)),
		}
	}

	/// Resolves the handle against `store`.
	///
	/// Fails with [`IdentityError::UnknownIdentifier`] when the descriptor is
	/// no longer registered, for example after a restart that reissued
	/// generated identifiers.
	pub fn restore<D>(&self, store: &ContextualStore<D>) -> Result<D, IdentityError>
	where
		D: Contextual + Eq + Hash + Clone,
	{
		store.descriptor_of_str(&self.id)
	}

	pub fn as_str(&self) -> &str {
		&self.id
	}
}
