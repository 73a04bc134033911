use core::fmt;
use core::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace, warn};

use crate::{ComponentIdentifier, IdentifierFormat, IdentityError};

/// A component descriptor that may carry its own stable identifier.
pub trait Contextual {
	/// Externally meaningful identifier, if the descriptor is passivation
	/// capable.
	fn passivation_id(&self) -> Option<&str>;
}

/// Bidirectional map between descriptors and [`ComponentIdentifier`]s.
///
/// Lookups and registrations for different descriptors never contend on a
/// global lock; a registration only holds the shard of its own key.
pub struct ContextualStore<D> {
	format: IdentifierFormat,
	next_id: AtomicU64,
	ids: DashMap<D, ComponentIdentifier, FxBuildHasher>,
	generated: DashMap<u64, D, FxBuildHasher>,
	stable: DashMap<Arc<str>, D, FxBuildHasher>,
}

impl<D> ContextualStore<D>
where
	D: Contextual + Eq + Hash + Clone,
{
	pub fn new() -> Self {
		Self::with_format(IdentifierFormat::default())
	}

	pub fn with_format(format: IdentifierFormat) -> Self {
		Self {
			format,
			next_id: AtomicU64::new(0),
			ids: DashMap::with_hasher(FxBuildHasher),
			generated: DashMap::with_hasher(FxBuildHasher),
			stable: DashMap::with_hasher(FxBuildHasher),
		}
	}

	pub fn format(&self) -> &IdentifierFormat {
		&self.format
	}

	/// Returns the identifier of `descriptor`, registering it on first use.
	///
	/// Descriptors with a passivation id always get it back as a stable
	/// identifier. All others get a sequence number; concurrent first calls
	/// for the same descriptor agree on one.
	pub fn id_of(&self, descriptor: &D) -> ComponentIdentifier {
		if let Some(passivation_id) = descriptor.passivation_id() {
			return self.register_stable(passivation_id, descriptor);
		}
		if let Some(id) = self.ids.get(descriptor) {
			return id.value().clone();
		}
		self.ids
			.entry(descriptor.clone())
			.or_insert_with(|| {
				let n = self.next_id.fetch_add(1, Ordering::Relaxed);
				self.generated.insert(n, descriptor.clone());
				trace!(id = n, "generated component identifier");
				ComponentIdentifier::Generated(n)
			})
			.value()
			.clone()
	}

	fn register_stable(&self, passivation_id: &str, descriptor: &D) -> ComponentIdentifier {
		let key: Arc<str> = passivation_id.into();
		match self.stable.entry(Arc::clone(&key)) {
			Entry::Occupied(existing) => {
				if existing.get() != descriptor {
					warn!(passivation_id, "passivation id already registered for another descriptor");
				}
			}
			Entry::Vacant(slot) => {
				slot.insert(descriptor.clone());
			}
		}
		ComponentIdentifier::Stable(key)
	}

	/// Returns the descriptor registered under `id`.
	pub fn descriptor_of(&self, id: &ComponentIdentifier) -> Result<D, IdentityError> {
		let found = match id {
			ComponentIdentifier::Generated(n) => self.generated.get(n).map(|d| d.value().clone()),
			ComponentIdentifier::Stable(s) => self.stable.get(s).map(|d| d.value().clone()),
		};
		found.ok_or_else(|| {
			warn!(id = %self.format.render(id), "stale component identifier");
			IdentityError::UnknownIdentifier(id.clone())
		})
	}

	/// Decodes `encoded` with this store's format and looks it up.
	pub fn descriptor_of_str(&self, encoded: &str) -> Result<D, IdentityError> {
		self.descriptor_of(&self.format.parse(encoded)?)
	}

	/// Drops every registration.
	///
	/// The sequence keeps counting, so identifiers issued before the clear
	/// stay unknown instead of resolving to a newer descriptor.
	pub fn clear(&self) {
		let dropped = self.len();
		self.ids.clear();
		self.generated.clear();
		self.stable.clear();
		debug!(dropped, "contextual store cleared");
	}

	/// Number of registered descriptors.
	pub fn len(&self) -> usize {
		self.ids.len() + self.stable.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<D> Default for ContextualStore<D>
where
	D: Contextual + Eq + Hash + Clone,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<D> fmt::Debug for ContextualStore<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContextualStore")
			.field("format", &self.format)
			.field("generated", &self.generated.len())
			.field("stable", &self.stable.len())
			.finish()
	}
}
