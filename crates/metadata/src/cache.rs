use core::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

/// Named memoization table.
///
/// Values are computed on first access and shared afterwards. Concurrent
/// first accesses to the same key are serialized on that key's cell, so the
/// compute function runs at most once per key per cache generation.
pub struct MetadataCache<K, V> {
	name: &'static str,
	cells: DashMap<K, Arc<OnceCell<V>>, FxBuildHasher>,
}

impl<K, V> MetadataCache<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	/// Creates an empty cache. `name` labels log events.
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			cells: DashMap::with_hasher(FxBuildHasher),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the memoized value for `key`, computing it with `compute` on
	/// first access.
	///
	/// An `Err` from `compute` is returned to the caller and leaves the key
	/// uncomputed; the next access retries.
	pub fn get_or_try_insert_with<E, F>(&self, key: &K, compute: F) -> Result<V, E>
	where
		F: FnOnce(&K) -> Result<V, E>,
	{
		if let Some(v) = self.get(key) {
			return Ok(v);
		}

		// Clone the cell out so the shard lock is released before computing.
		let cell = Arc::clone(&*self.cells.entry(key.clone()).or_default());
		let computed = cell.get_or_try_init(|| {
			trace!(cache = self.name, "metadata cache miss");
			compute(key)
		});
		match computed {
			Ok(value) => Ok(value.clone()),
			Err(error) => {
				// Drop the cell only while it is still this empty one; a
				// concurrent retry may have filled or replaced it.
				self.cells
					.remove_if(key, |_, c| Arc::ptr_eq(c, &cell) && c.get().is_none());
				Err(error)
			}
		}
	}

	/// Infallible variant of [`Self::get_or_try_insert_with`].
	pub fn get_or_insert_with<F>(&self, key: &K, compute: F) -> V
	where
		F: FnOnce(&K) -> V,
	{
		match self.get_or_try_insert_with::<core::convert::Infallible, _>(key, |k| Ok(compute(k))) {
			Ok(v) => v,
			Err(never) => match never {},
		}
	}

	/// Returns the value for `key` if it has already been computed.
	pub fn get(&self, key: &K) -> Option<V> {
		self.cells.get(key).and_then(|cell| cell.get().cloned())
	}

	pub fn contains(&self, key: &K) -> bool {
		self.get(key).is_some()
	}

	/// Number of computed entries.
	pub fn len(&self) -> usize {
		self.cells.iter().filter(|e| e.value().get().is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops every entry.
	///
	/// A computation racing with invalidation completes into a detached cell;
	/// its result is returned to that caller but not retained.
	pub fn invalidate_all(&self) {
		let dropped = self.cells.len();
		self.cells.clear();
		debug!(cache = self.name, dropped, "metadata cache invalidated");
	}
}

impl<K: Eq + Hash, V> fmt::Debug for MetadataCache<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MetadataCache")
			.field("name", &self.name)
			.field("cells", &self.cells.len())
			.finish()
	}
}

type Loader<K, V, E> = Box<dyn Fn(&K) -> Result<V, E> + Send + Sync>;

/// A [`MetadataCache`] bundled with the function that computes its values.
pub struct ComputingCache<K, V, E> {
	cache: MetadataCache<K, V>,
	loader: Loader<K, V, E>,
}

impl<K, V, E> ComputingCache<K, V, E>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	pub fn new<F>(name: &'static str, loader: F) -> Self
	where
		F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	{
		Self {
			cache: MetadataCache::new(name),
			loader: Box::new(loader),
		}
	}

	pub fn get(&self, key: &K) -> Result<V, E> {
		self.cache.get_or_try_insert_with(key, |k| (self.loader)(k))
	}

	pub fn peek(&self, key: &K) -> Option<V> {
		self.cache.get(key)
	}

	pub fn invalidate_all(&self) {
		self.cache.invalidate_all();
	}

	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}
}

impl<K: Eq + Hash, V, E> fmt::Debug for ComputingCache<K, V, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComputingCache").field(&self.cache).finish()
	}
}
