//! Canonicalization table for structurally equal metadata.
//!
//! Equal marker sets appear on many types and operations; interning them
//! lets every owner share one allocation and compare by pointer first.
//! Entries hold weak references, so a value no longer owned anywhere can be
//! dropped by [`Interner::purge`] and re-interned later.

use core::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;
use tracing::debug;

pub struct Interner<T> {
	name: &'static str,
	entries: DashMap<T, Weak<T>, FxBuildHasher>,
}

impl<T> Interner<T>
where
	T: Eq + Hash + Clone,
{
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			entries: DashMap::with_hasher(FxBuildHasher),
		}
	}

	/// Returns the shared handle for a value equal to `value`.
	pub fn intern(&self, value: T) -> Arc<T> {
		match self.entries.entry(value) {
			Entry::Occupied(mut o) => {
				if let Some(live) = o.get().upgrade() {
					return live;
				}
				let fresh = Arc::new(o.key().clone());
				o.insert(Arc::downgrade(&fresh));
				fresh
			}
			Entry::Vacant(v) => {
				let fresh = Arc::new(v.key().clone());
				v.insert(Arc::downgrade(&fresh));
				fresh
			}
		}
	}

	/// Number of table entries, including dead ones not yet purged.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Removes entries whose values are no longer referenced.
	pub fn purge(&self) -> usize {
		let before = self.entries.len();
		self.entries.retain(|_, w| w.strong_count() > 0);
		let purged = before.saturating_sub(self.entries.len());
		debug!(interner = self.name, purged, "interner purged");
		purged
	}

	pub fn clear(&self) {
		self.entries.clear();
	}
}

impl<T: Eq + Hash> fmt::Debug for Interner<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interner")
			.field("name", &self.name)
			.field("entries", &self.entries.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use proptest::prelude::*;

	use super::*;

	#[test]
	fn equal_values_share_one_handle() {
		let interner: Interner<Vec<&'static str>> = Interner::new("test");
		let a = interner.intern(vec!["Logged", "Tx"]);
		let b = interner.intern(vec!["Logged", "Tx"]);
		let c = interner.intern(vec!["Tx"]);
		assert!(Arc::ptr_eq(&a, &b));
		assert!(!Arc::ptr_eq(&a, &c));
		assert_eq!(interner.len(), 2);
	}

	#[test]
	fn purged_entries_reintern_equal_values() {
		let interner: Interner<String> = Interner::new("test");
		let first = interner.intern("Tx".to_string());
		drop(first);
		assert_eq!(interner.purge(), 1);
		assert!(interner.is_empty());

		let again = interner.intern("Tx".to_string());
		assert_eq!(again.as_str(), "Tx");
	}

	#[test]
	fn dead_entry_is_replaced_without_purge() {
		let interner: Interner<u64> = Interner::new("test");
		drop(interner.intern(9));
		let live = interner.intern(9);
		let again = interner.intern(9);
		assert!(Arc::ptr_eq(&live, &again));
		assert_eq!(interner.purge(), 0);
	}

	#[test]
	fn debug_counts_entries() {
		let interner: Interner<u8> = Interner::new("markers");
		let _held = interner.intern(1);
		assert_eq!(format!("{interner:?}"), r#"Interner { name: "markers", entries: 1 }"#);
	}

	#[test]
	fn concurrent_interning_converges() {
		let interner: Interner<String> = Interner::new("test");
		let handles: Vec<Arc<String>> = thread::scope(|s| {
			let joins: Vec<_> = (0..8)
				.map(|_| s.spawn(|| interner.intern("shared".to_string())))
				.collect();
			joins.into_iter().map(|j| j.join().unwrap()).collect()
		});
		assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
	}

	proptest! {
		#[test]
		fn interned_value_equals_input(values in proptest::collection::vec(0u16..32, 1..40)) {
			let interner: Interner<u16> = Interner::new("prop");
			let held: Vec<Arc<u16>> = values.iter().map(|v| interner.intern(*v)).collect();
			for (v, h) in values.iter().zip(&held) {
				prop_assert_eq!(**h, *v);
			}
		}
	}
}
