#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Memoization for read-only descriptive metadata.
//!
//! # Purpose
//!
//! Computing the interception-relevant shape of a type (its advice methods,
//! its interceptor kind, its own self-interception) walks the type hierarchy
//! through the introspection provider. That work is paid once per key and
//! then served from a [`MetadataCache`].
//!
//! # Mental Model
//!
//! Each cache is a map from key to a per-key cell. A lookup clones the cell
//! handle out of the map and initializes it outside the map lock, so distinct
//! keys never contend and a slow computation for one key never blocks lookups
//! of another.
//!
//! # Invariants
//!
//! - A key, once computed, yields the same value until the cache is invalidated.
//!   - Enforced in: [`cache::MetadataCache::get_or_try_insert_with`].
//!   - Tested by: `cache::tests::concurrent_first_access_computes_once`.
//! - Failures are never memoized.
//!   - Enforced in: [`cache::MetadataCache::get_or_try_insert_with`] (the cell stays empty).
//!   - Tested by: `cache::tests::failures_are_retried`.
//! - Interned handles are an optimization only; a purged entry is re-interned
//!   to an equal value.
//!   - Enforced in: [`interner::Interner::intern`].
//!   - Tested by: `interner::tests::purged_entries_reintern_equal_values`.

pub mod cache;
pub mod interner;

pub use cache::{ComputingCache, MetadataCache};
pub use interner::Interner;
