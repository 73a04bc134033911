//! Identity registry for component descriptors.
//!
//! # Purpose
//!
//! Gives every component descriptor a compact [`ComponentIdentifier`] that can
//! stand in for it across a serialization boundary, and turns identifiers back
//! into descriptors on restore.
//!
//! # Mental Model
//!
//! Two disjoint identifier spaces share one string encoding:
//!
//! - **Stable**: the descriptor carries its own passivation id. The
//!   identifier wraps it and is the same for every registry and every run.
//! - **Generated**: everything else gets the next sequence number the first
//!   time it is seen. Numbers are only meaningful to the registry that issued
//!   them.
//!
//! The encoded form starts with a prefix per space, so decoding routes without
//! consulting either map.
//!
//! # Invariants
//!
//! - Must never assign a generated identifier to a descriptor with a
//!   passivation id.
//!   - Enforced in: [`ContextualStore::id_of`].
//!   - Tested by: `store::tests::stable_descriptors_never_get_generated_ids`
//!
//! - Must hand out one identifier per descriptor, even under a concurrent
//!   first registration burst.
//!   - Enforced in: [`ContextualStore::id_of`] (entry insert under the shard lock).
//!   - Tested by: `store::tests::concurrent_burst_has_one_winner`
//!   - Failure symptom: A restored session resolves to a different component
//!     than the one that was passivated.

mod error;
mod id;
mod passivation;
mod store;

pub use error::IdentityError;
pub use id::{ComponentIdentifier, IdentifierFormat};
pub use passivation::PassivationHandle;
pub use store::{Contextual, ContextualStore};
