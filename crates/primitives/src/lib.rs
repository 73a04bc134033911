//! Core types shared by every weave crate: interception phases, type and
//! operation identity, dynamic values, declarative markers, and the
//! invocation failure wrapper.

/// Invocation failures and reflective wrapper unwrapping.
pub mod error;
/// Type and operation identity.
pub mod ids;
/// Declarative markers attached to types and operations.
pub mod marker;
/// Operation handles and dynamic values.
pub mod method;
/// Interception phases.
pub mod phase;

pub use error::{BoxError, InvocationError};
pub use ids::{MethodSignature, TypeKey};
pub use marker::{Marker, MarkerSet};
pub use method::{Instance, Method, MethodInvoker, Value, value};
pub use phase::Phase;
