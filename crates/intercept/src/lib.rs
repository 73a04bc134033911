#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Interception models and invocation chains.
//!
//! # Purpose
//!
//! For every managed type this crate builds an [`InterceptionModel`]: which
//! interceptors apply to which phase and operation, in which order, and
//! which operations opt out of type-level interceptors. At invocation time the
//! model plus a live target produce an [`InterceptionChain`] that runs the
//! interceptors around the real operation.
//!
//! # Mental Model
//!
//! 1. **Metadata:** [`InterceptionCaches`] turns introspected type
//!    descriptions into [`InterceptorClassMetadata`] once per type.
//! 2. **Model:** [`ModelInitializer`] feeds that metadata into an
//!    [`InterceptionModelBuilder`], a single-use state machine that freezes
//!    into an immutable [`InterceptionModel`].
//! 3. **Instances:** [`InterceptionContext`] creates one interceptor instance
//!    per interceptor type for a given target instance.
//! 4. **Execution:** [`InterceptedInstance`] flattens the applicable
//!    [`InterceptorInvocation`]s into a chain and drives it through
//!    [`InvocationContext::proceed`].
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`InterceptionModel`] | Frozen phase/operation to interceptor mapping for one type. |
//! | [`InterceptorClassMetadata`] | Per-interceptor-type kind, eligibility and advice. |
//! | [`InterceptionChain`] | Ordered units plus the terminal call for one execution. |
//! | [`InvocationContext`] | State threaded through a chain; exposes `proceed`. |
//!
//! # Concurrency
//!
//! Models are immutable and shared freely. A chain is owned by exactly one
//! invocation and is never shared between threads.
//!
//! # Invariants
//!
//! - Must execute global interceptors before method-bound ones, in bind order.
//!   - Enforced in: [`InterceptionModel::interceptors`].
//!   - Tested by: `invariants::test_global_before_method_bound`
//!   - Failure symptom: Transaction or security advice runs in the wrong nesting.
//!
//! - Must skip global interceptors for excluded operations.
//!   - Enforced in: [`InterceptionModel::interceptors`].
//!   - Tested by: `invariants::test_excluded_operation_skips_globals`
//!
//! - Must invoke every unit at most once per chain pass and the terminal call
//!   only after the cursor is exhausted.
//!   - Enforced in: `chain::InterceptionChain::invoke_next`.
//!   - Tested by: `invariants::test_short_circuit_skips_rest`
//!   - Failure symptom: Double side effects, or the target running although an
//!     interceptor vetoed the call.
//!
//! - Must reject every mutation of a builder after `build`.
//!   - Enforced in: [`InterceptionModelBuilder`] (`Open`/`Built` states).
//!   - Tested by: `invariants::test_builder_is_single_use`

mod advice;
mod caches;
mod chain;
mod context;
mod error;
mod initializer;
mod instance;
mod introspect;
mod metadata;
mod model;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod invariants;

pub use advice::{Advice, AdviceMethod, InterceptorMethods};
pub use caches::InterceptionCaches;
pub use chain::{InterceptionChain, InterceptorInvocation, InterceptorMethodInvocation};
pub use context::InvocationContext;
pub use error::{BuildError, ModelError};
pub use initializer::ModelInitializer;
pub use instance::{InterceptedInstance, InterceptionContext};
pub use introspect::{
	EnabledInterceptors, InterceptorDeclaration, InterceptorResolver, IntrospectionError,
	OperationDescription, StaticIntrospector, TypeDescription, TypeIntrospector,
};
pub use metadata::{
	CustomInterceptor, InstanceFactory, InterceptorClassMetadata, InterceptorKind,
	TargetClassInterceptorMetadata,
};
pub use model::{InterceptionModel, InterceptionModelBuilder};
