//! Immutable interception model of one target type.
//!
//! # Role
//!
//! Maps `(phase, operation)` to the ordered interceptors that run for it.
//! Produced once by [`InterceptionModelBuilder`] and read concurrently
//! without locking afterwards.

mod builder;

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use weave_primitives::{MethodSignature, Phase, TypeKey};

pub use self::builder::InterceptionModelBuilder;
use crate::{InterceptorClassMetadata, TargetClassInterceptorMetadata};

type Interceptors = Vec<Arc<InterceptorClassMetadata>>;

#[derive(Debug, Default)]
pub(crate) struct ModelParts {
	pub(crate) global: FxHashMap<Phase, Interceptors>,
	pub(crate) method_bound: FxHashMap<Phase, FxHashMap<MethodSignature, Interceptors>>,
	pub(crate) excluded: FxHashSet<MethodSignature>,
	pub(crate) all: IndexMap<TypeKey, Arc<InterceptorClassMetadata>, FxBuildHasher>,
	pub(crate) target_class: Option<Arc<TargetClassInterceptorMetadata>>,
}

#[derive(Debug)]
pub struct InterceptionModel {
	target: TypeKey,
	parts: ModelParts,
}

impl InterceptionModel {
	pub(crate) fn new(target: TypeKey, parts: ModelParts) -> Self {
		Self { target, parts }
	}

	/// The type this model intercepts.
	pub fn target(&self) -> &TypeKey {
		&self.target
	}

	/// Interceptors that run for `phase` on `method`, in execution order.
	///
	/// Global interceptors come first unless `method` is excluded, followed by
	/// the interceptors bound to `method`. Lifecycle phases and calls without
	/// an operation only see global interceptors.
	pub fn interceptors(&self, phase: Phase, method: Option<&MethodSignature>) -> Vec<Arc<InterceptorClassMetadata>> {
		let global = self.global_interceptors(phase);
		let method = match method {
			Some(m) if !phase.is_lifecycle_callback() => m,
			_ => return global.to_vec(),
		};

		let bound = self.method_bound_interceptors(phase, method);
		let mut out = Vec::with_capacity(global.len() + bound.len());
		if !self.is_excluded(method) {
			out.extend(global.iter().cloned());
		}
		out.extend(bound.iter().cloned());
		out
	}

	pub fn global_interceptors(&self, phase: Phase) -> &[Arc<InterceptorClassMetadata>] {
		self.parts.global.get(&phase).map_or(&[], Vec::as_slice)
	}

	pub fn method_bound_interceptors(
		&self,
		phase: Phase,
		method: &MethodSignature,
	) -> &[Arc<InterceptorClassMetadata>] {
		self.parts
			.method_bound
			.get(&phase)
			.and_then(|by_method| by_method.get(method))
			.map_or(&[], Vec::as_slice)
	}

	/// Operations with at least one method-bound interceptor for `phase`.
	pub fn bound_methods(&self, phase: Phase) -> impl Iterator<Item = &MethodSignature> {
		self.parts.method_bound.get(&phase).into_iter().flat_map(|m| m.keys())
	}

	/// Returns true if `method` opted out of global interceptors.
	pub fn is_excluded(&self, method: &MethodSignature) -> bool {
		self.parts.excluded.contains(method)
	}

	/// Every interceptor bound anywhere in the model, in first-bound order,
	/// without duplicates.
	pub fn all_interceptors(&self) -> impl ExactSizeIterator<Item = &Arc<InterceptorClassMetadata>> {
		self.parts.all.values()
	}

	pub fn contains_interceptor(&self, class: &TypeKey) -> bool {
		self.parts.all.contains_key(class)
	}

	pub fn target_class_metadata(&self) -> Option<&Arc<TargetClassInterceptorMetadata>> {
		self.parts.target_class.as_ref()
	}

	/// Returns true if any external interceptor is bound for `phase`.
	pub fn has_external_interceptors(&self, phase: Phase) -> bool {
		!self.global_interceptors(phase).is_empty()
			|| self
				.parts
				.method_bound
				.get(&phase)
				.is_some_and(|m| m.values().any(|v| !v.is_empty()))
	}

	/// Returns true if external interceptors exist for any phase other than
	/// around-construct.
	pub fn has_external_non_constructor_interceptors(&self) -> bool {
		Phase::ALL
			.into_iter()
			.filter(|p| *p != Phase::AroundConstruct)
			.any(|p| self.has_external_interceptors(p))
	}

	/// Returns true if anything, external or self-declared, intercepts `phase`.
	pub fn intercepts(&self, phase: Phase) -> bool {
		self.has_external_interceptors(phase)
			|| self.parts.target_class.as_ref().is_some_and(|t| t.is_eligible(phase))
	}

	pub fn is_empty(&self) -> bool {
		self.parts.all.is_empty() && self.parts.target_class.is_none()
	}
}
