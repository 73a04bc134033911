//! Interfaces to the collaborators that discover types and decide which
//! binding interceptors are enabled.
//!
//! Discovery itself lives outside this crate. A [`TypeIntrospector`] hands
//! out [`TypeDescription`]s; [`StaticIntrospector`] is a table-backed
//! implementation for hosts that register descriptions up front.

use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;
use weave_primitives::{MarkerSet, MethodSignature, Phase, TypeKey};

use crate::{AdviceMethod, CustomInterceptor, InstanceFactory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
	#[error("unknown type {0}")]
	UnknownType(TypeKey),
	#[error("cannot introspect {ty}: {reason}")]
	Failed { ty: TypeKey, reason: String },
}

/// Supplies descriptions of managed and interceptor types.
pub trait TypeIntrospector: Send + Sync {
	fn describe(&self, ty: &TypeKey) -> Result<Arc<TypeDescription>, IntrospectionError>;
}

/// How a type declares itself as an interceptor.
#[derive(Clone)]
pub enum InterceptorDeclaration {
	/// Resolved through these binding markers.
	Bound { bindings: MarkerSet },
	/// Created and driven by an extension.
	Custom(Arc<dyn CustomInterceptor>),
}

impl fmt::Debug for InterceptorDeclaration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bound { bindings } => f.debug_struct("Bound").field("bindings", bindings).finish(),
			Self::Custom(_) => f.write_str("Custom"),
		}
	}
}

/// One business operation of a type.
#[derive(Clone, Debug)]
pub struct OperationDescription {
	method: MethodSignature,
	markers: MarkerSet,
	interceptors: Vec<TypeKey>,
	exclude_class_interceptors: bool,
	timeout: bool,
}

impl OperationDescription {
	pub fn new(method: MethodSignature) -> Self {
		Self {
			method,
			markers: MarkerSet::new(),
			interceptors: Vec::new(),
			exclude_class_interceptors: false,
			timeout: false,
		}
	}

	pub fn with_markers(mut self, markers: MarkerSet) -> Self {
		self.markers = markers;
		self
	}

	/// Appends explicitly listed interceptors, in order.
	pub fn with_interceptors(mut self, interceptors: impl IntoIterator<Item = TypeKey>) -> Self {
		self.interceptors.extend(interceptors);
		self
	}

	pub fn excluding_class_interceptors(mut self) -> Self {
		self.exclude_class_interceptors = true;
		self
	}

	/// Marks the operation as a timer callback.
	pub fn as_timeout(mut self) -> Self {
		self.timeout = true;
		self
	}

	pub fn method(&self) -> &MethodSignature {
		&self.method
	}

	pub fn markers(&self) -> &MarkerSet {
		&self.markers
	}

	pub fn interceptors(&self) -> &[TypeKey] {
		&self.interceptors
	}

	pub fn excludes_class_interceptors(&self) -> bool {
		self.exclude_class_interceptors
	}

	pub fn is_timeout(&self) -> bool {
		self.timeout
	}
}

/// What a type declares, one level of the hierarchy at a time.
///
/// Everything here is local to the described type. Inherited advice is
/// assembled by walking [`TypeDescription::super_type`].
#[derive(Clone)]
pub struct TypeDescription {
	key: TypeKey,
	super_type: Option<TypeKey>,
	markers: MarkerSet,
	interceptors: Vec<TypeKey>,
	operations: Vec<OperationDescription>,
	other_methods: Vec<MethodSignature>,
	advice: Vec<AdviceMethod>,
	interceptor: Option<InterceptorDeclaration>,
	factory: Option<InstanceFactory>,
}

impl TypeDescription {
	pub fn new(key: TypeKey) -> Self {
		Self {
			key,
			super_type: None,
			markers: MarkerSet::new(),
			interceptors: Vec::new(),
			operations: Vec::new(),
			other_methods: Vec::new(),
			advice: Vec::new(),
			interceptor: None,
			factory: None,
		}
	}

	pub fn with_super_type(mut self, super_type: TypeKey) -> Self {
		self.super_type = Some(super_type);
		self
	}

	pub fn with_markers(mut self, markers: MarkerSet) -> Self {
		self.markers = markers;
		self
	}

	/// Appends class-level explicit interceptors, in order.
	pub fn with_interceptors(mut self, interceptors: impl IntoIterator<Item = TypeKey>) -> Self {
		self.interceptors.extend(interceptors);
		self
	}

	pub fn with_operation(mut self, operation: OperationDescription) -> Self {
		self.operations.push(operation);
		self
	}

	/// Declares a method that is neither an operation nor advice. It still
	/// overrides inherited advice of the same name and parameters.
	pub fn with_method(mut self, method: MethodSignature) -> Self {
		self.other_methods.push(method);
		self
	}

	pub fn with_advice(mut self, advice: AdviceMethod) -> Self {
		self.advice.push(advice);
		self
	}

	pub fn bound_interceptor(mut self, bindings: MarkerSet) -> Self {
		self.interceptor = Some(InterceptorDeclaration::Bound { bindings });
		self
	}

	pub fn custom_interceptor(mut self, custom: Arc<dyn CustomInterceptor>) -> Self {
		self.interceptor = Some(InterceptorDeclaration::Custom(custom));
		self
	}

	pub fn with_factory(mut self, factory: InstanceFactory) -> Self {
		self.factory = Some(factory);
		self
	}

	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn super_type(&self) -> Option<&TypeKey> {
		self.super_type.as_ref()
	}

	pub fn markers(&self) -> &MarkerSet {
		&self.markers
	}

	pub fn interceptors(&self) -> &[TypeKey] {
		&self.interceptors
	}

	pub fn operations(&self) -> &[OperationDescription] {
		&self.operations
	}

	pub fn advice(&self) -> &[AdviceMethod] {
		&self.advice
	}

	/// Every method declared at this level: operations, advice and plain
	/// methods.
	pub fn declared_methods(&self) -> impl Iterator<Item = &MethodSignature> {
		self.operations
			.iter()
			.map(OperationDescription::method)
			.chain(self.advice.iter().map(AdviceMethod::signature))
			.chain(self.other_methods.iter())
	}

	pub fn interceptor(&self) -> Option<&InterceptorDeclaration> {
		self.interceptor.as_ref()
	}

	pub fn factory(&self) -> Option<&InstanceFactory> {
		self.factory.as_ref()
	}
}

impl fmt::Debug for TypeDescription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeDescription")
			.field("key", &self.key)
			.field("super_type", &self.super_type)
			.field("markers", &self.markers)
			.field("interceptors", &self.interceptors)
			.field("operations", &self.operations)
			.field("advice", &self.advice.len())
			.field("interceptor", &self.interceptor)
			.field("factory", &self.factory.is_some())
			.finish()
	}
}

/// Introspector backed by descriptions registered up front.
#[derive(Debug, Default)]
pub struct StaticIntrospector {
	types: FxHashMap<TypeKey, Arc<TypeDescription>>,
}

impl StaticIntrospector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `description`, replacing any earlier one for the same key.
	pub fn register(&mut self, description: TypeDescription) -> &mut Self {
		self.types.insert(description.key().clone(), Arc::new(description));
		self
	}

	pub fn with(mut self, description: TypeDescription) -> Self {
		self.register(description);
		self
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

impl TypeIntrospector for StaticIntrospector {
	fn describe(&self, ty: &TypeKey) -> Result<Arc<TypeDescription>, IntrospectionError> {
		self.types
			.get(ty)
			.cloned()
			.ok_or_else(|| IntrospectionError::UnknownType(ty.clone()))
	}
}

/// Decides which binding interceptors apply to a set of markers.
pub trait InterceptorResolver: Send + Sync {
	/// Interceptor types for `bindings`, in execution order.
	///
	/// Eligibility for `phase` is checked by the caller; implementations may
	/// use the phase to narrow the result further.
	fn resolve(&self, phase: Phase, bindings: &MarkerSet) -> Vec<TypeKey>;
}

/// Ordered list of enabled binding interceptors.
///
/// An interceptor matches when every one of its bindings is present in the
/// requested markers. Enable order is execution order.
#[derive(Debug, Default, Clone)]
pub struct EnabledInterceptors {
	enabled: Vec<(TypeKey, MarkerSet)>,
}

impl EnabledInterceptors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables `ty` with `bindings`. Re-enabling a type moves nothing and
	/// replaces its bindings.
	pub fn enable(&mut self, ty: TypeKey, bindings: MarkerSet) -> &mut Self {
		match self.enabled.iter_mut().find(|(t, _)| *t == ty) {
			Some((_, existing)) => *existing = bindings,
			None => self.enabled.push((ty, bindings)),
		}
		self
	}

	/// Enables `types` in order, taking bindings from their descriptions.
	///
	/// Types that declare no bindings are skipped.
	pub fn from_introspector<'a>(
		introspector: &dyn TypeIntrospector,
		types: impl IntoIterator<Item = &'a TypeKey>,
	) -> Result<Self, IntrospectionError> {
		let mut out = Self::new();
		for ty in types {
			let description = introspector.describe(ty)?;
			let bindings = match description.interceptor() {
				Some(InterceptorDeclaration::Bound { bindings }) => bindings.clone(),
				Some(InterceptorDeclaration::Custom(custom)) => custom.bindings(),
				None => MarkerSet::new(),
			};
			if bindings.is_empty() {
				trace!(interceptor = %ty, "skipping interceptor without bindings");
				continue;
			}
			out.enable(ty.clone(), bindings);
		}
		Ok(out)
	}

	pub fn len(&self) -> usize {
		self.enabled.len()
	}

	pub fn is_empty(&self) -> bool {
		self.enabled.is_empty()
	}
}

impl InterceptorResolver for EnabledInterceptors {
	fn resolve(&self, _phase: Phase, bindings: &MarkerSet) -> Vec<TypeKey> {
		if bindings.is_empty() {
			return Vec::new();
		}
		self.enabled
			.iter()
			.filter(|(_, required)| !required.is_empty() && bindings.is_superset(required))
			.map(|(ty, _)| ty.clone())
			.collect()
	}
}
