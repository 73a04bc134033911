//! Per-interceptor-type metadata.
//!
//! Interceptors come in three kinds, selected when the metadata is built and
//! never changed afterwards. All of them answer the same two questions:
//! whether they take part in a phase, and which units run for that phase on
//! a given instance.

use core::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use weave_primitives::{Instance, InvocationError, MarkerSet, MethodSignature, Phase, TypeKey, Value};

use crate::{Advice, AdviceMethod, InterceptorInvocation, InterceptorMethods, InvocationContext};

/// Creates a fresh interceptor instance.
pub type InstanceFactory = Arc<dyn Fn() -> Result<Instance, InvocationError> + Send + Sync>;

/// An interceptor supplied by an extension rather than discovered from a type.
pub trait CustomInterceptor: Send + Sync {
	/// Returns true if this interceptor takes part in `phase`.
	fn intercepts(&self, phase: Phase) -> bool;

	/// Binding markers this interceptor is resolved by.
	fn bindings(&self) -> MarkerSet {
		MarkerSet::new()
	}

	fn create(&self) -> Result<Instance, InvocationError>;

	fn intercept(
		&self,
		phase: Phase,
		instance: &Instance,
		ctx: &mut InvocationContext,
	) -> Result<Option<Value>, InvocationError>;
}

#[derive(Clone)]
pub enum InterceptorKind {
	/// Listed explicitly on a target type.
	Plain {
		methods: Arc<InterceptorMethods>,
		factory: InstanceFactory,
	},
	/// Resolved through binding markers.
	Declarative {
		bindings: Arc<MarkerSet>,
		methods: Arc<InterceptorMethods>,
		factory: InstanceFactory,
	},
	/// Created and driven by a [`CustomInterceptor`].
	Custom(Arc<dyn CustomInterceptor>),
}

impl fmt::Debug for InterceptorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Plain { methods, .. } => f.debug_struct("Plain").field("methods", methods).finish(),
			Self::Declarative { bindings, methods, .. } => f
				.debug_struct("Declarative")
				.field("bindings", bindings)
				.field("methods", methods)
				.finish(),
			Self::Custom(_) => f.write_str("Custom"),
		}
	}
}

/// Identity is the interceptor type.
#[derive(Clone, Debug)]
pub struct InterceptorClassMetadata {
	class: TypeKey,
	kind: InterceptorKind,
}

impl InterceptorClassMetadata {
	pub fn plain(class: TypeKey, methods: Arc<InterceptorMethods>, factory: InstanceFactory) -> Self {
		Self {
			class,
			kind: InterceptorKind::Plain { methods, factory },
		}
	}

	pub fn declarative(
		class: TypeKey,
		bindings: Arc<MarkerSet>,
		methods: Arc<InterceptorMethods>,
		factory: InstanceFactory,
	) -> Self {
		Self {
			class,
			kind: InterceptorKind::Declarative {
				bindings,
				methods,
				factory,
			},
		}
	}

	pub fn custom(class: TypeKey, interceptor: Arc<dyn CustomInterceptor>) -> Self {
		Self {
			class,
			kind: InterceptorKind::Custom(interceptor),
		}
	}

	pub fn class(&self) -> &TypeKey {
		&self.class
	}

	pub fn kind(&self) -> &InterceptorKind {
		&self.kind
	}

	pub fn bindings(&self) -> Option<&MarkerSet> {
		match &self.kind {
			InterceptorKind::Declarative { bindings, .. } => Some(bindings),
			_ => None,
		}
	}

	pub fn is_eligible(&self, phase: Phase) -> bool {
		match &self.kind {
			InterceptorKind::Plain { methods, .. } | InterceptorKind::Declarative { methods, .. } => {
				methods.has_phase(phase)
			}
			InterceptorKind::Custom(custom) => custom.intercepts(phase),
		}
	}

	pub fn create_instance(&self) -> Result<Instance, InvocationError> {
		let created = match &self.kind {
			InterceptorKind::Plain { factory, .. } | InterceptorKind::Declarative { factory, .. } => {
				factory()
			}
			InterceptorKind::Custom(custom) => custom.create(),
		};
		created.map_err(InvocationError::unwrap_underlying)
	}

	/// Binds `instance` to `phase`.
	pub fn invocation(&self, instance: &Instance, phase: Phase) -> InterceptorInvocation {
		match &self.kind {
			InterceptorKind::Plain { methods, .. } | InterceptorKind::Declarative { methods, .. } => {
				InterceptorInvocation::new(self.class.clone(), phase, instance, methods.for_phase(phase))
			}
			InterceptorKind::Custom(custom) => {
				let mut units = Vec::new();
				if custom.intercepts(phase) {
					let custom = Arc::clone(custom);
					let signature = MethodSignature::nullary(self.class.clone(), phase.as_str());
					let advice = Advice::contextual(move |instance, ctx| custom.intercept(phase, instance, ctx));
					units.push(AdviceMethod::new(signature, phase, advice));
				}
				InterceptorInvocation::new(self.class.clone(), phase, instance, &units)
			}
		}
	}
}

impl PartialEq for InterceptorClassMetadata {
	fn eq(&self, other: &Self) -> bool {
		self.class == other.class
	}
}

impl Eq for InterceptorClassMetadata {}

impl Hash for InterceptorClassMetadata {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.class.hash(state);
	}
}

/// Advice declared on the target type itself.
///
/// Runs after every external interceptor of the same phase.
#[derive(Clone, Debug)]
pub struct TargetClassInterceptorMetadata {
	class: TypeKey,
	methods: Arc<InterceptorMethods>,
}

impl TargetClassInterceptorMetadata {
	pub fn new(class: TypeKey, methods: Arc<InterceptorMethods>) -> Self {
		Self { class, methods }
	}

	pub fn class(&self) -> &TypeKey {
		&self.class
	}

	pub fn methods(&self) -> &InterceptorMethods {
		&self.methods
	}

	pub fn is_eligible(&self, phase: Phase) -> bool {
		self.methods.has_phase(phase)
	}

	/// Binds the target instance itself to `phase`.
	pub fn invocation(&self, target: &Instance, phase: Phase) -> InterceptorInvocation {
		InterceptorInvocation::new(self.class.clone(), phase, target, self.methods.for_phase(phase))
	}
}

#[cfg(test)]
mod tests {
	use weave_primitives::value;

	use super::*;
	use crate::InterceptionChain;
	use crate::fixtures::{Journal, operation, target};

	struct Timing {
		journal: Journal,
	}

	impl CustomInterceptor for Timing {
		fn intercepts(&self, phase: Phase) -> bool {
			phase == Phase::AroundInvoke
		}

		fn create(&self) -> Result<Instance, InvocationError> {
			Ok(value(0u64))
		}

		fn intercept(
			&self,
			phase: Phase,
			_instance: &Instance,
			ctx: &mut InvocationContext,
		) -> Result<Option<Value>, InvocationError> {
			self.journal.push(format!("timing@{phase}"));
			ctx.proceed()
		}
	}

	#[test]
	fn custom_interceptor_drives_one_contextual_unit() {
		let j = Journal::default();
		let meta = InterceptorClassMetadata::custom(TypeKey::from("Timing"), Arc::new(Timing { journal: j.clone() }));
		assert!(meta.is_eligible(Phase::AroundInvoke));
		assert!(meta.bindings().is_none());

		let instance = meta.create_instance().unwrap();
		let invocation = meta.invocation(&instance, Phase::AroundInvoke);
		assert_eq!(invocation.units().len(), 1);
		assert!(invocation.units()[0].expects_invocation_context());
		assert!(meta.invocation(&instance, Phase::PreDestroy).is_empty());

		let chain = InterceptionChain::new([invocation], target(), Some(operation("foo", &j)));
		chain.invoke(vec![]).unwrap();
		assert_eq!(j.entries(), vec!["timing@around_invoke", "<target foo>"]);
	}

	#[test]
	fn identity_is_the_interceptor_type() {
		let j = Journal::default();
		let a = crate::fixtures::recording("A", &j);
		let again = crate::fixtures::recording("A", &j);
		assert_eq!(*a, *again);
		assert_ne!(*a, *crate::fixtures::recording("B", &j));
	}
}
