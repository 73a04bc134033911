use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use weave_primitives::{Instance, InvocationError, MethodSignature, Phase, TypeKey, Value};

use crate::InvocationContext;

type ContextualFn =
	dyn Fn(&Instance, &mut InvocationContext) -> Result<Option<Value>, InvocationError> + Send + Sync;
type SimpleFn = dyn Fn(&Instance) -> Result<(), InvocationError> + Send + Sync;

/// Callable body of an interceptor method.
#[derive(Clone)]
pub enum Advice {
	/// Consumes the invocation context and decides whether to call
	/// [`InvocationContext::proceed`].
	Contextual(Arc<ContextualFn>),
	/// Takes no context. The chain continues on its own after it returns.
	Simple(Arc<SimpleFn>),
}

impl Advice {
	pub fn contextual<F>(f: F) -> Self
	where
		F: Fn(&Instance, &mut InvocationContext) -> Result<Option<Value>, InvocationError>
			+ Send
			+ Sync
			+ 'static,
	{
		Self::Contextual(Arc::new(f))
	}

	pub fn simple<F>(f: F) -> Self
	where
		F: Fn(&Instance) -> Result<(), InvocationError> + Send + Sync + 'static,
	{
		Self::Simple(Arc::new(f))
	}

	pub fn expects_context(&self) -> bool {
		matches!(self, Self::Contextual(_))
	}
}

impl fmt::Debug for Advice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Contextual(_) => f.write_str("Advice::Contextual"),
			Self::Simple(_) => f.write_str("Advice::Simple"),
		}
	}
}

/// An interceptor method: where it is declared, which phase it serves and
/// what it runs.
#[derive(Clone, Debug)]
pub struct AdviceMethod {
	signature: MethodSignature,
	phase: Phase,
	advice: Advice,
}

impl AdviceMethod {
	pub fn new(signature: MethodSignature, phase: Phase, advice: Advice) -> Self {
		Self {
			signature,
			phase,
			advice,
		}
	}

	pub fn signature(&self) -> &MethodSignature {
		&self.signature
	}

	pub fn declaring(&self) -> &TypeKey {
		self.signature.declaring()
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn advice(&self) -> &Advice {
		&self.advice
	}
}

/// Advice methods of one type per phase, in hierarchy order (super type first).
#[derive(Clone, Debug, Default)]
pub struct InterceptorMethods {
	by_phase: FxHashMap<Phase, SmallVec<[AdviceMethod; 2]>>,
}

impl InterceptorMethods {
	pub fn new() -> Self {
		Self::default()
	}

	/// Extends inherited methods with one level of the hierarchy.
	///
	/// Inherited methods overridden by any of `declared` are dropped, whether or
	/// not the overriding method is itself an interceptor method. The level's
	/// own `advice` is then appended after what remains.
	pub fn extend_level<'a>(
		&self,
		declared: impl IntoIterator<Item = &'a MethodSignature>,
		advice: impl IntoIterator<Item = AdviceMethod>,
	) -> Self {
		let declared: Vec<&MethodSignature> = declared.into_iter().collect();
		let mut by_phase = self.by_phase.clone();
		for methods in by_phase.values_mut() {
			methods.retain(|m| !declared.iter().any(|d| d.overrides(m.signature())));
		}
		for m in advice {
			by_phase.entry(m.phase()).or_default().push(m);
		}
		by_phase.retain(|_, v| !v.is_empty());
		Self { by_phase }
	}

	pub fn for_phase(&self, phase: Phase) -> &[AdviceMethod] {
		self.by_phase.get(&phase).map_or(&[], |v| v.as_slice())
	}

	pub fn has_phase(&self, phase: Phase) -> bool {
		!self.for_phase(phase).is_empty()
	}

	pub fn is_empty(&self) -> bool {
		self.by_phase.is_empty()
	}

	/// Phases with at least one method, in [`Phase::ALL`] order.
	pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
		Phase::ALL.into_iter().filter(|p| self.has_phase(*p))
	}
}
