use core::fmt;
use std::sync::Arc;

use tracing::trace;
use weave_primitives::{Instance, InvocationError, Method, Phase, TypeKey, Value};

use crate::{Advice, AdviceMethod, InvocationContext};

/// One interceptor method bound to the instance it runs on.
#[derive(Clone)]
pub struct InterceptorMethodInvocation {
	instance: Instance,
	method: AdviceMethod,
}

impl InterceptorMethodInvocation {
	pub fn new(instance: Instance, method: AdviceMethod) -> Self {
		Self { instance, method }
	}

	pub fn instance(&self) -> &Instance {
		&self.instance
	}

	pub fn method(&self) -> &AdviceMethod {
		&self.method
	}

	pub fn expects_invocation_context(&self) -> bool {
		self.method.advice().expects_context()
	}
}

impl fmt::Debug for InterceptorMethodInvocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptorMethodInvocation")
			.field("method", self.method.signature())
			.field("contextual", &self.expects_invocation_context())
			.finish()
	}
}

/// An interceptor instance bound to one phase.
///
/// Expands to the interceptor's methods for that phase, in hierarchy order.
/// An interceptor with no method for the phase expands to nothing.
#[derive(Clone, Debug)]
pub struct InterceptorInvocation {
	interceptor: TypeKey,
	phase: Phase,
	units: Vec<InterceptorMethodInvocation>,
}

impl InterceptorInvocation {
	pub fn new(interceptor: TypeKey, phase: Phase, instance: &Instance, methods: &[AdviceMethod]) -> Self {
		let units = methods
			.iter()
			.filter(|m| m.phase() == phase)
			.map(|m| InterceptorMethodInvocation::new(Arc::clone(instance), m.clone()))
			.collect();
		Self {
			interceptor,
			phase,
			units,
		}
	}

	pub fn interceptor(&self) -> &TypeKey {
		&self.interceptor
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn units(&self) -> &[InterceptorMethodInvocation] {
		&self.units
	}

	pub fn is_empty(&self) -> bool {
		self.units.is_empty()
	}
}

/// Ordered units plus the terminal call for one execution.
///
/// A chain is created per invocation event and consumed by
/// [`InterceptionChain::invoke`]. It is not reusable and never shared between
/// threads.
pub struct InterceptionChain {
	target: Instance,
	target_method: Option<Method>,
	units: Arc<[InterceptorMethodInvocation]>,
	cursor: usize,
}

impl InterceptionChain {
	/// Flattens `invocations` into a chain around `target_method`.
	///
	/// Without a target method the chain ends in an absent result instead of a
	/// terminal call, as for lifecycle callbacks.
	pub fn new(
		invocations: impl IntoIterator<Item = InterceptorInvocation>,
		target: Instance,
		target_method: Option<Method>,
	) -> Self {
		let units: Vec<_> = invocations.into_iter().flat_map(|i| i.units).collect();
		Self {
			target,
			target_method,
			units: units.into(),
			cursor: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.units.len()
	}

	pub fn is_empty(&self) -> bool {
		self.units.is_empty()
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn has_next(&self) -> bool {
		self.cursor < self.units.len()
	}

	pub fn target(&self) -> &Instance {
		&self.target
	}

	pub fn target_method(&self) -> Option<&Method> {
		self.target_method.as_ref()
	}

	/// Executes the chain with the given parameters.
	pub fn invoke(self, parameters: Vec<Value>) -> Result<Option<Value>, InvocationError> {
		self.invoke_with_timer(parameters, None)
	}

	/// Executes an around-timeout chain; `timer` is visible to every unit.
	pub fn invoke_with_timer(
		self,
		parameters: Vec<Value>,
		timer: Option<Value>,
	) -> Result<Option<Value>, InvocationError> {
		let mut ctx = InvocationContext::new(self, parameters, timer);
		ctx.proceed()
	}

	/// Runs from the current cursor. The cursor is restored on return so that
	/// each frame sees the position it started from.
	pub(crate) fn invoke_next(ctx: &mut InvocationContext) -> Result<Option<Value>, InvocationError> {
		let saved = ctx.chain.cursor;
		let result = Self::run_from_cursor(ctx);
		ctx.chain.cursor = saved;
		result.map_err(InvocationError::unwrap_underlying)
	}

	fn run_from_cursor(ctx: &mut InvocationContext) -> Result<Option<Value>, InvocationError> {
		while let Some(unit) = ctx.chain.advance() {
			match unit.method.advice() {
				Advice::Contextual(advice) => {
					trace!(method = %unit.method.signature(), cursor = ctx.chain.cursor, "invoking contextual advice");
					return advice(&unit.instance, ctx);
				}
				Advice::Simple(advice) => {
					// Simple advice never proceeds itself; keep advancing on its behalf.
					trace!(method = %unit.method.signature(), cursor = ctx.chain.cursor, "invoking simple advice");
					advice(&unit.instance)?;
				}
			}
		}
		ctx.chain.complete(ctx.parameters())
	}

	fn advance(&mut self) -> Option<InterceptorMethodInvocation> {
		let unit = self.units.get(self.cursor)?.clone();
		self.cursor += 1;
		Some(unit)
	}

	fn complete(&self, parameters: &[Value]) -> Result<Option<Value>, InvocationError> {
		match &self.target_method {
			Some(method) => {
				trace!(method = %method.signature(), "chain exhausted, invoking target");
				method.invoke(&self.target, parameters)
			}
			None => Ok(None),
		}
	}
}

impl fmt::Debug for InterceptionChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptionChain")
			.field("target_method", &self.target_method)
			.field("units", &self.units)
			.field("cursor", &self.cursor)
			.finish()
	}
}
