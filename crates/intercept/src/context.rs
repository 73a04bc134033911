use core::fmt;

use rustc_hash::FxHashMap;
use weave_primitives::{Instance, InvocationError, Method, Value};

use crate::InterceptionChain;

/// State threaded through one chain execution.
///
/// Contextual advice receives `&mut InvocationContext` and continues the chain
/// by calling [`InvocationContext::proceed`]. Parameters may be replaced
/// before proceeding; the terminal operation receives whatever is current
/// when the cursor reaches it.
pub struct InvocationContext {
	pub(crate) chain: InterceptionChain,
	parameters: Vec<Value>,
	context_data: FxHashMap<String, Value>,
	timer: Option<Value>,
}

impl InvocationContext {
	pub(crate) fn new(chain: InterceptionChain, parameters: Vec<Value>, timer: Option<Value>) -> Self {
		Self {
			chain,
			parameters,
			context_data: FxHashMap::default(),
			timer,
		}
	}

	/// The target instance, or the construction placeholder for around-construct chains.
	pub fn target(&self) -> &Instance {
		self.chain.target()
	}

	/// The intercepted operation; `None` for lifecycle callbacks.
	pub fn method(&self) -> Option<&Method> {
		self.chain.target_method()
	}

	pub fn parameters(&self) -> &[Value] {
		&self.parameters
	}

	/// Replaces the parameters passed to the terminal operation.
	///
	/// Fails for lifecycle chains, which have no parameters, and when the
	/// count does not match the operation signature.
	pub fn set_parameters(&mut self, parameters: Vec<Value>) -> Result<(), InvocationError> {
		let Some(method) = self.chain.target_method() else {
			return Err(InvocationError::IllegalArguments {
				method: "<lifecycle callback>".to_string(),
				reason: "lifecycle callbacks take no parameters".to_string(),
			});
		};
		let expected = method.signature().arity();
		if parameters.len() != expected {
			return Err(InvocationError::IllegalArguments {
				method: method.signature().to_string(),
				reason: format!("expected {expected} parameters, got {}", parameters.len()),
			});
		}
		self.parameters = parameters;
		Ok(())
	}

	/// Data shared by every unit of this chain execution.
	pub fn context_data(&self) -> &FxHashMap<String, Value> {
		&self.context_data
	}

	pub fn context_data_mut(&mut self) -> &mut FxHashMap<String, Value> {
		&mut self.context_data
	}

	/// The timer that fired, for around-timeout chains.
	pub fn timer(&self) -> Option<&Value> {
		self.timer.as_ref()
	}

	/// Runs the rest of the chain and returns its result.
	///
	/// The cursor is restored when this call returns, so calling `proceed`
	/// again from the same unit replays the remainder of the chain.
	pub fn proceed(&mut self) -> Result<Option<Value>, InvocationError> {
		InterceptionChain::invoke_next(self)
	}
}

impl fmt::Debug for InvocationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InvocationContext")
			.field("method", &self.method())
			.field("parameters", &self.parameters.len())
			.field("cursor", &self.chain.cursor())
			.finish()
	}
}
