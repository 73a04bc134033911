use core::fmt;
use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{InvocationError, MethodSignature};

/// Dynamically typed argument or result.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A live target or interceptor instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a concrete value.
pub fn value<T: Any + Send + Sync>(v: T) -> Value {
	Arc::new(v)
}

/// Terminal call mechanism supplied by the proxy layer.
pub type MethodInvoker =
	Arc<dyn Fn(&Instance, &[Value]) -> Result<Option<Value>, InvocationError> + Send + Sync>;

/// Handle to a business operation: its identity plus the terminal invoker.
///
/// Equality and hashing use the signature only, so a handle can key the
/// method-bound interceptor tables regardless of which invoker it carries.
#[derive(Clone)]
pub struct Method {
	signature: MethodSignature,
	invoker: MethodInvoker,
}

impl Method {
	pub fn new<F>(signature: MethodSignature, invoker: F) -> Self
	where
		F: Fn(&Instance, &[Value]) -> Result<Option<Value>, InvocationError> + Send + Sync + 'static,
	{
		Self {
			signature,
			invoker: Arc::new(invoker),
		}
	}

	pub fn signature(&self) -> &MethodSignature {
		&self.signature
	}

	pub fn name(&self) -> &str {
		self.signature.name()
	}

	/// Invokes the operation on `target`.
	///
	/// The argument count is checked against the signature before the invoker
	/// runs. Failures from the invoker are returned as reported; unwrapping is
	/// the caller's concern.
	pub fn invoke(&self, target: &Instance, args: &[Value]) -> Result<Option<Value>, InvocationError> {
		if args.len() != self.signature.arity() {
			return Err(InvocationError::IllegalArguments {
				method: self.signature.to_string(),
				reason: format!("expected {} arguments, got {}", self.signature.arity(), args.len()),
			});
		}
		(self.invoker)(target, args)
	}
}

impl PartialEq for Method {
	fn eq(&self, other: &Self) -> bool {
		self.signature == other.signature
	}
}

impl Eq for Method {}

impl Hash for Method {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.signature.hash(state);
	}
}

impl fmt::Debug for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Method").field(&self.signature).finish()
	}
}
