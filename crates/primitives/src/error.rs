use thiserror::Error;

/// Boxed failure raised by an interceptor, lifecycle callback or target
/// operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure crossing an invocation boundary.
///
/// Invokers that call through an indirection (the terminal operation, an
/// advice method) report failures as [`InvocationError::Underlying`]. Every
/// chain boundary calls [`InvocationError::unwrap_underlying`] before
/// re-raising, so callers always see the original failure and can match on it
/// with [`InvocationError::downcast_ref`].
#[derive(Debug, Error)]
pub enum InvocationError {
	/// Failure wrapped by the invocation mechanism.
	#[error("invocation target failed: {0}")]
	Underlying(#[source] BoxError),
	/// Original failure, already unwrapped.
	#[error(transparent)]
	Failure(BoxError),
	/// Parameters rejected before reaching the target.
	#[error("illegal arguments for {method}: {reason}")]
	IllegalArguments { method: String, reason: String },
}

impl InvocationError {
	/// Wraps an original failure as reported by an invoker.
	pub fn underlying(error: impl Into<BoxError>) -> Self {
		Self::Underlying(error.into())
	}

	/// An original failure raised directly by advice code.
	pub fn failure(error: impl Into<BoxError>) -> Self {
		Self::Failure(error.into())
	}

	/// Peels every invocation wrapper, returning the original failure.
	///
	/// Nested wrappers (an invoker reporting a failure that was itself an
	/// `InvocationError`) are unwrapped until a non-wrapper is reached.
	pub fn unwrap_underlying(self) -> Self {
		let mut current = self;
		loop {
			match current {
				Self::Underlying(inner) | Self::Failure(inner) => {
					match inner.downcast::<InvocationError>() {
						Ok(nested) => current = *nested,
						Err(original) => return Self::Failure(original),
					}
				}
				other => return other,
			}
		}
	}

	/// Returns true if this error still carries an invocation wrapper.
	pub fn is_wrapped(&self) -> bool {
		matches!(self, Self::Underlying(_))
	}

	/// Downcasts the carried failure to a concrete error type.
	pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
		match self {
			Self::Underlying(inner) | Self::Failure(inner) => inner.downcast_ref::<T>(),
			Self::IllegalArguments { .. } => None,
		}
	}

	/// Consumes the error, returning the carried failure if there is one.
	pub fn into_inner(self) -> Option<BoxError> {
		match self {
			Self::Underlying(inner) | Self::Failure(inner) => Some(inner),
			Self::IllegalArguments { .. } => None,
		}
	}
}
