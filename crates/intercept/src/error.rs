use thiserror::Error;
use weave_primitives::{InvocationError, MethodSignature, Phase, TypeKey};

use crate::IntrospectionError;

/// Misuse of an [`crate::InterceptionModelBuilder`].
///
/// Both variants are programming errors surfaced while a type is processed;
/// neither is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	/// The builder was used after `build`.
	#[error("interception model for {target} was already built")]
	AlreadyBuilt { target: TypeKey },
	/// A lifecycle phase was bound to a specific operation.
	#[error("{phase} is a lifecycle phase and cannot be bound to {method}")]
	IneligibleBinding { phase: Phase, method: MethodSignature },
}

/// Failure to produce interception metadata or a model for a type.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error(transparent)]
	Build(#[from] BuildError),

	#[error("introspection failed: {0}")]
	Introspection(#[from] IntrospectionError),

	/// A referenced interceptor type is not known to the introspector.
	#[error("unknown interceptor {0}")]
	UnknownInterceptor(TypeKey),

	/// A type is listed as an interceptor but declares no advice at all.
	#[error("{0} is used as an interceptor but declares no interceptor methods")]
	NotAnInterceptor(TypeKey),

	/// An interceptor type has no way to be instantiated.
	#[error("interceptor {0} has no instance factory")]
	MissingFactory(TypeKey),

	/// The super type chain of a type loops back on itself.
	#[error("type hierarchy of {0} is cyclic")]
	CyclicHierarchy(TypeKey),

	/// Creating interceptor instances failed.
	#[error("failed to instantiate interceptors of {target}: {source}")]
	Instantiation {
		target: TypeKey,
		#[source]
		source: InvocationError,
	},
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
