use core::fmt;
use std::sync::Arc;

/// Identity of a managed or interceptor type.
///
/// Cloning is cheap; equality and hashing compare the type name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self(name.into())
	}

	pub fn name(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({})", self.0)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TypeKey {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

/// Identity of an operation: declaring type, name and parameter types.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodSignature {
	declaring: TypeKey,
	name: Arc<str>,
	parameters: Arc<[TypeKey]>,
}

impl MethodSignature {
	pub fn new(
		declaring: TypeKey,
		name: impl Into<Arc<str>>,
		parameters: impl IntoIterator<Item = TypeKey>,
	) -> Self {
		Self {
			declaring,
			name: name.into(),
			parameters: parameters.into_iter().collect(),
		}
	}

	/// Signature of a parameterless operation.
	pub fn nullary(declaring: TypeKey, name: impl Into<Arc<str>>) -> Self {
		Self::new(declaring, name, [])
	}

	pub fn declaring(&self) -> &TypeKey {
		&self.declaring
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parameters(&self) -> &[TypeKey] {
		&self.parameters
	}

	pub fn arity(&self) -> usize {
		self.parameters.len()
	}

	/// Returns true if `other` has the same name and parameter types.
	///
	/// Used to detect overriding across a type hierarchy, where the
	/// declaring types differ.
	pub fn overrides(&self, other: &MethodSignature) -> bool {
		self.name == other.name && self.parameters == other.parameters
	}
}

impl fmt::Debug for MethodSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self}")
	}
}

impl fmt::Display for MethodSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}(", self.declaring, self.name)?;
		for (i, p) in self.parameters.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{p}")?;
		}
		f.write_str(")")
	}
}
