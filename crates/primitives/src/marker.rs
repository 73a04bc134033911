use core::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// A declarative metadata tag attached to a type or operation.
///
/// Two markers are equal when their names and member values are equal, so a
/// binding marker declared on an interceptor matches the same marker declared
/// on a target.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker {
	name: Arc<str>,
	members: SmallVec<[(Arc<str>, Arc<str>); 2]>,
}

impl Marker {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			members: SmallVec::new(),
		}
	}

	/// Adds a member value. Members are kept sorted by name.
	pub fn with_member(mut self, name: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
		let name = name.into();
		let value = value.into();
		match self.members.binary_search_by(|(n, _)| n.cmp(&name)) {
			Ok(pos) => self.members[pos].1 = value,
			Err(pos) => self.members.insert(pos, (name, value)),
		}
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn member(&self, name: &str) -> Option<&str> {
		self.members
			.iter()
			.find(|(n, _)| &**n == name)
			.map(|(_, v)| &**v)
	}
}

impl fmt::Debug for Marker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self}")
	}
}

impl fmt::Display for Marker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@{}", self.name)?;
		if !self.members.is_empty() {
			f.write_str("(")?;
			for (i, (n, v)) in self.members.iter().enumerate() {
				if i > 0 {
					f.write_str(", ")?;
				}
				write!(f, "{n}={v}")?;
			}
			f.write_str(")")?;
		}
		Ok(())
	}
}

/// Sorted, duplicate-free set of markers.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerSet(SmallVec<[Marker; 4]>);

impl MarkerSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Marker> {
		self.0.iter()
	}

	pub fn insert(&mut self, marker: Marker) -> bool {
		match self.0.binary_search(&marker) {
			Ok(_) => false,
			Err(pos) => {
				self.0.insert(pos, marker);
				true
			}
		}
	}

	pub fn contains(&self, marker: &Marker) -> bool {
		self.0.binary_search(marker).is_ok()
	}

	pub fn contains_named(&self, name: &str) -> bool {
		self.0.iter().any(|m| m.name() == name)
	}

	/// Returns true if every marker of `other` is present in `self`.
	pub fn is_superset(&self, other: &MarkerSet) -> bool {
		other.iter().all(|m| self.contains(m))
	}

	pub fn union(&self, other: &MarkerSet) -> MarkerSet {
		let mut out = self.clone();
		for m in other.iter() {
			out.insert(m.clone());
		}
		out
	}

	/// Markers of `self` that are not in `other`.
	pub fn difference(&self, other: &MarkerSet) -> MarkerSet {
		self.iter().filter(|m| !other.contains(m)).cloned().collect()
	}
}

impl FromIterator<Marker> for MarkerSet {
	fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
		let mut v: SmallVec<[Marker; 4]> = iter.into_iter().collect();
		v.sort();
		v.dedup();
		Self(v)
	}
}

impl fmt::Debug for MarkerSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.0.iter()).finish()
	}
}
