use core::fmt;

/// A named interception point.
///
/// Lifecycle phases apply to a whole instance and can never be narrowed to a
/// single operation; see [`Phase::is_lifecycle_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
	/// Around a business operation.
	AroundInvoke,
	/// Around a timer callback operation.
	AroundTimeout,
	/// Around instance construction.
	AroundConstruct,
	/// After construction and injection completed.
	PostConstruct,
	/// Before the instance is destroyed.
	PreDestroy,
	/// Before the instance is passivated.
	PrePassivate,
	/// After the instance has been activated again.
	PostActivate,
}

impl Phase {
	/// All phases in declaration order.
	pub const ALL: [Phase; 7] = [
		Phase::AroundInvoke,
		Phase::AroundTimeout,
		Phase::AroundConstruct,
		Phase::PostConstruct,
		Phase::PreDestroy,
		Phase::PrePassivate,
		Phase::PostActivate,
	];

	/// Returns true for phases that apply to a whole instance.
	pub const fn is_lifecycle_callback(self) -> bool {
		!matches!(self, Self::AroundInvoke | Self::AroundTimeout)
	}

	/// Lifecycle phases excluding construction.
	pub fn lifecycle_callbacks() -> impl Iterator<Item = Phase> {
		Self::ALL
			.into_iter()
			.filter(|p| p.is_lifecycle_callback() && *p != Phase::AroundConstruct)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AroundInvoke => "around_invoke",
			Self::AroundTimeout => "around_timeout",
			Self::AroundConstruct => "around_construct",
			Self::PostConstruct => "post_construct",
			Self::PreDestroy => "pre_destroy",
			Self::PrePassivate => "pre_passivate",
			Self::PostActivate => "post_activate",
		}
	}
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(Phase::AroundInvoke, false)]
	#[case(Phase::AroundTimeout, false)]
	#[case(Phase::AroundConstruct, true)]
	#[case(Phase::PostConstruct, true)]
	#[case(Phase::PreDestroy, true)]
	#[case(Phase::PrePassivate, true)]
	#[case(Phase::PostActivate, true)]
	fn lifecycle_classification(#[case] phase: Phase, #[case] lifecycle: bool) {
		assert_eq!(phase.is_lifecycle_callback(), lifecycle);
	}

	#[test]
	fn lifecycle_callbacks_skip_construction() {
		let phases: Vec<_> = Phase::lifecycle_callbacks().collect();
		assert_eq!(
			phases,
			vec![
				Phase::PostConstruct,
				Phase::PreDestroy,
				Phase::PrePassivate,
				Phase::PostActivate
			]
		);
	}
}
