use std::sync::Arc;

use pretty_assertions::assert_eq;
use weave_primitives::{Phase, TypeKey, value};

use crate::fixtures::{Journal, operation, recording, sig, target};
use crate::{
	Advice, AdviceMethod, BuildError, InterceptedInstance, InterceptionModel, InterceptionModelBuilder,
};

/// Global `[A, B]` for around-invoke, `[C]` bound to `foo`, `bar` excluded.
fn scenario(j: &Journal) -> Arc<InterceptionModel> {
	let mut b = InterceptionModelBuilder::new(TypeKey::from("Target"));
	b.bind_global(Phase::AroundInvoke, [recording("A", j), recording("B", j)])
		.unwrap();
	b.bind_method(Phase::AroundInvoke, &sig("Target", "foo"), [recording("C", j)])
		.unwrap();
	b.exclude_global_interceptors(&sig("Target", "bar")).unwrap();
	Arc::new(b.build().unwrap())
}

/// Must execute global interceptors before method-bound ones, in bind order.
///
/// - Enforced in: `InterceptionModel::interceptors`
/// - Failure symptom: Transaction or security advice runs in the wrong nesting.
#[cfg_attr(test, test)]
pub(crate) fn test_global_before_method_bound() {
	let j = Journal::default();
	let handler = InterceptedInstance::new(scenario(&j), target()).unwrap();

	handler.invoke(&operation("foo", &j), vec![]).unwrap();
	assert_eq!(j.entries(), vec!["A", "B", "C", "<target foo>"]);
}

/// Must run only global interceptors for operations without bindings.
///
/// - Enforced in: `InterceptionModel::interceptors`
#[cfg_attr(test, test)]
pub(crate) fn test_unbound_operation_runs_globals_only() {
	let j = Journal::default();
	let handler = InterceptedInstance::new(scenario(&j), target()).unwrap();

	handler.invoke(&operation("baz", &j), vec![]).unwrap();
	assert_eq!(j.entries(), vec!["A", "B", "<target baz>"]);
}

/// Must skip global interceptors for excluded operations.
///
/// - Enforced in: `InterceptionModel::interceptors`
/// - Failure symptom: An operation that opted out still runs type-level advice.
#[cfg_attr(test, test)]
pub(crate) fn test_excluded_operation_skips_globals() {
	let j = Journal::default();
	let handler = InterceptedInstance::new(scenario(&j), target()).unwrap();

	handler.invoke(&operation("bar", &j), vec![]).unwrap();
	assert_eq!(j.entries(), vec!["<target bar>"]);
}

/// Must stop the chain when a unit does not proceed, returning its result.
///
/// - Enforced in: `InterceptionChain::invoke_next`
/// - Failure symptom: The target runs although an interceptor vetoed the call.
#[cfg_attr(test, test)]
pub(crate) fn test_short_circuit_skips_rest() {
	let j = Journal::default();
	let veto = crate::fixtures::with_advice(
		"Veto",
		AdviceMethod::new(
			sig("Veto", "around"),
			Phase::AroundInvoke,
			Advice::contextual(|_, _| Ok(Some(value("cached".to_string())))),
		),
	);
	let mut b = InterceptionModelBuilder::new(TypeKey::from("Target"));
	b.bind_global(Phase::AroundInvoke, [recording("A", &j), veto, recording("B", &j)])
		.unwrap();
	let handler = InterceptedInstance::new(Arc::new(b.build().unwrap()), target()).unwrap();

	let result = handler.invoke(&operation("foo", &j), vec![]).unwrap();
	assert_eq!(crate::fixtures::as_string(result).as_deref(), Some("cached"));
	assert_eq!(j.entries(), vec!["A"]);
}

/// Must reject every mutation of a builder after `build`.
///
/// - Enforced in: `InterceptionModelBuilder` (`Open`/`Built` states)
/// - Failure symptom: A frozen model changes under concurrent readers.
#[cfg_attr(test, test)]
pub(crate) fn test_builder_is_single_use() {
	let j = Journal::default();
	let mut b = InterceptionModelBuilder::new(TypeKey::from("Target"));
	b.bind_global(Phase::AroundInvoke, [recording("A", &j)]).unwrap();
	let model = b.build().unwrap();

	assert!(matches!(b.build(), Err(BuildError::AlreadyBuilt { .. })));
	assert!(matches!(
		b.bind_method(Phase::AroundInvoke, &sig("Target", "foo"), [recording("B", &j)]),
		Err(BuildError::AlreadyBuilt { .. })
	));
	assert_eq!(model.global_interceptors(Phase::AroundInvoke).len(), 1);
}
