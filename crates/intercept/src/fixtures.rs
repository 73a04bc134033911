//! Recording interceptors and targets shared by the unit tests.

use std::sync::{Arc, Mutex};

use weave_primitives::{Instance, InvocationError, Method, MethodSignature, Phase, TypeKey, Value, value};

use crate::{
	Advice, AdviceMethod, InterceptorClassMetadata, InterceptorMethods, TargetClassInterceptorMetadata,
};

/// Ordered record of everything that ran.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
	pub(crate) fn push(&self, entry: impl Into<String>) {
		self.0.lock().unwrap().push(entry.into());
	}

	pub(crate) fn entries(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}
}

pub(crate) fn sig(ty: &str, name: &str) -> MethodSignature {
	MethodSignature::nullary(TypeKey::from(ty), name)
}

/// Contextual around-advice that records `name` and proceeds.
pub(crate) fn around(name: &str, phase: Phase, journal: &Journal) -> AdviceMethod {
	let (label, journal) = (name.to_string(), journal.clone());
	AdviceMethod::new(
		sig(name, phase.as_str()),
		phase,
		Advice::contextual(move |_, ctx| {
			journal.push(label.clone());
			ctx.proceed()
		}),
	)
}

/// Context-free advice that records `name@phase`.
pub(crate) fn hook(name: &str, phase: Phase, journal: &Journal) -> AdviceMethod {
	let (label, journal) = (format!("{name}@{phase}"), journal.clone());
	AdviceMethod::new(
		sig(name, phase.as_str()),
		phase,
		Advice::simple(move |_| {
			journal.push(label.clone());
			Ok(())
		}),
	)
}

pub(crate) fn methods(advice: impl IntoIterator<Item = AdviceMethod>) -> Arc<InterceptorMethods> {
	Arc::new(InterceptorMethods::new().extend_level([], advice))
}

fn unit_factory() -> crate::InstanceFactory {
	Arc::new(|| -> Result<Instance, InvocationError> { Ok(value(())) })
}

/// Plain interceptor recording its name for both around phases and
/// `name@phase` for post-construct and pre-destroy.
pub(crate) fn recording(name: &str, journal: &Journal) -> Arc<InterceptorClassMetadata> {
	Arc::new(InterceptorClassMetadata::plain(
		TypeKey::from(name),
		methods([
			around(name, Phase::AroundInvoke, journal),
			around(name, Phase::AroundTimeout, journal),
			hook(name, Phase::PostConstruct, journal),
			hook(name, Phase::PreDestroy, journal),
		]),
		unit_factory(),
	))
}

/// Plain interceptor with a single advice method.
pub(crate) fn with_advice(name: &str, advice: AdviceMethod) -> Arc<InterceptorClassMetadata> {
	Arc::new(InterceptorClassMetadata::plain(
		TypeKey::from(name),
		methods([advice]),
		unit_factory(),
	))
}

/// Target-type advice recording `name` around invocations.
pub(crate) fn self_advice(name: &str, journal: &Journal) -> Arc<TargetClassInterceptorMetadata> {
	Arc::new(TargetClassInterceptorMetadata::new(
		TypeKey::from(name),
		methods([
			around(name, Phase::AroundInvoke, journal),
			hook(name, Phase::PostConstruct, journal),
		]),
	))
}

/// Nullary operation on `Target` that records `<target name>` and returns
/// its name.
pub(crate) fn operation(name: &str, journal: &Journal) -> Method {
	let (label, journal) = (format!("<target {name}>"), journal.clone());
	let result = name.to_string();
	Method::new(sig("Target", name), move |_, _| {
		journal.push(label.clone());
		Ok(Some(value(result.clone())))
	})
}

pub(crate) fn target() -> Instance {
	value(())
}

pub(crate) fn as_string(v: Option<Value>) -> Option<String> {
	v.and_then(|v| v.downcast_ref::<String>().cloned())
}

#[derive(Debug, thiserror::Error)]
#[error("boom: {0}")]
pub(crate) struct Boom(pub(crate) &'static str);

pub(crate) fn boom(reason: &'static str) -> InvocationError {
	InvocationError::failure(Boom(reason))
}
