use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use weave_intercept::{
	Advice, AdviceMethod, EnabledInterceptors, InstanceFactory, InterceptedInstance, InterceptionCaches,
	InterceptionModelBuilder, InterceptorClassMetadata, InterceptorMethods, ModelError, ModelInitializer,
	OperationDescription, StaticIntrospector, TypeDescription, TypeIntrospector,
};
use weave_primitives::{Instance, InvocationError, Marker, MarkerSet, Method, MethodSignature, Phase, TypeKey, value};

type Journal = Arc<Mutex<Vec<String>>>;

fn sig(ty: &str, name: &str) -> MethodSignature {
	MethodSignature::nullary(TypeKey::from(ty), name)
}

fn factory() -> InstanceFactory {
	Arc::new(|| -> Result<Instance, InvocationError> { Ok(value(())) })
}

fn markers(names: &[&str]) -> MarkerSet {
	names.iter().map(|n| Marker::new(*n)).collect()
}

fn recorder(name: &str, phase: Phase, journal: &Journal) -> AdviceMethod {
	let (label, journal) = (name.to_string(), Arc::clone(journal));
	AdviceMethod::new(
		sig(name, phase.as_str()),
		phase,
		Advice::contextual(move |_, ctx| {
			journal.lock().unwrap().push(label.clone());
			ctx.proceed()
		}),
	)
}

fn interceptor(name: &str, journal: &Journal) -> TypeDescription {
	TypeDescription::new(TypeKey::from(name))
		.with_advice(recorder(name, Phase::AroundInvoke, journal))
		.with_advice(recorder(name, Phase::AroundTimeout, journal))
		.with_factory(factory())
}

fn op(name: &str, journal: &Journal) -> Method {
	let (label, journal) = (format!("<{name}>"), Arc::clone(journal));
	Method::new(sig("Service", name), move |_, _| {
		journal.lock().unwrap().push(label.clone());
		Ok(None)
	})
}

struct Fixture {
	journal: Journal,
	initializer: ModelInitializer,
}

fn fixture() -> Fixture {
	let journal = Journal::default();
	let introspector = StaticIntrospector::new()
		.with(interceptor("Explicit", &journal))
		.with(interceptor("Tx", &journal).bound_interceptor(markers(&["Transactional"])))
		.with(interceptor("Audit", &journal).bound_interceptor(markers(&["Audited"])))
		.with(interceptor("PerMethod", &journal))
		.with(
			TypeDescription::new(TypeKey::from("Service"))
				.with_markers(markers(&["Transactional"]))
				.with_interceptors([TypeKey::from("Explicit")])
				.with_operation(
					OperationDescription::new(sig("Service", "save"))
						.with_markers(markers(&["Audited"]))
						.with_interceptors([TypeKey::from("PerMethod")]),
				)
				.with_operation(OperationDescription::new(sig("Service", "ping")).excluding_class_interceptors())
				.with_operation(
					OperationDescription::new(sig("Service", "tick"))
						.with_markers(markers(&["Audited"]))
						.as_timeout(),
				)
				.with_advice(recorder("Service", Phase::AroundInvoke, &journal)),
		)
		.with(TypeDescription::new(TypeKey::from("Broken")).with_interceptors([TypeKey::from("Missing")]));
	let introspector: Arc<dyn TypeIntrospector> = Arc::new(introspector);

	let enabled = EnabledInterceptors::from_introspector(
		introspector.as_ref(),
		&[TypeKey::from("Tx"), TypeKey::from("Audit"), TypeKey::from("Explicit")],
	)
	.unwrap();
	let caches = Arc::new(InterceptionCaches::new(introspector));
	Fixture {
		journal,
		initializer: ModelInitializer::new(caches, Arc::new(enabled)),
	}
}

impl Fixture {
	fn run(&self, method: &str) -> Vec<String> {
		let model = self.initializer.init(&TypeKey::from("Service")).unwrap();
		let handler = InterceptedInstance::new(model, value(())).unwrap();
		self.journal.lock().unwrap().clear();
		handler.invoke(&op(method, &self.journal), vec![]).unwrap();
		self.journal.lock().unwrap().clone()
	}
}

#[test]
fn explicit_then_resolved_then_method_then_own() {
	let f = fixture();
	assert_eq!(f.run("save"), vec!["Explicit", "Tx", "PerMethod", "Audit", "Service", "<save>"]);
	assert_eq!(f.run("other"), vec!["Explicit", "Tx", "Service", "<other>"]);
}

#[test]
fn excluded_operation_keeps_own_advice() {
	let f = fixture();
	assert_eq!(f.run("ping"), vec!["Service", "<ping>"]);
}

#[test]
fn timeout_operations_bind_around_timeout() {
	let f = fixture();
	let model = f.initializer.init(&TypeKey::from("Service")).unwrap();
	let tick = sig("Service", "tick");
	let bound: Vec<_> = model
		.method_bound_interceptors(Phase::AroundTimeout, &tick)
		.iter()
		.map(|i| i.class().name().to_string())
		.collect();
	assert_eq!(bound, vec!["Audit"]);

	let handler = InterceptedInstance::new(model, value(())).unwrap();
	handler.invoke_timeout(&op("tick", &f.journal), vec![], value(1u8)).unwrap();
	let seen = f.journal.lock().unwrap().clone();
	assert_eq!(seen, vec!["Explicit", "Tx", "Audit", "<tick>"]);
}

#[test]
fn models_are_cached_per_type() {
	let f = fixture();
	let a = f.initializer.init(&TypeKey::from("Service")).unwrap();
	let b = f.initializer.init(&TypeKey::from("Service")).unwrap();
	assert!(Arc::ptr_eq(&a, &b));
	assert!(f.initializer.caches().cached_model(&TypeKey::from("Service")).is_some());
}

#[test]
fn unknown_interceptor_fails_model() {
	let f = fixture();
	let err = f.initializer.init(&TypeKey::from("Broken")).unwrap_err();
	assert!(matches!(err, ModelError::UnknownInterceptor(t) if t.name() == "Missing"));
	assert!(f.initializer.caches().cached_model(&TypeKey::from("Broken")).is_none());
}

#[test]
fn unknown_target_is_an_introspection_error() {
	let f = fixture();
	assert!(matches!(
		f.initializer.init(&TypeKey::from("Nowhere")),
		Err(ModelError::Introspection(_))
	));
}

fn named(name: String, journal: &Journal) -> Arc<InterceptorClassMetadata> {
	let methods = InterceptorMethods::new().extend_level([], [recorder(&name, Phase::AroundInvoke, journal)]);
	Arc::new(InterceptorClassMetadata::plain(
		TypeKey::new(name),
		Arc::new(methods),
		factory(),
	))
}

proptest! {
	#[test]
	fn chain_runs_globals_then_bound(
		globals in prop::collection::vec("[a-z]{1,6}", 0..5),
		bound in prop::collection::vec("[A-Z]{1,6}", 0..5),
		excluded in any::<bool>(),
	) {
		let journal = Journal::default();
		let mut b = InterceptionModelBuilder::new(TypeKey::from("Service"));
		b.bind_global(Phase::AroundInvoke, globals.iter().map(|n| named(n.clone(), &journal))).unwrap();
		b.bind_method(Phase::AroundInvoke, &sig("Service", "foo"), bound.iter().map(|n| named(n.clone(), &journal))).unwrap();
		if excluded {
			b.exclude_global_interceptors(&sig("Service", "foo")).unwrap();
		}
		let handler = InterceptedInstance::new(Arc::new(b.build().unwrap()), value(())).unwrap();
		handler.invoke(&op("foo", &journal), vec![]).unwrap();

		let mut expected: Vec<String> = if excluded { Vec::new() } else { globals.clone() };
		expected.extend(bound.iter().cloned());
		expected.push("<foo>".to_string());
		prop_assert_eq!(journal.lock().unwrap().clone(), expected);
	}
}
