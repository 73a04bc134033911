//! Binding of a model to live instances.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use thiserror::Error;
use tracing::{trace, warn};
use weave_primitives::{Instance, InvocationError, Method, MethodSignature, Phase, TypeKey, Value, value};

use crate::error::Result;
use crate::{InterceptionChain, InterceptionModel, InterceptorInvocation, ModelError};

/// Interceptor instances created for one target instance.
///
/// One instance per interceptor type, created eagerly from
/// [`InterceptionModel::all_interceptors`] and shared by every phase and
/// operation of that target.
#[derive(Debug)]
pub struct InterceptionContext {
	instances: IndexMap<TypeKey, Instance, FxBuildHasher>,
}

impl InterceptionContext {
	pub fn new(model: &InterceptionModel) -> Result<Self> {
		let mut instances = IndexMap::with_capacity_and_hasher(model.all_interceptors().len(), FxBuildHasher);
		for interceptor in model.all_interceptors() {
			let instance = interceptor.create_instance().map_err(|source| ModelError::Instantiation {
				target: model.target().clone(),
				source,
			})?;
			instances.insert(interceptor.class().clone(), instance);
		}
		Ok(Self { instances })
	}

	pub fn instance(&self, class: &TypeKey) -> Option<&Instance> {
		self.instances.get(class)
	}

	pub fn len(&self) -> usize {
		self.instances.len()
	}

	pub fn is_empty(&self) -> bool {
		self.instances.is_empty()
	}

	/// Invocations for `phase` on `method`, external interceptors first and
	/// the target's own advice last.
	///
	/// The target's own around-construct advice is never included: it would
	/// run on an instance that does not exist yet.
	pub fn invocations(
		&self,
		model: &InterceptionModel,
		phase: Phase,
		method: Option<&MethodSignature>,
		target: &Instance,
	) -> Vec<InterceptorInvocation> {
		let mut out: Vec<_> = model
			.interceptors(phase, method)
			.iter()
			.filter_map(|interceptor| match self.instances.get(interceptor.class()) {
				Some(instance) => Some(interceptor.invocation(instance, phase)),
				None => {
					warn!(interceptor = %interceptor.class(), target = %model.target(), "interceptor has no instance");
					None
				}
			})
			.collect();
		let own = model
			.target_class_metadata()
			.filter(|own| phase != Phase::AroundConstruct && own.is_eligible(phase));
		if let Some(own) = own {
			out.push(own.invocation(target, phase));
		}
		out
	}
}

#[derive(Debug, Error)]
#[error("constructor {0} produced no instance")]
struct NoInstance(String);

/// A target instance with its interception model and interceptor instances.
///
/// This is the method handler a proxy forwards to.
#[derive(Clone, Debug)]
pub struct InterceptedInstance {
	model: Arc<InterceptionModel>,
	context: Arc<InterceptionContext>,
	target: Instance,
}

impl InterceptedInstance {
	/// Binds `target` to `model`, creating fresh interceptor instances.
	pub fn new(model: Arc<InterceptionModel>, target: Instance) -> Result<Self> {
		let context = Arc::new(InterceptionContext::new(&model)?);
		Ok(Self::with_context(model, context, target))
	}

	/// Binds `target` to interceptor instances that already exist.
	pub fn with_context(model: Arc<InterceptionModel>, context: Arc<InterceptionContext>, target: Instance) -> Self {
		for foreign in context.instances.keys().filter(|class| !model.contains_interceptor(class)) {
			warn!(interceptor = %foreign, target = %model.target(), "interceptor instance not used by model");
		}
		Self { model, context, target }
	}

	/// Creates the target through `constructor`, wrapped in the
	/// around-construct chain.
	///
	/// The chain runs before the target exists, so external interceptors see
	/// a unit placeholder as target and advice the target type declares for
	/// around-construct is skipped. The constructor must return the new
	/// instance.
	pub fn construct(model: Arc<InterceptionModel>, constructor: &Method, args: Vec<Value>) -> Result<Self> {
		let context = Arc::new(InterceptionContext::new(&model)?);
		let placeholder = value(());
		let invocations = context.invocations(&model, Phase::AroundConstruct, None, &placeholder);
		let chain = InterceptionChain::new(invocations, placeholder, Some(constructor.clone()));
		let instantiation = |source| ModelError::Instantiation {
			target: model.target().clone(),
			source,
		};

		let target = chain
			.invoke(args)
			.map_err(instantiation)?
			.ok_or_else(|| instantiation(InvocationError::failure(NoInstance(constructor.signature().to_string()))))?;
		Ok(Self::with_context(model, context, target))
	}

	pub fn model(&self) -> &Arc<InterceptionModel> {
		&self.model
	}

	pub fn context(&self) -> &Arc<InterceptionContext> {
		&self.context
	}

	pub fn target(&self) -> &Instance {
		&self.target
	}

	/// Invokes a business operation through its around-invoke chain.
	pub fn invoke(&self, method: &Method, args: Vec<Value>) -> std::result::Result<Option<Value>, InvocationError> {
		self.chain(Phase::AroundInvoke, Some(method)).invoke(args)
	}

	/// Invokes a timer callback through its around-timeout chain.
	pub fn invoke_timeout(
		&self,
		method: &Method,
		args: Vec<Value>,
		timer: Value,
	) -> std::result::Result<Option<Value>, InvocationError> {
		self.chain(Phase::AroundTimeout, Some(method))
			.invoke_with_timer(args, Some(timer))
	}

	/// Runs the callbacks of a lifecycle phase. There is no terminal call.
	///
	/// Around-construct is driven by [`Self::construct`] and rejected here
	/// together with the around phases.
	pub fn invoke_lifecycle(&self, phase: Phase) -> std::result::Result<(), InvocationError> {
		if !Phase::lifecycle_callbacks().any(|p| p == phase) {
			return Err(InvocationError::IllegalArguments {
				method: phase.to_string(),
				reason: "not a lifecycle callback phase".to_string(),
			});
		}
		self.chain(phase, None).invoke(Vec::new()).map(drop)
	}

	fn chain(&self, phase: Phase, method: Option<&Method>) -> InterceptionChain {
		let invocations = self
			.context
			.invocations(&self.model, phase, method.map(Method::signature), &self.target);
		trace!(
			target_type = %self.model.target(),
			%phase,
			invocations = invocations.len(),
			"building interception chain"
		);
		InterceptionChain::new(invocations, Arc::clone(&self.target), method.cloned())
	}
}
