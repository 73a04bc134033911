use std::sync::Arc;

use tracing::{debug, trace};
use weave_primitives::{MarkerSet, Phase, TypeKey};

use crate::error::Result;
use crate::{
	InterceptionCaches, InterceptionModel, InterceptionModelBuilder, InterceptorClassMetadata, InterceptorResolver,
	OperationDescription,
};

/// Builds interception models from introspected type descriptions.
///
/// Type level: explicitly listed interceptors, then interceptors resolved
/// from the type's binding markers, bound globally for every phase they are
/// eligible for. Operation level: explicitly listed interceptors, then
/// interceptors resolved from the operation's own markers, bound to the
/// operation for around-invoke (and around-timeout for timer callbacks).
/// Finally the target's own advice is recorded.
pub struct ModelInitializer {
	caches: Arc<InterceptionCaches>,
	resolver: Arc<dyn InterceptorResolver>,
}

impl ModelInitializer {
	pub fn new(caches: Arc<InterceptionCaches>, resolver: Arc<dyn InterceptorResolver>) -> Self {
		Self { caches, resolver }
	}

	pub fn caches(&self) -> &Arc<InterceptionCaches> {
		&self.caches
	}

	/// Returns the model of `ty`, building it on first request.
	pub fn init(&self, ty: &TypeKey) -> Result<Arc<InterceptionModel>> {
		self.caches
			.models
			.get_or_try_insert_with(ty, |ty| self.build(ty).map(Arc::new))
	}

	fn build(&self, ty: &TypeKey) -> Result<InterceptionModel> {
		let description = self.caches.describe(ty)?;
		let mut builder = InterceptionModelBuilder::new(ty.clone());

		let explicit = self.metadata_of(description.interceptors())?;
		let class_bindings = self.caches.intern_markers(description.markers());
		for phase in Phase::ALL {
			let mut global = eligible(&explicit, phase);
			global.extend(self.resolve(phase, &class_bindings)?);
			if !global.is_empty() {
				builder.bind_global(phase, global)?;
			}
		}

		for operation in description.operations() {
			self.init_operation(&mut builder, operation)?;
		}

		if let Some(own) = self.caches.target_class_metadata(ty)? {
			builder.set_target_class_metadata(own)?;
		}
		let model = builder.build()?;
		debug!(
			target_type = %ty,
			bound_operations = model.bound_methods(Phase::AroundInvoke).count(),
			timeout_operations = model.bound_methods(Phase::AroundTimeout).count(),
			"interception model initialized"
		);
		Ok(model)
	}

	fn init_operation(&self, builder: &mut InterceptionModelBuilder, operation: &OperationDescription) -> Result<()> {
		let method = operation.method();
		if operation.excludes_class_interceptors() {
			builder.exclude_global_interceptors(method)?;
		}

		let explicit = self.metadata_of(operation.interceptors())?;
		let bindings = self.caches.intern_markers(operation.markers());
		let phases: &[Phase] = if operation.is_timeout() {
			&[Phase::AroundInvoke, Phase::AroundTimeout]
		} else {
			&[Phase::AroundInvoke]
		};

		for &phase in phases {
			let mut bound = eligible(&explicit, phase);
			bound.extend(self.resolve(phase, &bindings)?);
			if !bound.is_empty() {
				trace!(%method, %phase, count = bound.len(), "binding method interceptors");
				builder.bind_method(phase, method, bound)?;
			}
		}
		Ok(())
	}

	fn metadata_of(&self, types: &[TypeKey]) -> Result<Vec<Arc<InterceptorClassMetadata>>> {
		types.iter().map(|t| self.caches.interceptor_metadata(t)).collect()
	}

	/// Binding interceptors for `bindings` that take part in `phase`.
	fn resolve(&self, phase: Phase, bindings: &MarkerSet) -> Result<Vec<Arc<InterceptorClassMetadata>>> {
		if bindings.is_empty() {
			return Ok(Vec::new());
		}
		let resolved = self.metadata_of(&self.resolver.resolve(phase, bindings))?;
		if !resolved.is_empty() {
			debug!(%phase, ?bindings, count = resolved.len(), "resolved binding interceptors");
		}
		Ok(eligible(&resolved, phase))
	}
}

fn eligible(interceptors: &[Arc<InterceptorClassMetadata>], phase: Phase) -> Vec<Arc<InterceptorClassMetadata>> {
	interceptors.iter().filter(|i| i.is_eligible(phase)).cloned().collect()
}
