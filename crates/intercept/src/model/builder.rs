use std::sync::Arc;

use tracing::debug;
use weave_primitives::{MethodSignature, Phase, TypeKey};

use super::{InterceptionModel, ModelParts};
use crate::{BuildError, InterceptorClassMetadata, TargetClassInterceptorMetadata};

enum BuilderState {
	Open(ModelParts),
	Built,
}

/// Single-use builder for an [`InterceptionModel`].
///
/// Interceptors are appended in call order within each phase/operation
/// bucket. Nothing is sorted or deduplicated: an interceptor bound at two
/// levels runs twice. After [`Self::build`] every call fails with
/// [`BuildError::AlreadyBuilt`].
pub struct InterceptionModelBuilder {
	target: TypeKey,
	state: BuilderState,
}

impl InterceptionModelBuilder {
	pub fn new(target: TypeKey) -> Self {
		Self {
			target,
			state: BuilderState::Open(ModelParts::default()),
		}
	}

	pub fn target(&self) -> &TypeKey {
		&self.target
	}

	pub fn is_built(&self) -> bool {
		matches!(self.state, BuilderState::Built)
	}

	fn parts_mut(&mut self) -> Result<&mut ModelParts, BuildError> {
		match &mut self.state {
			BuilderState::Open(parts) => Ok(parts),
			BuilderState::Built => Err(BuildError::AlreadyBuilt {
				target: self.target.clone(),
			}),
		}
	}

	/// Binds interceptors to every operation of `phase`.
	pub fn bind_global<I>(&mut self, phase: Phase, interceptors: I) -> Result<(), BuildError>
	where
		I: IntoIterator<Item = Arc<InterceptorClassMetadata>>,
	{
		let parts = self.parts_mut()?;
		let bucket = parts.global.entry(phase).or_default();
		for interceptor in interceptors {
			record(&mut parts.all, &interceptor);
			bucket.push(interceptor);
		}
		Ok(())
	}

	/// Binds interceptors to one operation.
	///
	/// Lifecycle phases cannot be narrowed to an operation and fail with
	/// [`BuildError::IneligibleBinding`].
	pub fn bind_method<I>(&mut self, phase: Phase, method: &MethodSignature, interceptors: I) -> Result<(), BuildError>
	where
		I: IntoIterator<Item = Arc<InterceptorClassMetadata>>,
	{
		let parts = self.parts_mut()?;
		if phase.is_lifecycle_callback() {
			return Err(BuildError::IneligibleBinding {
				phase,
				method: method.clone(),
			});
		}
		let bucket = parts
			.method_bound
			.entry(phase)
			.or_default()
			.entry(method.clone())
			.or_default();
		for interceptor in interceptors {
			record(&mut parts.all, &interceptor);
			bucket.push(interceptor);
		}
		Ok(())
	}

	/// Opts `method` out of global interceptors.
	pub fn exclude_global_interceptors(&mut self, method: &MethodSignature) -> Result<(), BuildError> {
		self.parts_mut()?.excluded.insert(method.clone());
		Ok(())
	}

	/// Records advice declared on the target type itself.
	pub fn set_target_class_metadata(
		&mut self,
		metadata: Arc<TargetClassInterceptorMetadata>,
	) -> Result<(), BuildError> {
		self.parts_mut()?.target_class = Some(metadata);
		Ok(())
	}

	/// Freezes the builder and returns the model.
	pub fn build(&mut self) -> Result<InterceptionModel, BuildError> {
		match std::mem::replace(&mut self.state, BuilderState::Built) {
			BuilderState::Open(parts) => {
				debug!(
					target_type = %self.target,
					interceptors = parts.all.len(),
					excluded = parts.excluded.len(),
					self_intercepting = parts.target_class.is_some(),
					"interception model built"
				);
				Ok(InterceptionModel::new(self.target.clone(), parts))
			}
			BuilderState::Built => Err(BuildError::AlreadyBuilt {
				target: self.target.clone(),
			}),
		}
	}
}

fn record(
	all: &mut indexmap::IndexMap<TypeKey, Arc<InterceptorClassMetadata>, rustc_hash::FxBuildHasher>,
	interceptor: &Arc<InterceptorClassMetadata>,
) {
	all.entry(interceptor.class().clone())
		.or_insert_with(|| Arc::clone(interceptor));
}
