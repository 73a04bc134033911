use core::fmt;
use core::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};
use weave_identity::{ComponentIdentifier, Contextual, ContextualStore, PassivationHandle};
use weave_intercept::{
	InterceptedInstance, InterceptionCaches, InterceptionModel, InterceptorResolver, ModelInitializer,
	TypeIntrospector,
};
use weave_primitives::{Instance, TypeKey};

use crate::{EngineConfig, Result};

/// Interception and identity services of one container.
///
/// `D` is the component descriptor type kept in the identity registry.
pub struct Engine<D> {
	config: EngineConfig,
	caches: Arc<InterceptionCaches>,
	initializer: ModelInitializer,
	store: Arc<ContextualStore<D>>,
	initialized: AtomicBool,
}

impl<D> Engine<D>
where
	D: Contextual + Eq + Hash + Clone,
{
	pub fn new(
		config: EngineConfig,
		introspector: Arc<dyn TypeIntrospector>,
		resolver: Arc<dyn InterceptorResolver>,
	) -> Result<Self> {
		let format = config.identity.format()?;
		let caches = Arc::new(InterceptionCaches::new(introspector));
		let initializer = ModelInitializer::new(Arc::clone(&caches), resolver);
		debug!(
			generated_prefix = format.generated_prefix(),
			stable_prefix = format.stable_prefix(),
			"engine created"
		);
		Ok(Self {
			config,
			caches,
			initializer,
			store: Arc::new(ContextualStore::with_format(format)),
			initialized: AtomicBool::new(false),
		})
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn caches(&self) -> &Arc<InterceptionCaches> {
		&self.caches
	}

	pub fn store(&self) -> &Arc<ContextualStore<D>> {
		&self.store
	}

	/// The interception model of `ty`, built on first request.
	pub fn interception_model(&self, ty: &TypeKey) -> Result<Arc<InterceptionModel>> {
		Ok(self.initializer.init(ty)?)
	}

	/// Binds `target`, an instance of `ty`, to fresh interceptor instances.
	pub fn intercept(&self, ty: &TypeKey, target: Instance) -> Result<InterceptedInstance> {
		let model = self.interception_model(ty)?;
		Ok(InterceptedInstance::new(model, target)?)
	}

	pub fn id_of(&self, descriptor: &D) -> ComponentIdentifier {
		self.store.id_of(descriptor)
	}

	pub fn descriptor_of(&self, id: &ComponentIdentifier) -> Result<D> {
		Ok(self.store.descriptor_of(id)?)
	}

	pub fn passivate(&self, descriptor: &D) -> PassivationHandle {
		PassivationHandle::capture(&self.store, descriptor)
	}

	pub fn restore(&self, handle: &PassivationHandle) -> Result<D> {
		Ok(handle.restore(&self.store)?)
	}

	/// Marks bootstrap as finished and releases bootstrap-only metadata if
	/// configured to. Returns false if initialization had already ended.
	pub fn end_initialization(&self) -> bool {
		if self.initialized.swap(true, Ordering::AcqRel) {
			return false;
		}
		if self.config.metadata.release_bootstrap_caches {
			self.caches.cleanup_after_bootstrap();
		}
		info!("initialization ended");
		true
	}

	/// Drops every identity registration and cached model.
	pub fn shutdown(&self) {
		self.store.clear();
		self.caches.clear();
		info!("engine shut down");
	}
}

impl<D> fmt::Debug for Engine<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Engine")
			.field("config", &self.config)
			.field("caches", &self.caches)
			.field("store", &self.store)
			.field("initialized", &self.is_initialized())
			.finish()
	}
}

impl<D> Engine<D> {
	pub fn is_initialized(&self) -> bool {
		self.initialized.load(Ordering::Acquire)
	}
}
