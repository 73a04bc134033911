//! Named metadata caches used while building interception models.
//!
//! Each cache memoizes one kind of metadata and has its own lifecycle:
//!
//! | Cache | Key | Released after bootstrap |
//! |-------|-----|--------------------------|
//! | `descriptions` | any type | yes |
//! | `interceptor_metadata` | interceptor type | no |
//! | `target_class_metadata` | target type | no |
//! | `interceptor_methods` | any type | yes |
//! | `models` | target type | no |
//!
//! The marker interner is purged after bootstrap as well.

use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;
use weave_metadata::{ComputingCache, Interner, MetadataCache};
use weave_primitives::{MarkerSet, TypeKey};

use crate::error::Result;
use crate::{
	InterceptionModel, InterceptorClassMetadata, InterceptorDeclaration, InterceptorMethods,
	IntrospectionError, ModelError, TargetClassInterceptorMetadata, TypeDescription, TypeIntrospector,
};

pub struct InterceptionCaches {
	introspector: Arc<dyn TypeIntrospector>,
	descriptions: ComputingCache<TypeKey, Arc<TypeDescription>, IntrospectionError>,
	interceptor_metadata: MetadataCache<TypeKey, Arc<InterceptorClassMetadata>>,
	target_class_metadata: MetadataCache<TypeKey, Option<Arc<TargetClassInterceptorMetadata>>>,
	interceptor_methods: MetadataCache<TypeKey, Arc<InterceptorMethods>>,
	pub(crate) models: MetadataCache<TypeKey, Arc<InterceptionModel>>,
	markers: Interner<MarkerSet>,
}

impl InterceptionCaches {
	pub fn new(introspector: Arc<dyn TypeIntrospector>) -> Self {
		let loader = Arc::clone(&introspector);
		Self {
			introspector,
			descriptions: ComputingCache::new("type_descriptions", move |ty| loader.describe(ty)),
			interceptor_metadata: MetadataCache::new("interceptor_metadata"),
			target_class_metadata: MetadataCache::new("target_class_metadata"),
			interceptor_methods: MetadataCache::new("interceptor_methods"),
			models: MetadataCache::new("interception_models"),
			markers: Interner::new("binding_markers"),
		}
	}

	pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
		&self.introspector
	}

	pub fn describe(&self, ty: &TypeKey) -> Result<Arc<TypeDescription>> {
		Ok(self.descriptions.get(ty)?)
	}

	/// Canonical shared handle for `markers`.
	pub fn intern_markers(&self, markers: &MarkerSet) -> Arc<MarkerSet> {
		self.markers.intern(markers.clone())
	}

	/// Advice methods of `ty` including inherited ones, super type first.
	pub fn interceptor_methods(&self, ty: &TypeKey) -> Result<Arc<InterceptorMethods>> {
		self.interceptor_methods.get_or_try_insert_with(ty, |ty| {
			let description = self.describe(ty)?;
			let inherited = match description.super_type() {
				Some(parent) => {
					self.check_acyclic(ty)?;
					self.interceptor_methods(parent)?
				}
				None => Arc::default(),
			};
			let methods = inherited.extend_level(description.declared_methods(), description.advice().iter().cloned());
			Ok(Arc::new(methods))
		})
	}

	/// Walks the super type chain of `ty` without caching anything.
	fn check_acyclic(&self, ty: &TypeKey) -> Result<()> {
		let mut seen = FxHashSet::default();
		let mut current = ty.clone();
		loop {
			if !seen.insert(current.clone()) {
				return Err(ModelError::CyclicHierarchy(ty.clone()));
			}
			match self.describe(&current)?.super_type() {
				Some(parent) => current = parent.clone(),
				None => return Ok(()),
			}
		}
	}

	/// Metadata of interceptor type `ty`.
	///
	/// The kind follows the type's declaration: binding interceptors become
	/// declarative, extension interceptors custom, anything else plain.
	pub fn interceptor_metadata(&self, ty: &TypeKey) -> Result<Arc<InterceptorClassMetadata>> {
		self.interceptor_metadata.get_or_try_insert_with(ty, |ty| {
			let description = self.descriptions.get(ty).map_err(|e| match e {
				IntrospectionError::UnknownType(t) => ModelError::UnknownInterceptor(t),
				other => other.into(),
			})?;

			if let Some(InterceptorDeclaration::Custom(custom)) = description.interceptor() {
				return Ok(Arc::new(InterceptorClassMetadata::custom(ty.clone(), Arc::clone(custom))));
			}

			let methods = self.interceptor_methods(ty)?;
			if methods.is_empty() {
				return Err(ModelError::NotAnInterceptor(ty.clone()));
			}
			let factory = description
				.factory()
				.cloned()
				.ok_or_else(|| ModelError::MissingFactory(ty.clone()))?;

			let metadata = match description.interceptor() {
				Some(InterceptorDeclaration::Bound { bindings }) => {
					InterceptorClassMetadata::declarative(ty.clone(), self.intern_markers(bindings), methods, factory)
				}
				_ => InterceptorClassMetadata::plain(ty.clone(), methods, factory),
			};
			Ok(Arc::new(metadata))
		})
	}

	/// Advice the target type declares on itself, if any.
	pub fn target_class_metadata(&self, ty: &TypeKey) -> Result<Option<Arc<TargetClassInterceptorMetadata>>> {
		self.target_class_metadata.get_or_try_insert_with(ty, |ty| {
			let methods = self.interceptor_methods(ty)?;
			Ok((!methods.is_empty()).then(|| Arc::new(TargetClassInterceptorMetadata::new(ty.clone(), methods))))
		})
	}

	/// The model of `ty`, if one was already built.
	pub fn cached_model(&self, ty: &TypeKey) -> Option<Arc<InterceptionModel>> {
		self.models.get(ty)
	}

	/// Releases metadata only needed while types are being processed.
	pub fn cleanup_after_bootstrap(&self) {
		self.descriptions.invalidate_all();
		self.interceptor_methods.invalidate_all();
		let purged = self.markers.purge();
		debug!(
			purged_markers = purged,
			interceptors = self.interceptor_metadata.len(),
			models = self.models.len(),
			"released bootstrap metadata"
		);
	}

	/// Drops every cached entry.
	pub fn clear(&self) {
		self.descriptions.invalidate_all();
		self.interceptor_metadata.invalidate_all();
		self.target_class_metadata.invalidate_all();
		self.interceptor_methods.invalidate_all();
		self.models.invalidate_all();
		self.markers.clear();
	}
}

impl fmt::Debug for InterceptionCaches {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptionCaches")
			.field("descriptions", &self.descriptions)
			.field("interceptor_metadata", &self.interceptor_metadata)
			.field("target_class_metadata", &self.target_class_metadata)
			.field("interceptor_methods", &self.interceptor_methods)
			.field("models", &self.models)
			.field("markers", &self.markers)
			.finish()
	}
}
