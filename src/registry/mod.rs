//! Descriptor registry.
//!
//! Process-wide, append-only store of model declarations, implementations
//! and the descriptors derived from them. Every descriptor and resolved
//! implementation is computed once per type under a per-key cell and shared
//! read-only afterwards.

pub mod descriptor;
pub mod dispatch;
mod memo;
pub mod validator;

pub use descriptor::{
    ConnectionDescriptor, FieldDescriptor, FieldLocation, FieldOrigin, IdentityDescriptor,
    ModelDescriptor,
};
pub use dispatch::{DispatchTable, Handler};
pub use crate::core::MalformedModelReport;
pub use validator::validate_model;

use lazy_static::lazy_static;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::config::MapperConfig;
use crate::convention;
use crate::core::{ModelError, Result, ValueType};
use crate::implementation::{DefaultImplementation, ModelImplementation};
use crate::model::{DeclarationCatalog, ModelDecl};
use memo::Memo;

// Global registry shared by every factory that does not bring its own
lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<Registry> = Arc::new(Registry::new());
}

pub struct Registry {
    config: MapperConfig,
    catalog: RwLock<DeclarationCatalog>,
    implementations: RwLock<HashMap<String, Arc<dyn ModelImplementation>>>,
    descriptors: Memo<Arc<ModelDescriptor>>,
    resolved: Memo<Arc<dyn ModelImplementation>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Get the process-wide registry
    pub fn global() -> &'static Arc<Registry> {
        &GLOBAL_REGISTRY
    }

    pub fn new() -> Self {
        Self::from_config(MapperConfig::default())
    }

    /// Registry with a custom configuration, rejected when it does not validate.
    pub fn with_config(config: MapperConfig) -> Result<Self> {
        config.validate().map_err(ModelError::InvalidConfig)?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: MapperConfig) -> Self {
        Self {
            config,
            catalog: RwLock::new(DeclarationCatalog::new()),
            implementations: RwLock::new(HashMap::new()),
            descriptors: Memo::new(),
            resolved: Memo::new(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    // ==================== Registration ====================

    /// Adds a declaration. Declarations are never replaced.
    pub fn register_model(&self, decl: ModelDecl) -> Result<()> {
        let type_name = decl.type_name.clone();
        let mut catalog = self.catalog.write()?;
        *catalog = catalog.clone().with_model(decl)?;
        debug!("Registered model {}", type_name);
        Ok(())
    }

    pub fn register_models(&self, decls: impl IntoIterator<Item = ModelDecl>) -> Result<()> {
        for decl in decls {
            self.register_model(decl)?;
        }
        Ok(())
    }

    /// Registers an implementation under its conventional key (`ns::TableImpl`).
    pub fn register_implementation(
        &self,
        key: &str,
        implementation: Arc<dyn ModelImplementation>,
    ) -> Result<()> {
        self.implementations
            .write()?
            .insert(key.to_string(), implementation);

        let catalog = self.catalog()?;
        for type_name in catalog.list_models() {
            let conventional =
                convention::implementation_key(type_name, &self.config.implementation_suffix);
            if conventional == key && self.resolved.peek(type_name).is_some() {
                warn!(
                    "Implementation {} registered after {} was resolved; the earlier resolution stays in effect",
                    key, type_name
                );
            }
        }
        debug!("Registered implementation {}", key);
        Ok(())
    }

    /// Registers the implementation of `type_name` under its conventional key.
    pub fn register_implementation_for(
        &self,
        type_name: &str,
        implementation: Arc<dyn ModelImplementation>,
    ) -> Result<()> {
        let key = self.implementation_key(type_name);
        self.register_implementation(&key, implementation)
    }

    // ==================== Lookups ====================

    /// Snapshot of the declaration catalog.
    pub fn catalog(&self) -> Result<DeclarationCatalog> {
        Ok(self.catalog.read()?.clone())
    }

    pub fn declaration(&self, type_name: &str) -> Result<Arc<ModelDecl>> {
        Ok(Arc::clone(self.catalog.read()?.get_model(type_name)?))
    }

    pub fn list_models(&self) -> Result<Vec<String>> {
        Ok(self
            .catalog()?
            .list_models()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn implementation_key(&self, type_name: &str) -> String {
        convention::implementation_key(type_name, &self.config.implementation_suffix)
    }

    /// Descriptor of `type_name`, built on first use.
    ///
    /// Parents are described first; inheritance cycles are rejected before
    /// any parent is visited. Undeclared types, and types with an undeclared
    /// ancestor, fail without being cached.
    pub fn describe(&self, type_name: &str) -> Result<Arc<ModelDescriptor>> {
        let catalog = self.catalog()?;
        let decl = Arc::clone(catalog.get_model(type_name)?);

        let ancestry = convention::transitive_supertypes(&catalog, &decl);
        if let Err(err @ ModelError::UnknownModel(_)) = ancestry {
            return Err(err);
        }

        self.descriptors.get_or_compute(type_name, || {
            ancestry?;
            let parents = convention::direct_supertypes(&decl)
                .iter()
                .map(|parent| self.describe(parent))
                .collect::<Result<Vec<_>>>()?;

            let descriptor = ModelDescriptor::build(&catalog, &decl, &parents)?;
            debug!(
                "Described model {}: identity {}, {} fields, {} connections",
                type_name,
                descriptor.identity.field,
                descriptor.fields.len(),
                descriptor.connections.len()
            );
            Ok(Arc::new(descriptor))
        })
    }

    /// Implementation of `type_name`, validated once against the declaration.
    ///
    /// Falls back to [`DefaultImplementation`] when nothing is registered
    /// under the conventional key. A failed validation is cached and
    /// returned on every later call.
    pub fn resolve_implementation(&self, type_name: &str) -> Result<Arc<dyn ModelImplementation>> {
        let descriptor = self.describe(type_name)?;

        self.resolved.get_or_compute(type_name, || {
            let key = self.implementation_key(type_name);
            let registered = self.implementations.read()?.get(&key).cloned();
            let implementation: Arc<dyn ModelImplementation> = match registered {
                Some(implementation) => {
                    debug!("Resolved implementation {} for {}", key, type_name);
                    implementation
                }
                None => {
                    debug!("No implementation registered as {}, using the default", key);
                    Arc::new(DefaultImplementation)
                }
            };

            let catalog = self.catalog()?;
            let decl = catalog.get_model(type_name)?;
            if let Err(report) =
                validate_model(&catalog, decl, &descriptor, &key, implementation.as_ref())
            {
                warn!(
                    "Model {} is malformed: {} interface error(s), {} implementation error(s)",
                    type_name,
                    report.interface_error_count(),
                    report.implementation_error_count()
                );
                return Err(ModelError::MalformedModel(Arc::new(report)));
            }
            Ok(implementation)
        })
    }

    // ==================== Descriptor queries ====================

    pub fn table_name(&self, type_name: &str) -> Result<String> {
        Ok(self.describe(type_name)?.table_name.clone())
    }

    pub fn identity(&self, type_name: &str) -> Result<IdentityDescriptor> {
        Ok(self.describe(type_name)?.identity.clone())
    }

    pub fn is_auto_increment(&self, type_name: &str) -> Result<bool> {
        Ok(self.describe(type_name)?.identity.auto_increment)
    }

    pub fn field_types(&self, type_name: &str) -> Result<BTreeMap<String, ValueType>> {
        Ok(self.describe(type_name)?.field_types())
    }

    pub fn supertypes(&self, type_name: &str) -> Result<Vec<String>> {
        Ok(self.describe(type_name)?.supers.clone())
    }

    pub fn all_supertypes(&self, type_name: &str) -> Result<Vec<String>> {
        Ok(self.describe(type_name)?.all_supers.clone())
    }

    pub fn belongs_to(&self, type_name: &str) -> Result<Vec<String>> {
        Ok(self.describe(type_name)?.belongs_to.clone())
    }

    pub fn related_types(&self, type_name: &str) -> Result<Vec<String>> {
        Ok(self.describe(type_name)?.related.clone())
    }

    pub fn connection(&self, type_name: &str, field: &str) -> Result<ConnectionDescriptor> {
        self.describe(type_name)?
            .connection(field)
            .cloned()
            .ok_or_else(|| ModelError::connection_not_found(type_name, field))
    }

    pub fn connection_target(&self, type_name: &str, field: &str) -> Result<String> {
        Ok(self.connection(type_name, field)?.target)
    }

    pub fn is_array_connection(&self, type_name: &str, field: &str) -> Result<bool> {
        Ok(self.connection(type_name, field)?.is_array())
    }

    pub fn owns_field(&self, type_name: &str, field: &str) -> Result<bool> {
        Ok(self.describe(type_name)?.owns_field(field))
    }

    pub fn owns_field_extended(&self, type_name: &str, field: &str) -> Result<bool> {
        Ok(self.describe(type_name)?.owns_field_extended(field))
    }

    /// Number of types with a published descriptor (successful or failed).
    pub fn described_count(&self) -> usize {
        self.descriptors.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
