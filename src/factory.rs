use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use crate::core::{ModelError, Result, Value};
use crate::instance::Model;
use crate::provider::{FindQuery, PersistenceProvider};
use crate::registry::{ConnectionDescriptor, Registry};

/// Creates model instances and routes persistence calls to the provider.
pub struct ModelFactory {
    registry: Arc<Registry>,
    provider: Arc<dyn PersistenceProvider>,
}

impl ModelFactory {
    pub fn new(registry: Arc<Registry>, provider: Arc<dyn PersistenceProvider>) -> Arc<Self> {
        Arc::new(Self { registry, provider })
    }

    /// Factory over the process-wide registry.
    pub fn with_global_registry(provider: Arc<dyn PersistenceProvider>) -> Arc<Self> {
        Self::new(Arc::clone(Registry::global()), provider)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn PersistenceProvider> {
        &self.provider
    }

    /// A new record of `type_name`, with one nested instance per supertype
    /// and both audit timestamps set to now.
    pub fn create(self: &Arc<Self>, type_name: &str) -> Result<Model> {
        self.instantiate(type_name, Utc::now())
    }

    fn instantiate(self: &Arc<Self>, type_name: &str, now: DateTime<Utc>) -> Result<Model> {
        let descriptor = self.registry.describe(type_name)?;
        let implementation = self.registry.resolve_implementation(type_name)?;
        let supers = descriptor
            .supers
            .iter()
            .map(|parent| self.instantiate(parent, now))
            .collect::<Result<Vec<_>>>()?;
        Ok(Model::new(Arc::clone(self), descriptor, implementation, supers, now))
    }

    /// Builds a persisted instance from stored values.
    pub fn materialize(
        self: &Arc<Self>,
        type_name: &str,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<Model> {
        let mut model = self.create(type_name)?;
        for (field, value) in values {
            model.set(&field, value)?;
        }
        model.mark_persisted();
        Ok(model)
    }

    /// Writes `model` through the provider and marks it persisted.
    ///
    /// Does not consult the implementation's validate hook; [`Model::save`] does.
    /// A failed write leaves `UpdatedAt` as it was before the call.
    pub fn save(&self, model: &mut Model) -> Result<()> {
        let touched = (self.registry.config().touch_updated_at_on_save
            && model.is_dirty()
            && !model.is_new_record())
        .then(|| model.touch(Utc::now()));

        if let Err(e) = self.provider.save(model) {
            if let Some(previous) = touched {
                model.restore_updated_at(previous);
            }
            return Err(ModelError::provider("save", e));
        }
        model.mark_persisted();
        debug!("Saved {} {}", model.type_name(), model.id().unwrap_or(Value::Null));
        Ok(())
    }

    pub fn delete(&self, models: &[&Model]) -> Result<()> {
        self.provider
            .delete(models)
            .map_err(|e| ModelError::provider("delete", e))
    }

    /// Finds records of `type_name` matching `criteria` with positional `params`.
    pub fn find(self: &Arc<Self>, type_name: &str, criteria: &str, params: Vec<Value>) -> Result<Vec<Model>> {
        self.advanced_find(&FindQuery::new(type_name).criteria(criteria).params(params))
    }

    pub fn advanced_find(self: &Arc<Self>, query: &FindQuery) -> Result<Vec<Model>> {
        self.registry.describe(&query.type_name)?;
        self.provider
            .advanced_find(self, query)
            .map_err(|e| ModelError::provider("find", e))
    }

    pub(crate) fn fetch(self: &Arc<Self>, owner: &Model, connection: &ConnectionDescriptor) -> Result<Vec<Model>> {
        let target = self.registry.describe(&connection.target)?;
        self.provider
            .fetch(self, &target, owner, connection)
            .map_err(|e| ModelError::provider("fetch", e))
    }
}
