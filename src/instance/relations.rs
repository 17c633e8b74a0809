use std::sync::Arc;
use tracing::{Level, event, info_span};

use crate::core::{ModelError, Result};
use crate::registry::ConnectionDescriptor;
use super::Model;

/// Cached instances of one connection field.
///
/// An entry is confirmed once its content has been fetched from, or
/// reconciled with, the persistence provider. Hand-attached instances
/// leave the entry unconfirmed.
#[derive(Debug, Clone, Default)]
pub struct RelationEntry {
    confirmed: bool,
    instances: Vec<Model>,
}

impl RelationEntry {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn instances(&self) -> &[Model] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Appends fetched instances and confirms the entry. With `dedupe`, a
    /// fetched instance whose identity matches a held one is skipped.
    fn reconcile(&mut self, fetched: Vec<Model>, dedupe: bool) {
        for model in fetched {
            let held = dedupe
                && self
                    .instances
                    .iter()
                    .any(|existing| existing.equals_id(&model).unwrap_or(false));
            if !held {
                self.instances.push(model);
            }
        }
        self.confirmed = true;
    }
}

impl Model {
    fn connection_for(&self, field: &str) -> Result<ConnectionDescriptor> {
        self.descriptor
            .connection(field)
            .cloned()
            .ok_or_else(|| ModelError::connection_not_found(self.type_name(), field))
    }

    /// Related instances of a connection, fetched on first access.
    ///
    /// A missing or unconfirmed entry triggers exactly one provider fetch
    /// whose results are appended to whatever was attached by hand. Later
    /// calls are served from the cache. A failed fetch leaves the entry as
    /// it was, so the next access retries.
    pub fn related(&mut self, field: &str) -> Result<&[Model]> {
        let key = field.to_lowercase();
        let connection = self.connection_for(&key)?;

        let confirmed = self.relations.get(&key).is_some_and(RelationEntry::is_confirmed);
        if !confirmed {
            let span = info_span!(
                "relation.fetch",
                model = %self.descriptor.type_name,
                field = %connection.field,
                target = %connection.target
            );
            let _enter = span.enter();

            let factory = Arc::clone(&self.factory);
            let fetched = match factory.fetch(self, &connection) {
                Ok(fetched) => fetched,
                Err(err) => {
                    event!(Level::WARN, error = %err, "relation fetch failed");
                    return Err(err);
                }
            };
            event!(Level::DEBUG, fetched = fetched.len(), "relation fetched");

            let dedupe = factory.registry().config().dedupe_reconciled_relations;
            self.relations
                .entry(key.clone())
                .or_default()
                .reconcile(fetched, dedupe);
        }

        self.relations
            .get(&key)
            .map(|entry| entry.instances.as_slice())
            .ok_or_else(|| ModelError::connection_not_found(&self.descriptor.type_name, field))
    }

    /// First related instance of a connection, or `None` when there is none.
    pub fn related_one(&mut self, field: &str) -> Result<Option<&Model>> {
        Ok(self.related(field)?.first())
    }

    /// Adds instances to a connection by hand. The entry stays unconfirmed
    /// until the next access reconciles it with the provider.
    pub fn attach(&mut self, field: &str, models: Vec<Model>) -> Result<()> {
        let connection = self.connection_for(field)?;
        check_targets(&connection, &models)?;
        let entry = self.relations.entry(connection.field.to_lowercase()).or_default();
        entry.instances.extend(models);
        self.dirty = true;
        Ok(())
    }

    /// Stores instances a provider loaded eagerly, marking the entry confirmed.
    pub fn attach_fetched(&mut self, field: &str, models: Vec<Model>) -> Result<()> {
        let connection = self.connection_for(field)?;
        check_targets(&connection, &models)?;
        let dedupe = self.factory.registry().config().dedupe_reconciled_relations;
        self.relations
            .entry(connection.field.to_lowercase())
            .or_default()
            .reconcile(models, dedupe);
        Ok(())
    }

    pub fn is_relation_confirmed(&self, field: &str) -> bool {
        self.relations
            .get(&field.to_lowercase())
            .is_some_and(RelationEntry::is_confirmed)
    }

    /// Cache entry of a connection, without fetching.
    pub fn cached_relation(&self, field: &str) -> Option<&RelationEntry> {
        self.relations.get(&field.to_lowercase())
    }

    /// Cached connections keyed by lower-cased field name.
    pub fn cached_relations(&self) -> impl Iterator<Item = (&str, &RelationEntry)> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn check_targets(connection: &ConnectionDescriptor, models: &[Model]) -> Result<()> {
    for model in models {
        let fits = model.type_name() == connection.target
            || model.descriptor.all_supers.contains(&connection.target);
        if !fits {
            return Err(ModelError::TypeMismatch(format!(
                "connection '{}' holds {}, got {}",
                connection.field,
                connection.target,
                model.type_name()
            )));
        }
    }
    Ok(())
}
