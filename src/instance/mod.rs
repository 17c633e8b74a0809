//! Live model instances.
//!
//! A [`Model`] owns its field store, its relation cache and one nested
//! instance per direct supertype. Fields are read and written through the
//! ownership table of the type's descriptor, so an inherited field always
//! lands in the sub-instance that physically stores it.

mod dispatch;
mod export;
mod identity;
mod relations;

pub use dispatch::Reply;
pub use relations::RelationEntry;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::convention::{CREATED_AT, UPDATED_AT};
use crate::core::{ModelError, Result, Value};
use crate::factory::ModelFactory;
use crate::implementation::ModelImplementation;
use crate::registry::ModelDescriptor;

#[derive(Clone)]
pub struct Model {
    factory: Arc<ModelFactory>,
    descriptor: Arc<ModelDescriptor>,
    implementation: Arc<dyn ModelImplementation>,
    fields: BTreeMap<String, Value>,
    relations: BTreeMap<String, RelationEntry>,
    supers: Vec<Model>,
    dirty: bool,
    new_record: bool,
}

impl Model {
    pub(crate) fn new(
        factory: Arc<ModelFactory>,
        descriptor: Arc<ModelDescriptor>,
        implementation: Arc<dyn ModelImplementation>,
        supers: Vec<Model>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(CREATED_AT.to_string(), Value::Timestamp(now));
        fields.insert(UPDATED_AT.to_string(), Value::Timestamp(now));

        Self {
            factory,
            descriptor,
            implementation,
            fields,
            relations: BTreeMap::new(),
            supers,
            dirty: true,
            new_record: true,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.descriptor.table_name
    }

    pub fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    pub fn factory(&self) -> &Arc<ModelFactory> {
        &self.factory
    }

    pub fn implementation(&self) -> &Arc<dyn ModelImplementation> {
        &self.implementation
    }

    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn extends_models(&self) -> bool {
        !self.supers.is_empty()
    }

    /// Nested instances for the direct supertypes, in declaration order.
    pub fn supertypes(&self) -> &[Model] {
        &self.supers
    }

    /// Sub-instance for `type_name`, searched through the whole hierarchy.
    pub fn supertype(&self, type_name: &str) -> Option<&Model> {
        self.supers.iter().find_map(|s| {
            if s.type_name() == type_name {
                Some(s)
            } else {
                s.supertype(type_name)
            }
        })
    }

    fn store_at(&self, path: &[usize]) -> Option<&Model> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.supers.get(*index)?.store_at(rest),
        }
    }

    fn store_at_mut(&mut self, path: &[usize]) -> Option<&mut Model> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.supers.get_mut(*index)?.store_at_mut(rest),
        }
    }

    /// Reads a field from the sub-instance that owns it. Unset fields read as `Null`.
    pub fn get(&self, field: &str) -> Result<Value> {
        let location = self
            .descriptor
            .locate(field)
            .ok_or_else(|| ModelError::field_not_found(self.type_name(), field))?;
        let store = self
            .store_at(&location.path)
            .ok_or_else(|| ModelError::field_not_found(self.type_name(), field))?;
        Ok(store.fields.get(&location.field).cloned().unwrap_or(Value::Null))
    }

    /// Writes a field into the sub-instance that owns it and marks the record dirty.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let descriptor = Arc::clone(&self.descriptor);
        let location = descriptor
            .locate(field)
            .ok_or_else(|| ModelError::field_not_found(&descriptor.type_name, field))?;
        let store = self
            .store_at_mut(&location.path)
            .ok_or_else(|| ModelError::field_not_found(&descriptor.type_name, field))?;

        let expected = store
            .descriptor
            .fields
            .get(&location.field)
            .map(|f| f.value_type.clone())
            .ok_or_else(|| ModelError::field_not_found(&descriptor.type_name, field))?;
        if !expected.accepts(&value) {
            return Err(ModelError::TypeMismatch(format!(
                "field '{}' of '{}' expects {}, got {}",
                field,
                descriptor.type_name,
                expected,
                value.type_name()
            )));
        }

        store.fields.insert(location.field.clone(), value);
        store.dirty = true;
        self.dirty = true;
        Ok(())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get(CREATED_AT).and_then(Value::as_timestamp)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.fields.get(UPDATED_AT).and_then(Value::as_timestamp)
    }

    /// Every set field reachable on this instance, own and inherited.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.descriptor
            .reachable_fields()
            .into_iter()
            .filter_map(|name| match self.get(name) {
                Ok(Value::Null) | Err(_) => None,
                Ok(value) => Some((name.to_string(), value)),
            })
            .collect()
    }

    /// Saves the record through the persistence provider.
    ///
    /// Returns `Ok(false)` without touching the provider when the
    /// implementation's validate hook rejects the instance.
    pub fn save(&mut self) -> Result<bool> {
        if !self.implementation.validate(self) {
            return Ok(false);
        }
        let factory = Arc::clone(&self.factory);
        factory.save(self)?;
        Ok(true)
    }

    pub fn delete(&self) -> Result<()> {
        self.factory.delete(&[self])
    }

    /// Stamps `UpdatedAt` across the composition and returns the previous
    /// values in preorder, for [`Model::restore_updated_at`].
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) -> Vec<Option<Value>> {
        let mut previous = Vec::new();
        self.touch_into(now, &mut previous);
        previous
    }

    fn touch_into(&mut self, now: DateTime<Utc>, previous: &mut Vec<Option<Value>>) {
        previous.push(self.fields.insert(UPDATED_AT.to_string(), Value::Timestamp(now)));
        for parent in &mut self.supers {
            parent.touch_into(now, previous);
        }
    }

    pub(crate) fn restore_updated_at(&mut self, previous: Vec<Option<Value>>) {
        self.restore_from(&mut previous.into_iter());
    }

    fn restore_from(&mut self, previous: &mut std::vec::IntoIter<Option<Value>>) {
        match previous.next() {
            Some(Some(value)) => {
                self.fields.insert(UPDATED_AT.to_string(), value);
            }
            Some(None) => {
                self.fields.remove(UPDATED_AT);
            }
            None => return,
        }
        for parent in &mut self.supers {
            parent.restore_from(previous);
        }
    }

    /// Clears the dirty and new-record flags across the whole composition.
    pub(crate) fn mark_persisted(&mut self) {
        self.new_record = false;
        self.dirty = false;
        for parent in &mut self.supers {
            parent.mark_persisted();
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("type_name", &self.descriptor.type_name)
            .field("fields", &self.fields)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .field("supers", &self.supers)
            .field("dirty", &self.dirty)
            .field("new_record", &self.new_record)
            .finish()
    }
}
