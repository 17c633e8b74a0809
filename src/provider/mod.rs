//! Persistence provider contract.
//!
//! Providers report failures as `anyhow::Error`; the factory wraps them in
//! [`crate::core::ModelError::Provider`] with the operation and the calling
//! thread.

pub mod memory;

pub use memory::MemoryProvider;

use std::sync::Arc;

use crate::core::Value;
use crate::factory::ModelFactory;
use crate::instance::Model;
use crate::registry::{ConnectionDescriptor, ModelDescriptor};

/// Parameters of a find: criteria, bound values, ordering, limit and the
/// connections to load eagerly.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub type_name: String,
    pub criteria: String,
    pub params: Vec<Value>,
    pub order_by: Option<String>,
    pub descending: bool,
    pub limit: Option<usize>,
    pub includes: Vec<String>,
}

impl FindQuery {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            criteria: String::new(),
            params: Vec::new(),
            order_by: None,
            descending: false,
            limit: None,
            includes: Vec::new(),
        }
    }

    pub fn criteria(mut self, criteria: &str) -> Self {
        self.criteria = criteria.to_string();
        self
    }

    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Loads the named connection together with each result.
    pub fn include(mut self, field: &str) -> Self {
        self.includes.push(field.to_string());
        self
    }
}

/// Storage backend behind a [`ModelFactory`].
pub trait PersistenceProvider: Send + Sync {
    /// Inserts or updates the record. May assign a server-generated identity.
    fn save(&self, model: &mut Model) -> anyhow::Result<()>;

    fn delete(&self, models: &[&Model]) -> anyhow::Result<()>;

    /// Runs a query and builds the rows into instances through `factory`.
    fn advanced_find(&self, factory: &Arc<ModelFactory>, query: &FindQuery) -> anyhow::Result<Vec<Model>>;

    /// Loads the instances of `target` related to `owner` through `connection`.
    fn fetch(
        &self,
        factory: &Arc<ModelFactory>,
        target: &ModelDescriptor,
        owner: &Model,
        connection: &ConnectionDescriptor,
    ) -> anyhow::Result<Vec<Model>>;
}
