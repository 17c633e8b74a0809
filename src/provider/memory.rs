//! In-memory reference provider.
//!
//! Keeps one table of field snapshots per model type. Related records are
//! linked explicitly with [`MemoryProvider::link`]; `fetch` serves those links.

use anyhow::{Context, anyhow, bail};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use crate::core::{IdentityType, ModelError, Result, Value};
use crate::factory::ModelFactory;
use crate::instance::Model;
use crate::registry::{ConnectionDescriptor, ModelDescriptor};
use super::{FindQuery, PersistenceProvider};

lazy_static! {
    static ref EQUALITY: Regex = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*\?\s*$").unwrap();
}

type Row = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<(Value, Row)>,
    next_id: i64,
}

impl Table {
    fn position(&self, id: &Value) -> Option<usize> {
        self.rows.iter().position(|(key, _)| key == id)
    }
}

/// (owner type, owner id, lower-cased connection field)
type LinkKey = (String, String, String);

#[derive(Default)]
pub struct MemoryProvider {
    tables: RwLock<HashMap<String, Table>>,
    links: RwLock<HashMap<LinkKey, Vec<(String, Value)>>>,
    fetch_calls: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links saved `related` records to the saved `owner` under `field`.
    pub fn link(&self, owner: &Model, field: &str, related: &[&Model]) -> Result<()> {
        let connection = owner
            .descriptor()
            .connection(field)
            .ok_or_else(|| ModelError::connection_not_found(owner.type_name(), field))?;
        let key = link_key(owner, &connection.field)?;

        let mut targets = Vec::with_capacity(related.len());
        for model in related {
            let id = model.id()?;
            if id.is_null() {
                return Err(ModelError::UnsupportedOperation(format!(
                    "cannot link an unsaved {}",
                    model.type_name()
                )));
            }
            targets.push((model.type_name().to_string(), id));
        }

        self.links.write()?.entry(key).or_default().extend(targets);
        Ok(())
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn row_count(&self, type_name: &str) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(type_name).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    fn lookup(&self, type_name: &str, id: &Value) -> anyhow::Result<Option<Row>> {
        let tables = self
            .tables
            .read()
            .map_err(|e| anyhow!("table lock poisoned: {}", e))?;
        Ok(tables
            .get(type_name)
            .and_then(|t| t.position(id).map(|i| t.rows[i].1.clone())))
    }

    fn linked(
        &self,
        factory: &Arc<ModelFactory>,
        owner: &Model,
        field: &str,
    ) -> anyhow::Result<Vec<Model>> {
        let key = link_key(owner, field)?;
        let targets = self
            .links
            .read()
            .map_err(|e| anyhow!("link lock poisoned: {}", e))?
            .get(&key)
            .cloned()
            .unwrap_or_default();

        let mut models = Vec::with_capacity(targets.len());
        for (type_name, id) in targets {
            if let Some(row) = self.lookup(&type_name, &id)? {
                models.push(factory.materialize(&type_name, row)?);
            }
        }
        Ok(models)
    }
}

fn link_key(owner: &Model, field: &str) -> Result<LinkKey> {
    let id = owner.id()?;
    if id.is_null() {
        return Err(ModelError::UnsupportedOperation(format!(
            "{} has no identity yet",
            owner.type_name()
        )));
    }
    Ok((
        owner.type_name().to_string(),
        id.to_string(),
        field.to_lowercase(),
    ))
}

impl PersistenceProvider for MemoryProvider {
    fn save(&self, model: &mut Model) -> anyhow::Result<()> {
        let type_name = model.type_name().to_string();
        let identity = model.descriptor().identity.clone();
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("table lock poisoned: {}", e))?;
        let table = tables.entry(type_name.clone()).or_default();

        let mut id = model.id()?;
        if id.is_null() {
            if identity.id_type != IdentityType::Integer {
                bail!("{} must be set before saving {}", identity.field, type_name);
            }
            table.next_id += 1;
            id = Value::Integer(table.next_id);
            model
                .set_id(id.clone())
                .with_context(|| format!("assigning {} of {}", identity.field, type_name))?;
        } else if let Some(n) = id.as_i64() {
            table.next_id = table.next_id.max(n);
        }

        let row = model.snapshot();
        match table.position(&id) {
            Some(index) => table.rows[index] = (id, row),
            None => table.rows.push((id, row)),
        }
        Ok(())
    }

    fn delete(&self, models: &[&Model]) -> anyhow::Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("table lock poisoned: {}", e))?;
        let mut links = self
            .links
            .write()
            .map_err(|e| anyhow!("link lock poisoned: {}", e))?;

        for model in models {
            let id = model.id()?;
            if let Some(table) = tables.get_mut(model.type_name()) {
                table.rows.retain(|(key, _)| *key != id);
            }
            let owner = id.to_string();
            links.retain(|(owner_type, owner_id, _), _| {
                !(owner_type == model.type_name() && *owner_id == owner)
            });
        }
        Ok(())
    }

    fn advanced_find(&self, factory: &Arc<ModelFactory>, query: &FindQuery) -> anyhow::Result<Vec<Model>> {
        let criteria = query.criteria.trim();
        let filter: Option<(String, Value)> = if criteria.is_empty() || criteria == "1 = 1" {
            None
        } else {
            let captures = EQUALITY
                .captures(criteria)
                .ok_or_else(|| anyhow!("unsupported criteria '{}'", criteria))?;
            let param = query
                .params
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("criteria '{}' expects one parameter", criteria))?;
            Some((captures[1].to_string(), param))
        };

        let mut rows: Vec<Row> = {
            let tables = self
                .tables
                .read()
                .map_err(|e| anyhow!("table lock poisoned: {}", e))?;
            tables
                .get(&query.type_name)
                .map(|t| t.rows.iter().map(|(_, row)| row.clone()).collect())
                .unwrap_or_default()
        };

        if let Some((field, expected)) = &filter {
            rows.retain(|row| row.get(field).is_some_and(|v| v == expected));
        }

        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let left = a.get(order).cloned().unwrap_or(Value::Null);
                let right = b.get(order).cloned().unwrap_or(Value::Null);
                left.compare(&right).unwrap_or(Ordering::Equal)
            });
            if query.descending {
                rows.reverse();
            }
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        let mut models = Vec::with_capacity(rows.len());
        for row in rows {
            let mut model = factory.materialize(&query.type_name, row)?;
            for field in &query.includes {
                let related = self.linked(factory, &model, field)?;
                model.attach_fetched(field, related)?;
            }
            models.push(model);
        }
        Ok(models)
    }

    fn fetch(
        &self,
        factory: &Arc<ModelFactory>,
        _target: &ModelDescriptor,
        owner: &Model,
        connection: &ConnectionDescriptor,
    ) -> anyhow::Result<Vec<Model>> {
        self.fetch_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if owner.id()?.is_null() {
            return Ok(Vec::new());
        }
        self.linked(factory, owner, &connection.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueType;
    use crate::model::ModelDecl;
    use crate::registry::Registry;

    fn factory() -> (Arc<ModelFactory>, Arc<MemoryProvider>) {
        let registry = Arc::new(Registry::new());
        registry
            .register_models([
                ModelDecl::new("a::Note").property("Body", ValueType::Text),
                ModelDecl::new("a::Account")
                    .key("Email", ValueType::Text)
                    .property("Password", ValueType::Text),
            ])
            .unwrap();
        let provider = Arc::new(MemoryProvider::new());
        (ModelFactory::new(registry, provider.clone()), provider)
    }

    #[test]
    fn test_save_assigns_auto_increment_ids() {
        let (factory, provider) = factory();
        let mut first = factory.create("a::Note").unwrap();
        let mut second = factory.create("a::Note").unwrap();
        assert!(first.save().unwrap());
        assert!(second.save().unwrap());

        assert_eq!(first.id().unwrap(), Value::Integer(1));
        assert_eq!(second.id().unwrap(), Value::Integer(2));
        assert_eq!(provider.row_count("a::Note"), 2);
        assert!(!first.is_new_record());
    }

    #[test]
    fn test_text_identity_must_be_set() {
        let (factory, _) = factory();
        let mut account = factory.create("a::Account").unwrap();
        let err = account.save().unwrap_err();
        assert!(matches!(err, ModelError::Provider { ref operation, .. } if operation == "save"));
    }

    #[test]
    fn test_find_by_equality_with_order_and_limit() {
        let (factory, _) = factory();
        for body in ["b", "a", "c", "a"] {
            let mut note = factory.create("a::Note").unwrap();
            note.set("Body", body).unwrap();
            note.save().unwrap();
        }

        let found = factory.find("a::Note", "Body = ?", vec![Value::from("a")]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|n| !n.is_new_record()));

        let ordered = factory
            .advanced_find(&FindQuery::new("a::Note").order_by("Body").descending(true).limit(2))
            .unwrap();
        let bodies: Vec<Value> = ordered.iter().map(|n| n.get("Body").unwrap()).collect();
        assert_eq!(bodies, vec![Value::from("c"), Value::from("b")]);
    }

    #[test]
    fn test_unsupported_criteria() {
        let (factory, _) = factory();
        let err = factory.find("a::Note", "Body LIKE ?", vec![Value::from("a")]).unwrap_err();
        assert!(err.to_string().contains("unsupported criteria"));
    }

    #[test]
    fn test_delete_removes_rows() {
        let (factory, provider) = factory();
        let mut note = factory.create("a::Note").unwrap();
        note.save().unwrap();
        note.delete().unwrap();
        assert_eq!(provider.row_count("a::Note"), 0);
    }
}
