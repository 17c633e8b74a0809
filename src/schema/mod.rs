//! Schema and query text generation.
//!
//! Columns and join tables are derived from model descriptors; a dialect
//! implements [`SchemaGenerator`] and [`QueryGenerator`] to render them.

pub mod mysql;

pub use mysql::{MySqlQueryGenerator, MySqlSchemaGenerator};

use serde::Serialize;

use crate::core::{ModelError, Result, ValueType};
use crate::model::ConnectionKind;
use crate::registry::{FieldOrigin, ModelDescriptor, Registry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    /// Rows referencing a deleted parent are deleted with it.
    pub cascade: bool,
}

/// One column of a model table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value_type: ValueType,
    pub sql_type: String,
    pub is_id: bool,
    pub auto_increment: bool,
    pub not_null: bool,
    pub unique: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Attribute {
    fn new(name: &str, value_type: ValueType, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            sql_type: sql_type.to_string(),
            is_id: false,
            auto_increment: false,
            not_null: false,
            unique: false,
            foreign_key: None,
        }
    }
}

/// Join table of a ManyToMany connection declared on `table_a`.
///
/// `field_a` holds the identity of the `table_b` row, `field_b` the
/// identity of the `table_a` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub name: String,
    pub kind: ConnectionKind,
    pub table_a: String,
    pub id_a: String,
    pub id_type_a: ValueType,
    pub table_b: String,
    pub id_b: String,
    pub id_type_b: ValueType,
    pub field_a: String,
    pub field_b: String,
}

pub trait SchemaGenerator {
    fn create_ddl(&self, table: &str, attributes: &[Attribute], id_name: &str) -> String;

    /// Foreign key constraints; empty when the table has none.
    fn create_constraints(&self, table: &str, attributes: &[Attribute]) -> String;

    /// Join table DDL; empty for anything but ManyToMany.
    fn create_join_table(&self, relationship: &Relationship) -> String;

    fn mapped_type(&self, value_type: &ValueType) -> Option<&'static str>;
}

pub trait QueryGenerator {
    fn generate_select(
        &self,
        what: &[&str],
        from: &[&str],
        criteria: &str,
        order_by: Option<&str>,
        descending: bool,
        limit: Option<usize>,
    ) -> String;
}

fn sql_type(generator: &dyn SchemaGenerator, descriptor: &ModelDescriptor, value_type: &ValueType) -> Result<&'static str> {
    generator.mapped_type(value_type).ok_or_else(|| {
        ModelError::UnsupportedOperation(format!(
            "no SQL type for {} in '{}'",
            value_type, descriptor.type_name
        ))
    })
}

/// Columns of the table of `type_name`: stored fields, supertype keys,
/// audit fields and the foreign keys of singular connections declared on
/// the type itself.
pub fn attributes(
    registry: &Registry,
    generator: &dyn SchemaGenerator,
    type_name: &str,
) -> Result<Vec<Attribute>> {
    let descriptor = registry.describe(type_name)?;
    let identity = &descriptor.identity;
    let mut columns = Vec::new();

    for field in descriptor.fields.values() {
        let mut column = Attribute::new(
            &field.name,
            field.value_type.clone(),
            sql_type(generator, &descriptor, &field.value_type)?,
        );
        column.is_id = field.name == identity.field;
        column.auto_increment = column.is_id && identity.auto_increment;
        column.not_null = field.not_null;
        column.unique = field.unique && !column.is_id;

        if let FieldOrigin::SupertypeKey { supertype } = &field.origin {
            let parent = registry.describe(supertype)?;
            column.foreign_key = Some(ForeignKey {
                table: parent.table_name.clone(),
                column: parent.identity.field.clone(),
                cascade: true,
            });
        }
        columns.push(column);
    }

    for connection in descriptor.connections.values() {
        if connection.declared_on != descriptor.type_name || connection.is_array() {
            continue;
        }
        let cascade = match connection.kind {
            ConnectionKind::BelongsTo => true,
            ConnectionKind::Aggregation | ConnectionKind::Composition => false,
            ConnectionKind::ManyToMany => continue,
        };
        let target = registry.describe(&connection.target)?;
        let mut column = Attribute::new(
            &format!("{}{}", connection.field, target.identity.field),
            target.identity.value_type.clone(),
            sql_type(generator, &descriptor, &target.identity.value_type)?,
        );
        column.not_null = cascade;
        column.foreign_key = Some(ForeignKey {
            table: target.table_name.clone(),
            column: target.identity.field.clone(),
            cascade,
        });
        columns.push(column);
    }

    // identity column first, then by name
    columns.sort_by(|a, b| b.is_id.cmp(&a.is_id).then_with(|| a.name.cmp(&b.name)));
    Ok(columns)
}

/// Join tables for the ManyToMany connections declared on `type_name`.
pub fn relationships(registry: &Registry, type_name: &str) -> Result<Vec<Relationship>> {
    let descriptor = registry.describe(type_name)?;
    let mut found = Vec::new();

    for connection in descriptor.connections.values() {
        if connection.kind != ConnectionKind::ManyToMany || connection.declared_on != descriptor.type_name {
            continue;
        }
        let target = registry.describe(&connection.target)?;
        found.push(Relationship {
            name: connection.name.clone(),
            kind: connection.kind,
            table_a: descriptor.table_name.clone(),
            id_a: descriptor.identity.field.clone(),
            id_type_a: descriptor.identity.value_type.clone(),
            table_b: target.table_name.clone(),
            id_b: target.identity.field.clone(),
            id_type_b: target.identity.value_type.clone(),
            field_a: format!("{}{}", target.table_name, target.identity.field),
            field_b: format!("{}{}", descriptor.table_name, descriptor.identity.field),
        });
    }
    Ok(found)
}

/// DDL for `types`: every table, then every constraint, then join tables.
pub fn migrate(registry: &Registry, generator: &dyn SchemaGenerator, types: &[&str]) -> Result<String> {
    let mut tables = String::new();
    let mut constraints = String::new();
    let mut joins = String::new();
    let mut seen_joins: Vec<String> = Vec::new();

    for type_name in types {
        let descriptor = registry.describe(type_name)?;
        let columns = attributes(registry, generator, type_name)?;
        tables.push_str(&generator.create_ddl(&descriptor.table_name, &columns, &descriptor.identity.field));
        constraints.push_str(&generator.create_constraints(&descriptor.table_name, &columns));

        for relationship in relationships(registry, type_name)? {
            if seen_joins.contains(&relationship.name) {
                continue;
            }
            joins.push_str(&generator.create_join_table(&relationship));
            seen_joins.push(relationship.name);
        }
    }

    Ok(format!("{}{}{}", tables, constraints, joins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDecl;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register_models([
                ModelDecl::new("corp::Person").property("Name", ValueType::Text),
                ModelDecl::new("corp::Employee")
                    .extends("corp::Person")
                    .property("Salary", ValueType::Double)
                    .connection("Employer", ValueType::model("corp::Corporation"), "Employer", ConnectionKind::BelongsTo),
                ModelDecl::new("corp::Corporation")
                    .property("Name", ValueType::Text)
                    .connection("Partners", ValueType::model_array("corp::Corporation2"), "Partnership", ConnectionKind::ManyToMany),
                ModelDecl::new("corp::Corporation2").property("Name", ValueType::Text),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn test_attributes_of_subtype() {
        let registry = registry();
        let columns = attributes(&registry, &MySqlSchemaGenerator, "corp::Employee").unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["PersonId", "CreatedAt", "EmployerId", "Salary", "UpdatedAt"]);

        let key = &columns[0];
        assert!(key.is_id);
        assert!(!key.auto_increment);
        assert_eq!(key.foreign_key.as_ref().unwrap().table, "Person");

        let employer = &columns[2];
        assert!(employer.foreign_key.as_ref().unwrap().cascade);
        assert_eq!(employer.sql_type, "int");
    }

    #[test]
    fn test_many_to_many_relationship() {
        let registry = registry();
        let found = relationships(&registry, "corp::Corporation").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Partnership");
        assert_eq!(found[0].field_a, "Corporation2Id");
        assert_eq!(found[0].field_b, "CorporationId");
    }

    #[test]
    fn test_migrate_orders_statements() {
        let registry = registry();
        let ddl = migrate(
            &registry,
            &MySqlSchemaGenerator,
            &["corp::Person", "corp::Employee", "corp::Corporation", "corp::Corporation2"],
        )
        .unwrap();

        let last_create = ddl.rfind("CREATE TABLE Corporation2").unwrap();
        let first_alter = ddl.find("ALTER TABLE").unwrap();
        let join = ddl.find("CREATE TABLE Partnership").unwrap();
        assert!(last_create < first_alter);
        assert!(first_alter < join);
    }
}
