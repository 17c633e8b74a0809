use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::convention::{self, CREATED_AT, DEFAULT_ID_FIELD, UPDATED_AT};
use crate::core::{Cardinality, IdentityType, ModelError, Result, ValueType};
use crate::model::{ConnectionKind, DeclarationCatalog, ModelDecl};
use super::dispatch::DispatchTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityDescriptor {
    pub field: String,
    pub id_type: IdentityType,
    pub value_type: ValueType,
    pub explicit: bool,
    pub auto_increment: bool,
}

/// Why a field appears in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldOrigin {
    /// A plain getter declared on the type.
    Declared,
    /// The implicit integer `Id` of a root type without an `Id` annotation.
    DefaultId,
    /// `CreatedAt` / `UpdatedAt`.
    Audit,
    /// Implicit key referencing a supertype; stored by the supertype as its identity.
    SupertypeKey { supertype: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub value_type: ValueType,
    /// Type whose sub-instance physically stores the value.
    pub owner: String,
    pub origin: FieldOrigin,
    pub unique: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionDescriptor {
    pub field: String,
    pub name: String,
    pub kind: ConnectionKind,
    pub target: String,
    pub cardinality: Cardinality,
    /// Type that declares the connection getter.
    pub declared_on: String,
}

impl ConnectionDescriptor {
    pub fn is_array(&self) -> bool {
        self.cardinality == Cardinality::Array
    }
}

/// Physical location of a field inside a composed instance: the chain of
/// supertype indices to follow, then the field name in that store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocation {
    pub path: Vec<usize>,
    pub field: String,
}

impl FieldLocation {
    fn own(field: &str) -> Self {
        Self {
            path: Vec::new(),
            field: field.to_string(),
        }
    }

    fn under(index: usize, inner: &FieldLocation) -> Self {
        let mut path = Vec::with_capacity(inner.path.len() + 1);
        path.push(index);
        path.extend_from_slice(&inner.path);
        Self {
            path,
            field: inner.field.clone(),
        }
    }
}

/// Structural metadata of a model type. Immutable once published by the registry.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub type_name: String,
    pub table_name: String,
    pub identity: IdentityDescriptor,
    /// Fields visible on this type's own descriptor: declared, audit,
    /// default id and supertype keys.
    pub fields: BTreeMap<String, FieldDescriptor>,
    pub supers: Vec<String>,
    pub all_supers: Vec<String>,
    /// Own and inherited connections keyed by lower-cased field name.
    pub connections: BTreeMap<String, ConnectionDescriptor>,
    pub belongs_to: Vec<String>,
    pub related: Vec<String>,
    #[serde(skip)]
    locations: HashMap<String, FieldLocation>,
    #[serde(skip)]
    dispatch: DispatchTable,
}

impl ModelDescriptor {
    /// Builds the descriptor of `decl` from its already published parents,
    /// given in `direct_supertypes` order.
    pub(crate) fn build(
        catalog: &DeclarationCatalog,
        decl: &ModelDecl,
        parents: &[Arc<ModelDescriptor>],
    ) -> Result<Self> {
        let type_name = decl.type_name.clone();
        let spec = convention::identity_field(catalog, decl)?;
        let id_type = IdentityType::from_value_type(&spec.value_type).ok_or_else(|| {
            ModelError::UnsupportedIdentityType {
                model: type_name.clone(),
                found: spec.value_type.name(),
            }
        })?;
        let identity = IdentityDescriptor {
            field: spec.field.clone(),
            id_type,
            value_type: spec.value_type.clone(),
            explicit: spec.explicit,
            auto_increment: spec.auto_increment,
        };

        let mut fields = BTreeMap::new();
        for getter in convention::plain_getters(decl) {
            let name = convention::field_name(&getter.name).to_string();
            fields.entry(name.clone()).or_insert(FieldDescriptor {
                name,
                value_type: getter.returns.clone(),
                owner: type_name.clone(),
                origin: FieldOrigin::Declared,
                unique: getter.is_unique() || getter.is_id(),
                not_null: getter.is_not_null() || getter.is_id(),
            });
        }

        if !spec.explicit && parents.is_empty() {
            fields.insert(
                DEFAULT_ID_FIELD.to_string(),
                FieldDescriptor {
                    name: DEFAULT_ID_FIELD.to_string(),
                    value_type: ValueType::Integer,
                    owner: type_name.clone(),
                    origin: FieldOrigin::DefaultId,
                    unique: true,
                    not_null: true,
                },
            );
        }

        for parent in parents {
            let key = format!("{}{}", parent.table_name, parent.identity.field);
            fields.entry(key.clone()).or_insert(FieldDescriptor {
                name: key,
                value_type: parent.identity.value_type.clone(),
                owner: parent.type_name.clone(),
                origin: FieldOrigin::SupertypeKey {
                    supertype: parent.type_name.clone(),
                },
                unique: false,
                not_null: true,
            });
        }

        for audit in [CREATED_AT, UPDATED_AT] {
            fields.insert(
                audit.to_string(),
                FieldDescriptor {
                    name: audit.to_string(),
                    value_type: ValueType::Timestamp,
                    owner: type_name.clone(),
                    origin: FieldOrigin::Audit,
                    unique: false,
                    not_null: true,
                },
            );
        }

        let locations = Self::locate_fields(&fields, parents)?;

        let mut connections = BTreeMap::new();
        for c in convention::connections(decl) {
            connections
                .entry(c.field.to_lowercase())
                .or_insert(ConnectionDescriptor {
                    field: c.field,
                    name: c.name,
                    kind: c.kind,
                    target: c.target,
                    cardinality: c.cardinality,
                    declared_on: type_name.clone(),
                });
        }
        for parent in parents {
            for (key, c) in &parent.connections {
                connections.entry(key.clone()).or_insert_with(|| c.clone());
            }
        }

        let dispatch = DispatchTable::build(decl, &identity, parents);

        Ok(Self {
            table_name: convention::table_name(&type_name).to_string(),
            identity,
            fields,
            supers: convention::direct_supertypes(decl),
            all_supers: convention::transitive_supertypes(catalog, decl)?,
            connections,
            belongs_to: convention::belongs_to(catalog, decl)?,
            related: convention::related_types(decl),
            locations,
            dispatch,
            type_name,
        })
    }

    /// Ownership table: own stored fields first, supertype keys redirected
    /// to the supertype's identity, then every field reachable through the
    /// parents in declaration order. The first owner found wins.
    fn locate_fields(
        fields: &BTreeMap<String, FieldDescriptor>,
        parents: &[Arc<ModelDescriptor>],
    ) -> Result<HashMap<String, FieldLocation>> {
        let mut locations = HashMap::new();

        for (name, field) in fields {
            let location = match &field.origin {
                FieldOrigin::SupertypeKey { supertype } => {
                    let (index, parent) = parents
                        .iter()
                        .enumerate()
                        .find(|(_, p)| &p.type_name == supertype)
                        .ok_or_else(|| ModelError::UnknownModel(supertype.clone()))?;
                    let inner = parent.locate(&parent.identity.field).ok_or_else(|| {
                        ModelError::field_not_found(&parent.type_name, &parent.identity.field)
                    })?;
                    FieldLocation::under(index, inner)
                }
                _ => FieldLocation::own(name),
            };
            locations.insert(name.clone(), location);
        }

        for (index, parent) in parents.iter().enumerate() {
            for (name, inner) in &parent.locations {
                locations
                    .entry(name.clone())
                    .or_insert_with(|| FieldLocation::under(index, inner));
            }
        }

        Ok(locations)
    }

    /// Where `field` is physically stored, searching the composed hierarchy.
    pub fn locate(&self, field: &str) -> Option<&FieldLocation> {
        self.locations.get(field)
    }

    /// Every field reachable on an instance of this type, sorted by name.
    pub fn reachable_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// True when this type's own store holds `field`.
    pub fn owns_field(&self, field: &str) -> bool {
        self.locations
            .get(field)
            .is_some_and(|location| location.path.is_empty())
    }

    /// True when `field` is reachable anywhere in the composed hierarchy.
    pub fn owns_field_extended(&self, field: &str) -> bool {
        self.locations.contains_key(field)
    }

    pub fn field_types(&self) -> BTreeMap<String, ValueType> {
        self.fields
            .iter()
            .map(|(name, f)| (name.clone(), f.value_type.clone()))
            .collect()
    }

    /// Looks up a connection by field name, case-insensitively.
    pub fn connection(&self, field: &str) -> Option<&ConnectionDescriptor> {
        self.connections.get(&field.to_lowercase())
    }

    pub fn is_array_connection(&self, field: &str) -> bool {
        self.connection(field).is_some_and(ConnectionDescriptor::is_array)
    }

    pub fn connection_target(&self, field: &str) -> Option<&str> {
        self.connection(field).map(|c| c.target.as_str())
    }

    pub fn extends_models(&self) -> bool {
        !self.supers.is_empty()
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MethodDecl;

    fn catalog() -> DeclarationCatalog {
        [
            ModelDecl::new("a::Person").property("Name", ValueType::Text),
            ModelDecl::new("a::Account")
                .key("Email", ValueType::Text)
                .property("Password", ValueType::Text),
            ModelDecl::new("a::Student")
                .extends("a::Person")
                .extends("a::Account")
                .method(MethodDecl::getter("getMatriculation", ValueType::Integer).id())
                .method(MethodDecl::setter("setMatriculation", ValueType::Integer)),
        ]
        .into_iter()
        .fold(DeclarationCatalog::new(), |c, d| c.with_model(d).unwrap())
    }

    fn describe(c: &DeclarationCatalog, name: &str) -> Arc<ModelDescriptor> {
        let decl = c.get_model(name).unwrap();
        let parents: Vec<_> = convention::direct_supertypes(decl)
            .iter()
            .map(|p| describe(c, p))
            .collect();
        Arc::new(ModelDescriptor::build(c, decl, &parents).unwrap())
    }

    #[test]
    fn test_root_type_gets_default_id_and_audit_fields() {
        let person = describe(&catalog(), "a::Person");
        let names: Vec<&str> = person.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["CreatedAt", "Id", "Name", "UpdatedAt"]);
        assert_eq!(person.fields["Id"].origin, FieldOrigin::DefaultId);
        assert!(person.owns_field("Name"));
    }

    #[test]
    fn test_supertype_keys_point_at_parent_identity() {
        let student = describe(&catalog(), "a::Student");
        assert_eq!(
            student.fields["AccountEmail"].origin,
            FieldOrigin::SupertypeKey { supertype: "a::Account".into() }
        );
        assert_eq!(student.fields["PersonId"].value_type, ValueType::Integer);

        let key = student.locate("AccountEmail").unwrap();
        assert_eq!(key.path, vec![1]);
        assert_eq!(key.field, "Email");

        let inherited = student.locate("Password").unwrap();
        assert_eq!(inherited.path, vec![1]);
        assert!(!student.owns_field("Password"));
        assert!(student.owns_field_extended("Password"));
        assert!(student.owns_field("CreatedAt"));
    }

    #[test]
    fn test_unsupported_identity_type() {
        let c = DeclarationCatalog::new()
            .with_model(ModelDecl::new("a::Reading").key("Taken", ValueType::Timestamp))
            .unwrap();
        let err = ModelDescriptor::build(&c, c.get_model("a::Reading").unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedIdentityType { .. }));
    }
}
