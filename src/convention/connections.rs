use crate::core::{Cardinality, ValueType};
use crate::model::{ConnectionKind, MethodDecl, ModelDecl};
use super::naming::{field_name, is_getter};

/// A relationship getter found on a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSpec {
    pub field: String,
    pub name: String,
    pub kind: ConnectionKind,
    pub target: String,
    pub cardinality: Cardinality,
}

/// Getters declared directly on `decl`.
pub fn getters(decl: &ModelDecl) -> impl Iterator<Item = &MethodDecl> {
    decl.methods.iter().filter(|m| is_getter(&m.name))
}

/// Connection getters declared directly on `decl`, in declaration order.
pub fn connections(decl: &ModelDecl) -> Vec<ConnectionSpec> {
    getters(decl)
        .filter_map(|m| {
            let (name, kind) = m.connection_spec()?;
            let target = m.returns.model_target()?;
            Some(ConnectionSpec {
                field: field_name(&m.name).to_string(),
                name: name.to_string(),
                kind,
                target: target.to_string(),
                cardinality: Cardinality::of(&m.returns),
            })
        })
        .collect()
}

/// Distinct model types reachable through the connections of `decl`.
pub fn related_types(decl: &ModelDecl) -> Vec<String> {
    let mut related: Vec<String> = Vec::new();
    for connection in connections(decl) {
        if !related.contains(&connection.target) {
            related.push(connection.target);
        }
    }
    related
}

/// True when the named connection points back at the declaring type.
pub fn is_recursive(decl: &ModelDecl, connection_name: &str) -> bool {
    connections(decl)
        .iter()
        .any(|c| c.name == connection_name && c.target == decl.type_name)
}

/// Plain getters: getters that are neither connections nor business logic.
pub fn plain_getters(decl: &ModelDecl) -> impl Iterator<Item = &MethodDecl> {
    getters(decl).filter(|m| {
        m.connection_spec().is_none() && !m.is_business_logic() && m.returns != ValueType::Void
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corporation() -> ModelDecl {
        ModelDecl::new("corp::Corporation")
            .key("CorporateId", ValueType::Integer)
            .property("Name", ValueType::Text)
            .connection("CEO", ValueType::model("corp::Person"), "CEO", ConnectionKind::Aggregation)
            .connection(
                "Employees",
                ValueType::model_array("corp::Person"),
                "Employed",
                ConnectionKind::Composition,
            )
            .connection(
                "Parent",
                ValueType::model("corp::Corporation"),
                "Holding",
                ConnectionKind::Aggregation,
            )
    }

    #[test]
    fn test_connections_carry_cardinality() {
        let found = connections(&corporation());
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].field, "CEO");
        assert_eq!(found[0].cardinality, Cardinality::Singular);
        assert_eq!(found[1].name, "Employed");
        assert_eq!(found[1].cardinality, Cardinality::Array);
        assert_eq!(found[1].target, "corp::Person");
    }

    #[test]
    fn test_related_types_are_distinct() {
        assert_eq!(
            related_types(&corporation()),
            vec!["corp::Person", "corp::Corporation"]
        );
    }

    #[test]
    fn test_recursive_connection() {
        let decl = corporation();
        assert!(is_recursive(&decl, "Holding"));
        assert!(!is_recursive(&decl, "CEO"));
    }

    #[test]
    fn test_plain_getters_skip_connections() {
        let decl = corporation();
        let names: Vec<&str> = plain_getters(&decl).map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getCorporateId", "getName"]);
    }
}
