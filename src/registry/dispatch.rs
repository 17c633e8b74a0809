use std::collections::HashMap;
use std::sync::Arc;

use crate::convention::{self, DEFAULT_ID_FIELD};
use crate::core::{Cardinality, ValueType};
use crate::implementation::MethodSignature;
use crate::model::ModelDecl;
use super::descriptor::{IdentityDescriptor, ModelDescriptor};

/// What an interface method resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    Getter { field: String },
    Setter { field: String, value_type: ValueType },
    /// `field` is lower-cased, matching the relation cache key.
    RelationGetter { field: String, cardinality: Cardinality },
    RelationSetter { field: String },
    /// Served by the implementation of the sub-instance at `path`.
    Business { signature: MethodSignature, path: Vec<usize> },
}

impl Handler {
    fn rebased(&self, index: usize) -> Self {
        match self {
            Self::Business { signature, path } => {
                let mut rebased = Vec::with_capacity(path.len() + 1);
                rebased.push(index);
                rebased.extend_from_slice(path);
                Self::Business {
                    signature: signature.clone(),
                    path: rebased,
                }
            }
            other => other.clone(),
        }
    }

    pub fn is_accessor(&self) -> bool {
        !matches!(self, Self::Business { .. })
    }
}

/// Method name → handler, built once per type alongside its descriptor.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<String, Handler>,
}

impl DispatchTable {
    pub(crate) fn build(
        decl: &ModelDecl,
        identity: &IdentityDescriptor,
        parents: &[Arc<ModelDescriptor>],
    ) -> Self {
        let mut handlers = HashMap::new();

        for method in &decl.methods {
            let field = convention::field_name(&method.name);
            let handler = if method.is_business_logic() {
                Handler::Business {
                    signature: MethodSignature::of(method),
                    path: Vec::new(),
                }
            } else if convention::is_getter(&method.name) {
                match method.connection_spec() {
                    Some(_) => Handler::RelationGetter {
                        field: field.to_lowercase(),
                        cardinality: Cardinality::of(&method.returns),
                    },
                    None => Handler::Getter {
                        field: field.to_string(),
                    },
                }
            } else if convention::is_setter(&method.name) {
                let relation = method.params.first().is_some_and(ValueType::is_model)
                    || decl.methods.iter().any(|m| {
                        convention::is_getter(&m.name)
                            && convention::field_name(&m.name) == field
                            && m.connection_spec().is_some()
                    });
                if relation {
                    Handler::RelationSetter {
                        field: field.to_lowercase(),
                    }
                } else {
                    Handler::Setter {
                        field: field.to_string(),
                        value_type: method.params.first().cloned().unwrap_or(ValueType::Void),
                    }
                }
            } else {
                continue;
            };
            handlers.entry(method.name.clone()).or_insert(handler);
        }

        if !identity.explicit && parents.is_empty() {
            handlers
                .entry(format!("get{}", DEFAULT_ID_FIELD))
                .or_insert(Handler::Getter {
                    field: DEFAULT_ID_FIELD.to_string(),
                });
            handlers
                .entry(format!("set{}", DEFAULT_ID_FIELD))
                .or_insert(Handler::Setter {
                    field: DEFAULT_ID_FIELD.to_string(),
                    value_type: ValueType::Integer,
                });
        }

        for (index, parent) in parents.iter().enumerate() {
            for (name, handler) in &parent.dispatch().handlers {
                handlers
                    .entry(name.clone())
                    .or_insert_with(|| handler.rebased(index));
            }
        }

        Self { handlers }
    }

    pub fn resolve(&self, method: &str) -> Option<&Handler> {
        self.handlers.get(method)
    }

    /// Method names in the table, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionKind, DeclarationCatalog, MethodDecl};

    fn describe(c: &DeclarationCatalog, name: &str) -> Arc<ModelDescriptor> {
        let decl = c.get_model(name).unwrap();
        let parents: Vec<_> = convention::direct_supertypes(decl)
            .iter()
            .map(|p| describe(c, p))
            .collect();
        Arc::new(ModelDescriptor::build(c, decl, &parents).unwrap())
    }

    fn catalog() -> DeclarationCatalog {
        [
            ModelDecl::new("corp::Person")
                .property("Name", ValueType::Text)
                .method(MethodDecl::business("greeting", ValueType::Text, vec![])),
            ModelDecl::new("corp::Employee")
                .extends("corp::Person")
                .property("Salary", ValueType::Double)
                .connection("Employer", ValueType::model("corp::Person"), "Employer", ConnectionKind::BelongsTo),
        ]
        .into_iter()
        .fold(DeclarationCatalog::new(), |c, d| c.with_model(d).unwrap())
    }

    #[test]
    fn test_classifies_declared_methods() {
        let employee = describe(&catalog(), "corp::Employee");
        let table = employee.dispatch();

        assert_eq!(
            table.resolve("getSalary"),
            Some(&Handler::Getter { field: "Salary".into() })
        );
        assert_eq!(
            table.resolve("getEmployer"),
            Some(&Handler::RelationGetter {
                field: "employer".into(),
                cardinality: Cardinality::Singular
            })
        );
        assert_eq!(
            table.resolve("setEmployer"),
            Some(&Handler::RelationSetter { field: "employer".into() })
        );
        assert!(table.resolve("hire").is_none());
    }

    #[test]
    fn test_inherited_entries_are_rebased() {
        let employee = describe(&catalog(), "corp::Employee");
        let table = employee.dispatch();

        assert_eq!(table.resolve("getName"), Some(&Handler::Getter { field: "Name".into() }));
        match table.resolve("greeting") {
            Some(Handler::Business { path, signature }) => {
                assert_eq!(path, &vec![0]);
                assert_eq!(signature.returns, ValueType::Text);
            }
            other => panic!("unexpected handler {:?}", other),
        }
        // Person's default id accessors are reachable through the parent.
        assert!(table.resolve("getId").is_some());
    }
}
