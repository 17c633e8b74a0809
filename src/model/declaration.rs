use serde::Serialize;
use crate::core::ValueType;

/// Name of the root marker type every model implicitly extends.
pub const ROOT_MODEL: &str = "Model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionKind {
    BelongsTo,
    Aggregation,
    Composition,
    ManyToMany,
}

impl Default for ConnectionKind {
    fn default() -> Self {
        Self::Aggregation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Annotation {
    Id,
    AutoIncrement,
    Unique,
    NotNull,
    BusinessLogic,
    Connection { name: String, kind: ConnectionKind },
}

/// One method of a model interface: its name, return type and parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub returns: ValueType,
    pub params: Vec<ValueType>,
    pub annotations: Vec<Annotation>,
}

impl MethodDecl {
    pub fn method(name: &str, returns: ValueType, params: Vec<ValueType>) -> Self {
        Self {
            name: name.to_string(),
            returns,
            params,
            annotations: Vec::new(),
        }
    }

    pub fn getter(name: &str, returns: ValueType) -> Self {
        Self::method(name, returns, Vec::new())
    }

    pub fn setter(name: &str, param: ValueType) -> Self {
        Self::method(name, ValueType::Void, vec![param])
    }

    /// A hand-written method backed by the registered implementation.
    pub fn business(name: &str, returns: ValueType, params: Vec<ValueType>) -> Self {
        Self::method(name, returns, params).business_logic()
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    pub fn id(self) -> Self {
        self.annotate(Annotation::Id)
    }

    pub fn auto_increment(self) -> Self {
        self.annotate(Annotation::AutoIncrement)
    }

    pub fn unique(self) -> Self {
        self.annotate(Annotation::Unique)
    }

    pub fn not_null(self) -> Self {
        self.annotate(Annotation::NotNull)
    }

    pub fn business_logic(self) -> Self {
        self.annotate(Annotation::BusinessLogic)
    }

    pub fn connection(self, name: &str, kind: ConnectionKind) -> Self {
        self.annotate(Annotation::Connection {
            name: name.to_string(),
            kind,
        })
    }

    pub fn is_id(&self) -> bool {
        self.annotations.contains(&Annotation::Id)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.annotations.contains(&Annotation::AutoIncrement)
    }

    pub fn is_unique(&self) -> bool {
        self.annotations.contains(&Annotation::Unique)
    }

    pub fn is_not_null(&self) -> bool {
        self.annotations.contains(&Annotation::NotNull)
    }

    pub fn is_business_logic(&self) -> bool {
        self.annotations.contains(&Annotation::BusinessLogic)
    }

    /// Connection name and kind, when the method carries a `Connection` annotation.
    pub fn connection_spec(&self) -> Option<(&str, ConnectionKind)> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Connection { name, kind } => Some((name.as_str(), *kind)),
            _ => None,
        })
    }
}

/// Declared shape of a model type: its name, direct parents and methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDecl {
    pub type_name: String,
    pub extends: Vec<String>,
    pub methods: Vec<MethodDecl>,
}

impl ModelDecl {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            extends: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.extends.push(parent.to_string());
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a `get<Name>`/`set<Name>` pair for a plain field.
    pub fn property(self, name: &str, value_type: ValueType) -> Self {
        self.method(MethodDecl::getter(&format!("get{}", name), value_type.clone()))
            .method(MethodDecl::setter(&format!("set{}", name), value_type))
    }

    /// Adds an accessor pair whose getter is annotated as the identity field.
    pub fn key(self, name: &str, value_type: ValueType) -> Self {
        self.method(MethodDecl::getter(&format!("get{}", name), value_type.clone()).id())
            .method(MethodDecl::setter(&format!("set{}", name), value_type))
    }

    /// Adds an annotated relationship getter plus its setter.
    pub fn connection(
        self,
        field: &str,
        target: ValueType,
        name: &str,
        kind: ConnectionKind,
    ) -> Self {
        self.method(
            MethodDecl::getter(&format!("get{}", field), target.clone()).connection(name, kind),
        )
        .method(MethodDecl::setter(&format!("set{}", field), target))
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}
