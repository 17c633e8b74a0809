//! Business-logic implementations.
//!
//! Accessors are generated from the declaration; methods annotated with
//! `BusinessLogic` are served by a hand-written [`ModelImplementation`]
//! registered under the conventional key `<namespace>::<Table>Impl`.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::core::{ModelError, Result, Value, ValueType};
use crate::instance::Model;
use crate::model::MethodDecl;

/// Structural signature of a method: name, return type and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodSignature {
    pub name: String,
    pub returns: ValueType,
    pub params: Vec<ValueType>,
}

impl MethodSignature {
    pub fn new(name: &str, returns: ValueType, params: Vec<ValueType>) -> Self {
        Self {
            name: name.to_string(),
            returns,
            params,
        }
    }

    pub fn of(method: &MethodDecl) -> Self {
        Self::new(&method.name, method.returns.clone(), method.params.clone())
    }

    /// True when every argument fits the parameter at the same position.
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.name()).collect();
        write!(f, "{} {}({})", self.returns, self.name, params.join(", "))
    }
}

/// Hand-written behaviour attached to a model type.
pub trait ModelImplementation: Send + Sync {
    /// Methods this implementation provides.
    fn methods(&self) -> Vec<MethodSignature> {
        Vec::new()
    }

    /// Invokes `method` on `model`. Only called with signatures from [`Self::methods`].
    fn call(&self, model: &mut Model, method: &MethodSignature, args: Vec<Value>) -> Result<Value>;

    /// Pre-save hook: returning `false` skips the save.
    fn validate(&self, _model: &Model) -> bool {
        true
    }

    /// Finds the method structurally matching `signature`.
    fn find_method(&self, signature: &MethodSignature) -> Option<MethodSignature> {
        self.methods().into_iter().find(|m| m == signature)
    }
}

/// Used for model types with no registered implementation.
pub struct DefaultImplementation;

impl ModelImplementation for DefaultImplementation {
    fn call(&self, model: &mut Model, method: &MethodSignature, _args: Vec<Value>) -> Result<Value> {
        Err(ModelError::method_not_found(model.type_name(), &method.name))
    }
}

type MethodBody = Arc<dyn Fn(&mut Model, Vec<Value>) -> Result<Value> + Send + Sync>;
type ValidateHook = Arc<dyn Fn(&Model) -> bool + Send + Sync>;

/// Implementation assembled from closures.
///
/// ```ignore
/// let imp = MethodTable::new()
///     .method(MethodSignature::new("greeting", ValueType::Text, vec![]), |model, _| {
///         Ok(Value::Text(format!("Hello {}", model.get("Name")?)))
///     });
/// registry.register_implementation("app::PersonImpl", Arc::new(imp))?;
/// ```
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: Vec<(MethodSignature, MethodBody)>,
    validate: Option<ValidateHook>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F>(mut self, signature: MethodSignature, body: F) -> Self
    where
        F: Fn(&mut Model, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push((signature, Arc::new(body)));
        self
    }

    pub fn validate_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Model) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(hook));
        self
    }
}

impl ModelImplementation for MethodTable {
    fn methods(&self) -> Vec<MethodSignature> {
        self.methods.iter().map(|(sig, _)| sig.clone()).collect()
    }

    fn call(&self, model: &mut Model, method: &MethodSignature, args: Vec<Value>) -> Result<Value> {
        let body = self
            .methods
            .iter()
            .find(|(sig, _)| sig == method)
            .map(|(_, body)| Arc::clone(body))
            .ok_or_else(|| ModelError::method_not_found(model.type_name(), &method.name))?;
        body(model, args)
    }

    fn validate(&self, model: &Model) -> bool {
        self.validate.as_ref().is_none_or(|hook| hook(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_accepts_matching_arguments() {
        let sig = MethodSignature::new("raise", ValueType::Void, vec![ValueType::Double]);
        assert!(sig.accepts(&[Value::Integer(10)]));
        assert!(!sig.accepts(&[Value::Text("10".into())]));
        assert!(!sig.accepts(&[]));
    }

    #[test]
    fn test_structural_lookup_requires_exact_parameters() {
        let table = MethodTable::new().method(
            MethodSignature::new("greet", ValueType::Text, vec![ValueType::Text]),
            |_, _| Ok(Value::Null),
        );
        let wanted = MethodSignature::new("greet", ValueType::Text, vec![ValueType::Text]);
        let other = MethodSignature::new("greet", ValueType::Text, vec![ValueType::Integer]);
        assert!(table.find_method(&wanted).is_some());
        assert!(table.find_method(&other).is_none());
    }

    #[test]
    fn test_signature_display() {
        let sig = MethodSignature::new("hire", ValueType::Boolean, vec![ValueType::model("corp::Person")]);
        assert_eq!(sig.to_string(), "Boolean hire(corp::Person)");
    }
}
