use std::sync::Arc;

use crate::core::{Cardinality, ModelError, Result, Value, ValueType};
use crate::implementation::MethodSignature;
use crate::registry::Handler;
use super::Model;

/// Result of invoking an interface method.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Setters and `Void` business methods.
    Unit,
    Value(Value),
    /// Singular connection; `None` when nothing is cached.
    One(Option<Model>),
    Many(Vec<Model>),
}

impl Reply {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_one(self) -> Option<Model> {
        match self {
            Self::One(model) => model,
            _ => None,
        }
    }

    pub fn into_many(self) -> Vec<Model> {
        match self {
            Self::Many(models) => models,
            Self::One(model) => model.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl Model {
    /// Invokes an interface method by name.
    ///
    /// The handler comes from the type's dispatch table: plain accessors go
    /// through the ownership table, relation getters through the lazy
    /// relation cache, business methods to the implementation of the
    /// declaring sub-instance. Names missing from the table are offered to
    /// this type's implementation by name and argument types.
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Reply> {
        let descriptor = Arc::clone(&self.descriptor);
        match descriptor.dispatch().resolve(method) {
            Some(Handler::Getter { field }) => {
                expect_arity(method, 0, &args)?;
                Ok(Reply::Value(self.get(field)?))
            }
            Some(Handler::Setter { field, .. }) => {
                expect_arity(method, 1, &args)?;
                let value = args.into_iter().next().unwrap_or(Value::Null);
                self.set(field, value)?;
                Ok(Reply::Unit)
            }
            Some(Handler::RelationGetter { field, cardinality }) => {
                expect_arity(method, 0, &args)?;
                match cardinality {
                    Cardinality::Array => Ok(Reply::Many(self.related(field)?.to_vec())),
                    Cardinality::Singular => Ok(Reply::One(self.related_one(field)?.cloned())),
                }
            }
            Some(Handler::RelationSetter { field }) => Err(ModelError::UnsupportedOperation(format!(
                "'{}' on '{}' sets connection '{}'; attach related instances instead",
                method, descriptor.type_name, field
            ))),
            Some(Handler::Business { signature, path }) => self.call_business(signature, path, args),
            None => self.call_undeclared(method, args),
        }
    }

    /// Shorthand for `invoke` on a getter.
    pub fn call_getter(&mut self, method: &str) -> Result<Reply> {
        self.invoke(method, Vec::new())
    }

    /// Shorthand for `invoke` on a setter.
    pub fn call_setter(&mut self, method: &str, value: impl Into<Value>) -> Result<()> {
        self.invoke(method, vec![value.into()]).map(|_| ())
    }

    fn call_business(
        &mut self,
        signature: &MethodSignature,
        path: &[usize],
        args: Vec<Value>,
    ) -> Result<Reply> {
        let type_name = self.descriptor.type_name.clone();
        let target = self
            .store_at_mut(path)
            .ok_or_else(|| ModelError::method_not_found(&type_name, &signature.name))?;
        let implementation = Arc::clone(&target.implementation);
        let matched = implementation
            .find_method(signature)
            .ok_or_else(|| ModelError::method_not_found(&type_name, &signature.name))?;

        expect_arity(&matched.name, matched.params.len(), &args)?;
        if !matched.accepts(&args) {
            return Err(ModelError::TypeMismatch(format!(
                "arguments of '{}' do not match {}",
                matched.name, matched
            )));
        }

        let result = implementation.call(target, &matched, args)?;
        Ok(reply_for(&matched.returns, result))
    }

    fn call_undeclared(&mut self, method: &str, args: Vec<Value>) -> Result<Reply> {
        let implementation = Arc::clone(&self.implementation);
        let matched = implementation
            .methods()
            .into_iter()
            .find(|m| m.name == method && m.accepts(&args))
            .ok_or_else(|| ModelError::method_not_found(self.type_name(), method))?;
        let result = implementation.call(self, &matched, args)?;
        Ok(reply_for(&matched.returns, result))
    }
}

fn expect_arity(method: &str, expected: usize, args: &[Value]) -> Result<()> {
    if args.len() != expected {
        return Err(ModelError::InvalidArguments {
            method: method.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn reply_for(returns: &ValueType, result: Value) -> Reply {
    if *returns == ValueType::Void {
        Reply::Unit
    } else {
        Reply::Value(result)
    }
}
