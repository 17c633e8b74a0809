use std::sync::Arc;
use thiserror::Error;

use super::report::MalformedModelReport;

#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("{0}")]
    MalformedModel(Arc<MalformedModelReport>),

    #[error("Model '{0}' extends more than one model: an Id must be declared explicitly")]
    AmbiguousIdentity(String),

    #[error("Unsupported identity type for '{model}': {found}")]
    UnsupportedIdentityType { model: String, found: String },

    #[error("Field '{field}' not found in model '{model}'")]
    FieldNotFound { model: String, field: String },

    #[error("Method '{method}' not found in model '{model}'")]
    MethodNotFound { model: String, method: String },

    #[error("Connection '{field}' not found in model '{model}'")]
    ConnectionNotFound { model: String, field: String },

    #[error("Persistence provider failed during {operation} (thread '{thread}'): {cause:#}")]
    Provider {
        operation: String,
        thread: String,
        cause: Arc<anyhow::Error>,
    },

    #[error("Model '{0}' is not declared")]
    UnknownModel(String),

    #[error("Model '{0}' already declared")]
    ModelExists(String),

    #[error("Cyclic inheritance detected at model '{0}'")]
    CyclicInheritance(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid arguments for '{method}': expected {expected}, got {found}")]
    InvalidArguments {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Wraps a provider failure with the operation name and the calling thread.
    pub fn provider(operation: impl Into<String>, cause: anyhow::Error) -> Self {
        let thread = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        Self::Provider {
            operation: operation.into(),
            thread,
            cause: Arc::new(cause),
        }
    }

    pub fn field_not_found(model: &str, field: &str) -> Self {
        Self::FieldNotFound {
            model: model.to_string(),
            field: field.to_string(),
        }
    }

    pub fn method_not_found(model: &str, method: &str) -> Self {
        Self::MethodNotFound {
            model: model.to_string(),
            method: method.to_string(),
        }
    }

    pub fn connection_not_found(model: &str, field: &str) -> Self {
        Self::ConnectionNotFound {
            model: model.to_string(),
            field: field.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ModelError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
