use serde::Serialize;
use std::fmt;
use super::Value;

/// Declared type of a getter return value or setter parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Integer,
    Long,
    Short,
    Byte,
    Boolean,
    Char,
    Float,
    Double,
    Decimal,
    Text,
    Timestamp,
    Time,
    Date,
    Clob,
    Blob,
    Url,
    Void,
    /// A single related model, by type name.
    Model(String),
    /// An array of related models, by type name.
    ModelArray(String),
}

impl ValueType {
    pub fn model(type_name: impl Into<String>) -> Self {
        Self::Model(type_name.into())
    }

    pub fn model_array(type_name: impl Into<String>) -> Self {
        Self::ModelArray(type_name.into())
    }

    /// True for every storable scalar type accepted as a plain field.
    pub fn is_valid_field(&self) -> bool {
        !matches!(self, Self::Void | Self::Model(_) | Self::ModelArray(_))
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_) | Self::ModelArray(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::ModelArray(_))
    }

    /// Related model type name, with the array wrapper removed.
    pub fn model_target(&self) -> Option<&str> {
        match self {
            Self::Model(name) | Self::ModelArray(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer | Self::Long | Self::Short | Self::Byte)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (t, Value::Integer(_)) if t.is_integer() => true,
            (Self::Float | Self::Double | Self::Decimal, Value::Float(_)) => true,
            // integer to floating point assignment is allowed
            (Self::Float | Self::Double | Self::Decimal, Value::Integer(_)) => true,
            (Self::Text | Self::Clob | Self::Url | Self::Decimal, Value::Text(_)) => true,
            (Self::Char, Value::Text(s)) => s.chars().count() == 1,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp | Self::Time | Self::Date, Value::Timestamp(_)) => true,
            (Self::Blob, Value::Bytes(_)) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Model(name) => name.clone(),
            Self::ModelArray(name) => format!("{}[]", name),
            other => format!("{:?}", other),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The two identity domains a model may be keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentityType {
    Integer,
    Text,
}

impl IdentityType {
    pub fn from_value_type(value_type: &ValueType) -> Option<Self> {
        match value_type {
            ValueType::Integer | ValueType::Long => Some(Self::Integer),
            ValueType::Text => Some(Self::Text),
            _ => None,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Integer, Value::Integer(_)) | (Self::Text, Value::Text(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    Singular,
    Array,
}

impl Cardinality {
    pub fn of(value_type: &ValueType) -> Self {
        if value_type.is_array() {
            Self::Array
        } else {
            Self::Singular
        }
    }
}
