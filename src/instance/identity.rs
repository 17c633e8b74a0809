use crate::core::{ModelError, Result, Value};
use super::Model;

impl Model {
    /// Identity value, read through the ownership table.
    pub fn id(&self) -> Result<Value> {
        self.get(&self.descriptor.identity.field)
    }

    pub fn set_id(&mut self, value: impl Into<Value>) -> Result<()> {
        let field = self.descriptor.identity.field.clone();
        self.set(&field, value)
    }

    /// True when `other` carries the same non-null identity value.
    pub fn equals_id(&self, other: &Model) -> Result<bool> {
        let field = &self.descriptor.identity.field;
        if other.descriptor.locate(field).is_none() {
            return Ok(false);
        }
        self.compare_id(&other.get(field)?)
    }

    /// Compares this instance's identity with `value`.
    ///
    /// `Null` on either side never matches. A value outside the identity's
    /// domain fails with `UnsupportedIdentityType`.
    pub fn compare_id(&self, value: &Value) -> Result<bool> {
        if value.is_null() {
            return Ok(false);
        }
        let identity = &self.descriptor.identity;
        if !identity.id_type.matches(value) {
            return Err(ModelError::UnsupportedIdentityType {
                model: self.descriptor.type_name.clone(),
                found: value.type_name().to_string(),
            });
        }
        let own = self.id()?;
        Ok(!own.is_null() && own == *value)
    }
}
