use std::collections::HashMap;
use std::sync::Arc;
use crate::core::{ModelError, Result};
use super::ModelDecl;

/// Catalog of model declarations, keyed by type name.
/// Immutable once built: cloning is cheap and needs no locking.
#[derive(Clone, Debug)]
pub struct DeclarationCatalog {
    /// Copy-on-write: every change produces a new map
    models: Arc<HashMap<String, Arc<ModelDecl>>>,
}

impl DeclarationCatalog {
    pub fn new() -> Self {
        Self {
            models: Arc::new(HashMap::new()),
        }
    }

    /// Add a declaration - returns a NEW catalog, the old one stays untouched
    pub fn with_model(self, decl: ModelDecl) -> Result<Self> {
        let name = decl.type_name.clone();

        if self.models.contains_key(&name) {
            return Err(ModelError::ModelExists(name));
        }

        let mut new_models = (*self.models).clone();
        new_models.insert(name, Arc::new(decl));

        Ok(Self {
            models: Arc::new(new_models),
        })
    }

    pub fn get_model(&self, name: &str) -> Result<&Arc<ModelDecl>> {
        self.models
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn model_exists(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn list_models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Remove a declaration - returns a NEW catalog
    pub fn without_model(self, name: &str) -> Result<Self> {
        if !self.models.contains_key(name) {
            return Err(ModelError::UnknownModel(name.to_string()));
        }

        let mut new_models = (*self.models).clone();
        new_models.remove(name);

        Ok(Self {
            models: Arc::new(new_models),
        })
    }
}

impl Default for DeclarationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model_is_copy_on_write() {
        let empty = DeclarationCatalog::new();
        let snapshot = empty.clone();
        let catalog = empty.with_model(ModelDecl::new("app::Account")).unwrap();

        assert!(catalog.model_exists("app::Account"));
        assert!(!snapshot.model_exists("app::Account"));
    }

    #[test]
    fn test_duplicate_declaration_fails() {
        let catalog = DeclarationCatalog::new()
            .with_model(ModelDecl::new("app::Account"))
            .unwrap();
        let err = catalog.with_model(ModelDecl::new("app::Account")).unwrap_err();
        assert!(matches!(err, ModelError::ModelExists(name) if name == "app::Account"));
    }

    #[test]
    fn test_without_model() {
        let catalog = DeclarationCatalog::new()
            .with_model(ModelDecl::new("app::Account"))
            .unwrap()
            .without_model("app::Account")
            .unwrap();
        assert!(catalog.get_model("app::Account").is_err());
        assert!(catalog.list_models().is_empty());
    }
}
