/// Mapper configuration
///
/// Owned by the [`crate::registry::Registry`]; factories and instances read
/// it through their registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    /// Suffix appended to a table name to find its implementation
    pub implementation_suffix: String,

    /// Refresh `UpdatedAt` when a dirty, already persisted record is saved
    pub touch_updated_at_on_save: bool,

    /// Skip fetched instances whose identity is already attached by hand
    pub dedupe_reconciled_relations: bool,
}

impl MapperConfig {
    /// Create a configuration with the conventional defaults
    pub fn new() -> Self {
        Self {
            implementation_suffix: "Impl".to_string(),
            touch_updated_at_on_save: true,
            dedupe_reconciled_relations: true,
        }
    }

    /// Set the implementation suffix
    pub fn implementation_suffix(mut self, suffix: &str) -> Self {
        self.implementation_suffix = suffix.to_string();
        self
    }

    /// Enable or disable `UpdatedAt` refresh on save
    pub fn touch_updated_at_on_save(mut self, enabled: bool) -> Self {
        self.touch_updated_at_on_save = enabled;
        self
    }

    /// Enable or disable identity deduplication during reconciliation
    pub fn dedupe_reconciled_relations(mut self, enabled: bool) -> Self {
        self.dedupe_reconciled_relations = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.implementation_suffix.is_empty() {
            return Err("implementation_suffix cannot be empty".to_string());
        }

        if !self
            .implementation_suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(format!(
                "implementation_suffix '{}' is not a valid identifier",
                self.implementation_suffix
            ));
        }

        Ok(())
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.implementation_suffix, "Impl");
        assert!(config.touch_updated_at_on_save);
        assert!(config.dedupe_reconciled_relations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MapperConfig::new()
            .implementation_suffix("Logic")
            .dedupe_reconciled_relations(false);
        assert_eq!(config.implementation_suffix, "Logic");
        assert!(!config.dedupe_reconciled_relations);
    }

    #[test]
    fn test_validate_rejects_bad_suffix() {
        assert!(MapperConfig::new().implementation_suffix("").validate().is_err());
        assert!(MapperConfig::new().implementation_suffix("a::b").validate().is_err());
    }
}
