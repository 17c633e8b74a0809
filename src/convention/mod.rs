//! Naming conventions: pure derivations of table names, field names,
//! identities, supertypes and connections from a model declaration.
//!
//! Nothing here caches; the [`crate::registry::Registry`] memoizes the results.

pub mod connections;
pub mod hierarchy;
pub mod identity;
pub mod naming;

pub use connections::{ConnectionSpec, connections, getters, is_recursive, plain_getters, related_types};
pub use hierarchy::{belongs_to, direct_supertypes, transitive_supertypes};
pub use identity::{IdentitySpec, identity_field, is_auto_increment};
pub use naming::{field_name, implementation_key, is_getter, is_setter, namespace, table_name};

/// Identity field of models that neither declare one nor inherit one.
pub const DEFAULT_ID_FIELD: &str = "Id";

/// Audit field set to the creation time of every instance.
pub const CREATED_AT: &str = "CreatedAt";

/// Audit field set at creation and refreshed when a dirty record is saved.
pub const UPDATED_AT: &str = "UpdatedAt";
