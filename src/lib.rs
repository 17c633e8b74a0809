// ============================================================================
// ModelMapper Library
// ============================================================================

//! Convention-driven object mapper.
//!
//! Models are declared as accessor shapes; table names, identities, fields
//! and connections follow from naming conventions and a small annotation
//! set. Instances read and write fields through precomputed ownership
//! tables and load connections lazily through a persistence provider.
//!
//! ```
//! use std::sync::Arc;
//! use modelmapper::{MemoryProvider, ModelDecl, ModelFactory, Registry, Value, ValueType};
//!
//! # fn main() -> modelmapper::Result<()> {
//! let registry = Arc::new(Registry::new());
//! registry.register_model(
//!     ModelDecl::new("app::Account")
//!         .key("Email", ValueType::Text)
//!         .property("Password", ValueType::Text),
//! )?;
//!
//! let factory = ModelFactory::new(registry, Arc::new(MemoryProvider::new()));
//! let mut account = factory.create("app::Account")?;
//! account.call_setter("setEmail", "a@b.com")?;
//! assert_eq!(account.get("Email")?, Value::from("a@b.com"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convention;
pub mod core;
pub mod factory;
pub mod implementation;
pub mod instance;
pub mod model;
pub mod provider;
pub mod registry;
pub mod schema;

// Re-export main types for convenience
pub use config::MapperConfig;
pub use core::{Cardinality, IdentityType, ModelError, Result, Value, ValueType};
pub use factory::ModelFactory;
pub use implementation::{DefaultImplementation, MethodSignature, MethodTable, ModelImplementation};
pub use instance::{Model, RelationEntry, Reply};
pub use model::{Annotation, ConnectionKind, DeclarationCatalog, MethodDecl, ModelDecl};
pub use provider::{FindQuery, MemoryProvider, PersistenceProvider};
pub use registry::{
    ConnectionDescriptor, FieldDescriptor, IdentityDescriptor, MalformedModelReport,
    ModelDescriptor, Registry,
};
pub use schema::{MySqlQueryGenerator, MySqlSchemaGenerator, QueryGenerator, SchemaGenerator};
