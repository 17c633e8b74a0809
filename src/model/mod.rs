pub mod catalog;
pub mod declaration;

pub use catalog::DeclarationCatalog;
pub use declaration::{Annotation, ConnectionKind, MethodDecl, ModelDecl, ROOT_MODEL};
