use crate::core::{ModelError, Result, ValueType};
use crate::model::{DeclarationCatalog, ModelDecl};
use super::hierarchy::direct_supertypes;
use super::naming::{field_name, is_getter, table_name};
use super::DEFAULT_ID_FIELD;

/// Identity field of a model type as derived from its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySpec {
    pub field: String,
    pub value_type: ValueType,
    /// Declared with the `Id` annotation on this type.
    pub explicit: bool,
    pub auto_increment: bool,
}

/// Resolves the identity field of `decl`.
///
/// An `Id`-annotated getter wins. Otherwise a single supertype `S` yields
/// `table_name(S) + identity(S)` with `S`'s identity type, no supertype yields
/// the integer `Id`, and several supertypes are ambiguous.
pub fn identity_field(catalog: &DeclarationCatalog, decl: &ModelDecl) -> Result<IdentitySpec> {
    let mut trail = vec![decl.type_name.clone()];
    identity_inner(catalog, decl, &mut trail)
}

fn identity_inner(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    trail: &mut Vec<String>,
) -> Result<IdentitySpec> {
    let declared = decl
        .methods
        .iter()
        .filter(|m| is_getter(&m.name) && m.is_id())
        .last();

    if let Some(getter) = declared {
        return Ok(IdentitySpec {
            field: field_name(&getter.name).to_string(),
            value_type: getter.returns.clone(),
            explicit: true,
            auto_increment: getter.is_auto_increment(),
        });
    }

    let supers = direct_supertypes(decl);
    match supers.as_slice() {
        [] => Ok(IdentitySpec {
            field: DEFAULT_ID_FIELD.to_string(),
            value_type: ValueType::Integer,
            explicit: false,
            auto_increment: true,
        }),
        [parent] => {
            if trail.contains(parent) {
                return Err(ModelError::CyclicInheritance(parent.clone()));
            }
            let parent_decl = catalog.get_model(parent)?;
            trail.push(parent.clone());
            let parent_id = identity_inner(catalog, parent_decl, trail)?;
            trail.pop();

            Ok(IdentitySpec {
                field: format!("{}{}", table_name(parent), parent_id.field),
                value_type: parent_id.value_type,
                explicit: false,
                auto_increment: false,
            })
        }
        _ => Err(ModelError::AmbiguousIdentity(decl.type_name.clone())),
    }
}

/// True when the identity is server generated: an explicit `AutoIncrement`
/// id, or the default `Id`.
pub fn is_auto_increment(catalog: &DeclarationCatalog, decl: &ModelDecl) -> Result<bool> {
    Ok(identity_field(catalog, decl)?.auto_increment)
}
