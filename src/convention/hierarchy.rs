use crate::core::{ModelError, Result};
use crate::model::{ConnectionKind, DeclarationCatalog, ModelDecl, ROOT_MODEL};
use super::naming::{field_name, is_getter};

/// Declared parent models, without the root marker type.
pub fn direct_supertypes(decl: &ModelDecl) -> Vec<String> {
    let mut supers: Vec<String> = Vec::new();
    for parent in &decl.extends {
        if parent == ROOT_MODEL || *parent == decl.type_name || supers.contains(parent) {
            continue;
        }
        supers.push(parent.clone());
    }
    supers
}

/// Every ancestor of `decl`: direct supertypes first, then their ancestors.
///
/// An ancestor reachable through more than one path is listed once, at the
/// position it was first seen.
pub fn transitive_supertypes(catalog: &DeclarationCatalog, decl: &ModelDecl) -> Result<Vec<String>> {
    let mut result = Vec::new();
    let mut trail = vec![decl.type_name.clone()];
    collect_supertypes(catalog, decl, &mut trail, &mut result)?;
    Ok(result)
}

fn collect_supertypes(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    trail: &mut Vec<String>,
    result: &mut Vec<String>,
) -> Result<()> {
    let supers = direct_supertypes(decl);

    for parent in &supers {
        if trail.contains(parent) {
            return Err(ModelError::CyclicInheritance(parent.clone()));
        }
        if !result.contains(parent) {
            result.push(parent.clone());
        }
    }

    for parent in &supers {
        let parent_decl = catalog.get_model(parent)?;
        trail.push(parent.clone());
        collect_supertypes(catalog, parent_decl, trail, result)?;
        trail.pop();
    }

    Ok(())
}

/// Fields holding BelongsTo connections, declared here or on any ancestor.
///
/// Duplicates reachable through several inheritance paths are kept.
pub fn belongs_to(catalog: &DeclarationCatalog, decl: &ModelDecl) -> Result<Vec<String>> {
    let mut trail = vec![decl.type_name.clone()];
    belongs_to_inner(catalog, decl, &mut trail)
}

fn belongs_to_inner(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    trail: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut owner_fields: Vec<String> = decl
        .methods
        .iter()
        .filter(|m| is_getter(&m.name))
        .filter(|m| matches!(m.connection_spec(), Some((_, ConnectionKind::BelongsTo))))
        .map(|m| field_name(&m.name).to_string())
        .collect();

    for parent in direct_supertypes(decl) {
        if trail.contains(&parent) {
            return Err(ModelError::CyclicInheritance(parent));
        }
        let parent_decl = catalog.get_model(&parent)?;
        trail.push(parent);
        owner_fields.extend(belongs_to_inner(catalog, parent_decl, trail)?);
        trail.pop();
    }

    Ok(owner_fields)
}
