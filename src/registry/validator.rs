//! Structural checks of a model declaration against its implementation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::convention;
use crate::core::{IdentityType, MalformedModelReport, ValueType};
use crate::implementation::{MethodSignature, ModelImplementation};
use crate::model::{Annotation, DeclarationCatalog, MethodDecl, ModelDecl};
use super::descriptor::ModelDescriptor;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Checks `decl` and `implementation` against the accessor conventions.
pub fn validate_model(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    descriptor: &ModelDescriptor,
    implementation_key: &str,
    implementation: &dyn ModelImplementation,
) -> Result<(), MalformedModelReport> {
    let mut report = MalformedModelReport::new(&decl.type_name, implementation_key);

    for method in &decl.methods {
        check_method(catalog, decl, descriptor, method, implementation, &mut report);
    }

    let ids = decl
        .methods
        .iter()
        .filter(|m| m.is_id() && convention::is_getter(&m.name))
        .count();
    if ids > 1 {
        report
            .generic_interface_errors
            .push(format!("{} getters are annotated Id; at most one is allowed", ids));
    }

    let mut seen: Vec<&str> = Vec::new();
    for method in &decl.methods {
        if seen.contains(&method.name.as_str()) {
            report
                .generic_interface_errors
                .push(format!("method '{}' is declared more than once", method.name));
        } else {
            seen.push(&method.name);
        }
    }

    for provided in implementation.methods() {
        let shadows = descriptor
            .dispatch()
            .resolve(&provided.name)
            .is_some_and(|handler| handler.is_accessor());
        if shadows {
            report.implementation(
                &provided.name,
                format!("{} shadows a generated accessor", provided),
            );
        }
    }

    if report.is_empty() { Ok(()) } else { Err(report) }
}

fn check_method(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    descriptor: &ModelDescriptor,
    method: &MethodDecl,
    implementation: &dyn ModelImplementation,
    report: &mut MalformedModelReport,
) {
    let name = method.name.as_str();
    if !IDENTIFIER.is_match(name) {
        report.interface(name, "illegal method name");
        return;
    }

    if method.is_business_logic() {
        let signature = MethodSignature::of(method);
        if implementation.find_method(&signature).is_none() {
            report.implementation(name, format!("missing implementation of {}", signature));
        }
        return;
    }

    if convention::is_getter(name) {
        check_getter(catalog, decl, descriptor, method, report);
    } else if convention::is_setter(name) {
        check_setter(catalog, decl, method, report);
    } else {
        report.interface(name, "method is neither an accessor nor annotated BusinessLogic");
    }
}

fn check_getter(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    descriptor: &ModelDescriptor,
    method: &MethodDecl,
    report: &mut MalformedModelReport,
) {
    let name = method.name.as_str();
    if !method.params.is_empty() {
        report.interface(name, "a getter must not take parameters");
    }
    if method.returns == ValueType::Void {
        report.interface(name, "a getter must return a value");
        return;
    }

    match method.connection_spec() {
        Some((connection, _)) => match method.returns.model_target() {
            None => report.interface(
                name,
                format!("Connection '{}' requires a model return type", connection),
            ),
            Some(target) if !catalog.model_exists(target) => {
                report.interface(name, format!("unknown connection target '{}'", target));
            }
            Some(_) if convention::is_recursive(decl, connection) => {
                report.interface(
                    name,
                    format!("recursive connection '{}' is not supported", connection),
                );
            }
            Some(_) => {}
        },
        None if method.returns.is_model() => {
            report.interface(name, "a model-typed getter requires a Connection annotation");
        }
        None if !method.returns.is_valid_field() => {
            report.interface(name, format!("invalid field type {}", method.returns));
        }
        None => {}
    }

    if method.is_auto_increment() {
        if !method.is_id() {
            report.interface(name, "AutoIncrement requires Id");
        } else if descriptor.identity.id_type != IdentityType::Integer {
            report.interface(name, "AutoIncrement requires an integer Id");
        }
    }
}

fn check_setter(
    catalog: &DeclarationCatalog,
    decl: &ModelDecl,
    method: &MethodDecl,
    report: &mut MalformedModelReport,
) {
    let name = method.name.as_str();
    if method.params.len() != 1 {
        report.interface(name, "a setter takes exactly one parameter");
    }
    if method.returns != ValueType::Void {
        report.interface(name, "a setter must return Void");
    }
    for annotation in &method.annotations {
        let getter_only = match annotation {
            Annotation::Id => Some("Id"),
            Annotation::AutoIncrement => Some("AutoIncrement"),
            Annotation::Connection { .. } => Some("Connection"),
            _ => None,
        };
        if let Some(label) = getter_only {
            report.interface(name, format!("{} only applies to getters", label));
        }
    }

    let field = convention::field_name(name);
    match find_getter(catalog, decl, field) {
        None => report.interface(name, format!("no getter declared for field '{}'", field)),
        Some(getter) => {
            if let Some(param) = method.params.first() {
                if *param != getter.returns {
                    report.interface(
                        name,
                        format!(
                            "parameter type {} does not match getter type {}",
                            param, getter.returns
                        ),
                    );
                }
            }
        }
    }
}

/// Getter for `field` on `decl` or any of its ancestors.
fn find_getter<'a>(
    catalog: &'a DeclarationCatalog,
    decl: &'a ModelDecl,
    field: &str,
) -> Option<&'a MethodDecl> {
    let candidates = [format!("get{}", field), format!("is{}", field)];
    let own = decl
        .methods
        .iter()
        .find(|m| candidates.contains(&m.name));
    if own.is_some() {
        return own;
    }
    convention::transitive_supertypes(catalog, decl)
        .ok()?
        .iter()
        .filter_map(|s| catalog.get_model(s).ok())
        .find_map(|parent| parent.methods.iter().find(|m| candidates.contains(&m.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::{DefaultImplementation, MethodTable};
    use crate::core::Value;
    use crate::model::ConnectionKind;
    use std::sync::Arc;

    fn check(decls: Vec<ModelDecl>, name: &str, imp: &dyn ModelImplementation) -> Result<(), MalformedModelReport> {
        let catalog = decls
            .into_iter()
            .fold(DeclarationCatalog::new(), |c, d| c.with_model(d).unwrap());
        let decl = catalog.get_model(name).unwrap();
        let descriptor = ModelDescriptor::build(&catalog, decl, &[]).unwrap();
        validate_model(&catalog, decl, &descriptor, "a::TestImpl", imp)
    }

    #[test]
    fn test_well_formed_model_passes() {
        let decls = vec![ModelDecl::new("a::Account")
            .key("Email", ValueType::Text)
            .property("Password", ValueType::Text)];
        assert!(check(decls, "a::Account", &DefaultImplementation).is_ok());
    }

    #[test]
    fn test_collects_interface_errors() {
        let decls = vec![ModelDecl::new("a::Broken")
            .method(MethodDecl::getter("getOwner", ValueType::model("a::Person")))
            .method(MethodDecl::setter("setMissing", ValueType::Text))
            .method(MethodDecl::method("login", ValueType::Boolean, vec![]))
            .method(MethodDecl::getter("getName", ValueType::Text))
            .method(MethodDecl::setter("setName", ValueType::Integer))];
        let report = check(decls, "a::Broken", &DefaultImplementation).unwrap_err();

        assert!(report.interface_errors.contains_key("getOwner"));
        assert!(report.interface_errors.contains_key("setMissing"));
        assert!(report.interface_errors.contains_key("login"));
        assert!(report.interface_errors["setName"][0].contains("does not match"));
        assert_eq!(report.interface_error_count(), 4);

        let rendered = report.to_string();
        assert!(rendered.starts_with("Malformed model interface/implementation"));
        assert!(rendered.contains("In interface a::Broken (4 error(s))"));
    }

    #[test]
    fn test_unknown_and_recursive_connections() {
        let decls = vec![ModelDecl::new("a::Node")
            .connection("Next", ValueType::model("a::Node"), "Next", ConnectionKind::Aggregation)
            .connection("Owner", ValueType::model("a::Ghost"), "Owner", ConnectionKind::BelongsTo)];
        let report = check(decls, "a::Node", &DefaultImplementation).unwrap_err();
        assert!(report.interface_errors["getNext"][0].contains("recursive"));
        assert!(report.interface_errors["getOwner"][0].contains("unknown connection target"));
    }

    #[test]
    fn test_business_logic_needs_structural_match() {
        let decls = vec![ModelDecl::new("a::Person")
            .property("Name", ValueType::Text)
            .method(MethodDecl::business("greet", ValueType::Text, vec![ValueType::Text]))];

        let missing = check(decls.clone(), "a::Person", &DefaultImplementation).unwrap_err();
        assert!(missing.implementation_errors.contains_key("greet"));

        let wrong = MethodTable::new().method(
            MethodSignature::new("greet", ValueType::Text, vec![ValueType::Integer]),
            |_, _| Ok(Value::Null),
        );
        assert!(check(decls.clone(), "a::Person", &wrong).is_err());

        let right = Arc::new(MethodTable::new().method(
            MethodSignature::new("greet", ValueType::Text, vec![ValueType::Text]),
            |_, _| Ok(Value::Null),
        ));
        assert!(check(decls, "a::Person", right.as_ref()).is_ok());
    }

    #[test]
    fn test_implementation_may_not_shadow_accessors() {
        let decls = vec![ModelDecl::new("a::Person").property("Name", ValueType::Text)];
        let imp = MethodTable::new().method(
            MethodSignature::new("getName", ValueType::Text, vec![]),
            |_, _| Ok(Value::Null),
        );
        let report = check(decls, "a::Person", &imp).unwrap_err();
        assert_eq!(report.implementation_error_count(), 1);
        assert!(report.to_string().contains("In implementation a::TestImpl (1 error(s))"));
    }

    #[test]
    fn test_more_than_one_id() {
        let decls = vec![ModelDecl::new("a::Pair")
            .key("Left", ValueType::Integer)
            .key("Right", ValueType::Integer)];
        let report = check(decls, "a::Pair", &DefaultImplementation).unwrap_err();
        assert_eq!(report.generic_interface_errors.len(), 1);
    }
}
