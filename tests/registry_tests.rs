use modelmapper::registry::FieldOrigin;
use modelmapper::{
    ConnectionKind, IdentityType, MethodDecl, ModelDecl, ModelError, Registry, ValueType,
};
use std::sync::Arc;
use std::thread;

fn school() -> Registry {
    let registry = Registry::new();
    registry
        .register_models([
            ModelDecl::new("school::Person")
                .property("Name", ValueType::Text)
                .property("Age", ValueType::Integer),
            ModelDecl::new("school::Account")
                .key("Email", ValueType::Text)
                .property("Password", ValueType::Text),
            ModelDecl::new("school::Student")
                .extends("school::Account")
                .property("Avg", ValueType::Double),
            ModelDecl::new("school::Graduate")
                .extends("school::Student")
                .property("Thesis", ValueType::Text),
            ModelDecl::new("school::TeachingAssistant")
                .extends("school::Person")
                .extends("school::Student"),
            ModelDecl::new("school::Tutor")
                .extends("school::Person")
                .extends("school::Student")
                .method(MethodDecl::getter("getBadge", ValueType::Long).id().auto_increment())
                .method(MethodDecl::setter("setBadge", ValueType::Long)),
        ])
        .unwrap();
    registry
}

#[test]
fn test_describe_twice_yields_identical_descriptor() {
    let registry = school();

    let first = registry.describe("school::Student").unwrap();
    let second = registry.describe("school::Student").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.fields, second.fields);
    assert_eq!(first.identity, second.identity);
    assert_eq!(first.supers, second.supers);
}

#[test]
fn test_single_parent_identity_is_composed() {
    let registry = school();

    let account = registry.identity("school::Account").unwrap();
    let student = registry.identity("school::Student").unwrap();
    assert_eq!(student.field, format!("{}{}", registry.table_name("school::Account").unwrap(), account.field));
    assert_eq!(student.field, "AccountEmail");
    assert_eq!(student.id_type, account.id_type);
    assert_eq!(student.id_type, IdentityType::Text);
    assert!(!student.auto_increment);

    let graduate = registry.identity("school::Graduate").unwrap();
    assert_eq!(graduate.field, "StudentAccountEmail");
    assert_eq!(graduate.id_type, IdentityType::Text);
}

#[test]
fn test_several_parents_without_id_are_ambiguous() {
    let registry = school();

    let err = registry.describe("school::TeachingAssistant").unwrap_err();
    assert!(matches!(err, ModelError::AmbiguousIdentity(ref t) if t == "school::TeachingAssistant"));

    // Cached: the same failure again.
    let again = registry.describe("school::TeachingAssistant").unwrap_err();
    assert_eq!(err.to_string(), again.to_string());
}

#[test]
fn test_explicit_id_resolves_several_parents() {
    let registry = school();

    let tutor = registry.describe("school::Tutor").unwrap();
    assert_eq!(tutor.identity.field, "Badge");
    assert!(tutor.identity.auto_increment);
    assert_eq!(tutor.supers, vec!["school::Person", "school::Student"]);
    assert_eq!(
        tutor.all_supers,
        vec!["school::Person", "school::Student", "school::Account"]
    );

    // One implicit key per supertype.
    assert_eq!(
        tutor.fields["PersonId"].origin,
        FieldOrigin::SupertypeKey { supertype: "school::Person".into() }
    );
    assert_eq!(tutor.fields["StudentAccountEmail"].value_type, ValueType::Text);
}

#[test]
fn test_field_types_include_audit_fields() {
    let registry = school();

    let types = registry.field_types("school::Student").unwrap();
    assert_eq!(types["CreatedAt"], ValueType::Timestamp);
    assert_eq!(types["UpdatedAt"], ValueType::Timestamp);
    assert_eq!(types["Avg"], ValueType::Double);
    assert_eq!(types["AccountEmail"], ValueType::Text);
    assert!(!types.contains_key("Password"));

    assert!(registry.owns_field("school::Student", "Avg").unwrap());
    assert!(!registry.owns_field("school::Student", "Password").unwrap());
    assert!(registry.owns_field_extended("school::Graduate", "Password").unwrap());
}

#[test]
fn test_diamond_ancestors_listed_once() {
    let registry = Registry::new();
    registry
        .register_models([
            ModelDecl::new("d::Base").property("Label", ValueType::Text),
            ModelDecl::new("d::Left").extends("d::Base"),
            ModelDecl::new("d::Right").extends("d::Base"),
            ModelDecl::new("d::Bottom")
                .extends("d::Left")
                .extends("d::Right")
                .key("Code", ValueType::Integer),
        ])
        .unwrap();

    assert_eq!(
        registry.all_supertypes("d::Bottom").unwrap(),
        vec!["d::Left", "d::Right", "d::Base"]
    );
}

#[test]
fn test_belongs_to_collects_inherited_owners() {
    let registry = Registry::new();
    registry
        .register_models([
            ModelDecl::new("hr::Company").property("Name", ValueType::Text),
            ModelDecl::new("hr::Department").property("Name", ValueType::Text),
            ModelDecl::new("hr::Worker").connection(
                "Company",
                ValueType::model("hr::Company"),
                "WorksFor",
                ConnectionKind::BelongsTo,
            ),
            ModelDecl::new("hr::Engineer")
                .extends("hr::Worker")
                .connection(
                    "Department",
                    ValueType::model("hr::Department"),
                    "Staff",
                    ConnectionKind::BelongsTo,
                ),
        ])
        .unwrap();

    assert_eq!(
        registry.belongs_to("hr::Engineer").unwrap(),
        vec!["Department", "Company"]
    );
    // Inherited connections resolve on the subtype.
    assert_eq!(
        registry.connection_target("hr::Engineer", "company").unwrap(),
        "hr::Company"
    );
    assert_eq!(
        registry.connection("hr::Engineer", "Company").unwrap().declared_on,
        "hr::Worker"
    );
}

#[test]
fn test_concurrent_describe_publishes_one_descriptor() {
    let registry = Arc::new(school());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.describe("school::Graduate").unwrap())
        })
        .collect();

    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for descriptor in &descriptors[1..] {
        assert!(Arc::ptr_eq(&descriptors[0], descriptor));
    }
}

#[test]
fn test_global_registry_is_shared() {
    let first = Registry::global();
    let second = Registry::global();
    assert!(Arc::ptr_eq(first, second));

    first
        .register_model(ModelDecl::new("global_test::Marker").property("Tag", ValueType::Text))
        .unwrap();
    assert!(second.describe("global_test::Marker").is_ok());
}

#[test]
fn test_missing_parent_is_not_cached() {
    let registry = Registry::new();
    registry
        .register_model(ModelDecl::new("late::Student").extends("late::Account"))
        .unwrap();

    assert!(matches!(
        registry.describe("late::Student"),
        Err(ModelError::UnknownModel(ref name)) if name == "late::Account"
    ));

    registry
        .register_model(ModelDecl::new("late::Account").key("Email", ValueType::Text))
        .unwrap();
    let student = registry.identity("late::Student").unwrap();
    assert_eq!(student.field, "AccountEmail");
}
