use std::sync::Arc;

use modelmapper::{
    ConnectionKind, MethodDecl, MethodSignature, MethodTable, ModelDecl, Registry, Result, Value,
    ValueType,
};

pub const NAMESPACE: &str = "sample";

pub const ACCOUNT: &str = "sample::Account";
pub const WEB_SERVICE: &str = "sample::WebService";
pub const PERSON: &str = "sample::Person";
pub const STUDENT: &str = "sample::Student";
pub const CORPORATION: &str = "sample::Corporation";

/// Types in migration order: referenced tables first.
pub const ALL: [&str; 5] = [PERSON, ACCOUNT, WEB_SERVICE, STUDENT, CORPORATION];

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new(ACCOUNT)
            .key("Email", ValueType::Text)
            .property("Password", ValueType::Text)
            .connection("WebService", ValueType::model(WEB_SERVICE), "AS", ConnectionKind::Aggregation),
        ModelDecl::new(WEB_SERVICE)
            .key("Name", ValueType::Text)
            .property("HostName", ValueType::Text)
            .connection("Accounts", ValueType::model_array(ACCOUNT), "AS", ConnectionKind::Composition),
        ModelDecl::new(PERSON)
            .property("Name", ValueType::Text)
            .property("Surname", ValueType::Text)
            .property("Age", ValueType::Integer)
            .method(MethodDecl::business("fullName", ValueType::Text, vec![])),
        ModelDecl::new(STUDENT)
            .extends(ACCOUNT)
            .property("Avg", ValueType::Double)
            .connection(
                "Corporations",
                ValueType::model_array(CORPORATION),
                "Stage",
                ConnectionKind::ManyToMany,
            ),
        ModelDecl::new(CORPORATION)
            .method(MethodDecl::getter("getCorporateId", ValueType::Integer).id().auto_increment())
            .method(MethodDecl::setter("setCorporateId", ValueType::Integer))
            .property("Name", ValueType::Text)
            .connection("CEO", ValueType::model(PERSON), "CEO", ConnectionKind::Aggregation)
            .connection("Employees", ValueType::model_array(PERSON), "Employed", ConnectionKind::Composition),
    ]
}

/// Registry holding the sample declarations and the `Person` implementation.
pub fn sample_registry() -> Result<Arc<Registry>> {
    let registry = Arc::new(Registry::new());
    registry.register_models(declarations())?;

    let person = MethodTable::new().method(
        MethodSignature::new("fullName", ValueType::Text, vec![]),
        |model, _| {
            let name = model.get("Name")?;
            let surname = model.get("Surname")?;
            Ok(Value::Text(format!("{} {}", name, surname)))
        },
    );
    registry.register_implementation_for(PERSON, Arc::new(person))?;
    Ok(registry)
}

/// Qualifies a bare table name with the sample namespace.
pub fn qualify(type_name: &str) -> String {
    if type_name.contains("::") || type_name.contains('.') {
        type_name.to_string()
    } else {
        format!("{}::{}", NAMESPACE, type_name)
    }
}
