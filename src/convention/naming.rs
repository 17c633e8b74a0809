/// Field name for an accessor: strips the `is`, `get` or `set` prefix.
///
/// `getEmail` -> `Email`, `isActive` -> `Active`, `setEmail` -> `Email`.
pub fn field_name(method: &str) -> &str {
    if let Some(rest) = method.strip_prefix("is") {
        return rest;
    }
    if method.starts_with("get") || method.starts_with("set") {
        return &method[3..];
    }
    method
}

/// Table name of a model type: its name without the namespace.
///
/// Both `corp::hr::Person` and `corp.hr.Person` map to `Person`.
pub fn table_name(type_name: &str) -> &str {
    let last = type_name.rsplit("::").next().unwrap_or(type_name);
    last.rsplit('.').next().unwrap_or(last)
}

/// Namespace prefix of a model type, if it has one.
pub fn namespace(type_name: &str) -> Option<&str> {
    let table = table_name(type_name);
    let prefix = &type_name[..type_name.len() - table.len()];
    let prefix = prefix
        .strip_suffix("::")
        .or_else(|| prefix.strip_suffix('.'))?;
    if prefix.is_empty() { None } else { Some(prefix) }
}

pub fn is_getter(method: &str) -> bool {
    method.starts_with("get") || method.starts_with("is")
}

pub fn is_setter(method: &str) -> bool {
    method.starts_with("set")
}

/// Conventional name of the business-logic implementation for a model type:
/// `<table-name><suffix>` in the model's namespace.
pub fn implementation_key(type_name: &str, suffix: &str) -> String {
    let table = table_name(type_name);
    let separator = if type_name.contains("::") { "::" } else { "." };
    match namespace(type_name) {
        Some(ns) => format!("{}{}{}{}", ns, separator, table, suffix),
        None => format!("{}{}", table, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_strips_prefixes() {
        assert_eq!(field_name("getEmail"), "Email");
        assert_eq!(field_name("setEmail"), "Email");
        assert_eq!(field_name("isActive"), "Active");
        assert_eq!(field_name("login"), "login");
    }

    #[test]
    fn test_table_name_drops_namespace() {
        assert_eq!(table_name("corp::hr::Person"), "Person");
        assert_eq!(table_name("corp.hr.Person"), "Person");
        assert_eq!(table_name("Person"), "Person");
    }

    #[test]
    fn test_namespace() {
        assert_eq!(namespace("corp::hr::Person"), Some("corp::hr"));
        assert_eq!(namespace("corp.Person"), Some("corp"));
        assert_eq!(namespace("Person"), None);
    }

    #[test]
    fn test_accessor_classification() {
        assert!(is_getter("getName"));
        assert!(is_getter("isAdmin"));
        assert!(!is_getter("setName"));
        assert!(is_setter("setName"));
        assert!(!is_setter("reset"));
    }

    #[test]
    fn test_implementation_key() {
        assert_eq!(implementation_key("corp::Person", "Impl"), "corp::PersonImpl");
        assert_eq!(implementation_key("corp.Person", "Impl"), "corp.PersonImpl");
        assert_eq!(implementation_key("Person", "Impl"), "PersonImpl");
    }
}
