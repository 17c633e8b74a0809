use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::convention::{CREATED_AT, UPDATED_AT};
use crate::core::{Cardinality, Value};
use crate::registry::FieldOrigin;
use super::Model;

/// One cached connection, resolved to its declared field name.
struct RelationView<'a> {
    field: &'a str,
    cardinality: Cardinality,
    instances: &'a [Model],
}

impl Model {
    /// Merged field store: own fields, then each supertype's, then the audit
    /// fields. Identity comes first within each level. Unset fields are `Null`.
    pub fn export_fields(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        for audit in [CREATED_AT, UPDATED_AT] {
            let value = self.fields.get(audit).cloned().unwrap_or(Value::Null);
            out.push((audit.to_string(), value));
        }
        out
    }

    fn collect_fields(&self, out: &mut Vec<(String, Value)>) {
        let identity = &self.descriptor.identity.field;
        let mut stored: Vec<&str> = self
            .descriptor
            .fields
            .values()
            .filter(|f| matches!(f.origin, FieldOrigin::Declared | FieldOrigin::DefaultId))
            .map(|f| f.name.as_str())
            .collect();
        stored.sort_by_key(|name| (*name != identity.as_str(), *name));

        for name in stored {
            if out.iter().any(|(seen, _)| seen == name) {
                continue;
            }
            let value = self.fields.get(name).cloned().unwrap_or(Value::Null);
            out.push((name.to_string(), value));
        }
        for parent in &self.supers {
            parent.collect_fields(out);
        }
    }

    fn relation_views(&self) -> Vec<RelationView<'_>> {
        self.relations
            .iter()
            .map(|(key, entry)| match self.descriptor.connection(key) {
                Some(connection) => RelationView {
                    field: &connection.field,
                    cardinality: connection.cardinality,
                    instances: entry.instances(),
                },
                None => RelationView {
                    field: key,
                    cardinality: Cardinality::Array,
                    instances: entry.instances(),
                },
            })
            .collect()
    }

    /// JSON export: `{"<Table>": {<fields>, <connections>}}`.
    pub fn to_json_value(&self) -> JsonValue {
        let mut root = Map::new();
        root.insert(self.table_name().to_string(), self.json_body());
        JsonValue::Object(root)
    }

    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    fn json_body(&self) -> JsonValue {
        let mut body = Map::new();
        for (name, value) in self.export_fields() {
            body.insert(name, value.to_json());
        }
        for view in self.relation_views() {
            let rendered = match view.cardinality {
                Cardinality::Array => {
                    JsonValue::Array(view.instances.iter().map(Model::json_body).collect())
                }
                Cardinality::Singular => view
                    .instances
                    .first()
                    .map(Model::json_body)
                    .unwrap_or(JsonValue::Null),
            };
            body.insert(view.field.to_string(), rendered);
        }
        JsonValue::Object(body)
    }

    /// XML export: one element per field, nested elements per connection.
    /// Array connections are wrapped in an element named after the field.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, 0);
        out
    }

    fn write_xml(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let table = self.table_name();
        out.push_str(&format!("{}<{}>\n", pad, table));

        for (name, value) in self.export_fields() {
            if value.is_null() {
                out.push_str(&format!("{}  <{}/>\n", pad, name));
            } else {
                out.push_str(&format!(
                    "{}  <{}>{}</{}>\n",
                    pad,
                    name,
                    escape_xml(&value.to_string()),
                    name
                ));
            }
        }

        for view in self.relation_views() {
            match view.cardinality {
                Cardinality::Array => {
                    out.push_str(&format!("{}  <{}>\n", pad, view.field));
                    for model in view.instances {
                        model.write_xml(out, depth + 2);
                    }
                    out.push_str(&format!("{}  </{}>\n", pad, view.field));
                }
                Cardinality::Singular => {
                    if let Some(model) = view.instances.first() {
                        model.write_xml(out, depth + 1);
                    }
                }
            }
        }

        out.push_str(&format!("{}</{}>\n", pad, table));
    }
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Textual dump: `#<Table inherits (A, B) Field: value, ...>`.
impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}", self.table_name())?;
        if self.extends_models() {
            let parents: Vec<&str> = self.supers.iter().map(Model::table_name).collect();
            write!(f, " inherits ({})", parents.join(", "))?;
        }

        let mut parts: Vec<String> = self
            .export_fields()
            .into_iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        for view in self.relation_views() {
            let rendered: Vec<String> = view.instances.iter().map(Model::to_string).collect();
            match view.cardinality {
                Cardinality::Array => parts.push(format!("{}: [{}]", view.field, rendered.join(", "))),
                Cardinality::Singular => parts.push(format!(
                    "{}: {}",
                    view.field,
                    rendered.first().map(String::as_str).unwrap_or("null")
                )),
            }
        }

        write!(f, " {}>", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::escape_xml;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
