use crate::core::ValueType;
use crate::model::ConnectionKind;
use super::{Attribute, QueryGenerator, Relationship, SchemaGenerator};

const TABLE_OPTIONS: &str = ") ENGINE=InnoDB DEFAULT CHARSET=latin1;";

pub struct MySqlSchemaGenerator;

impl MySqlSchemaGenerator {
    fn column(&self, attribute: &Attribute) -> String {
        let mut ddl = format!("\n\t{} {}", attribute.name, attribute.sql_type);
        if attribute.auto_increment {
            ddl.push_str(" AUTO_INCREMENT");
        }
        if attribute.is_id || attribute.not_null {
            ddl.push_str(" NOT NULL");
        } else {
            ddl.push_str(" NULL");
        }
        if attribute.unique {
            ddl.push_str(" UNIQUE");
        }
        ddl
    }
}

impl SchemaGenerator for MySqlSchemaGenerator {
    fn create_ddl(&self, table: &str, attributes: &[Attribute], id_name: &str) -> String {
        let columns: Vec<String> = attributes.iter().map(|a| self.column(a)).collect();
        let mut ddl = format!("CREATE TABLE {}({}", table, columns.join(","));
        if attributes.iter().any(|a| a.is_id) {
            ddl.push_str(&format!(",\n\tPRIMARY KEY({})", id_name));
        }
        ddl.push('\n');
        ddl.push_str(TABLE_OPTIONS);
        ddl.push('\n');
        ddl
    }

    fn create_constraints(&self, table: &str, attributes: &[Attribute]) -> String {
        let keys: Vec<String> = attributes
            .iter()
            .filter_map(|a| {
                let fk = a.foreign_key.as_ref()?;
                let cascade = if fk.cascade { " ON DELETE CASCADE" } else { "" };
                Some(format!(
                    "\n\tADD FOREIGN KEY({}) REFERENCES {}({}){}",
                    a.name, fk.table, fk.column, cascade
                ))
            })
            .collect();
        if keys.is_empty() {
            return String::new();
        }
        format!("\nALTER TABLE {}{};\n", table, keys.join(","))
    }

    fn create_join_table(&self, relationship: &Relationship) -> String {
        if relationship.kind != ConnectionKind::ManyToMany {
            return String::new();
        }
        let int = self.mapped_type(&ValueType::Integer).unwrap_or("int");
        let type_a = self.mapped_type(&relationship.id_type_b).unwrap_or(int);
        let type_b = self.mapped_type(&relationship.id_type_a).unwrap_or(int);

        let mut ddl = format!("CREATE TABLE {} (", relationship.name);
        ddl.push_str(&format!("\n\tId {} AUTO_INCREMENT,", int));
        ddl.push_str(&format!(
            "\n\t{} {},\n\t{} {},",
            relationship.field_a, type_a, relationship.field_b, type_b
        ));
        ddl.push_str("\n\tPRIMARY KEY(Id),");
        ddl.push_str(&format!(
            "\n\tFOREIGN KEY({}) REFERENCES {}({}),",
            relationship.field_a, relationship.table_b, relationship.id_b
        ));
        ddl.push_str(&format!(
            "\n\tFOREIGN KEY({}) REFERENCES {}({})",
            relationship.field_b, relationship.table_a, relationship.id_a
        ));
        ddl.push('\n');
        ddl.push_str(TABLE_OPTIONS);
        ddl.push_str("\n\n");
        ddl
    }

    fn mapped_type(&self, value_type: &ValueType) -> Option<&'static str> {
        let sql = match value_type {
            ValueType::Long => "bigint",
            ValueType::Boolean => "bit",
            ValueType::Char => "char",
            ValueType::Integer => "int",
            ValueType::Short | ValueType::Byte => "tinyint",
            ValueType::Float | ValueType::Double => "double",
            ValueType::Decimal => "decimal",
            ValueType::Timestamp | ValueType::Time => "datetime",
            ValueType::Text | ValueType::Url => "varchar(255)",
            ValueType::Blob => "varbinary(max)",
            ValueType::Clob => "text",
            ValueType::Date => "date",
            ValueType::Void | ValueType::Model(_) | ValueType::ModelArray(_) => return None,
        };
        Some(sql)
    }
}

pub struct MySqlQueryGenerator;

impl QueryGenerator for MySqlQueryGenerator {
    fn generate_select(
        &self,
        what: &[&str],
        from: &[&str],
        criteria: &str,
        order_by: Option<&str>,
        descending: bool,
        limit: Option<usize>,
    ) -> String {
        let columns: Vec<String> = what.iter().map(|table| format!("{}.*", table)).collect();
        let mut query = format!(
            "SELECT {} FROM {} WHERE {}",
            columns.join(","),
            from.join(","),
            criteria
        );
        if let Some(order) = order_by {
            query.push_str(&format!(
                " ORDER BY {} {}",
                order,
                if descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = limit.filter(|l| *l > 0) {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ForeignKey;

    fn column(name: &str, sql: &str) -> Attribute {
        Attribute {
            name: name.to_string(),
            value_type: ValueType::Text,
            sql_type: sql.to_string(),
            is_id: false,
            auto_increment: false,
            not_null: false,
            unique: false,
            foreign_key: None,
        }
    }

    #[test]
    fn test_create_ddl() {
        let mut id = column("Id", "int");
        id.is_id = true;
        id.auto_increment = true;
        let mut email = column("Email", "varchar(255)");
        email.unique = true;

        let ddl = MySqlSchemaGenerator.create_ddl("Account", &[id, email], "Id");
        assert_eq!(
            ddl,
            "CREATE TABLE Account(\n\tId int AUTO_INCREMENT NOT NULL,\n\tEmail varchar(255) NULL UNIQUE,\n\tPRIMARY KEY(Id)\n) ENGINE=InnoDB DEFAULT CHARSET=latin1;\n"
        );
    }

    #[test]
    fn test_constraints() {
        let mut owner = column("EmployerId", "int");
        owner.foreign_key = Some(ForeignKey {
            table: "Corporation".into(),
            column: "Id".into(),
            cascade: true,
        });
        let sql = MySqlSchemaGenerator.create_constraints("Employee", &[owner, column("Name", "varchar(255)")]);
        assert_eq!(
            sql,
            "\nALTER TABLE Employee\n\tADD FOREIGN KEY(EmployerId) REFERENCES Corporation(Id) ON DELETE CASCADE;\n"
        );
        assert!(MySqlSchemaGenerator.create_constraints("Note", &[column("Body", "text")]).is_empty());
    }

    #[test]
    fn test_generate_select() {
        let sql = MySqlQueryGenerator.generate_select(
            &["Person"],
            &["Person"],
            "Name = ?",
            Some("Name"),
            true,
            Some(10),
        );
        assert_eq!(sql, "SELECT Person.* FROM Person WHERE Name = ? ORDER BY Name DESC LIMIT 10");
    }

    #[test]
    fn test_unmapped_types() {
        assert_eq!(MySqlSchemaGenerator.mapped_type(&ValueType::Long), Some("bigint"));
        assert_eq!(MySqlSchemaGenerator.mapped_type(&ValueType::model("a::B")), None);
    }
}
