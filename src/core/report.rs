//! Convention violations collected while validating a model.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Every convention violation found on a model type and its implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MalformedModelReport {
    pub model: String,
    pub implementation: String,
    pub interface_errors: BTreeMap<String, Vec<String>>,
    pub generic_interface_errors: Vec<String>,
    pub implementation_errors: BTreeMap<String, Vec<String>>,
    pub generic_implementation_errors: Vec<String>,
}

impl MalformedModelReport {
    pub fn new(model: &str, implementation: &str) -> Self {
        Self {
            model: model.to_string(),
            implementation: implementation.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn interface(&mut self, method: &str, message: impl Into<String>) {
        self.interface_errors
            .entry(method.to_string())
            .or_default()
            .push(message.into());
    }

    pub(crate) fn implementation(&mut self, method: &str, message: impl Into<String>) {
        self.implementation_errors
            .entry(method.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn interface_error_count(&self) -> usize {
        self.interface_errors.len() + self.generic_interface_errors.len()
    }

    pub fn implementation_error_count(&self) -> usize {
        self.implementation_errors.len() + self.generic_implementation_errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interface_error_count() == 0 && self.implementation_error_count() == 0
    }
}

fn write_section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    subject: &str,
    per_method: &BTreeMap<String, Vec<String>>,
    generic: &[String],
) -> fmt::Result {
    let count = per_method.len() + generic.len();
    if count == 0 {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "In {} {} ({} error(s))", title, subject, count)?;
    for message in generic {
        writeln!(f, "  - {}", message)?;
    }
    for (method, messages) in per_method {
        writeln!(f, "  {}:", method)?;
        for message in messages {
            writeln!(f, "    - {}", message)?;
        }
    }
    Ok(())
}

impl fmt::Display for MalformedModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed model interface/implementation: {}", self.model)?;
        write_section(
            f,
            "interface",
            &self.model,
            &self.interface_errors,
            &self.generic_interface_errors,
        )?;
        write_section(
            f,
            "implementation",
            &self.implementation,
            &self.implementation_errors,
            &self.generic_implementation_errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_sections_and_counts() {
        let mut report = MalformedModelReport::new("a::Person", "a::PersonImpl");
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "Malformed model interface/implementation: a::Person\n");

        report.interface("getname", "illegal method name");
        report.implementation("getAge", "missing implementation of getAge()");
        assert_eq!(report.interface_error_count(), 1);
        assert_eq!(report.implementation_error_count(), 1);

        let text = report.to_string();
        assert!(text.contains("In interface a::Person (1 error(s))\n  getname:\n    - illegal method name"));
        assert!(text.contains("In implementation a::PersonImpl (1 error(s))"));
    }
}
