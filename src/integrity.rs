//! Naming primitives shared by the schema and the git layers

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type SchemaName = String;
pub type TableName = String;
pub type ColumnName = String;
pub type OptionKey = String;
pub type BranchName = String;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Whether the name can be used as a schema, table or column identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// The four kinds of mutation a Change can classify into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crud {
    Create,
    Retrieve,
    Update,
    Delete,
}

impl Crud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Crud::Create => "create",
            Crud::Retrieve => "retrieve",
            Crud::Update => "update",
            Crud::Delete => "delete",
        }
    }

    /// HTTP verb used by collaborators that talk to REST backends
    pub fn to_http_verb(&self) -> &'static str {
        match self {
            Crud::Create => "POST",
            Crud::Retrieve => "GET",
            Crud::Update => "PUT",
            Crud::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Crud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("foos"));
        assert!(is_valid_identifier("_private_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("foo bar"));
    }

    #[test]
    fn test_crud_http_verbs() {
        assert_eq!(Crud::Create.to_http_verb(), "POST");
        assert_eq!(Crud::Retrieve.to_http_verb(), "GET");
        assert_eq!(Crud::Update.to_http_verb(), "PUT");
        assert_eq!(Crud::Delete.to_http_verb(), "DELETE");
    }

    #[test]
    fn test_crud_serializes_lowercase() {
        let json = serde_json::to_string(&Crud::Retrieve).unwrap();
        assert_eq!(json, "\"retrieve\"");
        assert_eq!(Crud::Delete.to_string(), "delete");
    }
}
