//! Changes - the atomic unit of mutation

use crate::error::{GitError, GitResult};
use crate::git::options::Options;
use crate::integrity::{ColumnName, Crud, OptionKey, TableName};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// An atomic, typed mutation descriptor
///
/// Its CRUD kind is not stored but derived from which of entity id, value and
/// column are present:
///
/// | entity id | value | column | kind     |
/// |-----------|-------|--------|----------|
/// | absent    | set   | set    | create   |
/// | set       | absent| set    | retrieve |
/// | set       | set   | set    | update   |
/// | set       | absent| absent | delete   |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Ledger index the change is staged into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<i64>,
    pub table_name: TableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<ColumnName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    /// Kind declared by the author; checked against the presence pattern
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Crud>,
}

impl Change {
    pub fn new(table_name: impl Into<TableName>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn with_column(mut self, column_name: impl Into<ColumnName>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_kind(mut self, kind: Crud) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.as_ref().map(Value::value_type)
    }

    /// Sets the value; `None` is rejected and leaves the change untouched
    pub fn set_value(&mut self, value: Option<Value>) -> GitResult<()> {
        match value {
            Some(value) => {
                self.value = Some(value);
                Ok(())
            }
            None => Err(GitError::NilValue),
        }
    }

    /// Empties the value (e.g. to reuse a change as a retrieval)
    pub fn clear_value(&mut self) {
        self.value = None;
    }

    pub fn set_option(&mut self, key: impl Into<OptionKey>, value: serde_json::Value) -> GitResult<()> {
        self.options.assign(key, value)
    }

    pub fn with_option(mut self, key: impl Into<OptionKey>, value: serde_json::Value) -> GitResult<Self> {
        self.set_option(key, value)?;
        Ok(self)
    }

    fn has_column(&self) -> bool {
        self.column_name.as_deref().map_or(false, |c| !c.is_empty())
    }

    fn has_entity_id(&self) -> bool {
        self.entity_id.as_deref().map_or(false, |id| !id.is_empty())
    }

    /// Derives the CRUD kind from the presence pattern
    pub fn classify(&self) -> GitResult<Crud> {
        match (self.has_entity_id(), self.value.is_some(), self.has_column()) {
            (false, true, true) => Ok(Crud::Create),
            (true, false, true) => Ok(Crud::Retrieve),
            (true, true, true) => Ok(Crud::Update),
            (true, false, false) => Ok(Crud::Delete),
            _ => Err(GitError::UnclassifiableChange),
        }
    }

    /// Synchronous gate run before any schema or backend interaction
    pub fn validate(&self) -> GitResult<()> {
        if self.table_name.is_empty() {
            return Err(GitError::NilTable);
        }
        if self.options.has_nil_key() {
            return Err(GitError::NilOptionKey);
        }
        self.classify()?;
        self.validate_type()
    }

    /// Checks the declared kind, if any, rule by rule
    fn validate_type(&self) -> GitResult<()> {
        let Some(kind) = self.kind else {
            return Ok(());
        };
        let (entity_id, value, column) = match kind {
            Crud::Create => (false, true, true),
            Crud::Retrieve => (true, false, true),
            Crud::Update => (true, true, true),
            Crud::Delete => (true, false, false),
        };
        check_presence(entity_id, self.has_entity_id(), GitError::NilEntityId, GitError::NotNilEntityId)?;
        check_presence(value, self.value.is_some(), GitError::NilValue, GitError::NotNilValue)?;
        check_presence(column, self.has_column(), GitError::NilColumn, GitError::NotNilColumn)
    }
}

fn check_presence(want: bool, got: bool, nil: GitError, not_nil: GitError) -> GitResult<()> {
    match (want, got) {
        (true, false) => Err(nil),
        (false, true) => Err(not_nil),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    #[test]
    fn test_classification_is_total() {
        for entity_id in [false, true] {
            for value in [false, true] {
                for column in [false, true] {
                    let mut chg = Change::new("foos");
                    if entity_id {
                        chg = chg.with_entity_id("1");
                    }
                    if value {
                        chg = chg.with_value("x");
                    }
                    if column {
                        chg = chg.with_column("bar");
                    }
                    let want = match (entity_id, value, column) {
                        (false, true, true) => Some(Crud::Create),
                        (true, false, true) => Some(Crud::Retrieve),
                        (true, true, true) => Some(Crud::Update),
                        (true, false, false) => Some(Crud::Delete),
                        _ => None,
                    };
                    match want {
                        Some(kind) => assert_eq!(chg.classify().unwrap(), kind),
                        None => assert!(matches!(chg.classify(), Err(GitError::UnclassifiableChange))),
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_names_count_as_absent() {
        let chg = Change::new("foos").with_entity_id("").with_column("bar").with_value("x");
        assert_eq!(chg.classify().unwrap(), Crud::Create);

        let chg = Change::new("foos").with_entity_id("1").with_column("");
        assert_eq!(chg.classify().unwrap(), Crud::Delete);
    }

    #[test]
    fn test_set_value_round_trip() {
        let cases = vec![
            (Value::from("foo"), ValueType::String),
            (Value::from(42i64), ValueType::Int),
            (Value::from(1.5f32), ValueType::Float32),
            (Value::from(2.25f64), ValueType::Float64),
            (Value::Json(json!({"projects": [1, 2]})), ValueType::Json),
        ];
        for (value, want_type) in cases {
            let mut chg = fixtures::clean_value_change();
            chg.set_value(Some(value.clone())).unwrap();
            assert_eq!(chg.value(), Some(&value));
            assert_eq!(chg.value_type(), Some(want_type));
        }
    }

    #[test]
    fn test_set_nil_value_fails() {
        let mut chg = fixtures::clean_value_change();
        assert!(matches!(chg.set_value(None), Err(GitError::NilValue)));
        assert_eq!(chg.value_type(), None);
    }

    #[test]
    fn test_set_option() {
        let mut chg = Change::new("foos");
        chg.set_option("owner", json!("octo")).unwrap();
        assert_eq!(chg.options.get_str("owner"), Some("octo"));

        chg.set_option("owner", json!("cat")).unwrap();
        assert_eq!(chg.options.keys(), vec!["owner".to_string()]);
        assert_eq!(chg.options.get_str("owner"), Some("cat"));

        let before = chg.options.clone();
        assert!(matches!(chg.set_option("", json!("x")), Err(GitError::NilOptionKey)));
        assert_eq!(chg.options, before);
    }

    #[test]
    fn test_validate_rejects_structural_errors() {
        assert!(matches!(
            Change::new("").with_column("bar").with_value("x").validate(),
            Err(GitError::NilTable)
        ));
        assert!(matches!(
            Change::new("foos").with_value("x").validate(),
            Err(GitError::UnclassifiableChange)
        ));
        assert!(fixtures::create_change().validate().is_ok());
        assert!(fixtures::delete_change().validate().is_ok());
    }

    #[test]
    fn test_validate_checks_declared_kind() {
        let chg = fixtures::update_change().with_kind(Crud::Create);
        assert!(matches!(chg.validate(), Err(GitError::NotNilEntityId)));

        let chg = fixtures::create_change().with_kind(Crud::Retrieve);
        assert!(matches!(chg.validate(), Err(GitError::NilEntityId)));

        let chg = fixtures::update_change().with_kind(Crud::Retrieve);
        assert!(matches!(chg.validate(), Err(GitError::NotNilValue)));

        let chg = fixtures::retrieve_change().with_kind(Crud::Delete);
        assert!(matches!(chg.validate(), Err(GitError::NotNilColumn)));

        let chg = fixtures::delete_change().with_kind(Crud::Retrieve);
        assert!(matches!(chg.validate(), Err(GitError::NilColumn)));

        let chg = fixtures::retrieve_change().with_kind(Crud::Update);
        assert!(matches!(chg.validate(), Err(GitError::NilValue)));

        assert!(fixtures::update_change().with_kind(Crud::Update).validate().is_ok());
    }

    #[test]
    fn test_change_json_shape() {
        let chg: Change = serde_json::from_value(json!({
            "tableName": "repositories",
            "columnName": "name",
            "value": {"type": "string", "value": "git-crud"},
            "options": {"username": "octo"}
        }))
        .unwrap();
        assert_eq!(chg.classify().unwrap(), Crud::Create);
        assert_eq!(chg.value_type(), Some(ValueType::String));
        assert_eq!(chg.options.get_str("username"), Some("octo"));
    }
}
