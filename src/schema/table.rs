//! Tables and columns of a schema blueprint

use crate::error::{SchemaError, ValidationError};
use crate::integrity::{is_valid_identifier, ColumnName, OptionKey, TableName};
use crate::schema::validators::Validator;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A table of a schema: its columns and the option keys it accepts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: TableName,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub option_keys: Vec<OptionKey>,
}

impl Table {
    pub fn new(name: impl Into<TableName>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_option_key(mut self, key: impl Into<OptionKey>) -> Self {
        self.option_keys.push(key.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn option_key_is_valid(&self, key: &str) -> bool {
        self.option_keys.iter().any(|k| k == key)
    }

    /// Every structural defect of the table and its columns
    pub(crate) fn validate_self(&self) -> Vec<ValidationError> {
        let mut errs = Vec::new();

        if self.name.is_empty() {
            errs.push(self.validation_err(SchemaError::NilTableName));
        } else if !is_valid_identifier(&self.name) {
            errs.push(self.validation_err(SchemaError::InvalidIdentifier(self.name.clone())));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !column.name.is_empty() && !seen.insert(column.name.as_str()) {
                errs.push(self.validation_err(SchemaError::DuplicatedColumn(column.name.clone())));
            }
            errs.extend(column.validate_self());
        }

        errs
    }

    fn validation_err(&self, err: SchemaError) -> ValidationError {
        ValidationError::new("table", self.name.clone(), err)
    }
}

/// A column and the validator its values must satisfy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    pub name: ColumnName,
    /// Name of a builtin validator, used when the schema is authored as data
    #[serde(default, rename = "validator", skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl Column {
    pub fn new(name: impl Into<ColumnName>, validator: Validator) -> Self {
        Self {
            name: name.into(),
            builtin: None,
            validator: Some(validator),
        }
    }

    /// A column validated by the builtin validator of the given name
    pub fn with_builtin(name: impl Into<ColumnName>, builtin: &str) -> Result<Self, SchemaError> {
        let mut column = Self {
            name: name.into(),
            builtin: Some(builtin.to_string()),
            validator: None,
        };
        column.apply_builtin_validator()?;
        Ok(column)
    }

    /// Resolves the builtin validator name into the column validator
    pub fn apply_builtin_validator(&mut self) -> Result<(), SchemaError> {
        if let Some(name) = &self.builtin {
            self.validator = Some(Validator::builtin(name)?);
        }
        Ok(())
    }

    /// Judges a supplied value; changes without a value never reach it
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        match &self.validator {
            Some(validator) => validator.validate(value),
            None => Err(SchemaError::NilValidator(self.name.clone())),
        }
    }

    fn validate_self(&self) -> Vec<ValidationError> {
        let mut errs = Vec::new();
        if self.name.is_empty() {
            errs.push(ValidationError::new("column", "", SchemaError::NilColumnName));
        } else if !is_valid_identifier(&self.name) {
            errs.push(ValidationError::new(
                "column",
                self.name.clone(),
                SchemaError::InvalidIdentifier(self.name.clone()),
            ));
        }
        if self.validator.is_none() {
            errs.push(ValidationError::new(
                "column",
                self.name.clone(),
                SchemaError::NilValidator(self.name.clone()),
            ));
        }
        errs
    }
}
