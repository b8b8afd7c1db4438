//! Schema Module
//!
//! The declarative contract of what may be mutated. A [`Schema`] lists its
//! tables, the columns of each table with their value validators, and the
//! option keys each table accepts. It provides:
//! - Self validation (every diagnosable defect, never only the first)
//! - Context validation of a single Change against the schema
//! - Foreign vs nonexistent disambiguation through a [`Planisphere`]

pub mod planisphere;
pub mod table;
pub mod validators;

pub use planisphere::Planisphere;
pub use table::{Column, Table};
pub use validators::Validator;

use crate::error::{MultiError, SchemaError, ValidationError};
use crate::integrity::{is_valid_identifier, OptionKey, SchemaName};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::thread;
use tracing::debug;

/// The representation of a backend instructive, using SQL concepts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub id: i64,
    pub name: SchemaName,
    #[serde(default)]
    pub blueprint: Vec<Table>,
}

impl Schema {
    pub fn new(name: impl Into<SchemaName>, blueprint: Vec<Table>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            blueprint,
        }
    }

    /// Decodes a schema authored as JSON and resolves its builtin validators
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut schema: Schema = serde_json::from_reader(reader)?;
        schema.apply_builtin_validators()?;
        Ok(schema)
    }

    /// Deep self validation, one concurrent task per table
    ///
    /// The schema's own invariants are checked while the tables are being
    /// validated; every error found is returned.
    pub fn validate_self(&self) -> Result<(), MultiError<ValidationError>> {
        let mut errs = MultiError::new();

        thread::scope(|scope| {
            let tasks: Vec<_> = self
                .blueprint
                .iter()
                .map(|table| scope.spawn(move || table.validate_self()))
                .collect();

            if self.blueprint.is_empty() {
                errs.push(self.validation_err(SchemaError::NilBlueprint));
            }
            if self.name.is_empty() {
                errs.push(self.validation_err(SchemaError::NilSchemaName));
            } else if !is_valid_identifier(&self.name) {
                errs.push(self.validation_err(SchemaError::InvalidIdentifier(self.name.clone())));
            }

            for task in tasks {
                match task.join() {
                    Ok(table_errs) => errs.extend(table_errs),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        debug!(schema = %self.name, errors = errs.len(), "schema self validation done");
        errs.into_result()
    }

    /// Checks that a change context is legal within this schema
    ///
    /// An empty `column_name` stops the check after the table and option keys,
    /// as no column rule applies to whole-row flows. Column validators only run
    /// when a value is supplied.
    pub fn validate_ctx(
        &self,
        table_name: &str,
        column_name: Option<&str>,
        option_keys: &[OptionKey],
        value: Option<&Value>,
        scope: &Planisphere,
    ) -> Result<(), SchemaError> {
        let table = self
            .table(table_name)
            .ok_or_else(|| scope.precise_table_err(table_name))?;

        if let Some(key) = option_keys.iter().find(|k| !table.option_key_is_valid(k)) {
            return Err(SchemaError::InvalidOptionKey(key.clone()));
        }

        let column_name = match column_name {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(()),
        };

        let column = table
            .column(column_name)
            .ok_or_else(|| self.precise_column_err(column_name, scope))?;

        match value {
            Some(value) => column.validate(value),
            None => Ok(()),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.blueprint.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.blueprint.iter().map(|t| t.name.as_str()).collect()
    }

    pub(crate) fn has_column(&self, column_name: &str) -> bool {
        self.blueprint
            .iter()
            .any(|t| t.columns.iter().any(|c| c.name == column_name))
    }

    /// Assumes the column is missing from its table
    fn precise_column_err(&self, column_name: &str, scope: &Planisphere) -> SchemaError {
        if self.has_column(column_name) || scope.has_column(column_name) {
            SchemaError::ForeignColumn(column_name.to_string())
        } else {
            SchemaError::NonexistentColumn(column_name.to_string())
        }
    }

    /// Wraps [`Column::apply_builtin_validator`] over all columns
    pub fn apply_builtin_validators(&mut self) -> Result<(), SchemaError> {
        for table in &mut self.blueprint {
            for column in &mut table.columns {
                column.apply_builtin_validator()?;
            }
        }
        Ok(())
    }

    fn validation_err(&self, err: SchemaError) -> ValidationError {
        ValidationError::new("schema", self.name.clone(), err)
    }
}
