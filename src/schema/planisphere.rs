//! The search scope of schemas

use crate::error::SchemaError;
use crate::schema::Schema;
use std::sync::Arc;

/// The set of schemas an orchestration may look into
///
/// Besides resolving a schema by name, it is consulted when a name is missing
/// from the selected schema, to tell a foreign name (valid elsewhere, the wrong
/// schema was likely selected) from a nonexistent one (likely a typo).
#[derive(Debug, Clone, Default)]
pub struct Planisphere {
    schemas: Vec<Arc<Schema>>,
}

impl Planisphere {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self {
            schemas: schemas.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn push(&mut self, schema: Schema) {
        self.schemas.push(Arc::new(schema));
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.iter()
    }

    /// Resolves a schema by its (non-empty) name
    pub fn schema_from_name(&self, name: &str) -> Result<Arc<Schema>, SchemaError> {
        self.schemas
            .iter()
            .find(|s| !s.name.is_empty() && s.name == name)
            .cloned()
            .ok_or_else(|| SchemaError::SchemaNotFoundInScope(name.to_string()))
    }

    /// Assumes the table is missing from the selected schema
    pub(crate) fn precise_table_err(&self, table_name: &str) -> SchemaError {
        let exists = self
            .schemas
            .iter()
            .any(|s| s.blueprint.iter().any(|t| t.name == table_name));
        if exists {
            SchemaError::ForeignTable(table_name.to_string())
        } else {
            SchemaError::NonexistentTable(table_name.to_string())
        }
    }

    pub(crate) fn has_column(&self, column_name: &str) -> bool {
        self.schemas.iter().any(|s| s.has_column(column_name))
    }
}

impl FromIterator<Schema> for Planisphere {
    fn from_iter<I: IntoIterator<Item = Schema>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
