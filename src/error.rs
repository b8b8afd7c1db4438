//! Error handling module
//!
//! Provides the error taxonomy of the orchestration engine: structural and
//! consistency errors of Changes and Commits, schema context errors, registry
//! errors, backend errors and fatal orchestration errors.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Separator used when several errors are rendered as one
pub const ERRORS_SEPARATOR: &str = "; ";

/// Errors raised by Changes, Commits, the Team registry and the Owner
#[derive(Error, Debug)]
pub enum GitError {
    // Changes
    #[error("the change is ALREADY COMMITTED")]
    DuplicatedChange,

    #[error("the change DOESN'T respect any PATTERN and thus CANNOT be CLASSIFIABLE")]
    UnclassifiableChange,

    #[error("the given OPTION KEY is NIL")]
    NilOptionKey,

    // Table
    #[error("change's TABLE cannot be NIL")]
    NilTable,

    // Column
    #[error("change's COLUMN cannot be NOT NIL")]
    NotNilColumn,

    #[error("change's COLUMN cannot be NIL")]
    NilColumn,

    // EntityID
    #[error("the ENTITY_ID is NIL")]
    NilEntityId,

    #[error("the ENTITY_ID is NOT NIL")]
    NotNilEntityId,

    // Value
    #[error("the VALUE cannot be NIL")]
    NilValue,

    #[error("the VALUE cannot be NOT NIL")]
    NotNilValue,

    // Commit
    #[error("the TYPES over the commit are MIXED")]
    MixedTypes,

    #[error("the TABLES over the commit are MIXED")]
    MixedTables,

    #[error("the OPTIONS over the commit are MIXED")]
    MixedOptions,

    #[error("the commit does NOT contain ANY CHANGE")]
    EmptyCommit,

    // Community
    #[error("the SCHEMA NAME provided is NOT FOUND: {0}")]
    NotFoundSchema(String),

    // Team
    #[error("the TABLE is ALREADY IN USE by a member: {0}")]
    TableInUse(String),

    #[error("there are NOT COLLABORATORS to achieve this TABLE: {0}")]
    NoCollaborators(String),

    #[error("there are NOT MEMBERS to achieve this TABLE: {0}")]
    NoMembers(String),

    #[error("the pull request has NO TEAM assigned")]
    NilTeam,

    #[error("the commit has NO REVIEWER assigned")]
    NilReviewer,

    // Owner
    #[error("the PROJECT is NIL")]
    NilProject,

    #[error("the PROJECT does NOT contain ANY SCHEMA")]
    EmptyProject,

    // Schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("the commit does NOT PASS the SCHEMA validation: {0}")]
    SchemaChecks(MultiError<SchemaError>),

    // Backend
    #[error("the collaborator call FAILED: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("the orchestration was CANCELLED")]
    Cancelled,

    #[error("the collaborator call TIMED OUT after {0:?}")]
    Timeout(Duration),

    #[error("the merge task was ABORTED: {0}")]
    TaskAborted(String),
}

/// Errors raised while validating a schema or a change context against it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("the SCHEMA NAME is NIL")]
    NilSchemaName,

    #[error("the schema BLUEPRINT is NIL")]
    NilBlueprint,

    #[error("the TABLE NAME is NIL")]
    NilTableName,

    #[error("the COLUMN NAME is NIL")]
    NilColumnName,

    #[error("the COLUMN is DUPLICATED: {0}")]
    DuplicatedColumn(String),

    #[error("the column VALIDATOR is NIL: {0}")]
    NilValidator(String),

    #[error("the NAME is NOT a valid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("the BUILTIN VALIDATOR does NOT EXIST: {0}")]
    UnknownValidator(String),

    #[error("the SCHEMA was NOT FOUND in the given scope: {0}")]
    SchemaNotFoundInScope(String),

    #[error("the TABLE belongs to ANOTHER SCHEMA: {0}")]
    ForeignTable(String),

    #[error("the TABLE does NOT EXIST: {0}")]
    NonexistentTable(String),

    #[error("the COLUMN belongs to ANOTHER TABLE or SCHEMA: {0}")]
    ForeignColumn(String),

    #[error("the COLUMN does NOT EXIST: {0}")]
    NonexistentColumn(String),

    #[error("the OPTION KEY is NOT VALID for the table: {0}")]
    InvalidOptionKey(String),

    #[error("the VALUE is INVALID: {0}")]
    InvalidValue(String),
}

/// A schema error tagged with the schema component it originates from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{origin_type} {origin_name:?}: {source}")]
pub struct ValidationError {
    pub origin_type: &'static str,
    pub origin_name: String,
    #[source]
    pub source: SchemaError,
}

impl ValidationError {
    pub fn new(origin_type: &'static str, origin_name: impl Into<String>, source: SchemaError) -> Self {
        Self {
            origin_type,
            origin_name: origin_name.into(),
            source,
        }
    }
}

/// Several errors collected from a fan-out, kept in the order they were joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiError<E> {
    errors: Vec<E>,
}

impl<E> MultiError<E> {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, err: E) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    /// Ok when nothing was collected, the joined error otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<E> Default for MultiError<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Extend<E> for MultiError<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl<E> FromIterator<E> for MultiError<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for MultiError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(ERRORS_SEPARATOR)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for MultiError<E> {}

/// Result type alias for engine operations
pub type GitResult<T> = Result<T, GitError>;
