//! Column value validators
//!
//! A [`Validator`] is attached per column and judges the value a Change wants
//! to write. The builtin set can be resolved by name, so schemas authored as
//! JSON only need to reference them.

use crate::error::SchemaError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use validator::{ValidateEmail, ValidateUrl};

type ValidateFn = dyn Fn(&Value) -> Result<(), SchemaError> + Send + Sync;

/// A value validator attached to a column
#[derive(Clone)]
pub struct Validator {
    name: String,
    func: Arc<ValidateFn>,
}

impl Validator {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Resolve one of the builtin validators by name
    pub fn builtin(name: &str) -> Result<Self, SchemaError> {
        match name {
            "string" => Ok(string()),
            "int" => Ok(int()),
            "float" => Ok(float()),
            "json" => Ok(json()),
            "bytes" => Ok(bytes()),
            "email" => Ok(email()),
            "url" => Ok(url()),
            "any" => Ok(any()),
            other => Err(SchemaError::UnknownValidator(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        (self.func)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("name", &self.name).finish()
    }
}

fn invalid(value: &Value, expected: &str) -> SchemaError {
    SchemaError::InvalidValue(format!(
        "expected {}, got {}",
        expected,
        value.value_type()
    ))
}

pub fn string() -> Validator {
    Validator::new("string", |value| match value {
        Value::String(_) => Ok(()),
        other => Err(invalid(other, "string")),
    })
}

pub fn int() -> Validator {
    Validator::new("int", |value| match value {
        Value::Int(_) => Ok(()),
        other => Err(invalid(other, "int")),
    })
}

pub fn float() -> Validator {
    Validator::new("float", |value| match value {
        Value::Float32(_) | Value::Float64(_) => Ok(()),
        other => Err(invalid(other, "float")),
    })
}

pub fn json() -> Validator {
    Validator::new("json", |value| match value {
        Value::Json(_) => Ok(()),
        other => Err(invalid(other, "json")),
    })
}

/// Raw bytes travel either as a string or as a JSON array of octets
pub fn bytes() -> Validator {
    Validator::new("bytes", |value| match value {
        Value::String(_) => Ok(()),
        Value::Json(serde_json::Value::Array(items))
            if items
                .iter()
                .all(|i| i.as_u64().map_or(false, |b| b <= u64::from(u8::MAX))) =>
        {
            Ok(())
        }
        other => Err(invalid(other, "bytes")),
    })
}

pub fn email() -> Validator {
    Validator::new("email", |value| match value {
        Value::String(s) if s.as_str().validate_email() => Ok(()),
        other => Err(invalid(other, "email")),
    })
}

pub fn url() -> Validator {
    Validator::new("url", |value| match value {
        Value::String(s) if s.as_str().validate_url() => Ok(()),
        other => Err(invalid(other, "url")),
    })
}

pub fn any() -> Validator {
    Validator::new("any", |_| Ok(()))
}
