use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::FieldDefinition;

/// Errors raised while loading or checking a form definition.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse form definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field at position {0} has an empty id")]
    EmptyId(usize),
    #[error("field id '{0}' is used more than once")]
    DuplicateId(String),
}

/// Presentation settings passed through to the rendered form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

/// Top-level form definition, as stored by the builder and served publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FormSettings>,
}

impl FormDefinition {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields,
            settings: None,
        }
    }

    /// Parses and checks a JSON form definition.
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        let form: FormDefinition = serde_json::from_str(raw)?;
        form.check()?;
        Ok(form)
    }

    /// Verifies that every field has a non-empty id that is unique in the form.
    pub fn check(&self) -> Result<(), SpecError> {
        let mut seen = BTreeSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.id.trim().is_empty() {
                return Err(SpecError::EmptyId(index));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SpecError::DuplicateId(field.id.clone()));
            }
        }
        Ok(())
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }
}
