use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::spec::form::{FormDefinition, SpecError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("form '{0}' does not exist")]
    NotFound(String),
    #[error("'{0}' is not a valid form slug")]
    InvalidSlug(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode form: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Persistence collaborator for authored forms, keyed by slug.
pub trait FormStore {
    fn load(&self, slug: &str) -> Result<FormDefinition, StoreError>;
    fn save(&self, slug: &str, form: &FormDefinition) -> Result<(), StoreError>;
}

/// Slugs are ASCII letters, digits, `-` and `_`.
pub fn check_slug(slug: &str) -> Result<(), StoreError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidSlug(slug.to_string()))
    }
}

/// Keeps forms in memory for the lifetime of the store.
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    forms: RefCell<BTreeMap<String, FormDefinition>>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.borrow().is_empty()
    }
}

impl FormStore for MemoryFormStore {
    fn load(&self, slug: &str) -> Result<FormDefinition, StoreError> {
        self.forms
            .borrow()
            .get(slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    fn save(&self, slug: &str, form: &FormDefinition) -> Result<(), StoreError> {
        check_slug(slug)?;
        form.check()?;
        self.forms
            .borrow_mut()
            .insert(slug.to_string(), form.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_restricted() {
        assert!(check_slug("spring-launch_2").is_ok());
        assert!(check_slug("../etc").is_err());
        assert!(check_slug("").is_err());
        assert!(check_slug("Spring-Launch").is_ok());
        assert!(check_slug("a/b").is_err());
        assert!(check_slug("a.json").is_err());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryFormStore::new();
        let form = FormDefinition::new("Contact", Vec::new());
        store.save("contact", &form).expect("save");
        assert_eq!(store.load("contact").expect("load"), form);
        assert!(matches!(store.load("missing"), Err(StoreError::NotFound(_))));
    }
}
