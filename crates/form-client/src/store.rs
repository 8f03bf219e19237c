use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use form_spec::store::{StoreError, check_slug};
use form_spec::{FormDefinition, FormStore};
use tracing::debug;

/// Stores each form as `<slug>.form.json` inside one directory.
#[derive(Debug, Clone)]
pub struct FileFormStore {
    root: PathBuf,
}

impl FileFormStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, slug: &str) -> Result<PathBuf, StoreError> {
        check_slug(slug)?;
        Ok(self.root.join(format!("{slug}.form.json")))
    }
}

impl FormStore for FileFormStore {
    fn load(&self, slug: &str) -> Result<FormDefinition, StoreError> {
        let path = self.path_for(slug)?;
        let contents = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StoreError::NotFound(slug.to_string())
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Ok(FormDefinition::from_json(&contents)?)
    }

    fn save(&self, slug: &str, form: &FormDefinition) -> Result<(), StoreError> {
        let path = self.path_for(slug)?;
        form.check()?;
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(form).map_err(StoreError::Encode)?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote form definition");
        Ok(())
    }
}
