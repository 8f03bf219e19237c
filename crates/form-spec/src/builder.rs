use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::spec::field::{FieldConfig, FieldDefinition, FieldOption, FieldType};
use crate::spec::form::{FormDefinition, FormSettings};
use crate::store::{FormStore, StoreError};
use crate::visibility::ordered_fields;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("no field with id '{0}'")]
    UnknownField(String),
    #[error("field ids cannot be changed (tried '{from}' -> '{to}')")]
    IdChange { from: String, to: String },
    #[error("invalid update for field '{field}': {source}")]
    InvalidPatch {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("position {index} is out of range for {len} fields")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authoring state for a form: the ordered field list, the field being
/// edited and whether the author is previewing.
#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    fields: Vec<FieldDefinition>,
    settings: Option<FormSettings>,
    selected_field_id: Option<String>,
    preview_mode: bool,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing form, with fields in render order.
    pub fn from_form(form: &FormDefinition) -> Self {
        Self {
            fields: ordered_fields(&form.fields).into_iter().cloned().collect(),
            settings: form.settings.clone(),
            selected_field_id: None,
            preview_mode: false,
        }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn settings(&self) -> Option<&FormSettings> {
        self.settings.as_ref()
    }

    pub fn set_settings(&mut self, settings: Option<FormSettings>) {
        self.settings = settings;
    }

    pub fn selected_field_id(&self) -> Option<&str> {
        self.selected_field_id.as_deref()
    }

    pub fn selected_field(&self) -> Option<&FieldDefinition> {
        self.selected_field_id
            .as_deref()
            .and_then(|id| self.field(id))
    }

    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview_mode = !self.preview_mode;
        self.preview_mode
    }

    pub fn select_field(&mut self, id: Option<&str>) -> Result<(), BuilderError> {
        if let Some(id) = id
            && self.field(id).is_none()
        {
            return Err(BuilderError::UnknownField(id.to_string()));
        }
        self.selected_field_id = id.map(str::to_string);
        Ok(())
    }

    /// Appends a field of `kind` with a fresh id and type-appropriate defaults,
    /// and selects it.
    pub fn add_field(&mut self, kind: FieldType) -> &FieldDefinition {
        let id = self.fresh_id();
        let label = format!("{} Field", kind.title());
        let mut field = FieldDefinition::new(id.clone(), kind.clone(), label);
        field.order = self.fields.len() as i64;
        field.config = default_config(&kind);
        debug!(field = %id, field_type = %kind, "added field");
        self.fields.push(field);
        self.selected_field_id = Some(id);
        let last = self.fields.len() - 1;
        &self.fields[last]
    }

    fn fresh_id(&self) -> String {
        loop {
            let candidate = format!("field_{}", Uuid::new_v4().simple());
            if self.field(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Shallow-merges `patch` (camelCase keys) into the field.
    ///
    /// Top-level keys replace the existing entry wholesale, so patching
    /// `config` replaces the whole config object.
    pub fn update_field(
        &mut self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<&FieldDefinition, BuilderError> {
        let position = self.position(id)?;
        if let Some(new_id) = patch.get("id")
            && new_id.as_str() != Some(id)
        {
            return Err(BuilderError::IdChange {
                from: id.to_string(),
                to: new_id.to_string(),
            });
        }

        let invalid = |source| BuilderError::InvalidPatch {
            field: id.to_string(),
            source,
        };
        let mut merged = match serde_json::to_value(&self.fields[position]).map_err(invalid)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        let updated: FieldDefinition =
            serde_json::from_value(Value::Object(merged)).map_err(invalid)?;
        self.fields[position] = updated;
        Ok(&self.fields[position])
    }

    /// Removes a field, clearing the selection if it pointed at it.
    pub fn delete_field(&mut self, id: &str) -> Result<FieldDefinition, BuilderError> {
        let position = self.position(id)?;
        let removed = self.fields.remove(position);
        if self.selected_field_id.as_deref() == Some(id) {
            self.selected_field_id = None;
        }
        Ok(removed)
    }

    /// Moves the field at `from` to `to` and renumbers every `order` to the
    /// field's new index. Any previous `order` values are overwritten.
    pub fn reorder_fields(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        let len = self.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(BuilderError::OutOfRange { index, len });
            }
        }
        let moved = self.fields.remove(from);
        self.fields.insert(to, moved);
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index as i64;
        }
        Ok(())
    }

    pub fn to_form(&self, title: impl Into<String>, description: Option<String>) -> FormDefinition {
        FormDefinition {
            title: title.into(),
            description,
            fields: self.fields.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Hands the current form to `store`.
    pub fn save(
        &self,
        store: &dyn FormStore,
        slug: &str,
        title: &str,
        description: Option<String>,
    ) -> Result<FormDefinition, BuilderError> {
        let form = self.to_form(title, description);
        store.save(slug, &form)?;
        info!(slug, fields = form.fields.len(), "form saved");
        Ok(form)
    }

    fn position(&self, id: &str) -> Result<usize, BuilderError> {
        self.fields
            .iter()
            .position(|field| field.id == id)
            .ok_or_else(|| BuilderError::UnknownField(id.to_string()))
    }
}

fn default_config(kind: &FieldType) -> FieldConfig {
    match kind {
        FieldType::Radio | FieldType::Checkbox | FieldType::Select => FieldConfig {
            options: vec![
                FieldOption::new("Option 1", "option_1"),
                FieldOption::new("Option 2", "option_2"),
            ],
            ..FieldConfig::default()
        },
        FieldType::Slider => FieldConfig {
            min: Some(0.0),
            max: Some(100.0),
            step: Some(1.0),
            show_value: Some(true),
            ..FieldConfig::default()
        },
        FieldType::Textarea => FieldConfig {
            rows: Some(4),
            ..FieldConfig::default()
        },
        FieldType::Date => FieldConfig {
            date_format: Some("date".into()),
            ..FieldConfig::default()
        },
        FieldType::Text | FieldType::Email | FieldType::Unsupported(_) => FieldConfig::default(),
    }
}
