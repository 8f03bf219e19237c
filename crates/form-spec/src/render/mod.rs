//! Field renderers and the dispatcher that routes a definition to one.
//!
//! A rendered field is a JSON UI element: a `field` shell (label, required
//! flag, help text, error, disabled state, cosmetic passthrough) wrapping a
//! type-specific `control`. Each renderer has a matching change handler that
//! turns a [`ChangeEvent`] into the value stored for the field.

pub mod choice;
pub mod date;
pub mod input;
pub mod slider;
pub mod view;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::warn;

use crate::spec::field::{FieldDefinition, FieldType};

pub use view::{FormView, ViewField, ViewStatus, build_form_view, render_json_ui, render_text};

/// Per-render inputs of a field renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldContext<'a> {
    pub value: Option<&'a Value>,
    pub error: Option<&'a str>,
    pub disabled: bool,
}

impl<'a> FieldContext<'a> {
    pub fn new(value: Option<&'a Value>, error: Option<&'a str>) -> Self {
        Self {
            value,
            error,
            disabled: false,
        }
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// User interaction reported by a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Raw text typed or the option value picked in a single-choice control.
    Input(String),
    /// An option was ticked or unticked.
    Toggle(String),
    /// The full selection of a multi-select.
    SelectMany(Vec<String>),
    /// A new slider position.
    Slide(f64),
}

impl ChangeEvent {
    fn name(&self) -> &'static str {
        match self {
            ChangeEvent::Input(_) => "input",
            ChangeEvent::Toggle(_) => "toggle",
            ChangeEvent::SelectMany(_) => "select_many",
            ChangeEvent::Slide(_) => "slide",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ChangeError {
    #[error("{event} events do not apply to {field_type} fields")]
    Mismatch {
        field_type: String,
        event: &'static str,
    },
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("field type '{0}' cannot be edited")]
    Unsupported(String),
}

impl ChangeError {
    fn mismatch(field: &FieldDefinition, event: &ChangeEvent) -> Self {
        ChangeError::Mismatch {
            field_type: field.kind.to_string(),
            event: event.name(),
        }
    }
}

/// Renders a field with the renderer registered for its type.
///
/// Unsupported types produce a placeholder element instead of failing, so one
/// malformed field never prevents the rest of a form from rendering.
pub fn render_field(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    match &field.kind {
        FieldType::Text | FieldType::Textarea | FieldType::Email => input::render(field, ctx),
        FieldType::Radio => choice::render_radio(field, ctx),
        FieldType::Checkbox => choice::render_checkbox(field, ctx),
        FieldType::Select => choice::render_select(field, ctx),
        FieldType::Slider => slider::render(field, ctx),
        FieldType::Date => date::render(field, ctx),
        FieldType::Unsupported(name) => {
            warn!(field = %field.id, field_type = %name, "rendering placeholder for unsupported field type");
            render_unsupported(field, name)
        }
    }
}

/// Computes the value a change event stores for `field`.
pub fn apply_change(
    field: &FieldDefinition,
    current: Option<&Value>,
    event: ChangeEvent,
) -> Result<Value, ChangeError> {
    match &field.kind {
        FieldType::Text | FieldType::Textarea | FieldType::Email => input::change(field, event),
        FieldType::Radio => choice::change_radio(field, event),
        FieldType::Checkbox => choice::change_checkbox(field, current, event),
        FieldType::Select => choice::change_select(field, current, event),
        FieldType::Slider => slider::change(field, event),
        FieldType::Date => date::change(field, event),
        FieldType::Unsupported(name) => Err(ChangeError::Unsupported(name.clone())),
    }
}

pub fn unsupported_text(name: &str) -> String {
    format!("Unsupported field type: {name}")
}

fn render_unsupported(field: &FieldDefinition, name: &str) -> Value {
    json!({
        "type": "unsupported",
        "id": field.id,
        "fieldType": name,
        "text": unsupported_text(name),
    })
}

/// Error text to display; a custom validation message wins over the computed one.
pub fn displayed_error(field: &FieldDefinition, error: Option<&str>) -> Option<String> {
    error.map(|computed| {
        field
            .validation
            .custom_message
            .clone()
            .unwrap_or_else(|| computed.to_string())
    })
}

/// Wraps a control in the shell shared by every renderer.
fn field_shell(field: &FieldDefinition, ctx: FieldContext<'_>, control: Value) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String("field".into()));
    map.insert("id".into(), Value::String(field.id.clone()));
    map.insert("fieldType".into(), Value::String(field.kind.to_string()));
    map.insert("label".into(), Value::String(field.label.clone()));
    map.insert("required".into(), Value::Bool(field.required));
    if let Some(help) = field.help() {
        map.insert("description".into(), Value::String(help.to_string()));
    }
    if let Some(error) = displayed_error(field, ctx.error) {
        map.insert("error".into(), Value::String(error));
    }
    map.insert("disabled".into(), Value::Bool(ctx.disabled));
    if let Some(class_name) = &field.config.class_name {
        map.insert("className".into(), Value::String(class_name.clone()));
    }
    if let Some(style) = &field.config.style {
        map.insert("style".into(), style.clone());
    }
    map.insert("control".into(), control);
    Value::Object(map)
}
