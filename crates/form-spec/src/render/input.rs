use serde_json::{Map, Value};

use super::{ChangeError, ChangeEvent, FieldContext, field_shell};
use crate::spec::field::{FieldDefinition, FieldType};
use crate::value;

const DEFAULT_TEXTAREA_ROWS: u32 = 4;

/// Renders text, textarea and email fields.
pub fn render(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let mut control = Map::new();
    let text = ctx.value.map(value::to_text).unwrap_or_default();
    if matches!(field.kind, FieldType::Textarea) {
        control.insert("type".into(), Value::String("textarea".into()));
        control.insert(
            "rows".into(),
            Value::from(field.config.rows.unwrap_or(DEFAULT_TEXTAREA_ROWS)),
        );
    } else {
        control.insert("type".into(), Value::String("input".into()));
        control.insert("inputType".into(), Value::String(input_type(field).into()));
    }
    control.insert("name".into(), Value::String(field.id.clone()));
    control.insert("value".into(), Value::String(text));
    if let Some(placeholder) = &field.placeholder {
        control.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    control.insert("required".into(), Value::Bool(field.required));
    field_shell(field, ctx, Value::Object(control))
}

fn input_type(field: &FieldDefinition) -> &'static str {
    match field.kind {
        FieldType::Email => "email",
        _ => "text",
    }
}

pub fn change(field: &FieldDefinition, event: ChangeEvent) -> Result<Value, ChangeError> {
    match event {
        ChangeEvent::Input(text) => Ok(Value::String(text)),
        other => Err(ChangeError::mismatch(field, &other)),
    }
}
