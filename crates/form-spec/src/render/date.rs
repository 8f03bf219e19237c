use serde_json::{Map, Value};

use super::{ChangeError, ChangeEvent, FieldContext, field_shell};
use crate::spec::field::FieldDefinition;
use crate::value;

/// Input flavour selected by `config.dateFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    Date,
    DateTimeLocal,
    Time,
}

impl DateMode {
    pub fn for_field(field: &FieldDefinition) -> Self {
        match field.config.date_format.as_deref() {
            Some("datetime" | "datetime-local") => DateMode::DateTimeLocal,
            Some("time") => DateMode::Time,
            _ => DateMode::Date,
        }
    }

    pub fn input_type(&self) -> &'static str {
        match self {
            DateMode::Date => "date",
            DateMode::DateTimeLocal => "datetime-local",
            DateMode::Time => "time",
        }
    }
}

/// Bounds are emitted as input constraints only; they are not validated here.
pub fn render(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let mut control = Map::new();
    control.insert("type".into(), Value::String("input".into()));
    control.insert(
        "inputType".into(),
        Value::String(DateMode::for_field(field).input_type().into()),
    );
    control.insert("name".into(), Value::String(field.id.clone()));
    control.insert(
        "value".into(),
        Value::String(ctx.value.map(value::to_text).unwrap_or_default()),
    );
    if let Some(min) = &field.validation.min_date {
        control.insert("min".into(), Value::String(min.clone()));
    }
    if let Some(max) = &field.validation.max_date {
        control.insert("max".into(), Value::String(max.clone()));
    }
    control.insert("required".into(), Value::Bool(field.required));
    field_shell(field, ctx, Value::Object(control))
}

pub fn change(field: &FieldDefinition, event: ChangeEvent) -> Result<Value, ChangeError> {
    match event {
        ChangeEvent::Input(text) => Ok(Value::String(text)),
        other => Err(ChangeError::mismatch(field, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::FieldType;

    #[test]
    fn date_format_selects_the_input_type() {
        let mut field = FieldDefinition::new("when", FieldType::Date, "When");
        assert_eq!(DateMode::for_field(&field), DateMode::Date);
        field.config.date_format = Some("datetime".into());
        assert_eq!(DateMode::for_field(&field).input_type(), "datetime-local");
        field.config.date_format = Some("time".into());
        assert_eq!(DateMode::for_field(&field).input_type(), "time");
    }

    #[test]
    fn bounds_become_native_constraints() {
        let mut field = FieldDefinition::new("when", FieldType::Date, "When");
        field.validation.min_date = Some("2024-01-01".into());
        field.validation.max_date = Some("2024-12-31".into());
        let element = render(&field, FieldContext::default());
        assert_eq!(element["control"]["min"], "2024-01-01");
        assert_eq!(element["control"]["max"], "2024-12-31");
    }
}
