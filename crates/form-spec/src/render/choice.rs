use serde_json::{Value, json};

use super::{ChangeError, ChangeEvent, FieldContext, field_shell};
use crate::spec::field::FieldDefinition;
use crate::value;

pub fn render_radio(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let options = field
        .config
        .options
        .iter()
        .map(|option| {
            json!({
                "label": option.label,
                "value": option.value,
                "checked": ctx
                    .value
                    .is_some_and(|stored| value::option_matches(&option.value, stored)),
            })
        })
        .collect::<Vec<_>>();
    let control = json!({
        "type": "radioGroup",
        "name": field.id,
        "options": options,
    });
    field_shell(field, ctx, control)
}

pub fn render_checkbox(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let selected = value::string_items(ctx.value);
    let options = field
        .config
        .options
        .iter()
        .map(|option| {
            json!({
                "label": option.label,
                "value": option.value,
                "checked": selected.contains(&option.value),
            })
        })
        .collect::<Vec<_>>();
    let control = json!({
        "type": "checkboxGroup",
        "name": field.id,
        "options": options,
    });
    field_shell(field, ctx, control)
}

pub fn render_select(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let multiple = field.config.allow_multiple;
    let selected = value::string_items(ctx.value);
    let options = field
        .config
        .options
        .iter()
        .map(|option| {
            json!({
                "label": option.label,
                "value": option.value,
                "selected": if multiple {
                    selected.contains(&option.value)
                } else {
                    ctx.value
                        .is_some_and(|stored| value::option_matches(&option.value, stored))
                },
            })
        })
        .collect::<Vec<_>>();
    let control = json!({
        "type": "select",
        "name": field.id,
        "multiple": multiple,
        "placeholder": field.placeholder.as_deref().unwrap_or("Select an option"),
        "options": options,
    });
    field_shell(field, ctx, control)
}

/// Radio groups store the picked option value, numerically coerced.
pub fn change_radio(field: &FieldDefinition, event: ChangeEvent) -> Result<Value, ChangeError> {
    match event {
        ChangeEvent::Input(raw) => Ok(value::coerce_choice(&raw)),
        other => Err(ChangeError::mismatch(field, &other)),
    }
}

/// Checkboxes store the list of ticked option values.
pub fn change_checkbox(
    field: &FieldDefinition,
    current: Option<&Value>,
    event: ChangeEvent,
) -> Result<Value, ChangeError> {
    match event {
        ChangeEvent::Toggle(option) => Ok(toggle(current, option)),
        ChangeEvent::SelectMany(options) => Ok(string_array(options)),
        other => Err(ChangeError::mismatch(field, &other)),
    }
}

/// Multi selects store the list of selected values; single selects behave
/// like radio groups.
pub fn change_select(
    field: &FieldDefinition,
    current: Option<&Value>,
    event: ChangeEvent,
) -> Result<Value, ChangeError> {
    match (field.config.allow_multiple, event) {
        (true, ChangeEvent::SelectMany(options)) => Ok(string_array(options)),
        (true, ChangeEvent::Toggle(option)) => Ok(toggle(current, option)),
        (false, ChangeEvent::Input(raw)) => Ok(value::coerce_choice(&raw)),
        (_, other) => Err(ChangeError::mismatch(field, &other)),
    }
}

fn toggle(current: Option<&Value>, option: String) -> Value {
    let mut selected = value::string_items(current);
    if let Some(position) = selected.iter().position(|item| *item == option) {
        selected.remove(position);
    } else {
        selected.push(option);
    }
    string_array(selected)
}

fn string_array(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::{FieldOption, FieldType};

    fn options() -> Vec<FieldOption> {
        vec![
            FieldOption::new("Forty two", "42"),
            FieldOption::new("Letters", "abc"),
        ]
    }

    #[test]
    fn radio_coerces_numeric_option_values() {
        let field = FieldDefinition::new("pick", FieldType::Radio, "Pick").with_options(options());
        assert_eq!(
            change_radio(&field, ChangeEvent::Input("42".into())),
            Ok(json!(42))
        );
        assert_eq!(
            change_radio(&field, ChangeEvent::Input("abc".into())),
            Ok(json!("abc"))
        );
    }

    #[test]
    fn radio_marks_coerced_values_as_checked() {
        let field = FieldDefinition::new("pick", FieldType::Radio, "Pick").with_options(options());
        let element = render_radio(&field, FieldContext::new(Some(&json!(42)), None));
        assert_eq!(element["control"]["options"][0]["checked"], true);
        assert_eq!(element["control"]["options"][1]["checked"], false);
    }

    #[test]
    fn non_canonical_numeric_options_stay_checked() {
        let field = FieldDefinition::new("pick", FieldType::Radio, "Pick").with_options(vec![
            FieldOption::new("Agent", "007"),
            FieldOption::new("One", "1.0"),
        ]);
        let stored = change_radio(&field, ChangeEvent::Input("007".into())).expect("pick");
        let element = render_radio(&field, FieldContext::new(Some(&stored), None));
        assert_eq!(element["control"]["options"][0]["checked"], true);
        assert_eq!(element["control"]["options"][1]["checked"], false);

        let mut select = field.clone();
        select.kind = FieldType::Select;
        let stored = change_select(&select, None, ChangeEvent::Input("1.0".into())).expect("pick");
        let element = render_select(&select, FieldContext::new(Some(&stored), None));
        assert_eq!(element["control"]["options"][0]["selected"], false);
        assert_eq!(element["control"]["options"][1]["selected"], true);
    }

    #[test]
    fn checkbox_toggles_add_and_remove() {
        let field =
            FieldDefinition::new("pick", FieldType::Checkbox, "Pick").with_options(options());
        let once = change_checkbox(&field, None, ChangeEvent::Toggle("abc".into())).expect("add");
        assert_eq!(once, json!(["abc"]));
        let twice = change_checkbox(&field, Some(&once), ChangeEvent::Toggle("42".into()))
            .expect("add second");
        assert_eq!(twice, json!(["abc", "42"]));
        let removed = change_checkbox(&field, Some(&twice), ChangeEvent::Toggle("abc".into()))
            .expect("remove");
        assert_eq!(removed, json!(["42"]));
    }

    #[test]
    fn multi_select_keeps_strings() {
        let mut field =
            FieldDefinition::new("pick", FieldType::Select, "Pick").with_options(options());
        field.config.allow_multiple = true;
        let value = change_select(
            &field,
            None,
            ChangeEvent::SelectMany(vec!["42".into(), "abc".into()]),
        )
        .expect("select");
        assert_eq!(value, json!(["42", "abc"]));
        assert!(change_select(&field, None, ChangeEvent::Input("42".into())).is_err());
    }

    #[test]
    fn single_select_coerces_like_radio() {
        let field = FieldDefinition::new("pick", FieldType::Select, "Pick").with_options(options());
        assert_eq!(
            change_select(&field, None, ChangeEvent::Input("42".into())),
            Ok(json!(42))
        );
    }
}
