use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::render::slider::SliderRange;
use crate::spec::field::{FieldDefinition, FieldType};
use crate::value::{self, ValueStore};

/// Field id to human-readable error message.
pub type ErrorMap = BTreeMap<String, String>;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Result of validating the visible fields of a form.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: ErrorMap,
}

impl ValidationOutcome {
    pub fn from_errors(errors: ErrorMap) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validation collaborator used by a form session on submit.
pub trait FormValidator {
    fn validate(&self, fields: &[&FieldDefinition], values: &ValueStore) -> ValidationOutcome;
}

/// The stock rule set, see [`validate_form_data`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl FormValidator for DefaultValidator {
    fn validate(&self, fields: &[&FieldDefinition], values: &ValueStore) -> ValidationOutcome {
        validate_form_data(fields, values)
    }
}

impl<F> FormValidator for F
where
    F: Fn(&[&FieldDefinition], &ValueStore) -> ValidationOutcome,
{
    fn validate(&self, fields: &[&FieldDefinition], values: &ValueStore) -> ValidationOutcome {
        self(fields, values)
    }
}

/// Validates the given (visible) fields against the current values.
///
/// Required fields must hold a non-blank value. Optional fields that are
/// empty are not checked further. Date bounds are left to the input control.
pub fn validate_form_data(fields: &[&FieldDefinition], values: &ValueStore) -> ValidationOutcome {
    let errors = fields
        .iter()
        .filter_map(|field| {
            validate_field(field, values.get(&field.id)).map(|message| (field.id.clone(), message))
        })
        .collect();
    ValidationOutcome::from_errors(errors)
}

/// Returns the first rule the value breaks, if any.
pub fn validate_field(field: &FieldDefinition, value: Option<&Value>) -> Option<String> {
    if !value::has_answer(value) {
        return field
            .required
            .then(|| format!("{} is required", field.label));
    }
    let value = value?;

    match &field.kind {
        FieldType::Text | FieldType::Textarea => check_length(field, value),
        FieldType::Email => check_email(value),
        FieldType::Slider => check_slider(field, value),
        FieldType::Checkbox => check_selection_count(field, value),
        FieldType::Select if field.config.allow_multiple => check_selection_count(field, value),
        FieldType::Radio | FieldType::Select => check_option(field, value),
        FieldType::Date | FieldType::Unsupported(_) => None,
    }
}

fn check_length(field: &FieldDefinition, value: &Value) -> Option<String> {
    let length = value::to_text(value).chars().count() as f64;
    if let Some(min) = field.validation.min
        && length < min
    {
        return Some(format!(
            "{} must be at least {} characters",
            field.label,
            value::format_number(min)
        ));
    }
    if let Some(max) = field.validation.max
        && length > max
    {
        return Some(format!(
            "{} must be at most {} characters",
            field.label,
            value::format_number(max)
        ));
    }
    None
}

fn check_email(value: &Value) -> Option<String> {
    let text = value::to_text(value);
    let valid = EMAIL
        .as_ref()
        .is_none_or(|pattern| pattern.is_match(text.trim()));
    (!valid).then(|| "Please enter a valid email address".to_string())
}

fn check_slider(field: &FieldDefinition, value: &Value) -> Option<String> {
    let number = value::to_number(value);
    if number.is_nan() {
        return Some(format!("{} must be a number", field.label));
    }
    let range = SliderRange::for_field(field);
    if number < range.min {
        return Some(format!(
            "{} must be at least {}",
            field.label,
            value::format_number(range.min)
        ));
    }
    if number > range.max {
        return Some(format!(
            "{} must be at most {}",
            field.label,
            value::format_number(range.max)
        ));
    }
    None
}

fn check_selection_count(field: &FieldDefinition, value: &Value) -> Option<String> {
    let Some(items) = value.as_array() else {
        return Some(format!("{} has an invalid selection", field.label));
    };
    let count = items.len() as f64;
    if let Some(min) = field.validation.min
        && count < min
    {
        return Some(format!(
            "Select at least {} options",
            value::format_number(min)
        ));
    }
    if let Some(max) = field.validation.max
        && count > max
    {
        return Some(format!(
            "Select at most {} options",
            value::format_number(max)
        ));
    }
    None
}

fn check_option(field: &FieldDefinition, value: &Value) -> Option<String> {
    if field.config.options.is_empty() {
        return None;
    }
    let known = field
        .config
        .options
        .iter()
        .any(|option| value::option_matches(&option.value, value));
    (!known).then(|| format!("{} has an invalid selection", field.label))
}
