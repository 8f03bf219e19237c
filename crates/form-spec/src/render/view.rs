use serde_json::{Map, Value, json};

use super::{FieldContext, displayed_error, render_field, slider, unsupported_text};
use crate::progress::{Progress, compute_progress};
use crate::spec::field::{FieldDefinition, FieldType};
use crate::spec::form::FormDefinition;
use crate::validate::ErrorMap;
use crate::value::{self, ValueStore};
use crate::visibility::visible_fields;

pub const THANK_YOU_MESSAGE: &str = "Thank you! Your response has been submitted.";

const TRACK_WIDTH: usize = 20;

/// Lifecycle stage the view is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Editing,
    Submitting,
    Submitted,
}

impl ViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStatus::Editing => "editing",
            ViewStatus::Submitting => "submitting",
            ViewStatus::Submitted => "submitted",
        }
    }
}

/// A visible field together with its current value and error.
#[derive(Debug, Clone)]
pub struct ViewField {
    pub definition: FieldDefinition,
    pub value: Option<Value>,
    pub error: Option<String>,
}

/// Everything needed to draw one render pass of a form.
#[derive(Debug, Clone)]
pub struct FormView {
    pub title: String,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub custom_css: Option<String>,
    pub status: ViewStatus,
    pub progress: Progress,
    pub focus_field: Option<String>,
    pub fields: Vec<ViewField>,
}

/// Builds the view for the visible fields, in render order.
///
/// A submitted form shows no fields at all.
pub fn build_form_view(
    form: &FormDefinition,
    values: &ValueStore,
    errors: &ErrorMap,
    status: ViewStatus,
) -> FormView {
    let visible = visible_fields(&form.fields, values);
    let progress = compute_progress(&visible, values);
    let fields = if status == ViewStatus::Submitted {
        Vec::new()
    } else {
        visible
            .iter()
            .map(|field| ViewField {
                definition: (*field).clone(),
                value: values.get(&field.id).cloned(),
                error: errors.get(&field.id).cloned(),
            })
            .collect()
    };
    let settings = form.settings.as_ref();

    FormView {
        title: form.title.clone(),
        description: form.description.clone(),
        theme: settings.and_then(|settings| settings.theme.clone()),
        custom_css: settings.and_then(|settings| settings.custom_css.clone()),
        status,
        progress,
        focus_field: None,
        fields,
    }
}

/// Renders the view as a JSON UI tree.
pub fn render_json_ui(view: &FormView) -> Value {
    if view.status == ViewStatus::Submitted {
        return json!({
            "type": "form",
            "status": view.status.as_str(),
            "title": view.title,
            "message": THANK_YOU_MESSAGE,
        });
    }

    let disabled = view.status == ViewStatus::Submitting;
    let fields = view
        .fields
        .iter()
        .map(|field| {
            let ctx = FieldContext::new(field.value.as_ref(), field.error.as_deref())
                .disabled(disabled);
            render_field(&field.definition, ctx)
        })
        .collect::<Vec<_>>();

    let mut map = Map::new();
    map.insert("type".into(), Value::String("form".into()));
    map.insert("status".into(), Value::String(view.status.as_str().into()));
    map.insert("title".into(), Value::String(view.title.clone()));
    if let Some(description) = &view.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(theme) = &view.theme {
        map.insert("theme".into(), Value::String(theme.clone()));
    }
    if let Some(css) = &view.custom_css {
        map.insert("customCss".into(), Value::String(css.clone()));
    }
    map.insert(
        "progress".into(),
        json!({
            "completed": view.progress.completed,
            "total": view.progress.total,
            "percent": view.progress.percent,
        }),
    );
    if let Some(focus) = &view.focus_field {
        map.insert("focusField".into(), Value::String(focus.clone()));
    }
    map.insert("fields".into(), Value::Array(fields));
    let submit_label = if disabled { "Submitting..." } else { "Submit" };
    map.insert(
        "submit".into(),
        json!({
            "label": submit_label,
            "disabled": disabled,
        }),
    );
    Value::Object(map)
}

/// Renders the view as human-friendly text.
pub fn render_text(view: &FormView) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {}", view.title));
    if view.status == ViewStatus::Submitted {
        lines.push(THANK_YOU_MESSAGE.to_string());
        return lines.join("\n");
    }
    if let Some(description) = &view.description {
        lines.push(description.clone());
    }
    lines.push(format!(
        "Progress: {}/{} ({}%)",
        view.progress.completed,
        view.progress.total,
        view.progress.percent.round()
    ));

    for field in &view.fields {
        let definition = &field.definition;
        if let FieldType::Unsupported(name) = &definition.kind {
            lines.push(format!(" - {}", unsupported_text(name)));
            continue;
        }
        let mut heading = format!(" - {} ({})", definition.label, definition.id);
        if definition.required {
            heading.push_str(" *");
        }
        lines.push(heading);
        if let Some(help) = definition.help() {
            lines.push(format!("   {help}"));
        }
        for line in describe_control(definition, field.value.as_ref()) {
            lines.push(format!("   {line}"));
        }
        if let Some(error) = displayed_error(definition, field.error.as_deref()) {
            lines.push(format!("   ! {error}"));
        }
    }

    if view.status == ViewStatus::Submitting {
        lines.push("Submitting...".to_string());
    }
    lines.join("\n")
}

fn describe_control(field: &FieldDefinition, current: Option<&Value>) -> Vec<String> {
    match &field.kind {
        FieldType::Text | FieldType::Textarea | FieldType::Email | FieldType::Date => {
            let text = current.map(value::to_text).unwrap_or_default();
            if text.is_empty() {
                let hint = field.placeholder.as_deref().unwrap_or("(empty)");
                vec![hint.to_string()]
            } else {
                vec![format!("= {text}")]
            }
        }
        FieldType::Radio | FieldType::Checkbox | FieldType::Select => {
            let multi = field.is_multi_value();
            let selected = value::string_items(current);
            field
                .config
                .options
                .iter()
                .map(|option| {
                    let on = if multi {
                        selected.contains(&option.value)
                    } else {
                        current.is_some_and(|stored| value::option_matches(&option.value, stored))
                    };
                    let mark = match (multi, on) {
                        (true, true) => "[x]",
                        (true, false) => "[ ]",
                        (false, true) => "(x)",
                        (false, false) => "( )",
                    };
                    format!("{mark} {} [{}]", option.label, option.value)
                })
                .collect()
        }
        FieldType::Slider => {
            let range = slider::SliderRange::for_field(field);
            let position = slider::current_position(field, current);
            let filled = ((range.percent(position) / 100.0 * TRACK_WIDTH as f64).round()
                as usize)
                .min(TRACK_WIDTH);
            let mut line = format!(
                "[{}{}]",
                "#".repeat(filled),
                "-".repeat(TRACK_WIDTH - filled)
            );
            if field.config.show_value.unwrap_or(true) {
                line.push_str(&format!(
                    " {} ({}..{})",
                    value::format_number(position),
                    value::format_number(range.min),
                    value::format_number(range.max)
                ));
            }
            vec![line]
        }
        FieldType::Unsupported(name) => vec![unsupported_text(name)],
    }
}
