use form_client::FileFormStore;
use form_spec::store::StoreError;
use form_spec::value;
use form_spec::{
    Condition, ConditionalRule, FieldDefinition, FieldOption, FieldType, FormBuilder, FormStore,
    Logic, Operator,
};
use serde_json::{Map, Number, Value, json};

use crate::{
    CliResult, mark_required, prompt_bool, prompt_f64, prompt_line, prompt_non_empty,
    prompt_optional,
};

const OPERATORS: &str =
    "equals|not_equals|contains|greater_than|less_than|is_empty|is_not_empty";

/// Interactive builder: collects fields, optional visibility rules and an
/// ordering, then saves the form under `slug`.
pub fn run_new(store: &FileFormStore, slug: &str, force: bool) -> CliResult<()> {
    println!("Interactive form builder");
    let path = store.path_for(slug)?;
    let existing = if force {
        None
    } else {
        match store.load(slug) {
            Ok(form) => Some(form),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        }
    };

    let mut builder = match &existing {
        Some(form) => {
            println!("Editing '{}' ({} fields)", slug, form.fields.len());
            FormBuilder::from_form(form)
        }
        None => FormBuilder::new(),
    };
    let title = prompt_non_empty(
        &mark_required("Form title"),
        existing.as_ref().map(|form| form.title.as_str()),
    )?;
    let description = prompt_optional("Description (optional)")?
        .or_else(|| existing.as_ref().and_then(|form| form.description.clone()));
    let current_theme = builder
        .settings()
        .and_then(|settings| settings.theme.clone());
    if let Some(theme) = prompt_optional("Theme (optional)")?.or(current_theme) {
        let mut settings = builder.settings().cloned().unwrap_or_default();
        settings.theme = Some(theme);
        builder.set_settings(Some(settings));
    }

    loop {
        let Some(kind) = prompt_field_type()? else {
            break;
        };
        let field = builder.add_field(kind).clone();
        let patch = prompt_field_details(&field, builder.fields())?;
        let field = builder.update_field(&field.id, &patch)?;
        println!("Added {} field '{}' ({})", field.kind, field.label, field.id);
    }

    if builder.fields().is_empty() {
        return Err("at least one field is required".into());
    }
    prompt_reorder(&mut builder)?;

    let form = builder.save(store, slug, &title, description)?;
    println!(
        "Saved form '{}' with {} fields to {}",
        slug,
        form.fields.len(),
        path.display()
    );
    Ok(())
}

fn prompt_field_type() -> CliResult<Option<FieldType>> {
    let names = FieldType::SUPPORTED
        .iter()
        .map(FieldType::as_str)
        .collect::<Vec<_>>()
        .join("|");
    loop {
        let raw = prompt_line(&format!("Field type ({}, blank to finish)", names), None)?;
        if raw.is_empty() {
            return Ok(None);
        }
        let kind = FieldType::parse(&raw.to_lowercase());
        if kind.is_supported() {
            return Ok(Some(kind));
        }
        println!("Unknown field type '{}'.", raw);
    }
}

/// Collects the edits for a freshly added field as a JSON patch.
fn prompt_field_details(
    field: &FieldDefinition,
    fields: &[FieldDefinition],
) -> CliResult<Map<String, Value>> {
    let mut patch = Map::new();
    let label = prompt_non_empty(&mark_required("Label"), Some(field.label.as_str()))?;
    patch.insert("label".into(), json!(label));
    patch.insert("required".into(), json!(prompt_bool("Required?", false)?));
    if let Some(placeholder) = prompt_optional("Placeholder (optional)")? {
        patch.insert("placeholder".into(), json!(placeholder));
    }
    if let Some(description) = prompt_optional("Description (optional)")? {
        patch.insert("description".into(), json!(description));
    }
    if let Some(config) = prompt_config(field)? {
        patch.insert("config".into(), config);
    }

    let others = fields
        .iter()
        .filter(|other| other.id != field.id)
        .collect::<Vec<_>>();
    if !others.is_empty() && prompt_bool("Only show when other fields match?", false)? {
        let rule = prompt_conditional(&others)?;
        patch.insert("conditional".into(), serde_json::to_value(&rule)?);
    }
    Ok(patch)
}

fn prompt_config(field: &FieldDefinition) -> CliResult<Option<Value>> {
    let mut config = field.config.clone();
    match &field.kind {
        FieldType::Radio | FieldType::Checkbox | FieldType::Select => {
            let options = prompt_options()?;
            if !options.is_empty() {
                config.options = options;
            }
            if field.kind == FieldType::Select {
                config.allow_multiple = prompt_bool("Allow multiple selections?", false)?;
            }
        }
        FieldType::Slider => {
            config.min = Some(prompt_f64("Minimum", config.min.unwrap_or(0.0))?);
            config.max = Some(prompt_f64("Maximum", config.max.unwrap_or(100.0))?);
            config.step = Some(prompt_f64("Step", config.step.unwrap_or(1.0))?);
        }
        FieldType::Date => loop {
            let format = prompt_line(
                "Date format (date|datetime-local|time)",
                config.date_format.as_deref(),
            )?;
            if matches!(format.as_str(), "date" | "datetime-local" | "time") {
                config.date_format = Some(format);
                break;
            }
            println!("Unknown date format '{}'.", format);
        },
        FieldType::Text | FieldType::Textarea | FieldType::Email | FieldType::Unsupported(_) => {
            return Ok(None);
        }
    }
    Ok(Some(serde_json::to_value(&config)?))
}

/// Options are entered as `Label` or `Label=value`.
fn prompt_options() -> CliResult<Vec<FieldOption>> {
    let raw = prompt_line("Options, comma separated (blank keeps the defaults)", None)?;
    let options = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| match entry.split_once('=') {
            Some((label, value)) => FieldOption::new(label.trim(), value.trim()),
            None => FieldOption::new(entry, option_value(entry, index)),
        })
        .collect();
    Ok(options)
}

fn option_value(label: &str, index: usize) -> String {
    let value = label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let value = value.trim_matches('_');
    if value.is_empty() {
        format!("option_{}", index + 1)
    } else {
        value.to_string()
    }
}

fn prompt_conditional(others: &[&FieldDefinition]) -> CliResult<ConditionalRule> {
    println!(
        "Available fields: {}",
        others
            .iter()
            .map(|field| format!("{} ({})", field.label, field.id))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut conditions = Vec::new();
    loop {
        let target = prompt_field_reference(others)?;
        let operator = prompt_operator()?;
        let value = if operator.takes_operand() {
            parse_condition_value(target, &prompt_line("Compare with", None)?)
        } else {
            Value::Null
        };
        conditions.push(Condition::new(target.id.clone(), operator, value));
        if !prompt_bool("Add another condition?", false)? {
            break;
        }
    }

    let logic = if conditions.len() > 1 {
        prompt_logic()?
    } else {
        Logic::And
    };
    Ok(ConditionalRule {
        show_if: conditions,
        logic,
    })
}

/// Accepts a field id or a label, ignoring case for labels.
fn prompt_field_reference<'a>(others: &[&'a FieldDefinition]) -> CliResult<&'a FieldDefinition> {
    loop {
        let raw = prompt_non_empty("Depends on field (id or label)", None)?;
        let found = others
            .iter()
            .find(|field| field.id == raw)
            .or_else(|| {
                others
                    .iter()
                    .find(|field| field.label.eq_ignore_ascii_case(&raw))
            });
        match found {
            Some(field) => return Ok(*field),
            None => println!("No field matches '{}'.", raw),
        }
    }
}

fn prompt_operator() -> CliResult<Operator> {
    loop {
        let raw = prompt_line(&format!("Operator ({})", OPERATORS), Some("equals"))?;
        match Operator::from(raw.to_lowercase()) {
            Operator::Unknown(name) => println!("Unknown operator '{}'.", name),
            operator => return Ok(operator),
        }
    }
}

fn prompt_logic() -> CliResult<Logic> {
    loop {
        let raw = prompt_line("Combine conditions with (and|or)", Some("and"))?;
        match raw.to_lowercase().as_str() {
            "and" => return Ok(Logic::And),
            "or" => return Ok(Logic::Or),
            other => println!("Expected 'and' or 'or', got '{}'.", other),
        }
    }
}

/// Types the compare value the way `target` stores its answers: strings for
/// text-like and multi-value fields, coerced numbers for sliders and single
/// choices.
fn parse_condition_value(target: &FieldDefinition, raw: &str) -> Value {
    let trimmed = raw.trim();
    match &target.kind {
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Email
        | FieldType::Date
        | FieldType::Checkbox => Value::String(trimmed.to_string()),
        FieldType::Select if target.is_multi_value() => Value::String(trimmed.to_string()),
        FieldType::Radio | FieldType::Select | FieldType::Slider => value::coerce_choice(trimmed),
        FieldType::Unsupported(_) => parse_literal(trimmed),
    }
}

fn parse_literal(trimmed: &str) -> Value {
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int_val));
    }
    if let Ok(float_val) = trimmed.parse::<f64>()
        && let Some(number) = Number::from_f64(float_val)
    {
        return Value::Number(number);
    }
    Value::String(trimmed.to_string())
}

/// Moves fields by 1-based position until the author leaves the prompt blank.
fn prompt_reorder(builder: &mut FormBuilder) -> CliResult<()> {
    if builder.fields().len() < 2 {
        return Ok(());
    }
    loop {
        println!("Current order:");
        for (index, field) in builder.fields().iter().enumerate() {
            println!("  {}. {} ({})", index + 1, field.label, field.id);
        }
        let raw = prompt_line("Move field (FROM,TO; blank to keep this order)", None)?;
        if raw.is_empty() {
            return Ok(());
        }
        let Some((from, to)) = parse_move(&raw) else {
            println!("Expected two positions such as '3,1'.");
            continue;
        };
        if let Err(err) = builder.reorder_fields(from, to) {
            println!("{}", err);
        }
    }
}

/// Parses `FROM,TO` (1-based) into 0-based indexes.
fn parse_move(raw: &str) -> Option<(usize, usize)> {
    let (from, to) = raw.split_once(',')?;
    let from = from.trim().parse::<usize>().ok()?.checked_sub(1)?;
    let to = to.trim().parse::<usize>().ok()?.checked_sub(1)?;
    Some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_spec::ChangeEvent;

    #[test]
    fn option_values_are_derived_from_labels() {
        assert_eq!(option_value("Email Newsletter", 0), "email_newsletter");
        assert_eq!(option_value("???", 2), "option_3");
    }

    #[test]
    fn moves_are_one_based() {
        assert_eq!(parse_move("3, 1"), Some((2, 0)));
        assert_eq!(parse_move("0,1"), None);
        assert_eq!(parse_move("2"), None);
    }

    #[test]
    fn condition_values_follow_the_target_field() {
        let zip = FieldDefinition::new("zip", FieldType::Text, "Zip");
        assert_eq!(parse_condition_value(&zip, "12345"), json!("12345"));

        let budget = FieldDefinition::new("budget", FieldType::Slider, "Budget");
        assert_eq!(parse_condition_value(&budget, "100"), json!(100));
        assert_eq!(parse_condition_value(&budget, "2.5"), json!(2.5));

        let plan = FieldDefinition::new("plan", FieldType::Radio, "Plan");
        assert_eq!(parse_condition_value(&plan, "42"), json!(42));
        assert_eq!(parse_condition_value(&plan, "yes"), json!("yes"));

        let legacy = FieldDefinition::new("flag", FieldType::parse("toggle"), "Flag");
        assert_eq!(parse_condition_value(&legacy, "TRUE"), json!(true));
    }

    #[test]
    fn text_rule_matches_what_the_user_types() {
        let zip = FieldDefinition::new("zip", FieldType::Text, "Zip");
        let rule = ConditionalRule {
            show_if: vec![Condition::new(
                "zip",
                Operator::Equals,
                parse_condition_value(&zip, "12345"),
            )],
            logic: Logic::And,
        };
        let gated = FieldDefinition::new("area", FieldType::Text, "Area").with_conditional(rule);

        let mut values = Map::new();
        let typed = form_spec::apply_change(&zip, None, ChangeEvent::Input("12345".into()))
            .expect("typed");
        values.insert("zip".into(), typed);
        assert!(form_spec::is_visible(&gated, &values));
    }
}
