mod builder;
mod wizard;

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use form_client::{ApiSubmitTarget, DEFAULT_BASE_URL, FileFormStore, FormApi, HttpFormApi};
use form_spec::render::displayed_error;
use form_spec::render::view::THANK_YOU_MESSAGE;
use form_spec::validate::validate_field;
use form_spec::{
    ChangeEvent, DefaultValidator, ErrorMap, FieldDefinition, FieldType, FormDefinition,
    FormSession, SessionError, SubmitError, SubmitOutcome, SubmitTarget, ValueStore, ViewStatus,
    build_form_view, render_json_ui, render_text, validate_form_data, visible_fields,
};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{AnswerParseError, PromptContext, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Dynamic form CLI",
    long_about = "Renders, validates and fills dynamic forms, and builds new ones interactively"
)]
struct Cli {
    /// Log visibility, validation and submission decisions to stderr.
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    /// Base URL of the public form API.
    #[arg(long, global = true, env = "FORMKIT_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,
    /// Directory where authored forms are stored.
    #[arg(long, global = true, env = "FORMKIT_STORE_DIR", default_value = "./forms")]
    store_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the form as it renders for a set of values.
    Render {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON object of field values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Run validation and show the errors inline.
        #[arg(long)]
        check: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate values against the fields they leave visible.
    Validate {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Path to the JSON object of field values.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Fill in a form field by field and submit it.
    Fill {
        /// Path to a local form definition JSON.
        #[arg(
            long,
            value_name = "SPEC",
            conflicts_with = "slug",
            required_unless_present = "slug"
        )]
        spec: Option<PathBuf>,
        /// Slug of a published form to fetch from the API.
        #[arg(long, value_name = "SLUG")]
        slug: Option<String>,
        /// Write the submitted values here instead of sending them to the API.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Print the submission response.
        #[arg(long)]
        show_response: bool,
    },
    /// Build a form interactively and save it to the store.
    New {
        /// Slug the form is stored under.
        #[arg(long, value_name = "SLUG")]
        slug: String,
        /// Start from scratch even when the slug already exists.
        #[arg(long)]
        force: bool,
    },
    /// Print the JSON Schema of form definitions.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Render {
            spec,
            values,
            check,
            format,
        } => run_render(&spec, values.as_deref(), check, format),
        Command::Validate { spec, values } => run_validate(&spec, &values),
        Command::Fill {
            spec,
            slug,
            out,
            show_response,
        } => run_fill(
            FillOptions {
                spec,
                slug,
                out,
                show_response,
            },
            &cli.api_url,
            cli.verbose,
        ),
        Command::New { slug, force } => {
            builder::run_new(&FileFormStore::new(cli.store_dir), &slug, force)
        }
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_form(path: &Path) -> CliResult<FormDefinition> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    Ok(FormDefinition::from_json(&contents)?)
}

fn load_values(path: &Path) -> CliResult<ValueStore> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    parse_values(&contents)
        .map_err(|err| format!("{}: {}", path.display(), err).into())
}

fn parse_values(contents: &str) -> CliResult<ValueStore> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Object(values) => Ok(values),
        _ => Err("values must be a JSON object keyed by field id".into()),
    }
}

fn run_render(
    spec_path: &Path,
    values_path: Option<&Path>,
    check: bool,
    format: RenderMode,
) -> CliResult<()> {
    let form = load_form(spec_path)?;
    let values = match values_path {
        Some(path) => load_values(path)?,
        None => ValueStore::new(),
    };
    let (errors, focus) = if check {
        let visible = visible_fields(&form.fields, &values);
        let outcome = validate_form_data(&visible, &values);
        let focus = visible
            .iter()
            .find(|field| outcome.errors.contains_key(&field.id))
            .map(|field| field.id.clone());
        (outcome.errors, focus)
    } else {
        (ErrorMap::new(), None)
    };

    let mut view = build_form_view(&form, &values, &errors, ViewStatus::Editing);
    view.focus_field = focus;
    match format {
        RenderMode::Text => println!("{}", render_text(&view)),
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&view))?),
    }
    Ok(())
}

fn run_validate(spec_path: &Path, values_path: &Path) -> CliResult<()> {
    let form = load_form(spec_path)?;
    let values = load_values(values_path)?;
    let visible = visible_fields(&form.fields, &values);
    let outcome = validate_form_data(&visible, &values);

    println!(
        "Validation result: {}",
        if outcome.is_valid { "valid" } else { "invalid" }
    );
    if !outcome.errors.is_empty() {
        println!("Errors:");
        for field in &visible {
            let error = outcome.errors.get(&field.id).map(String::as_str);
            if let Some(message) = displayed_error(field, error) {
                println!("  {} - {}", field.id, message);
            }
        }
    }

    let hidden = form
        .fields
        .iter()
        .filter(|field| !visible.iter().any(|shown| shown.id == field.id))
        .map(|field| field.id.as_str())
        .collect::<Vec<_>>();
    if !hidden.is_empty() {
        println!("Hidden fields (not validated): {}", hidden.join(", "));
    }
    let unknown = values
        .keys()
        .filter(|key| form.field(key).is_none())
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        println!("Unknown value fields: {}", unknown.join(", "));
    }

    if outcome.is_valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormDefinition);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

struct FillOptions {
    spec: Option<PathBuf>,
    slug: Option<String>,
    out: Option<PathBuf>,
    show_response: bool,
}

fn run_fill(options: FillOptions, api_url: &str, verbose: bool) -> CliResult<()> {
    let api = HttpFormApi::new(api_url);
    let form = match (&options.spec, &options.slug) {
        (Some(path), _) => load_form(path)?,
        (None, Some(slug)) => api.fetch_form(slug).map_err(|err| {
            debug!(slug = %slug, error = %err, "form fetch failed");
            err.user_message()
        })?,
        (None, None) => return Err("either --spec or --slug is required".into()),
    };

    let mut target: Box<dyn SubmitTarget + '_> = match (&options.out, &options.slug) {
        (Some(path), _) => Box::new(LocalTarget {
            path: Some(path.clone()),
        }),
        (None, Some(slug)) => Box::new(ApiSubmitTarget::new(&api, slug.clone())),
        (None, None) => Box::new(LocalTarget { path: None }),
    };

    let mut session = FormSession::new(form);
    let mut presenter =
        WizardPresenter::new(Verbosity::from_verbose(verbose), options.show_response);
    let payload = fill_session(&mut session, &mut presenter, target.as_mut())?;
    presenter.show_completion(THANK_YOU_MESSAGE, &payload);
    Ok(())
}

/// Writes accepted values to a file, or to stdout when no path is set.
struct LocalTarget {
    path: Option<PathBuf>,
}

impl SubmitTarget for LocalTarget {
    fn submit(&mut self, values: &ValueStore) -> Result<Value, SubmitError> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|err| SubmitError::with_source("failed to encode values", err))?;
        match &self.path {
            Some(path) => {
                fs::write(path, json).map_err(|err| {
                    SubmitError::with_source(format!("failed to write {}", path.display()), err)
                })?;
                Ok(json!({ "saved": path.display().to_string() }))
            }
            None => {
                println!("{}", json);
                Ok(Value::Null)
            }
        }
    }
}

/// Prompts every visible field once, re-reading visibility after each answer,
/// then submits. Fields rejected at submit time are asked again.
fn fill_session(
    session: &mut FormSession,
    presenter: &mut WizardPresenter,
    target: &mut dyn SubmitTarget,
) -> CliResult<Value> {
    let mut asked: HashSet<String> = HashSet::new();
    loop {
        let view = session.view();
        presenter.show_header(&view);

        let visible = session.visible_fields();
        let total = visible.len();
        let next = visible
            .iter()
            .enumerate()
            .find(|(_, field)| !asked.contains(&field.id))
            .map(|(index, field)| (index + 1, (*field).clone()));

        let Some((index, field)) = next else {
            match session.submit(&DefaultValidator, target) {
                Ok(SubmitOutcome::Accepted(payload)) => return Ok(payload),
                Ok(SubmitOutcome::Rejected { errors, .. }) => {
                    presenter.show_rejected(&session.view());
                    for id in errors.keys() {
                        asked.remove(id);
                    }
                    continue;
                }
                Err(SessionError::Submit(err)) => {
                    presenter.show_submit_error(&err);
                    if prompt_bool("Try again?", true)? {
                        continue;
                    }
                    return Err("submission abandoned; answers were not sent".into());
                }
                Err(err) => return Err(err.into()),
            }
        };

        presenter.show_status(&view);
        asked.insert(field.id.clone());
        if !field.kind.is_supported() {
            presenter.show_unsupported(&field);
            continue;
        }
        let prompt = PromptContext::new(&field, index, total);
        prompt_field(session, &field, &prompt, presenter)?;
    }
}

fn prompt_field(
    session: &mut FormSession,
    field: &FieldDefinition,
    prompt: &PromptContext,
    presenter: &WizardPresenter,
) -> CliResult<()> {
    loop {
        presenter.show_prompt(prompt);
        let raw = read_answer()?;
        if !raw.is_empty() {
            let event = match parse_answer(field, &raw) {
                Ok(event) => event,
                Err(err) => {
                    presenter.show_parse_error(&err);
                    continue;
                }
            };
            match session.apply_change(&field.id, event) {
                Ok(_) => {}
                Err(SessionError::Change { source, .. }) => {
                    presenter.show_parse_error(&AnswerParseError::new(source.to_string(), None));
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let problem = validate_field(field, session.values().get(&field.id));
        match displayed_error(field, problem.as_deref()) {
            Some(message) => presenter.show_parse_error(&AnswerParseError::new(message, None)),
            None => return Ok(()),
        }
    }
}

fn read_answer() -> CliResult<String> {
    print!("> ");
    io::stdout().flush()?;
    let line = read_line()?;
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Err("wizard aborted by user".into());
    }
    Ok(trimmed.to_string())
}

/// Turns a typed answer into the change event the field's control would emit.
fn parse_answer(field: &FieldDefinition, raw: &str) -> Result<ChangeEvent, AnswerParseError> {
    match &field.kind {
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Email
        | FieldType::Date
        | FieldType::Slider => Ok(ChangeEvent::Input(raw.to_string())),
        FieldType::Radio | FieldType::Checkbox | FieldType::Select => {
            if field.is_multi_value() {
                parse_choices(field, raw).map(ChangeEvent::SelectMany)
            } else {
                resolve_choice(field, raw).map(ChangeEvent::Input)
            }
        }
        FieldType::Unsupported(name) => Err(AnswerParseError::new(
            form_spec::render::unsupported_text(name),
            None,
        )),
    }
}

/// Matches an option by value, then by label ignoring case.
fn resolve_choice(field: &FieldDefinition, raw: &str) -> Result<String, AnswerParseError> {
    let raw = raw.trim();
    let options = &field.config.options;
    options
        .iter()
        .find(|option| option.value == raw)
        .or_else(|| {
            options
                .iter()
                .find(|option| option.label.eq_ignore_ascii_case(raw))
        })
        .map(|option| option.value.clone())
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not one of the choices.", raw),
                Some(
                    options
                        .iter()
                        .map(|option| option.value.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            )
        })
}

fn parse_choices(field: &FieldDefinition, raw: &str) -> Result<Vec<String>, AnswerParseError> {
    let mut selected: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let value = resolve_choice(field, part)?;
        if !selected.contains(&value) {
            selected.push(value);
        }
    }
    Ok(selected)
}

fn read_line() -> CliResult<String> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err("input ended before the prompt was answered".into());
    }
    Ok(line)
}

fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<String> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let line = read_line()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn prompt_optional(prompt: &str) -> CliResult<Option<String>> {
    let value = prompt_line(prompt, None)?;
    if value.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn prompt_non_empty(prompt: &str, default: Option<&str>) -> CliResult<String> {
    loop {
        let value = prompt_line(prompt, default)?;
        if !value.trim().is_empty() {
            return Ok(value);
        }
        println!("Value cannot be empty.");
    }
}

fn mark_required(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.to_lowercase().contains("required") {
        trimmed.to_string()
    } else {
        format!("{} (required)", trimmed)
    }
}

fn prompt_bool(prompt: &str, default: bool) -> CliResult<bool> {
    let prompt_text = format!("{} (y/n)", prompt.trim());
    let default_hint = if default { "Y" } else { "N" };
    loop {
        let line = prompt_line(&prompt_text, Some(default_hint))?;
        match line.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => {
                println!("Invalid answer '{}'. Expected yes or no.", other);
            }
        }
    }
}

fn prompt_f64(prompt: &str, default: f64) -> CliResult<f64> {
    let default_text = form_spec::value::format_number(default);
    loop {
        let raw = prompt_line(prompt, Some(&default_text))?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => return Ok(value),
            _ => println!("Enter a number."),
        }
    }
}
