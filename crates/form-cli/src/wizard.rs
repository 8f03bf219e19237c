use std::error::Error;

use form_spec::render::date::DateMode;
use form_spec::render::slider::SliderRange;
use form_spec::render::{displayed_error, unsupported_text};
use form_spec::value::format_number;
use form_spec::{FieldDefinition, FieldType, FormView, SubmitError};
use serde_json::Value;

/// Controls which bits of state the fill wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: progress, visible fields, error details.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and state while a form session is filled in on a terminal.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_payload: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_payload: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_payload,
        }
    }

    pub fn show_header(&mut self, view: &FormView) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", view.title);
        if let Some(description) = &view.description {
            println!("{}", description);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, view: &FormView) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Progress: {}/{} ({}%)",
            view.progress.completed,
            view.progress.total,
            view.progress.percent.round()
        );
        println!("Visible fields:");
        for field in &view.fields {
            let mut entry = format!(" - {} ({})", field.definition.id, field.definition.label);
            if field.definition.required {
                entry.push_str(" [required]");
            }
            if field.value.is_some() {
                entry.push_str(" [answered]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.label);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(help) = &prompt.help {
            println!("{}", help);
        }
        if !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_unsupported(&self, field: &FieldDefinition) {
        println!("{}", unsupported_text(field.kind.as_str()));
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_rejected(&self, view: &FormView) {
        eprintln!("Please fix the following before submitting:");
        for field in &view.fields {
            if let Some(error) = displayed_error(&field.definition, field.error.as_deref()) {
                eprintln!("  {} - {}", field.definition.id, error);
            }
        }
    }

    pub fn show_submit_error(&self, error: &SubmitError) {
        eprintln!("Submission failed: {}", error);
        if self.verbosity.is_verbose() {
            let mut source = error.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
        }
    }

    pub fn show_completion(&self, message: &str, payload: &Value) {
        println!("{}", message);
        if self.show_payload && !payload.is_null() {
            match serde_json::to_string_pretty(payload) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize response: {}", err),
            }
        }
    }
}

/// Context used to format a single field prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub help: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    /// `index` is the 1-based position of the field among the visible ones.
    pub fn new(field: &FieldDefinition, index: usize, total: usize) -> Self {
        let choices = if field.kind.uses_options() {
            field
                .config
                .options
                .iter()
                .map(|option| {
                    if option.label == option.value {
                        option.value.clone()
                    } else {
                        format!("{} ({})", option.value, option.label)
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            index: index.max(1),
            total,
            label: field.label.clone(),
            help: field.help().map(str::to_string),
            required: field.required,
            hint: hint_for(field),
            choices,
        }
    }
}

fn hint_for(field: &FieldDefinition) -> Option<String> {
    match &field.kind {
        FieldType::Email => Some("(email address)".to_string()),
        FieldType::Date => Some(
            match DateMode::for_field(field) {
                DateMode::Date => "(YYYY-MM-DD)",
                DateMode::DateTimeLocal => "(YYYY-MM-DDTHH:MM)",
                DateMode::Time => "(HH:MM)",
            }
            .to_string(),
        ),
        FieldType::Slider => {
            let range = SliderRange::for_field(field);
            Some(format!(
                "({} to {}, step {})",
                format_number(range.min),
                format_number(range.max),
                format_number(range.step)
            ))
        }
        FieldType::Checkbox => Some("(comma separated)".to_string()),
        FieldType::Select if field.is_multi_value() => Some("(comma separated)".to_string()),
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Radio
        | FieldType::Select
        | FieldType::Unsupported(_) => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}
