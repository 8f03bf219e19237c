use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::ConditionalRule;

/// Field types understood by the renderers.
///
/// Type names outside the known set are preserved as [`FieldType::Unsupported`]
/// so a form authored against a newer schema still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Radio,
    Checkbox,
    Select,
    Slider,
    Date,
    Unsupported(String),
}

impl FieldType {
    /// Every type the builder can add.
    pub const SUPPORTED: [FieldType; 8] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Email,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Select,
        FieldType::Slider,
        FieldType::Date,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "email" => FieldType::Email,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "select" => FieldType::Select,
            "slider" => FieldType::Slider,
            "date" => FieldType::Date,
            other => FieldType::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Slider => "slider",
            FieldType::Date => "date",
            FieldType::Unsupported(name) => name,
        }
    }

    /// Human-friendly name used for default labels.
    pub fn title(&self) -> &str {
        match self {
            FieldType::Text => "Text",
            FieldType::Textarea => "Text Area",
            FieldType::Email => "Email",
            FieldType::Radio => "Radio",
            FieldType::Checkbox => "Checkbox",
            FieldType::Select => "Select",
            FieldType::Slider => "Slider",
            FieldType::Date => "Date",
            FieldType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldType::Unsupported(_))
    }

    /// Whether the field draws its values from `config.options`.
    pub fn uses_options(&self) -> bool {
        matches!(
            self,
            FieldType::Radio | FieldType::Checkbox | FieldType::Select
        )
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::parse(&raw)
    }
}

impl From<FieldType> for String {
    fn from(kind: FieldType) -> Self {
        match kind {
            FieldType::Unsupported(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable entry of a radio, checkbox or select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Validation rules. Not every rule applies to every field type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    /// Replaces any computed error message when the field fails validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

/// Type-specific rendering configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Declarative description of one form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub kind: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub validation: FieldValidation,
    #[serde(default)]
    pub config: FieldConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalRule>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, kind: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            placeholder: None,
            description: None,
            required: false,
            order: 0,
            validation: FieldValidation::default(),
            config: FieldConfig::default(),
            conditional: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.config.options = options;
        self
    }

    #[must_use]
    pub fn with_conditional(mut self, conditional: ConditionalRule) -> Self {
        self.conditional = Some(conditional);
        self
    }

    /// Description shown under the label, falling back to the config help text.
    pub fn help(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.config.help_text.as_deref())
    }

    /// Whether this field holds a list of selections rather than one value.
    pub fn is_multi_value(&self) -> bool {
        match self.kind {
            FieldType::Checkbox => true,
            FieldType::Select => self.config.allow_multiple,
            _ => false,
        }
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.config
            .options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}
