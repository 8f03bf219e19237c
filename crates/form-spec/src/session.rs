use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::progress::{Progress, compute_progress};
use crate::render::{ChangeError, ChangeEvent, FormView, ViewStatus, apply_change, build_form_view};
use crate::spec::field::FieldDefinition;
use crate::spec::form::FormDefinition;
use crate::validate::{ErrorMap, FormValidator};
use crate::value::ValueStore;
use crate::visibility::visible_fields;

/// Failure reported by a submit collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubmitError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Receives the full value store once a submission passes validation.
pub trait SubmitTarget {
    fn submit(&mut self, values: &ValueStore) -> Result<Value, SubmitError>;
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("field '{0}' is not part of this form")]
    UnknownField(String),
    #[error("the form has already been submitted")]
    AlreadySubmitted,
    #[error("invalid change for field '{field}': {source}")]
    Change {
        field: String,
        #[source]
        source: ChangeError,
    },
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// What happened to a submit attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation blocked the submission; nothing was sent.
    Rejected { errors: ErrorMap, focus: Option<String> },
    /// The target accepted the values and returned this payload.
    Accepted(Value),
}

/// Runtime state of one rendered form.
///
/// Owns the value store and error map for a single session. Once a
/// submission succeeds the session is terminal: it renders the thank-you view
/// and rejects further edits and submits.
#[derive(Debug, Clone)]
pub struct FormSession {
    form: FormDefinition,
    values: ValueStore,
    errors: ErrorMap,
    is_submitting: bool,
    is_submitted: bool,
    focus_field: Option<String>,
}

impl FormSession {
    pub fn new(form: FormDefinition) -> Self {
        Self {
            form,
            values: ValueStore::new(),
            errors: ErrorMap::new(),
            is_submitting: false,
            is_submitted: false,
            focus_field: None,
        }
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    /// Field the user should be brought to after a rejected submit.
    pub fn focus_field(&self) -> Option<&str> {
        self.focus_field.as_deref()
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.form.field(id)
    }

    /// Stores a new value. Only the edited field's error is cleared, along with
    /// the focus when it pointed at that field; nothing is re-validated until
    /// the next submit.
    pub fn on_field_change(&mut self, field_id: &str, value: Value) -> Result<(), SessionError> {
        if self.is_submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.form.field(field_id).is_none() {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        self.values.insert(field_id.to_string(), value);
        self.errors.remove(field_id);
        if self.focus_field.as_deref() == Some(field_id) {
            self.focus_field = None;
        }
        Ok(())
    }

    /// Routes a control event through the field's change handler.
    pub fn apply_change(
        &mut self,
        field_id: &str,
        event: ChangeEvent,
    ) -> Result<&Value, SessionError> {
        let field = self
            .form
            .field(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))?;
        let value = apply_change(field, self.values.get(field_id), event).map_err(|source| {
            SessionError::Change {
                field: field_id.to_string(),
                source,
            }
        })?;
        self.on_field_change(field_id, value)?;
        self.values
            .get(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))
    }

    /// Visible fields in render order, recomputed on every call.
    pub fn visible_fields(&self) -> Vec<&FieldDefinition> {
        visible_fields(&self.form.fields, &self.values)
    }

    pub fn progress(&self) -> Progress {
        compute_progress(&self.visible_fields(), &self.values)
    }

    pub fn status(&self) -> ViewStatus {
        if self.is_submitted {
            ViewStatus::Submitted
        } else if self.is_submitting {
            ViewStatus::Submitting
        } else {
            ViewStatus::Editing
        }
    }

    pub fn view(&self) -> FormView {
        let mut view = build_form_view(&self.form, &self.values, &self.errors, self.status());
        view.focus_field = self.focus_field.clone();
        view
    }

    /// Validates the visible fields and, when they pass, hands the value
    /// store to `target`.
    ///
    /// A failing target leaves every value in place so the user can retry.
    pub fn submit(
        &mut self,
        validator: &dyn FormValidator,
        target: &mut dyn SubmitTarget,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.is_submitted {
            return Err(SessionError::AlreadySubmitted);
        }

        let visible = visible_fields(&self.form.fields, &self.values);
        let outcome = validator.validate(&visible, &self.values);
        if !outcome.is_valid {
            let focus = visible
                .iter()
                .find(|field| outcome.errors.contains_key(&field.id))
                .map(|field| field.id.clone());
            debug!(
                errors = outcome.errors.len(),
                focus = focus.as_deref().unwrap_or(""),
                "submission blocked by validation"
            );
            self.errors = outcome.errors.clone();
            self.focus_field = focus.clone();
            return Ok(SubmitOutcome::Rejected {
                errors: outcome.errors,
                focus,
            });
        }
        self.errors.clear();
        self.focus_field = None;

        self.is_submitting = true;
        let result = target.submit(&self.values);
        self.is_submitting = false;

        let payload = result?;
        info!(fields = self.values.len(), "form submitted");
        self.values.clear();
        self.errors.clear();
        self.is_submitted = true;
        Ok(SubmitOutcome::Accepted(payload))
    }
}
