use form_spec::store::check_slug;
use form_spec::{FormDefinition, SpecError, SubmitError, SubmitTarget, ValueStore};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("form not found")]
    NotFound,
    #[error("'{0}' is not a valid form slug")]
    InvalidSlug(String),
    #[error("form service responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to reach the form service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("form definition is invalid: {0}")]
    Invalid(#[from] SpecError),
}

impl ApiError {
    /// Message shown to someone filling in a form when it cannot be loaded.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::NotFound => "Form not found",
            _ => "Failed to load form",
        }
    }
}

/// Public form endpoints.
pub trait FormApi {
    /// `GET /form/public/{slug}`
    fn fetch_form(&self, slug: &str) -> Result<FormDefinition, ApiError>;
    /// `POST /form/public/{slug}/submit` with the value store as body.
    fn submit(&self, slug: &str, values: &ValueStore) -> Result<Value, ApiError>;
}

/// Blocking HTTP implementation of [`FormApi`].
#[derive(Debug, Clone)]
pub struct HttpFormApi {
    client: Client,
    base_url: String,
}

impl HttpFormApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the public form resource, optionally with a trailing segment.
    pub fn form_url(&self, slug: &str, suffix: Option<&str>) -> Result<String, ApiError> {
        check_slug(slug).map_err(|_| ApiError::InvalidSlug(slug.to_string()))?;
        let mut url = format!("{}/form/public/{}", self.base_url, slug);
        if let Some(suffix) = suffix {
            url.push('/');
            url.push_str(suffix);
        }
        Ok(url)
    }
}

impl FormApi for HttpFormApi {
    fn fetch_form(&self, slug: &str) -> Result<FormDefinition, ApiError> {
        let url = self.form_url(slug, None)?;
        debug!(%url, "fetching form");
        let response = self.client.get(&url).send()?;
        let body = read_body(response)?;
        let form: FormDefinition = serde_json::from_str(&body).map_err(ApiError::Decode)?;
        form.check()?;
        Ok(form)
    }

    fn submit(&self, slug: &str, values: &ValueStore) -> Result<Value, ApiError> {
        let url = self.form_url(slug, Some("submit"))?;
        debug!(%url, fields = values.len(), "submitting form");
        let response = self.client.post(&url).json(values).send()?;
        let body = read_body(response)?;
        info!(slug, "submission accepted");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}

fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.text()?)
}

/// Submits a session's values to one form through a [`FormApi`].
pub struct ApiSubmitTarget<'a, A: FormApi> {
    api: &'a A,
    slug: String,
}

impl<'a, A: FormApi> ApiSubmitTarget<'a, A> {
    pub fn new(api: &'a A, slug: impl Into<String>) -> Self {
        Self {
            api,
            slug: slug.into(),
        }
    }
}

impl<A: FormApi> SubmitTarget for ApiSubmitTarget<'_, A> {
    fn submit(&mut self, values: &ValueStore) -> Result<Value, SubmitError> {
        self.api
            .submit(&self.slug, values)
            .map_err(|err| SubmitError::with_source("failed to submit form", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_public_routes() {
        let api = HttpFormApi::new("https://example.com/api/");
        assert_eq!(
            api.form_url("launch-survey", None).expect("url"),
            "https://example.com/api/form/public/launch-survey"
        );
        assert_eq!(
            api.form_url("launch-survey", Some("submit")).expect("url"),
            "https://example.com/api/form/public/launch-survey/submit"
        );
    }

    #[test]
    fn slugs_cannot_escape_the_route() {
        let api = HttpFormApi::new(DEFAULT_BASE_URL);
        assert!(matches!(
            api.form_url("../admin", None),
            Err(ApiError::InvalidSlug(_))
        ));
        assert_eq!(
            api.form_url("Spring-Launch", None).expect("mixed case url"),
            "http://localhost:3000/api/form/public/Spring-Launch"
        );
    }

    #[test]
    fn only_not_found_gets_its_own_message() {
        assert_eq!(ApiError::NotFound.user_message(), "Form not found");
        let other = ApiError::Status {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(other.user_message(), "Failed to load form");
    }
}
