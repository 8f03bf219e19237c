//! Collaborators that sit at the edge of the form engine: the public form
//! API used to fetch and submit forms, and a file-backed form store.

pub mod api;
pub mod store;

pub use api::{ApiError, ApiSubmitTarget, DEFAULT_BASE_URL, FormApi, HttpFormApi};
pub use store::FileFormStore;
