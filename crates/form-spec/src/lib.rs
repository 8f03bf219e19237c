#![allow(missing_docs)]

pub mod builder;
pub mod condition;
pub mod progress;
pub mod render;
pub mod session;
pub mod spec;
pub mod store;
pub mod validate;
pub mod value;
pub mod visibility;

pub use builder::{BuilderError, FormBuilder};
pub use condition::{Condition, ConditionalRule, Logic, Operator};
pub use progress::{Progress, compute_progress};
pub use render::{
    ChangeError, ChangeEvent, FieldContext, FormView, ViewStatus, apply_change, build_form_view,
    render_field, render_json_ui, render_text,
};
pub use session::{FormSession, SessionError, SubmitError, SubmitOutcome, SubmitTarget};
pub use spec::{
    FieldConfig, FieldDefinition, FieldOption, FieldType, FieldValidation, FormDefinition,
    FormSettings, SpecError,
};
pub use store::{FormStore, MemoryFormStore, StoreError};
pub use validate::{
    DefaultValidator, ErrorMap, FormValidator, ValidationOutcome, validate_form_data,
};
pub use value::ValueStore;
pub use visibility::{VisibilityMap, is_visible, resolve_visibility, visible_fields};
