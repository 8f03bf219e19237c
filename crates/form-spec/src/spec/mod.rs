pub mod field;
pub mod form;

pub use field::{FieldConfig, FieldDefinition, FieldOption, FieldType, FieldValidation};
pub use form::{FormDefinition, FormSettings, SpecError};
