use std::collections::BTreeMap;

use crate::spec::field::FieldDefinition;
use crate::value::ValueStore;

pub type VisibilityMap = BTreeMap<String, bool>;

/// Whether a field should be shown for the current values.
///
/// Fields without a conditional rule are always visible. The result depends
/// only on `values`; nothing is cached between calls.
pub fn is_visible(field: &FieldDefinition, values: &ValueStore) -> bool {
    field
        .conditional
        .as_ref()
        .is_none_or(|rule| rule.evaluate(values))
}

/// Fields in render order. Equal `order` values keep their list order.
pub fn ordered_fields(fields: &[FieldDefinition]) -> Vec<&FieldDefinition> {
    let mut ordered: Vec<&FieldDefinition> = fields.iter().collect();
    ordered.sort_by_key(|field| field.order);
    ordered
}

/// Visible fields in render order.
pub fn visible_fields<'a>(
    fields: &'a [FieldDefinition],
    values: &ValueStore,
) -> Vec<&'a FieldDefinition> {
    let mut visible: Vec<&FieldDefinition> = fields
        .iter()
        .filter(|field| is_visible(field, values))
        .collect();
    visible.sort_by_key(|field| field.order);
    visible
}

pub fn resolve_visibility(fields: &[FieldDefinition], values: &ValueStore) -> VisibilityMap {
    fields
        .iter()
        .map(|field| (field.id.clone(), is_visible(field, values)))
        .collect()
}
