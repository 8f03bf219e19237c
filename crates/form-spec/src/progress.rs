use serde::Serialize;

use crate::spec::field::FieldDefinition;
use crate::value::{self, ValueStore};

/// Completion counters over the visible fields of a form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

/// Counts how many of `visible` hold a non-empty value.
///
/// Hidden fields must not be passed in; they count toward neither side.
pub fn compute_progress(visible: &[&FieldDefinition], values: &ValueStore) -> Progress {
    let total = visible.len();
    let completed = visible
        .iter()
        .filter(|field| value::has_answer(values.get(&field.id)))
        .count();
    let percent = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    Progress {
        completed,
        total,
        percent,
    }
}
