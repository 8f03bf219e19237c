use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::value::{self, ValueStore};

/// Comparison applied between another field's value and a condition value.
///
/// Type mismatches never fail: an operator that cannot apply to the value it
/// is given evaluates to `false`. Operator names outside the known set are
/// kept as [`Operator::Unknown`] and are always `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::Unknown(name) => name,
        }
    }

    /// Whether the operator reads `Condition::value` at all.
    pub fn takes_operand(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    pub fn apply(&self, target: &Value, operand: &Value) -> bool {
        match self {
            Operator::Equals => value::strictly_equal(target, operand),
            Operator::NotEquals => !value::strictly_equal(target, operand),
            // Only string targets can contain anything, and a null operand
            // matches nothing.
            Operator::Contains => match (target, operand) {
                (_, Value::Null) => false,
                (Value::String(text), operand) => text.contains(value::to_text(operand).as_str()),
                _ => false,
            },
            // NaN on either side makes both comparisons false.
            Operator::GreaterThan => value::to_number(target) > value::to_number(operand),
            Operator::LessThan => value::to_number(target) < value::to_number(operand),
            Operator::IsEmpty => value::is_empty(target),
            Operator::IsNotEmpty => value::is_not_empty(target),
            Operator::Unknown(name) => {
                warn!(operator = %name, "unknown condition operator evaluates to false");
                false
            }
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        match operator {
            Operator::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// How the conditions of a rule are combined.
///
/// A missing or unrecognised value means `and`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

impl From<String> for Logic {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "or" => Logic::Or,
            "and" => Logic::And,
            other => {
                warn!(logic = %other, "unrecognised condition logic, using 'and'");
                Logic::And
            }
        }
    }
}

impl From<Logic> for String {
    fn from(logic: Logic) -> Self {
        logic.as_str().to_string()
    }
}

/// A single comparison against another field's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_id: String,
    #[schemars(with = "String")]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Condition {
    pub fn new(field_id: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field_id: field_id.into(),
            operator,
            value,
        }
    }

    pub fn evaluate(&self, values: &ValueStore) -> bool {
        let target = value::lookup(values, &self.field_id);
        self.operator.apply(target, &self.value)
    }
}

/// Visibility rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    #[serde(default)]
    pub show_if: Vec<Condition>,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub logic: Logic,
}

impl ConditionalRule {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            show_if: conditions,
            logic: Logic::And,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            show_if: conditions,
            logic: Logic::Or,
        }
    }

    /// Every condition is evaluated against the same snapshot of values.
    pub fn evaluate(&self, values: &ValueStore) -> bool {
        let mut results = self.show_if.iter().map(|condition| condition.evaluate(values));
        match self.logic {
            Logic::And => results.all(|passed| passed),
            Logic::Or => results.any(|passed| passed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> ValueStore {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn contains_requires_a_string_target() {
        let values = store(json!({ "name": "hello world", "tags": ["world"] }));
        let on_text = Condition::new("name", Operator::Contains, json!("world"));
        let on_list = Condition::new("tags", Operator::Contains, json!("world"));
        assert!(on_text.evaluate(&values));
        assert!(!on_list.evaluate(&values));
    }

    #[test]
    fn contains_without_an_operand_matches_nothing() {
        let values = store(json!({ "name": "hello world" }));
        let explicit = Condition::new("name", Operator::Contains, Value::Null);
        assert!(!explicit.evaluate(&values));

        let omitted: Condition =
            serde_json::from_value(json!({ "fieldId": "name", "operator": "contains" }))
                .expect("condition");
        assert!(!omitted.evaluate(&values));
        assert!(Condition::new("name", Operator::Contains, json!("")).evaluate(&values));
    }

    #[test]
    fn numeric_comparisons_coerce_and_fail_quietly() {
        let values = store(json!({ "budget": "1500", "name": "abc" }));
        assert!(Condition::new("budget", Operator::GreaterThan, json!(1000)).evaluate(&values));
        assert!(!Condition::new("budget", Operator::LessThan, json!("1000")).evaluate(&values));
        assert!(!Condition::new("name", Operator::GreaterThan, json!(0)).evaluate(&values));
        assert!(!Condition::new("name", Operator::LessThan, json!(0)).evaluate(&values));
    }

    #[test]
    fn equality_is_strict() {
        let values = store(json!({ "count": 42 }));
        assert!(Condition::new("count", Operator::Equals, json!(42)).evaluate(&values));
        assert!(!Condition::new("count", Operator::Equals, json!("42")).evaluate(&values));
        assert!(Condition::new("count", Operator::NotEquals, json!("42")).evaluate(&values));
    }

    #[test]
    fn missing_logic_means_and() {
        let rule: ConditionalRule = serde_json::from_value(json!({
            "showIf": [{ "fieldId": "a", "operator": "is_empty" }]
        }))
        .expect("deserialize");
        assert_eq!(rule.logic, Logic::And);

        let rule: ConditionalRule = serde_json::from_value(json!({
            "showIf": [],
            "logic": "xor"
        }))
        .expect("deserialize");
        assert_eq!(rule.logic, Logic::And);
    }

    #[test]
    fn unknown_operators_never_match() {
        let condition: Condition = serde_json::from_value(json!({
            "fieldId": "a",
            "operator": "starts_with",
            "value": "x"
        }))
        .expect("deserialize");
        assert_eq!(condition.operator, Operator::Unknown("starts_with".into()));
        assert!(!condition.evaluate(&store(json!({ "a": "xyz" }))));
    }
}
