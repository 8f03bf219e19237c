use serde_json::{Value, json};

use super::{ChangeError, ChangeEvent, FieldContext, field_shell};
use crate::spec::field::FieldDefinition;
use crate::value;

/// Bounds and step of a slider.
///
/// `config` wins over `validation`, which wins over the 0..100 default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub fn for_field(field: &FieldDefinition) -> Self {
        let min = field.config.min.or(field.validation.min).unwrap_or(0.0);
        let max = field.config.max.or(field.validation.max).unwrap_or(100.0);
        let step = field
            .config
            .step
            .filter(|step| *step > 0.0 && step.is_finite())
            .unwrap_or(1.0);
        Self { min, max, step }
    }

    /// Clamps into range and snaps onto the step grid anchored at `min`.
    pub fn constrain(&self, number: f64) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        let clamped = number.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }

    /// Share of the track filled by `number`, in percent.
    pub fn percent(&self, number: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        (number - self.min) / (self.max - self.min) * 100.0
    }
}

/// Value displayed when nothing has been picked yet.
pub fn current_position(field: &FieldDefinition, current: Option<&Value>) -> f64 {
    let range = SliderRange::for_field(field);
    match current.map(value::to_number) {
        Some(number) if !number.is_nan() => number,
        _ => field.config.default_value.unwrap_or(range.min),
    }
}

pub fn render(field: &FieldDefinition, ctx: FieldContext<'_>) -> Value {
    let range = SliderRange::for_field(field);
    let position = current_position(field, ctx.value);
    let control = json!({
        "type": "range",
        "name": field.id,
        "min": range.min,
        "max": range.max,
        "step": range.step,
        "value": position,
        "percent": range.percent(position),
        "showValue": field.config.show_value.unwrap_or(true),
    });
    field_shell(field, ctx, control)
}

pub fn change(field: &FieldDefinition, event: ChangeEvent) -> Result<Value, ChangeError> {
    let range = SliderRange::for_field(field);
    let number = match event {
        ChangeEvent::Slide(number) => number,
        ChangeEvent::Input(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ChangeError::NotANumber(raw.clone()))?,
        other => return Err(ChangeError::mismatch(field, &other)),
    };
    if !number.is_finite() {
        return Err(ChangeError::NotANumber(number.to_string()));
    }
    Ok(value::number_value(range.constrain(number)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::FieldType;

    fn slider(min: Option<f64>, max: Option<f64>, step: Option<f64>) -> FieldDefinition {
        let mut field = FieldDefinition::new("budget", FieldType::Slider, "Budget");
        field.config.min = min;
        field.config.max = max;
        field.config.step = step;
        field
    }

    #[test]
    fn range_falls_back_to_validation_then_defaults() {
        let mut field = slider(None, None, None);
        assert_eq!(
            SliderRange::for_field(&field),
            SliderRange {
                min: 0.0,
                max: 100.0,
                step: 1.0
            }
        );
        field.validation.min = Some(5.0);
        field.config.max = Some(50.0);
        let range = SliderRange::for_field(&field);
        assert_eq!((range.min, range.max), (5.0, 50.0));
    }

    #[test]
    fn changes_clamp_and_snap() {
        let field = slider(Some(0.0), Some(1000.0), Some(50.0));
        assert_eq!(change(&field, ChangeEvent::Slide(1234.0)), Ok(json!(1000)));
        assert_eq!(change(&field, ChangeEvent::Slide(-3.0)), Ok(json!(0)));
        assert_eq!(change(&field, ChangeEvent::Slide(74.0)), Ok(json!(50)));
        assert_eq!(
            change(&field, ChangeEvent::Input("130".into())),
            Ok(json!(150))
        );
        assert!(change(&field, ChangeEvent::Input("lots".into())).is_err());
    }

    #[test]
    fn track_shows_percent_filled() {
        let field = slider(Some(10.0), Some(30.0), None);
        let element = render(&field, FieldContext::new(Some(&json!(15)), None));
        assert_eq!(element["control"]["percent"], 25.0);
        assert_eq!(element["control"]["showValue"], true);
    }

    #[test]
    fn unset_slider_shows_default_value() {
        let mut field = slider(None, None, None);
        field.config.default_value = Some(40.0);
        let element = render(&field, FieldContext::default());
        assert_eq!(element["control"]["value"], 40.0);
    }
}
