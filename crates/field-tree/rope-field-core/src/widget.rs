//! Input controls at the leaves of a field tree.
//!
//! A widget only describes the control; its answer, solution and score state
//! lives in the instantiated tree.

use serde::{Deserialize, Serialize};
use serde_json::json;

use rope_api_core::config::Config;
use rope_api_core::error::IllPosedError;
use rope_api_core::Value;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    Left,
    #[default]
    Right,
    Neither,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    Checkbox {
        checked: bool,
    },
    /// Radio buttons or a dropdown, settled by [`Widget::resolve`].
    Choice {
        options: Vec<Value>,
    },
    Dropdown {
        options: Vec<Value>,
    },
    RadioButtons {
        options: Vec<Value>,
        vertical: bool,
    },
    Slider {
        minimum: f64,
        maximum: f64,
        step: f64,
        width: u32,
        label_position: LabelPosition,
    },
    Text {
        placeholder: String,
        width: u32,
    },
    Textarea {
        placeholder: String,
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub kind: WidgetKind,
    #[serde(default)]
    pub description: String,
}

impl Widget {
    fn of(kind: WidgetKind) -> Self {
        Widget {
            kind,
            description: String::new(),
        }
    }

    pub fn checkbox() -> Self {
        Widget::of(WidgetKind::Checkbox { checked: false })
    }

    pub fn choice(options: Vec<Value>) -> Self {
        Widget::of(WidgetKind::Choice { options })
    }

    pub fn dropdown(options: Vec<Value>) -> Self {
        Widget::of(WidgetKind::Dropdown { options })
    }

    pub fn radio_buttons(options: Vec<Value>) -> Self {
        Widget::of(WidgetKind::RadioButtons {
            options,
            vertical: true,
        })
    }

    pub fn slider(minimum: f64, maximum: f64) -> Self {
        Widget::of(WidgetKind::Slider {
            minimum,
            maximum,
            step: 1.0,
            width: 25,
            label_position: LabelPosition::Right,
        })
    }

    pub fn text() -> Self {
        Widget::of(WidgetKind::Text {
            placeholder: String::new(),
            width: 20,
        })
    }

    pub fn textarea() -> Self {
        Widget::of(WidgetKind::Textarea {
            placeholder: String::new(),
            width: 50,
            height: 4,
        })
    }

    /// Concrete control for this widget under `config`. Short option lists
    /// get radio buttons, longer ones a dropdown.
    pub fn resolve(&self, config: &Config) -> Widget {
        match &self.kind {
            WidgetKind::Choice { options } => {
                let kind = if options.len() <= config.one_of_maximum_radio_buttons {
                    WidgetKind::RadioButtons {
                        options: options.clone(),
                        vertical: true,
                    }
                } else {
                    WidgetKind::Dropdown {
                        options: options.clone(),
                    }
                };
                Widget {
                    kind,
                    description: self.description.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            WidgetKind::Checkbox { .. } => "Checkbox",
            WidgetKind::Choice { .. } => "Choice",
            WidgetKind::Dropdown { .. } => "Dropdown",
            WidgetKind::RadioButtons { .. } => "RadioButtons",
            WidgetKind::Slider { .. } => "Slider",
            WidgetKind::Text { .. } => "Text",
            WidgetKind::Textarea { .. } => "Textarea",
        }
    }

    /// Value a fresh control starts with.
    pub fn initial_value(&self) -> Option<Value> {
        match self.kind {
            WidgetKind::Checkbox { checked } => Some(Value::Bool(checked)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), IllPosedError> {
        match &self.kind {
            WidgetKind::Slider {
                minimum,
                maximum,
                step,
                width,
                ..
            } => {
                if !(minimum.is_finite() && maximum.is_finite() && minimum <= maximum) {
                    return Err(IllPosedError::new(
                        "'minimum' and 'maximum' have to be real numbers where \
                         'maximum' is greater than or equal to 'minimum'.",
                    ));
                }
                if !(*step > 0.0) {
                    return Err(IllPosedError::new("'step' has to be a positive real number."));
                }
                if *width > 100 {
                    return Err(IllPosedError::new(
                        "'width' has to be an integer greater than or equal to 0 and \
                         less than or equal to 100.",
                    ));
                }
                Ok(())
            }
            WidgetKind::Choice { options }
            | WidgetKind::Dropdown { options }
            | WidgetKind::RadioButtons { options, .. }
                if options.is_empty() =>
            {
                Err(IllPosedError::new("A choice widget needs at least one option."))
            }
            _ => Ok(()),
        }
    }

    /// Control specific attributes announced when the widget is created.
    pub fn attributes(&self) -> Vec<(&'static str, serde_json::Value)> {
        let options = |options: &[Value]| {
            json!(options.iter().map(|o| o.to_string()).collect::<Vec<_>>())
        };
        let mut attrs = vec![("description", json!(self.description))];
        match &self.kind {
            WidgetKind::Checkbox { checked } => attrs.push(("checked", json!(checked))),
            WidgetKind::Choice { options: o } | WidgetKind::Dropdown { options: o } => {
                attrs.push(("options", options(o)))
            }
            WidgetKind::RadioButtons { options: o, vertical } => {
                attrs.push(("options", options(o)));
                attrs.push(("vertical", json!(vertical)));
            }
            WidgetKind::Slider {
                minimum,
                maximum,
                step,
                width,
                label_position,
            } => {
                attrs.push(("label_position", json!(label_position)));
                attrs.push(("maximum", json!(maximum)));
                attrs.push(("minimum", json!(minimum)));
                attrs.push(("step", json!(step)));
                attrs.push(("width", json!(width)));
            }
            WidgetKind::Text { placeholder, width } => {
                attrs.push(("placeholder", json!(placeholder)));
                attrs.push(("width", json!(width)));
            }
            WidgetKind::Textarea {
                placeholder,
                width,
                height,
            } => {
                attrs.push(("height", json!(height)));
                attrs.push(("placeholder", json!(placeholder)));
                attrs.push(("width", json!(width)));
            }
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_reject_inverted_slider_bounds() {
        assert!(Widget::slider(0.0, 10.0).validate().is_ok());
        assert!(Widget::slider(10.0, 0.0).validate().is_err());
    }

    #[test]
    fn it_should_start_checkboxes_unchecked() {
        assert_eq!(Widget::checkbox().initial_value(), Some(Value::Bool(false)));
        assert_eq!(Widget::text().initial_value(), None);
    }

    #[test]
    fn it_should_resolve_choices_by_option_count() {
        let options: Vec<Value> = (1..=3).map(Value::Int).collect();
        let choice = Widget::choice(options).with_description("pick");
        let config = Config {
            one_of_maximum_radio_buttons: 2,
            ..Config::default()
        };
        let narrow = choice.resolve(&config);
        assert_eq!(narrow.name(), "Dropdown");
        assert_eq!(narrow.description, "pick");
        assert_eq!(choice.resolve(&Config::default()).name(), "RadioButtons");
        assert_eq!(Widget::text().resolve(&config), Widget::text());
    }

    #[test]
    fn it_should_announce_control_attributes() {
        let attrs = Widget::radio_buttons(vec![Value::text("a"), Value::text("b")]).attributes();
        let names: Vec<_> = attrs.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["description", "options", "vertical"]);
        assert_eq!(attrs[1].1, json!(["a", "b"]));
    }
}
