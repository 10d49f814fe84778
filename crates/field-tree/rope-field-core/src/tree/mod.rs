//! Instantiated field tree.
//!
//! Nodes live in an arena owned by [`FieldTree`]; the root (index 0) is the
//! problem. Every instantiation draws fresh [`FieldId`]s, so trees built from
//! the same blueprint never alias.

mod scoring;
mod slots;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;

use rope_api_core::config::Config;
use rope_api_core::dtype::DType;
use rope_api_core::error::IllPosedError;
use rope_api_core::{FieldId, Value};

use crate::blueprint::{FieldBlueprint, FieldKind};
use crate::template::{format_template, placeholders};
use crate::widget::Widget;

const ROOT: usize = 0;

/// What a widget currently holds: text typed by the learner, or a value
/// written by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Answer {
    Raw(String),
    Parsed(Value),
}

impl Answer {
    fn display(&self) -> String {
        match self {
            Answer::Raw(text) => text.clone(),
            Answer::Parsed(value) => value.to_string(),
        }
    }
}

/// The value pipelines every field exposes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Value,
    TheSolution,
    ASolution,
    Solution,
}

/// Visibility switches of widget state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShowFlag {
    Solution,
    Score,
    MaxScore,
    Correct,
}

impl ShowFlag {
    pub fn attribute(&self) -> &'static str {
        match self {
            ShowFlag::Solution => "show_solution",
            ShowFlag::Score => "show_score",
            ShowFlag::MaxScore => "show_max_score",
            ShowFlag::Correct => "show_correct",
        }
    }
}

/// Change notifications staged for the frontend.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FieldEvent {
    AttributeChanged {
        widget: FieldId,
        attribute: &'static str,
        value: serde_json::Value,
    },
    ValidationFailed {
        widget: FieldId,
        field: FieldId,
        message: String,
    },
}

#[derive(Clone, Debug, Default)]
struct WidgetState {
    widget: Option<Widget>,
    value: Option<Answer>,
    valid: Option<bool>,
    the_solution: Option<Value>,
    a_solution: Option<Value>,
    solution: Option<Value>,
    displayed_score: Option<f64>,
    displayed_max_score: Option<f64>,
    correct: Option<bool>,
    show_solution: bool,
    show_score: bool,
    show_max_score: bool,
    show_correct: bool,
}

impl WidgetState {
    fn new(widget: &Widget) -> Self {
        WidgetState {
            value: widget.initial_value().map(Answer::Parsed),
            widget: Some(widget.clone()),
            ..WidgetState::default()
        }
    }

    fn show(&self, flag: ShowFlag) -> bool {
        match flag {
            ShowFlag::Solution => self.show_solution,
            ShowFlag::Score => self.show_score,
            ShowFlag::MaxScore => self.show_max_score,
            ShowFlag::Correct => self.show_correct,
        }
    }
}

#[derive(Clone, Debug)]
struct FieldNode {
    id: FieldId,
    name: String,
    parent: Option<usize>,
    kind: FieldKind,
    dtype: Option<DType>,
    template: String,
    ifields: IndexMap<String, usize>,
    ofields: BTreeSet<String>,
    treat_none_manually: bool,
    widget: Option<WidgetState>,
}

pub struct FieldTree {
    nodes: Vec<FieldNode>,
    config: Arc<Config>,
    events: Vec<FieldEvent>,
    notify: bool,
}

impl FieldTree {
    /// Build fresh state for one attempt. Checks that every declared
    /// sub-field is named exactly once by its template and that all data
    /// types and widgets are well formed.
    pub fn instantiate(
        blueprint: &FieldBlueprint,
        config: Arc<Config>,
    ) -> Result<FieldTree, IllPosedError> {
        let mut tree = FieldTree {
            nodes: Vec::new(),
            config,
            events: Vec::new(),
            notify: false,
        };
        tree.build(blueprint, String::new(), None)?;
        debug!(
            "instantiated field tree: {} nodes, {} widgets",
            tree.nodes.len(),
            tree.nodes.iter().filter(|n| n.widget.is_some()).count()
        );
        Ok(tree)
    }

    fn build(
        &mut self,
        blueprint: &FieldBlueprint,
        name: String,
        parent: Option<usize>,
    ) -> Result<usize, IllPosedError> {
        if let Some(dtype) = &blueprint.dtype {
            dtype.validate()?;
        }
        let widget = match &blueprint.kind {
            FieldKind::Widget(widget) => {
                let widget = widget.resolve(&self.config);
                widget.validate()?;
                Some(WidgetState::new(&widget))
            }
            _ => None,
        };
        let idx = self.nodes.len();
        self.nodes.push(FieldNode {
            id: FieldId::fresh(),
            name,
            parent,
            kind: blueprint.kind.clone(),
            dtype: blueprint.dtype.clone(),
            template: blueprint.template.clone(),
            ifields: IndexMap::new(),
            ofields: BTreeSet::new(),
            treat_none_manually: blueprint.treat_none_manually,
            widget,
        });
        if blueprint.is_widget() {
            return Ok(idx);
        }

        let found = placeholders(&blueprint.template);
        for name in blueprint.children.keys() {
            match found.iter().filter(|p| &p.name == name).count() {
                0 => {
                    return Err(IllPosedError::new(format!(
                        "Missing input field '{name}' in template."
                    )))
                }
                1 => {}
                _ => {
                    return Err(IllPosedError::new(format!(
                        "Input field '{name}' appears more than once in template."
                    )))
                }
            }
        }
        if blueprint.kind == FieldKind::Single && blueprint.children.len() != 1 {
            return Err(IllPosedError::new(
                "A single valued field needs exactly one sub-field.",
            ));
        }

        let mut ifields = IndexMap::new();
        let mut ofields = BTreeSet::new();
        for placeholder in found {
            match blueprint.children.get(&placeholder.name) {
                Some(child) => {
                    let child_idx = self.build(child, placeholder.name.clone(), Some(idx))?;
                    ifields.insert(placeholder.name, child_idx);
                }
                None => {
                    ofields.insert(placeholder.name);
                }
            }
        }
        self.nodes[idx].ifields = ifields;
        self.nodes[idx].ofields = ofields;
        Ok(idx)
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn root_id(&self) -> FieldId {
        self.nodes[ROOT].id
    }

    /// Input field names in template order.
    pub fn field_names(&self) -> Vec<String> {
        self.nodes[ROOT].ifields.keys().cloned().collect()
    }

    /// Placeholders of the problem template that are not input fields.
    pub fn ofields(&self) -> &BTreeSet<String> {
        &self.nodes[ROOT].ofields
    }

    fn field_index(&self, name: &str) -> Result<usize, IllPosedError> {
        self.nodes[ROOT]
            .ifields
            .get(name)
            .copied()
            .ok_or_else(|| IllPosedError::new(format!("Unknown input field '{name}'.")))
    }

    fn widget_index(&self, id: FieldId) -> Result<usize, IllPosedError> {
        self.nodes
            .iter()
            .position(|n| n.id == id && n.widget.is_some())
            .ok_or_else(|| IllPosedError::new(format!("Unknown widget {id}.")))
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_index(name).ok().map(|idx| self.nodes[idx].id)
    }

    pub fn dtype(&self, name: &str) -> Option<&DType> {
        self.field_index(name)
            .ok()
            .and_then(|idx| self.nodes[idx].dtype.as_ref())
    }

    pub fn treat_none_manually(&self, name: &str) -> bool {
        self.field_index(name)
            .map(|idx| self.nodes[idx].treat_none_manually)
            .unwrap_or(false)
    }

    pub fn trivial_value(&self, name: &str) -> Option<Value> {
        self.dtype(name).and_then(DType::trivial_value)
    }

    pub fn dummy_value(&self, name: &str) -> Option<Value> {
        self.dtype(name).and_then(DType::dummy_value)
    }

    fn collect_widgets(&self, idx: usize, out: &mut Vec<usize>) {
        let node = &self.nodes[idx];
        if node.widget.is_some() {
            out.push(idx);
            return;
        }
        for &child in node.ifields.values() {
            self.collect_widgets(child, out);
        }
    }

    fn widgets_below(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_widgets(idx, &mut out);
        out
    }

    /// Widget identifiers in template order.
    pub fn widgets(&self) -> Vec<FieldId> {
        self.widgets_below(ROOT)
            .into_iter()
            .map(|idx| self.nodes[idx].id)
            .collect()
    }

    /// Widgets belonging to input field `name`.
    pub fn field_widgets(&self, name: &str) -> Vec<FieldId> {
        match self.field_index(name) {
            Ok(idx) => self
                .widgets_below(idx)
                .into_iter()
                .map(|w| self.nodes[w].id)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn widget(&self, id: FieldId) -> Option<&Widget> {
        let idx = self.widget_index(id).ok()?;
        self.nodes[idx].widget.as_ref()?.widget.as_ref()
    }

    /// Outermost ancestor reached through single-child links, stopping below
    /// the problem.
    fn sole_child_top(&self, mut idx: usize) -> usize {
        while let Some(parent) = self.nodes[idx].parent {
            let p = &self.nodes[parent];
            if p.parent.is_none() || p.ifields.len() != 1 {
                break;
            }
            idx = parent;
        }
        idx
    }

    /// Ancestor directly below the problem.
    fn visible(&self, mut idx: usize) -> usize {
        while let Some(parent) = self.nodes[idx].parent {
            if self.nodes[parent].parent.is_none() {
                break;
            }
            idx = parent;
        }
        idx
    }

    /// Description of the data type a widget feeds.
    pub fn widget_info(&self, id: FieldId) -> Option<String> {
        let idx = self.widget_index(id).ok()?;
        let top = self.sole_child_top(idx);
        self.nodes[top].dtype.as_ref().map(DType::info)
    }

    /// Name of the input field a widget belongs to.
    pub fn widget_field(&self, id: FieldId) -> Option<&str> {
        let idx = self.widget_index(id).ok()?;
        Some(self.nodes[self.visible(idx)].name.as_str())
    }

    fn render(&self, idx: usize) -> Result<String, IllPosedError> {
        let node = &self.nodes[idx];
        if node.widget.is_some() {
            return Ok(format!("<<#{}>>", node.id));
        }
        let mut values = HashMap::new();
        for (name, &child) in &node.ifields {
            values.insert(name.clone(), self.render(child)?);
        }
        format_template(&node.template, &values)
    }

    /// Problem template with every widget replaced by `<<#id>>`; output
    /// fields stay as placeholders.
    pub fn render_template(&self) -> Result<String, IllPosedError> {
        self.render(ROOT)
    }

    pub fn set_notifications(&mut self, on: bool) {
        self.notify = on;
    }

    /// Events staged since the previous drain.
    pub fn drain_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, idx: usize, attribute: &'static str, value: serde_json::Value) {
        if self.notify {
            let widget = self.nodes[idx].id;
            self.events.push(FieldEvent::AttributeChanged {
                widget,
                attribute,
                value,
            });
        }
    }

    fn widget_state(&self, idx: usize) -> Option<&WidgetState> {
        self.nodes[idx].widget.as_ref()
    }

    fn widget_state_mut(&mut self, idx: usize) -> Option<&mut WidgetState> {
        self.nodes[idx].widget.as_mut()
    }

    /// Full attribute set of a widget, as announced on creation.
    pub fn widget_attributes(&self, id: FieldId) -> Vec<(&'static str, serde_json::Value)> {
        let Ok(idx) = self.widget_index(id) else {
            return Vec::new();
        };
        let Some(state) = self.widget_state(idx) else {
            return Vec::new();
        };
        let mut attrs = state
            .widget
            .as_ref()
            .map(Widget::attributes)
            .unwrap_or_default();
        attrs.push(("info", json!(self.widget_info(id))));
        attrs.push(("value", json!(state.value.as_ref().map(Answer::display))));
        attrs.push(("valid", json!(state.valid)));
        for flag in [
            ShowFlag::Solution,
            ShowFlag::Score,
            ShowFlag::MaxScore,
            ShowFlag::Correct,
        ] {
            attrs.push((flag.attribute(), json!(state.show(flag))));
        }
        attrs
    }
}

fn value_json(value: Option<&Value>) -> serde_json::Value {
    json!(value.map(Value::to_string))
}
