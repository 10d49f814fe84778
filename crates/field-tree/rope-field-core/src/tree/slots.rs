//! Value pipelines: reading assembles sub-field values bottom-up and checks
//! them, writing checks a value and distributes its parts top-down.

use indexmap::IndexMap;
use log::debug;
use serde_json::json;

use rope_api_core::error::{IllPosedError, RopeError, ValidationError};
use rope_api_core::{FieldId, Value};

use super::{value_json, Answer, FieldEvent, FieldTree, ShowFlag, Slot, ROOT};
use crate::compose;

impl FieldTree {
    /// Read `slot` of input field `name`. `Ok(None)` means some part is empty.
    pub fn get(&self, name: &str, slot: Slot) -> Result<Option<Value>, RopeError> {
        let idx = self.field_index(name)?;
        Ok(self.pull(idx, slot)?)
    }

    /// Write `slot` of input field `name`; `None` clears it.
    pub fn set(&mut self, name: &str, slot: Slot, value: Option<Value>) -> Result<(), RopeError> {
        let idx = self.field_index(name)?;
        self.push(idx, slot, value)
    }

    /// Current answers; unreadable ones count as missing.
    pub fn answers(&self) -> IndexMap<String, Option<Value>> {
        self.nodes[ROOT]
            .ifields
            .iter()
            .map(|(name, &idx)| (name.clone(), self.pull(idx, Slot::Value).ok().flatten()))
            .collect()
    }

    /// Why the current answer of `name` is rejected, if it is.
    pub fn validation_error(&self, name: &str) -> Option<ValidationError> {
        let idx = self.field_index(name).ok()?;
        self.pull(idx, Slot::Value).err()
    }

    /// Text typed into a widget by the learner.
    pub fn set_widget_text(&mut self, id: FieldId, raw: Option<String>) -> Result<(), IllPosedError> {
        let idx = self.widget_index(id)?;
        self.set_answer(idx, raw.map(Answer::Raw));
        Ok(())
    }

    pub fn widget_value(&self, id: FieldId) -> Option<&Answer> {
        let idx = self.widget_index(id).ok()?;
        self.widget_state(idx)?.value.as_ref()
    }

    pub fn widget_valid(&self, id: FieldId) -> Option<bool> {
        let idx = self.widget_index(id).ok()?;
        self.widget_state(idx)?.valid
    }

    pub fn widget_solution(&self, id: FieldId) -> Option<&Value> {
        let idx = self.widget_index(id).ok()?;
        self.widget_state(idx)?.solution.as_ref()
    }

    fn coerce(&self, idx: usize, value: Value) -> Result<Value, ValidationError> {
        let node = &self.nodes[idx];
        match &node.dtype {
            Some(dtype) => dtype
                .coerce(value, &self.config)
                .map_err(|e| e.at(node.id)),
            None => Ok(value),
        }
    }

    pub(super) fn pull(&self, idx: usize, slot: Slot) -> Result<Option<Value>, ValidationError> {
        let node = &self.nodes[idx];
        if let Some(state) = &node.widget {
            return Ok(match slot {
                Slot::Value => state.value.as_ref().map(|answer| match answer {
                    Answer::Raw(text) => Value::text(text.clone()),
                    Answer::Parsed(value) => value.clone(),
                }),
                Slot::TheSolution => state.the_solution.clone(),
                Slot::ASolution => state.a_solution.clone(),
                Slot::Solution => state.solution.clone(),
            });
        }

        let mut parts = IndexMap::with_capacity(node.ifields.len());
        for (name, &child) in &node.ifields {
            let child_state = self.nodes[child].widget.as_ref();
            let value = match (child_state, slot) {
                // raw learner text is parsed by the typed field right above it
                (Some(state), Slot::Value) => match &state.value {
                    Some(Answer::Raw(text)) => match &node.dtype {
                        Some(dtype) => dtype
                            .parse(text, &self.config)
                            .map_err(|e| e.at(node.id))?,
                        None => Some(Value::text(text.clone())),
                    },
                    Some(Answer::Parsed(value)) => Some(value.clone()),
                    None => None,
                },
                _ => self.pull(child, slot)?,
            };
            match value {
                Some(value) => {
                    parts.insert(name.clone(), value);
                }
                None => return Ok(None),
            }
        }
        let value = compose::assemble(&node.kind, parts).map_err(|e| e.at(node.id))?;
        self.coerce(idx, value).map(Some)
    }

    pub(super) fn push(
        &mut self,
        idx: usize,
        slot: Slot,
        value: Option<Value>,
    ) -> Result<(), RopeError> {
        if self.nodes[idx].widget.is_some() {
            return self.write_widget(idx, slot, value);
        }
        let Some(value) = value else {
            let children: Vec<usize> = self.nodes[idx].ifields.values().copied().collect();
            for child in children {
                self.push(child, slot, None)?;
            }
            return Ok(());
        };
        let value = self.coerce(idx, value)?;
        let node = &self.nodes[idx];
        let id = node.id;
        let names: Vec<String> = node.ifields.keys().cloned().collect();
        let parts = compose::disassemble(&node.kind, &names, value).map_err(|e| e.at(id))?;
        for (name, part) in parts {
            let child = self.nodes[idx].ifields.get(&name).copied().ok_or_else(|| {
                ValidationError::new(format!("Unknown input field '{name}'.")).at(id)
            })?;
            self.push(child, slot, Some(part))?;
        }
        Ok(())
    }

    fn write_widget(&mut self, idx: usize, slot: Slot, value: Option<Value>) -> Result<(), RopeError> {
        match slot {
            Slot::Value => {
                self.set_answer(idx, value.map(Answer::Parsed));
                Ok(())
            }
            Slot::Solution => {
                self.set_solution(idx, value);
                Ok(())
            }
            Slot::TheSolution | Slot::ASolution => {
                let name = self.nodes[self.visible(idx)].name.clone();
                let Some(state) = self.widget_state_mut(idx) else {
                    return Ok(());
                };
                if slot == Slot::TheSolution {
                    state.the_solution = value.clone();
                } else {
                    state.a_solution = value.clone();
                }
                if value.is_none() {
                    return Ok(());
                }
                if state.solution.is_some() {
                    return Err(IllPosedError::new(format!(
                        "Contradicting solutions for input field {name}."
                    ))
                    .into());
                }
                self.set_solution(idx, value);
                Ok(())
            }
        }
    }

    fn set_solution(&mut self, idx: usize, value: Option<Value>) {
        let Some(state) = self.widget_state_mut(idx) else {
            return;
        };
        state.solution = value;
        if state.show(ShowFlag::Solution) {
            let payload = value_json(state.solution.as_ref());
            self.emit(idx, "solution", payload);
        }
    }

    fn set_answer(&mut self, idx: usize, answer: Option<Answer>) {
        let Some(state) = self.widget_state_mut(idx) else {
            return;
        };
        if state.value == answer {
            return;
        }
        let is_empty = match &answer {
            None => true,
            Some(Answer::Raw(text)) => text.trim().is_empty(),
            Some(Answer::Parsed(_)) => false,
        };
        let display = answer.as_ref().map(Answer::display);
        state.value = answer;
        self.emit(idx, "value", json!(display));

        let top = self.sole_child_top(idx);
        let valid = match self.pull(top, Slot::Value) {
            Ok(_) => (!is_empty).then_some(true),
            Err(err) => {
                debug!("widget {} rejected: {}", self.nodes[idx].id, err.message);
                if self.notify {
                    self.events.push(FieldEvent::ValidationFailed {
                        widget: self.nodes[idx].id,
                        field: err.field.unwrap_or(self.nodes[top].id),
                        message: err.message,
                    });
                }
                Some(false)
            }
        };
        if let Some(state) = self.widget_state_mut(idx) {
            state.valid = valid;
        }
        self.emit(idx, "valid", json!(valid));
    }
}
