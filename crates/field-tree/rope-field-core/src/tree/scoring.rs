//! Automatic scores, displayed scores and correctness bookkeeping.
//!
//! Automatic scoring compares at the input field level, so a composite such
//! as an elementwise complex number counts as one unit however many widgets
//! it spans.

use serde_json::json;

use rope_api_core::error::IllPosedError;
use rope_api_core::{FieldId, Value};

use super::{FieldTree, ShowFlag, Slot, ROOT};

#[derive(Copy, Clone)]
enum ScoreSlot {
    Score,
    MaxScore,
}

impl FieldTree {
    fn compare_at(&self, idx: usize, lhs: &Value, rhs: &Value) -> f64 {
        match &self.nodes[idx].dtype {
            Some(dtype) => dtype.compare(lhs, rhs),
            None if lhs == rhs => 1.0,
            None => 0.0,
        }
    }

    /// Score of `lhs` against `rhs` under the data type of field `name`.
    pub fn compare(&self, name: &str, lhs: &Value, rhs: &Value) -> Result<f64, IllPosedError> {
        let idx = self.field_index(name)?;
        Ok(self.compare_at(idx, lhs, rhs))
    }

    /// Mean of the per-field comparisons of two answer dictionaries.
    pub fn compare_problem(&self, lhs: &Value, rhs: &Value) -> f64 {
        let (Value::Dict(lhs), Value::Dict(rhs)) = (lhs, rhs) else {
            return 0.0;
        };
        let fields = &self.nodes[ROOT].ifields;
        if fields.is_empty() {
            return 1.0;
        }
        let lookup = |pairs: &[(Value, Value)], name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k.as_text() == Some(name))
                .map(|(_, v)| v.clone())
        };
        let total: f64 = fields
            .iter()
            .map(|(name, &idx)| match (lookup(lhs, name), lookup(rhs, name)) {
                (Some(a), Some(b)) => self.compare_at(idx, &a, &b),
                _ => 0.0,
            })
            .sum();
        total / fields.len() as f64
    }

    /// Number of widgets of input field `name`.
    pub fn widget_count(&self, name: &str) -> usize {
        self.field_index(name)
            .map(|idx| self.widgets_below(idx).len())
            .unwrap_or(0)
    }

    /// Maximal score of `name`: its sample solution compared to itself.
    pub fn auto_max_score(&self, name: &str) -> Result<f64, IllPosedError> {
        let idx = self.field_index(name)?;
        let solution = self.pull(idx, Slot::Solution).map_err(|e| {
            IllPosedError::new(format!("Invalid sample solution for {name}: {e}"))
        })?;
        let Some(solution) = solution else {
            return Err(IllPosedError::new(format!(
                "Automatic setting of maximal score for {name} needs a sample solution."
            )));
        };
        Ok(self.compare_at(idx, &solution, &solution))
    }

    /// Score of the current answer of `name` against its unique solution.
    /// Empty or invalid answers score 0. Updates the correctness flags.
    pub fn auto_score(&mut self, name: &str) -> Result<f64, IllPosedError> {
        let idx = self.field_index(name)?;
        let the_solution = self.pull(idx, Slot::TheSolution).map_err(|e| {
            IllPosedError::new(format!("Invalid sample solution for {name}: {e}"))
        })?;
        let Some(the_solution) = the_solution else {
            return Err(IllPosedError::new(format!(
                "Automatic scoring for {name} needs a unique sample solution."
            )));
        };
        let answer = self.pull(idx, Slot::Value).ok().flatten();
        let Some(answer) = answer else {
            self.set_correct_at(idx, Some(false));
            return Ok(0.0);
        };
        let score = self.compare_at(idx, &answer, &the_solution);
        let max = self.auto_max_score(name)?;
        self.set_correct_at(idx, Some(score == max));
        Ok(score)
    }

    fn push_score(&mut self, idx: usize, which: ScoreSlot, value: Option<f64>) {
        if let Some(state) = self.widget_state_mut(idx) {
            let (attribute, shown) = match which {
                ScoreSlot::Score => {
                    state.displayed_score = value;
                    ("displayed_score", state.show_score)
                }
                ScoreSlot::MaxScore => {
                    state.displayed_max_score = value;
                    ("displayed_max_score", state.show_max_score)
                }
            };
            if shown {
                let processed = value.map(|v| self.config.score_processing.apply(v));
                self.emit(idx, attribute, json!(processed));
            }
            return;
        }
        // the whole score sits on the last sub-field
        let children: Vec<usize> = self.nodes[idx].ifields.values().copied().collect();
        if let Some((last, rest)) = children.split_last() {
            for &child in rest {
                self.push_score(child, which, None);
            }
            self.push_score(*last, which, value);
        }
    }

    /// Show `score` on the last widget of `name`; earlier widgets show none.
    pub fn set_displayed_score(&mut self, name: &str, score: Option<f64>) -> Result<(), IllPosedError> {
        let idx = self.field_index(name)?;
        self.push_score(idx, ScoreSlot::Score, score);
        Ok(())
    }

    pub fn set_displayed_max_score(
        &mut self,
        name: &str,
        score: Option<f64>,
    ) -> Result<(), IllPosedError> {
        let idx = self.field_index(name)?;
        self.push_score(idx, ScoreSlot::MaxScore, score);
        Ok(())
    }

    /// Displayed score of a widget after score processing.
    pub fn displayed_score(&self, id: FieldId) -> Option<f64> {
        let idx = self.widget_index(id).ok()?;
        let raw = self.widget_state(idx)?.displayed_score?;
        Some(self.config.score_processing.apply(raw))
    }

    pub fn displayed_max_score(&self, id: FieldId) -> Option<f64> {
        let idx = self.widget_index(id).ok()?;
        let raw = self.widget_state(idx)?.displayed_max_score?;
        Some(self.config.score_processing.apply(raw))
    }

    fn correct_at(&self, idx: usize) -> Option<bool> {
        let mut all = true;
        for widget in self.widgets_below(idx) {
            match self.widget_state(widget).and_then(|s| s.correct) {
                None => return None,
                Some(flag) => all &= flag,
            }
        }
        Some(all)
    }

    fn set_correct_at(&mut self, idx: usize, correct: Option<bool>) {
        for widget in self.widgets_below(idx) {
            if let Some(state) = self.widget_state_mut(widget) {
                state.correct = correct;
                if state.show_correct {
                    self.emit(widget, "correct", json!(correct));
                }
            }
        }
    }

    /// `None` while any widget of `name` is undecided.
    pub fn correct(&self, name: &str) -> Option<bool> {
        self.field_index(name).ok().and_then(|idx| self.correct_at(idx))
    }

    pub fn set_correct(&mut self, name: &str, correct: Option<bool>) -> Result<(), IllPosedError> {
        let idx = self.field_index(name)?;
        self.set_correct_at(idx, correct);
        Ok(())
    }

    pub fn widget_correct(&self, id: FieldId) -> Option<bool> {
        let idx = self.widget_index(id).ok()?;
        self.widget_state(idx)?.correct
    }

    /// Toggle a visibility switch on every widget. Switching on also
    /// publishes the value it reveals.
    pub fn set_show(&mut self, flag: ShowFlag, on: bool) {
        let processing = self.config.score_processing;
        for idx in self.widgets_below(ROOT) {
            let Some(state) = self.widget_state_mut(idx) else {
                continue;
            };
            match flag {
                ShowFlag::Solution => state.show_solution = on,
                ShowFlag::Score => state.show_score = on,
                ShowFlag::MaxScore => state.show_max_score = on,
                ShowFlag::Correct => state.show_correct = on,
            }
            let revealed = match flag {
                ShowFlag::Solution => ("solution", super::value_json(state.solution.as_ref())),
                ShowFlag::Score => (
                    "displayed_score",
                    json!(state
                        .displayed_score
                        .map(|v| processing.apply(v))),
                ),
                ShowFlag::MaxScore => (
                    "displayed_max_score",
                    json!(state
                        .displayed_max_score
                        .map(|v| processing.apply(v))),
                ),
                ShowFlag::Correct => ("correct", json!(state.correct)),
            };
            self.emit(idx, flag.attribute(), json!(on));
            if on {
                self.emit(idx, revealed.0, revealed.1);
            }
        }
    }
}
