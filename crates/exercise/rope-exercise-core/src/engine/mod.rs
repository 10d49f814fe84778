//! Per-attempt evaluation of an exercise.
//!
//! [`ParametrizedExercise`] computes its stages on first demand and keeps
//! them: parameters, the field tree, solutions, weights, maximal scores,
//! scores and correctness. Later stages pull earlier ones in, so stages run
//! in this order whatever is asked for first. Only scores depend on the
//! answers; writing an answer drops them.

mod scores;
mod solutions;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use rope_api_core::config::Config;
use rope_api_core::error::{IllPosedError, RopeError};
use rope_api_core::{FieldId, Value};
use rope_field_core::{FieldEvent, FieldTree, Slot};

use crate::callback::Kwargs;
use crate::exercise::{check_difficulty, Exercise, Metadata};
use crate::inputs::InputGenerator;

/// Values produced by the parameters callback.
pub type Params = IndexMap<String, Value>;
/// Answers keyed by input field; `None` is an empty answer.
pub type Answers = IndexMap<String, Option<Value>>;
/// Scores keyed by input field; `None` where the fields are not scored
/// individually.
pub type Scores = IndexMap<String, Option<f64>>;

/// Parameters shared by every exercise of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParameters {
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    /// Further values handed to the parameters callback.
    pub extra: Params,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        GlobalParameters {
            min_difficulty: 0.0,
            max_difficulty: 1.0,
            extra: Params::new(),
        }
    }
}

pub(crate) fn kwargs(params: &Params) -> Kwargs {
    params
        .iter()
        .map(|(name, value)| (name.clone(), Some(value.clone())))
        .collect()
}

#[derive(Default)]
struct Memo {
    parameters: Option<Params>,
    tree: Option<FieldTree>,
    preamble: Option<String>,
    hints: Option<Vec<String>>,
    the_solution: Option<Answers>,
    a_solution: Option<Answers>,
    /// Fields whose solution is an empty answer.
    none_solution: BTreeSet<String>,
    score_weights: Option<IndexMap<String, f64>>,
    max_scores: Option<(Scores, f64)>,
    scores: Option<(Scores, f64)>,
}

/// Record of every stage of one attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub id: Option<String>,
    pub parameters: Params,
    pub answers: Answers,
    pub solution: Answers,
    pub max_scores: Scores,
    pub scores: Scores,
    pub max_total_score: f64,
    pub total_score: f64,
    pub correct: IndexMap<String, Option<bool>>,
}

pub struct ParametrizedExercise {
    exercise: Arc<Exercise>,
    global: GlobalParameters,
    config: Arc<Config>,
    difficulty: Option<f64>,
    rng: StdRng,
    notify: bool,
    memo: Memo,
}

impl ParametrizedExercise {
    pub fn new(exercise: Arc<Exercise>) -> Self {
        ParametrizedExercise {
            exercise,
            global: GlobalParameters::default(),
            config: Config::shared_default(),
            difficulty: None,
            rng: StdRng::from_entropy(),
            notify: false,
            memo: Memo::default(),
        }
    }

    pub fn with_global_parameters(mut self, global: GlobalParameters) -> Self {
        self.global = global;
        self
    }

    pub fn with_config(mut self, config: Arc<Config>) -> Self {
        self.config = config;
        self
    }

    /// Fix the difficulty instead of drawing it.
    pub fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Reproducible parameters, mainly for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn exercise(&self) -> &Arc<Exercise> {
        &self.exercise
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn id(&self) -> Option<String> {
        self.exercise.id()
    }

    pub fn metadata(&self) -> &Metadata {
        self.exercise.metadata()
    }

    /// Stage widget change events for [`Self::drain_events`].
    pub fn set_notifications(&mut self, on: bool) {
        self.notify = on;
        if let Some(tree) = self.memo.tree.as_mut() {
            tree.set_notifications(on);
        }
    }

    pub fn drain_events(&mut self) -> Vec<FieldEvent> {
        self.memo
            .tree
            .as_mut()
            .map(FieldTree::drain_events)
            .unwrap_or_default()
    }

    fn draw_difficulty(&mut self) -> Result<f64, IllPosedError> {
        if let Some(difficulty) = self.difficulty {
            return check_difficulty("difficulty", difficulty);
        }
        let settings = self.exercise.settings();
        settings.validate()?;
        let min = check_difficulty(
            "min_difficulty",
            settings.min_difficulty.unwrap_or(self.global.min_difficulty),
        )?;
        let max = check_difficulty(
            "max_difficulty",
            settings.max_difficulty.unwrap_or(self.global.max_difficulty),
        )?;
        if min > max {
            return Err(IllPosedError::new(format!(
                "'min_difficulty' ({min}) must not exceed 'max_difficulty' ({max})."
            )));
        }
        Ok(self.rng.gen_range(min..=max))
    }

    pub fn parameters(&mut self) -> Result<Params, RopeError> {
        if let Some(params) = &self.memo.parameters {
            return Ok(params.clone());
        }
        let difficulty = self.draw_difficulty()?;
        let mut available = kwargs(&self.global.extra);
        available.insert(
            "min_difficulty".into(),
            Some(Value::Real(self.global.min_difficulty)),
        );
        available.insert(
            "max_difficulty".into(),
            Some(Value::Real(self.global.max_difficulty)),
        );
        available.insert("difficulty".into(), Some(Value::Real(difficulty)));
        let params = self.exercise.parameters.apply(&available, &mut self.rng)?;
        debug!(
            "{}: parameters {:?} at difficulty {difficulty:.2}",
            self.exercise.name(),
            params.keys().collect::<Vec<_>>()
        );
        self.memo.parameters = Some(params.clone());
        Ok(params)
    }

    fn build_tree(&mut self) -> Result<FieldTree, RopeError> {
        let params = self.parameters()?;
        let blueprint = self.exercise.problem.apply(&kwargs(&params))?;
        let mut tree = FieldTree::instantiate(&blueprint, Arc::clone(&self.config))?;
        if let Some(missing) = tree.ofields().iter().find(|o| !params.contains_key(*o)) {
            return Err(IllPosedError::new(format!(
                "No parameter for output field '{missing}'."
            ))
            .into());
        }
        tree.set_notifications(self.notify);
        debug!(
            "{}: problem with fields {:?}",
            self.exercise.name(),
            tree.field_names()
        );
        Ok(tree)
    }

    /// The field tree of this attempt.
    pub fn tree(&mut self) -> Result<&mut FieldTree, RopeError> {
        let tree = match self.memo.tree.take() {
            Some(tree) => tree,
            None => self.build_tree()?,
        };
        Ok(self.memo.tree.insert(tree))
    }

    /// Problem template with widgets as `<<#id>>` and output fields left as
    /// placeholders.
    pub fn template(&mut self) -> Result<String, RopeError> {
        Ok(self.tree()?.render_template()?)
    }

    pub fn field_names(&mut self) -> Result<Vec<String>, RopeError> {
        Ok(self.tree()?.field_names())
    }

    pub fn widgets(&mut self) -> Result<Vec<FieldId>, RopeError> {
        Ok(self.tree()?.widgets())
    }

    pub fn preamble(&mut self) -> Result<String, RopeError> {
        if let Some(preamble) = &self.memo.preamble {
            return Ok(preamble.clone());
        }
        let params = self.parameters()?;
        let preamble = self.exercise.preamble.apply(&kwargs(&params))?;
        self.memo.preamble = Some(preamble.clone());
        Ok(preamble)
    }

    pub fn hints(&mut self) -> Result<Vec<String>, RopeError> {
        if let Some(hints) = &self.memo.hints {
            return Ok(hints.clone());
        }
        let params = self.parameters()?;
        let hints = self.exercise.hints.apply(&kwargs(&params))?.0;
        self.memo.hints = Some(hints.clone());
        Ok(hints)
    }

    pub fn trivial_input(&mut self) -> Result<Answers, RopeError> {
        let tree = self.tree()?;
        Ok(tree
            .field_names()
            .into_iter()
            .map(|name| {
                let value = tree.trivial_value(&name);
                (name, value)
            })
            .collect())
    }

    pub fn dummy_input(&mut self) -> Result<Answers, RopeError> {
        let tree = self.tree()?;
        Ok(tree
            .field_names()
            .into_iter()
            .map(|name| {
                let value = tree.dummy_value(&name);
                (name, value)
            })
            .collect())
    }

    pub fn answers(&mut self) -> Result<Answers, RopeError> {
        Ok(self.tree()?.answers())
    }

    /// Write answers into the tree. Fields not named keep their answer.
    pub fn set_answers(&mut self, answers: &Answers) -> Result<(), RopeError> {
        let tree = self.tree()?;
        for (name, value) in answers {
            tree.set(name, Slot::Value, value.clone())?;
        }
        self.memo.scores = None;
        Ok(())
    }

    /// Text typed into a widget. Invalid text is reported through the
    /// widget, not as an error.
    pub fn set_widget_value(&mut self, widget: FieldId, raw: Option<String>) -> Result<(), RopeError> {
        self.tree()?.set_widget_text(widget, raw)?;
        self.memo.scores = None;
        Ok(())
    }

    pub fn feedback(&mut self) -> Result<String, RopeError> {
        let params = self.parameters()?;
        let mut available = kwargs(&params);
        available.extend(self.answers()?);
        self.exercise.feedback.apply(&available)
    }

    /// Candidate answers for exercise tests: every combination of an empty
    /// answer, the trivial value, the dummy value and the sample solution.
    pub fn input_generator(&mut self) -> Result<InputGenerator, RopeError> {
        let names = self.field_names()?;
        let sources = [self.trivial_input()?, self.dummy_input()?, self.solution()?];
        let candidates = names
            .iter()
            .map(|name| {
                sources
                    .iter()
                    .filter_map(|source| source.get(name).cloned().flatten())
                    .collect()
            })
            .collect();
        Ok(InputGenerator::new(names, candidates))
    }

    pub fn summary(&mut self) -> Result<Summary, RopeError> {
        Ok(Summary {
            name: self.exercise.name().to_string(),
            id: self.id(),
            parameters: self.parameters()?,
            answers: self.answers()?,
            solution: self.solution()?,
            max_scores: self.max_scores()?,
            scores: self.scores()?,
            max_total_score: self.max_total_score()?,
            total_score: self.total_score()?,
            correct: self.correct()?,
        })
    }
}
