//! Score weights, maximal scores, scores and correctness.
//!
//! The scores callback may answer in four shapes (see [`ScoreOutput`]). It
//! is first probed with the dummy input to learn the shape, then called
//! with the sample solution for maximal scores or with the answers for
//! scores. Weights apply to per-field scores only; a number or pair is
//! taken as the total as it is.

use std::mem;

use indexmap::IndexMap;
use log::debug;

use rope_api_core::error::{IllPosedError, RopeError};

use super::{kwargs, Answers, Params, ParametrizedExercise, Scores};
use crate::exercise::Weights;
use crate::outputs::{FieldScore, ScoreOutput};

fn same_shape(probe: &ScoreOutput, output: &ScoreOutput) -> bool {
    mem::discriminant(probe) == mem::discriminant(output)
}

fn shape_error() -> RopeError {
    IllPosedError::new(
        "If implemented, the score method must return a number, a pair of numbers or a \
         dictionary with values of this type, where number is either an int or a float.",
    )
    .into()
}

impl ParametrizedExercise {
    pub fn score_weights(&mut self) -> Result<IndexMap<String, f64>, RopeError> {
        if let Some(weights) = &self.memo.score_weights {
            return Ok(weights.clone());
        }
        let names = self.field_names()?;
        let weights: IndexMap<String, f64> = match &self.exercise.settings().weights {
            Weights::Uniform(weight) => names.iter().map(|n| (n.clone(), *weight)).collect(),
            Weights::PerField(given) => {
                if let Some(unknown) = given.keys().find(|key| !names.contains(key)) {
                    return Err(IllPosedError::new(format!(
                        "All keys of 'weights' have to match an input field. \
                         There is no input field '{unknown}'."
                    ))
                    .into());
                }
                names
                    .iter()
                    .map(|n| (n.clone(), given.get(n).copied().unwrap_or(1.0)))
                    .collect()
            }
        };
        self.memo.score_weights = Some(weights.clone());
        Ok(weights)
    }

    /// Call the scores callback with the parameters and `input`.
    pub(crate) fn call_scores(&self, params: &Params, input: &Answers) -> Result<ScoreOutput, RopeError> {
        let mut available = kwargs(params);
        available.extend(input.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.exercise.scores.apply(&available)
    }

    /// Shape of the scores callback, probed with the dummy input.
    pub fn score_output_probe(&mut self) -> Result<ScoreOutput, RopeError> {
        let params = self.parameters()?;
        let dummy = self.dummy_input()?;
        self.call_scores(&params, &dummy)
    }

    pub fn max_scores(&mut self) -> Result<Scores, RopeError> {
        Ok(self.max_score_stage()?.0)
    }

    pub fn max_total_score(&mut self) -> Result<f64, RopeError> {
        Ok(self.max_score_stage()?.1)
    }

    pub fn scores(&mut self) -> Result<Scores, RopeError> {
        Ok(self.score_stage()?.0)
    }

    pub fn total_score(&mut self) -> Result<f64, RopeError> {
        Ok(self.score_stage()?.1)
    }

    fn max_score_stage(&mut self) -> Result<(Scores, f64), RopeError> {
        if let Some(stage) = &self.memo.max_scores {
            return Ok(stage.clone());
        }
        let stage = self.compute_max_scores()?;
        debug!(
            "{}: maximal total score {}",
            self.exercise.name(),
            stage.1
        );
        self.memo.max_scores = Some(stage.clone());
        Ok(stage)
    }

    fn score_stage(&mut self) -> Result<(Scores, f64), RopeError> {
        if let Some(stage) = &self.memo.scores {
            return Ok(stage.clone());
        }
        let stage = self.compute_scores()?;
        debug!("{}: total score {}", self.exercise.name(), stage.1);
        self.memo.scores = Some(stage.clone());
        Ok(stage)
    }

    /// A total without per-field split. A single field shows it.
    fn whole(&mut self, names: &[String], total: f64, max: bool) -> Result<(Scores, f64), RopeError> {
        let tree = self.tree()?;
        if let [name] = names {
            if max {
                tree.set_displayed_max_score(name, Some(total))?;
            } else {
                tree.set_displayed_score(name, Some(total))?;
            }
            return Ok((Scores::from([(name.clone(), Some(total))]), total));
        }
        Ok((names.iter().map(|n| (n.clone(), None)).collect(), total))
    }

    fn compute_max_scores(&mut self) -> Result<(Scores, f64), RopeError> {
        let expected_empty = self.none_solution_fields()?;
        let solution: Answers = self
            .solution()?
            .into_iter()
            .filter(|(name, _)| !expected_empty.contains(name))
            .collect();
        let params = self.parameters()?;
        let dummy = self.dummy_input()?;
        let weights = self.score_weights()?;
        let names = self.field_names()?;

        let probe = self.call_scores(&params, &dummy)?;
        if matches!(probe, ScoreOutput::Auto | ScoreOutput::Total(_)) {
            if let Some((name, _)) = solution.iter().find(|(_, value)| value.is_none()) {
                return Err(IllPosedError::new(format!(
                    "Unable to determine maximal score for input field '{name}'."
                ))
                .into());
            }
        }

        let per_field = match probe {
            ScoreOutput::Auto => None,
            ScoreOutput::Pair(_, max) => return self.whole(&names, max, true),
            ScoreOutput::Total(_) | ScoreOutput::Fields(_) => {
                let mut input: Answers = solution
                    .iter()
                    .map(|(name, value)| {
                        let value = value
                            .clone()
                            .or_else(|| dummy.get(name).cloned().flatten());
                        (name.clone(), value)
                    })
                    .collect();
                for name in &expected_empty {
                    input.insert(name.clone(), None);
                }
                match (&probe, self.call_scores(&params, &input)?) {
                    (ScoreOutput::Total(_), ScoreOutput::Total(max)) => {
                        return self.whole(&names, max, true)
                    }
                    (ScoreOutput::Fields(_), ScoreOutput::Fields(given)) => Some(given),
                    _ => return Err(shape_error()),
                }
            }
        };

        let tree = self.tree()?;
        let mut max_scores = Scores::new();
        let mut total = 0.0;
        for name in &names {
            let given = per_field
                .as_ref()
                .and_then(|given| given.get(name).copied().flatten())
                .filter(|_| !matches!(solution.get(name), Some(None)));
            let unit = match given {
                Some(FieldScore::Score(max)) | Some(FieldScore::Pair(_, max)) => max,
                None if expected_empty.contains(name) => tree.field_widgets(name).len() as f64,
                None => tree.auto_max_score(name)?,
            };
            let max = unit * weights.get(name).copied().unwrap_or(1.0);
            tree.set_displayed_max_score(name, Some(max))?;
            max_scores.insert(name.clone(), Some(max));
            total += max;
        }
        Ok((max_scores, total))
    }

    fn compute_scores(&mut self) -> Result<(Scores, f64), RopeError> {
        let expected_empty = self.none_solution_fields()?;
        let params = self.parameters()?;
        let dummy = self.dummy_input()?;
        let weights = self.score_weights()?;
        let names = self.field_names()?;
        let answers = self.answers()?;

        let output = self.call_scores(&params, &dummy)?;
        let tree = self.tree()?;
        let filled: Vec<String> = answers
            .iter()
            .filter(|(name, value)| value.is_none() && !tree.treat_none_manually(name))
            .map(|(name, _)| name.clone())
            .collect();
        let per_field = matches!(output, ScoreOutput::Fields(_));
        let single = names.len() == 1 && !matches!(output, ScoreOutput::Auto);

        let mut input = answers.clone();
        if per_field || single {
            for name in &filled {
                input.insert(name.clone(), dummy.get(name).cloned().flatten());
            }
        }
        let mut scores = self.call_scores(&params, &input)?;
        if !same_shape(&output, &scores) {
            return Err(shape_error());
        }

        // dummy stand-ins never earn points
        if let (true, ScoreOutput::Fields(given)) = (per_field, &mut scores) {
            for name in &filled {
                if let Some(entry) = given.get_mut(name) {
                    *entry = Some(match entry {
                        Some(FieldScore::Pair(_, max)) => FieldScore::Pair(0.0, *max),
                        _ => FieldScore::Score(0.0),
                    });
                }
            }
        }
        if single {
            if let Some(name) = filled.first() {
                let zero = match (&output, &scores) {
                    (ScoreOutput::Pair(..), ScoreOutput::Pair(_, max)) => FieldScore::Pair(0.0, *max),
                    _ => FieldScore::Score(0.0),
                };
                scores = ScoreOutput::Fields(IndexMap::from([(name.clone(), Some(zero))]));
            }
        }

        let given = match scores {
            ScoreOutput::Total(total) | ScoreOutput::Pair(total, _) => {
                return self.whole(&names, total, false)
            }
            ScoreOutput::Auto => IndexMap::new(),
            ScoreOutput::Fields(given) => given,
        };

        let tree = self.tree()?;
        let mut scores = Scores::new();
        let mut total = 0.0;
        for name in &names {
            let unit = match given.get(name).copied().flatten() {
                Some(FieldScore::Score(score)) | Some(FieldScore::Pair(score, _)) => score,
                None if expected_empty.contains(name) => {
                    if matches!(answers.get(name), Some(None)) {
                        tree.field_widgets(name).len() as f64
                    } else {
                        0.0
                    }
                }
                None => tree.auto_score(name)?,
            };
            let score = unit * weights.get(name).copied().unwrap_or(1.0);
            tree.set_displayed_score(name, Some(score))?;
            scores.insert(name.clone(), Some(score));
            total += score;
        }
        Ok((scores, total))
    }

    /// Correctness per field: score equals maximal score. A flag already set
    /// on a field is kept.
    pub fn correct(&mut self) -> Result<IndexMap<String, Option<bool>>, RopeError> {
        let max_scores = self.max_scores()?;
        let scores = self.scores()?;
        let tree = self.tree()?;
        let mut correct = IndexMap::new();
        for name in tree.field_names() {
            let score = scores.get(&name).copied().flatten();
            let max = max_scores.get(&name).copied().flatten();
            let flag = match (tree.correct(&name), score, max) {
                (None, Some(score), Some(max)) => {
                    let flag = score == max;
                    tree.set_correct(&name, Some(flag))?;
                    Some(flag)
                }
                (cached, _, _) => cached,
            };
            correct.insert(name, flag);
        }
        Ok(correct)
    }
}
