//! Automated checks an exercise author runs against an exercise.
//!
//! [`ExerciseTestSuite::run`] evaluates the exercise in fresh attempts, with
//! its sample solution and with every input the [`InputGenerator`] yields,
//! and collects one [`CheckResult`] per named check. Authoring errors raised
//! along the way fail the check that hit them.
//!
//! [`InputGenerator`]: crate::inputs::InputGenerator

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use rope_api_core::config::Config;
use rope_api_core::error::RopeError;
use rope_field_core::placeholders;

use crate::engine::{kwargs, Answers, GlobalParameters, ParametrizedExercise};
use crate::exercise::{Exercise, Weights};
use crate::outputs::{FieldScore, ScoreOutput};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub exercise: String,
    pub checks: Vec<CheckResult>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Failed(_)))
    }

    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.checks.iter().find(|c| c.name == name).map(|c| &c.outcome)
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.exercise)?;
        for check in &self.checks {
            match &check.outcome {
                Outcome::Passed => writeln!(f, "  ok      {}", check.name)?,
                Outcome::Failed(msg) => writeln!(f, "  FAILED  {}: {msg}", check.name)?,
                Outcome::Skipped(why) => writeln!(f, "  skipped {}: {why}", check.name)?,
            }
        }
        Ok(())
    }
}

type Check = fn(&ExerciseTestSuite, &mut ParametrizedExercise) -> Result<Outcome, RopeError>;

const CHECKS: [(&str, Check); 12] = [
    ("parameters_have_defaults", ExerciseTestSuite::parameters_have_defaults),
    ("metadata", ExerciseTestSuite::metadata),
    ("score_weights", ExerciseTestSuite::score_weights),
    ("templates_resolve", ExerciseTestSuite::templates_resolve),
    ("maximal_total_score_is_stable", ExerciseTestSuite::maximal_total_score_is_stable),
    ("maximal_total_score_is_positive", ExerciseTestSuite::maximal_total_score_is_positive),
    ("maximal_scores_are_non_negative", ExerciseTestSuite::maximal_scores_are_non_negative),
    ("sample_solution_scores_maximal", ExerciseTestSuite::sample_solution_scores_maximal),
    ("score_bounds", ExerciseTestSuite::score_bounds),
    ("score_sum_equals_total_score", ExerciseTestSuite::score_sum_equals_total_score),
    ("score_return_values", ExerciseTestSuite::score_return_values),
    ("feedback_with_inputs", ExerciseTestSuite::feedback_with_inputs),
];

fn failed(message: impl Into<String>) -> Outcome {
    Outcome::Failed(message.into())
}

pub struct ExerciseTestSuite {
    exercise: Arc<Exercise>,
    config: Arc<Config>,
    global: GlobalParameters,
    repetitions: Option<usize>,
    seed: Option<u64>,
}

impl ExerciseTestSuite {
    pub fn new(exercise: Arc<Exercise>) -> Self {
        ExerciseTestSuite {
            exercise,
            config: Config::shared_default(),
            global: GlobalParameters::default(),
            repetitions: None,
            seed: None,
        }
    }

    pub fn with_config(mut self, config: Arc<Config>) -> Self {
        self.config = config;
        self
    }

    pub fn with_global_parameters(mut self, global: GlobalParameters) -> Self {
        self.global = global;
        self
    }

    /// Runs for the stability check and inputs per input check. Defaults to
    /// `maximum_test_repetitions`.
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Seed the attempts; run `i` uses `seed + i`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn repetitions(&self) -> usize {
        self.repetitions
            .unwrap_or(self.config.maximum_test_repetitions)
            .min(self.config.maximum_test_repetitions)
    }

    fn attempt(&self, run: u64) -> ParametrizedExercise {
        let pexercise = ParametrizedExercise::new(Arc::clone(&self.exercise))
            .with_config(Arc::clone(&self.config))
            .with_global_parameters(self.global.clone());
        match self.seed {
            Some(seed) => pexercise.with_seed(seed.wrapping_add(run)),
            None => pexercise,
        }
    }

    pub fn run(&self) -> TestReport {
        info!("{}: testing", self.exercise.name());
        let checks = CHECKS
            .iter()
            .map(|(name, check)| {
                let mut pexercise = self.attempt(0);
                let outcome = match check(self, &mut pexercise) {
                    Ok(outcome) => outcome,
                    Err(err) => failed(err.to_string()),
                };
                debug!("{}: {name} {outcome:?}", self.exercise.name());
                CheckResult { name, outcome }
            })
            .collect();
        TestReport {
            exercise: self.exercise.name().to_string(),
            checks,
        }
    }

    /// Apply every generated input in turn and run `check` on it. The first
    /// failing input ends the loop.
    fn with_inputs<F>(&self, pexercise: &mut ParametrizedExercise, mut check: F) -> Result<Outcome, RopeError>
    where
        F: FnMut(&mut ParametrizedExercise, &Answers) -> Result<Outcome, RopeError>,
    {
        let inputs: Vec<Answers> = pexercise
            .input_generator()?
            .take(self.repetitions())
            .collect();
        for input in &inputs {
            pexercise.set_answers(input)?;
            let outcome = check(pexercise, input)?;
            if outcome != Outcome::Passed {
                return Ok(outcome);
            }
        }
        Ok(Outcome::Passed)
    }

    fn parameters_have_defaults(&self, _: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        let missing: Vec<&str> = self
            .exercise
            .parameters_signature()
            .params()
            .iter()
            .filter(|p| p.default.is_none())
            .map(|p| p.name.as_str())
            .collect();
        Ok(match missing.first() {
            None => Outcome::Passed,
            Some(name) => failed(format!(
                "Argument '{name}' of 'parameters' must have a default value."
            )),
        })
    }

    fn metadata(&self, _: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        let mut problems = self.exercise.metadata().problems();
        if let Err(err) = self.exercise.settings().validate() {
            problems.push(err.to_string());
        }
        Ok(if problems.is_empty() {
            Outcome::Passed
        } else {
            failed(problems.join(" "))
        })
    }

    fn score_weights(&self, pexercise: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        let names = pexercise.field_names()?;
        match &self.exercise.settings().weights {
            Weights::Uniform(weight) if *weight <= 0.0 => {
                return Ok(failed(format!(
                    "Score weights have to be greater than 0, got {weight}."
                )))
            }
            Weights::Uniform(_) => {}
            Weights::PerField(given) => {
                for (name, weight) in given {
                    if !names.contains(name) {
                        return Ok(failed(format!(
                            "Cannot weight score. There is no input field named '{name}'."
                        )));
                    }
                    if *weight <= 0.0 {
                        return Ok(failed(format!(
                            "All score weights have to be greater than 0, got {weight}."
                        )));
                    }
                }
                let probe = pexercise.score_output_probe()?;
                if names.len() > 1 && matches!(probe, ScoreOutput::Total(_) | ScoreOutput::Pair(..)) {
                    return Ok(failed(
                        "It is only possible to weight scores of input fields individually \
                         if the score method returns an input-field-wise scoring.",
                    ));
                }
            }
        }
        Ok(Outcome::Passed)
    }

    fn templates_resolve(&self, pexercise: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        let params = pexercise.parameters()?;
        for ofield in placeholders(&pexercise.preamble()?) {
            if !params.contains_key(&ofield.name) {
                return Ok(failed(format!(
                    "There is no parameter for output field '{}' in the preamble string.",
                    ofield.name
                )));
            }
        }
        // output fields of the problem are checked while building the tree
        pexercise.template()?;

        let dummy = pexercise.dummy_input()?;
        let mut available = kwargs(&params);
        available.extend(dummy);
        let feedback = self.exercise.feedback.apply(&available)?;
        for ofield in placeholders(&feedback) {
            if !available.contains_key(&ofield.name) {
                return Ok(failed(format!(
                    "There is no parameter or answer for output field '{}' in the feedback string.",
                    ofield.name
                )));
            }
        }
        Ok(Outcome::Passed)
    }

    fn maximal_total_score_is_stable(
        &self,
        pexercise: &mut ParametrizedExercise,
    ) -> Result<Outcome, RopeError> {
        let expected = pexercise.max_total_score()?;
        for run in 1..self.repetitions() as u64 {
            let other = self.attempt(run).max_total_score()?;
            if other != expected {
                return Ok(failed(format!(
                    "The maximal total score must not change over different runs of an \
                     exercise, got {expected} and {other} as a maximal total score."
                )));
            }
        }
        Ok(Outcome::Passed)
    }

    fn maximal_total_score_is_positive(
        &self,
        pexercise: &mut ParametrizedExercise,
    ) -> Result<Outcome, RopeError> {
        Ok(if pexercise.max_total_score()? > 0.0 {
            Outcome::Passed
        } else {
            failed("The maximal total score is not positive.")
        })
    }

    fn maximal_scores_are_non_negative(
        &self,
        pexercise: &mut ParametrizedExercise,
    ) -> Result<Outcome, RopeError> {
        let max_scores = pexercise.max_scores()?;
        if max_scores.values().any(Option::is_none) {
            return Ok(Outcome::Skipped("input fields are not scored individually".into()));
        }
        for (name, max) in max_scores {
            if max.is_some_and(|max| max < 0.0) {
                return Ok(failed(format!(
                    "The maximal score for input field {name} is negative."
                )));
            }
        }
        Ok(Outcome::Passed)
    }

    fn sample_solution_scores_maximal(
        &self,
        pexercise: &mut ParametrizedExercise,
    ) -> Result<Outcome, RopeError> {
        let solution = pexercise.solution()?;
        let expected_empty = pexercise.none_solution_fields()?;
        if let Some((name, _)) = solution
            .iter()
            .find(|(name, value)| value.is_none() && !expected_empty.contains(name))
        {
            return Ok(Outcome::Skipped(format!("no sample solution for '{name}'")));
        }
        pexercise.set_answers(&solution)?;
        let max_scores = pexercise.max_scores()?;
        for (name, score) in pexercise.scores()? {
            let max = max_scores.get(&name).copied().flatten();
            if score.is_some() && score != max {
                return Ok(failed(format!(
                    "The sample solution for input field {name} does not get maximal score."
                )));
            }
        }
        if pexercise.total_score()? != pexercise.max_total_score()? {
            return Ok(failed("The sample solution does not get maximal total score."));
        }
        Ok(Outcome::Passed)
    }

    fn score_bounds(&self, pexercise: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        self.with_inputs(pexercise, |pexercise, input| {
            let total = pexercise.total_score()?;
            let max_total = pexercise.max_total_score()?;
            if total < 0.0 {
                return Ok(failed(format!("The total score is negative for {input:?}.")));
            }
            if total > max_total {
                return Ok(failed(format!(
                    "The total score is greater than the maximal total score for {input:?}."
                )));
            }
            let scores = pexercise.scores()?;
            if scores.values().any(Option::is_none) {
                return Ok(Outcome::Passed);
            }
            let max_scores = pexercise.max_scores()?;
            for (name, score) in scores {
                let score = score.unwrap_or_default();
                if score < 0.0 {
                    return Ok(failed(format!(
                        "The score for input field {name} is negative."
                    )));
                }
                if let Some(max) = max_scores.get(&name).copied().flatten() {
                    if score > max {
                        return Ok(failed(format!(
                            "The score for input field {name} is greater than the maximal score."
                        )));
                    }
                }
            }
            Ok(Outcome::Passed)
        })
    }

    fn score_sum_equals_total_score(
        &self,
        pexercise: &mut ParametrizedExercise,
    ) -> Result<Outcome, RopeError> {
        let probe = pexercise.score_output_probe()?;
        let fields = pexercise.field_names()?.len();
        if !matches!(probe, ScoreOutput::Fields(_)) && fields != 1 {
            return Ok(Outcome::Skipped("input fields are not scored individually".into()));
        }
        self.with_inputs(pexercise, |pexercise, input| {
            let sum: f64 = pexercise.scores()?.values().flatten().sum();
            let total = pexercise.total_score()?;
            Ok(if sum == total {
                Outcome::Passed
            } else {
                failed(format!(
                    "The sum of the input field scores ({sum}) is not equal to the total \
                     score ({total}) for {input:?}."
                ))
            })
        })
    }

    fn score_return_values(&self, pexercise: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        let params = pexercise.parameters()?;
        let names = pexercise.field_names()?;
        let dummy = pexercise.dummy_input()?;
        let name = self.exercise.name().to_string();
        self.with_inputs(pexercise, |pexercise, input| {
            let mut answers = dummy.clone();
            answers.extend(
                input
                    .iter()
                    .filter(|(_, value)| value.is_some())
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            match pexercise.call_scores(&params, &answers)? {
                ScoreOutput::Auto | ScoreOutput::Total(_) => {}
                ScoreOutput::Pair(score, max) if score > max => {
                    return Ok(failed(format!(
                        "The score ({score}) for exercise {name} exceeds the maximal score ({max})."
                    )))
                }
                ScoreOutput::Pair(..) => {}
                ScoreOutput::Fields(given) => {
                    for (field, score) in given {
                        if !names.contains(&field) {
                            return Ok(failed(format!(
                                "The score method of exercise {name} scores a non-existent \
                                 input field '{field}'."
                            )));
                        }
                        if let Some(FieldScore::Pair(score, max)) = score {
                            if score > max {
                                return Ok(failed(format!(
                                    "The score ({score}) for input field '{field}' in exercise \
                                     {name} exceeds the maximal score ({max})."
                                )));
                            }
                        }
                    }
                }
            }
            Ok(Outcome::Passed)
        })
    }

    fn feedback_with_inputs(&self, pexercise: &mut ParametrizedExercise) -> Result<Outcome, RopeError> {
        self.with_inputs(pexercise, |pexercise, input| {
            Ok(match pexercise.feedback() {
                Ok(_) => Outcome::Passed,
                Err(err) => failed(format!(
                    "The feedback method raises an error for the following inputs: {input:?} ({err})."
                )),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Signature;
    use rope_field_core::{fields, Problem};

    fn suite(exercise: Exercise) -> ExerciseTestSuite {
        ExerciseTestSuite::new(Arc::new(exercise))
            .with_repetitions(8)
            .with_seed(3)
    }

    #[test]
    fn it_should_fail_parameters_without_defaults() {
        let exercise = Exercise::new("NoDefaults", Signature::default(), |_| {
            Ok(Problem::new("<<x>>").field("x", fields::int()))
        })
        .with_parameters(["seed"], |_, _| Ok(Default::default()));
        let report = suite(exercise).run();
        assert!(matches!(
            report.outcome("parameters_have_defaults"),
            Some(Outcome::Failed(msg)) if msg.contains("'seed'")
        ));
    }

    #[test]
    fn it_should_fail_unknown_weight_keys() {
        let exercise = Exercise::new("Weighted", Signature::default(), |_| {
            Ok(Problem::new("<<x>>").field("x", fields::int()))
        })
        .with_the_solution(Signature::default(), |_| Ok(1i64))
        .with_weights(Weights::PerField([("y".to_string(), 2.0)].into()));
        let report = suite(exercise).run();
        assert!(!report.passed());
        assert!(matches!(
            report.outcome("score_weights"),
            Some(Outcome::Failed(msg)) if msg.contains("'y'")
        ));
    }

    #[test]
    fn it_should_skip_the_sample_solution_check_without_solution() {
        let exercise = Exercise::new("Unsolved", Signature::default(), |_| {
            Ok(Problem::new("<<x>>").field("x", fields::int()))
        })
        .with_scores(["x"], |args| Ok(args.int("x")? == 2));
        let report = suite(exercise).run();
        assert!(matches!(
            report.outcome("sample_solution_scores_maximal"),
            Some(Outcome::Skipped(_))
        ));
    }

    #[test]
    fn it_should_render_a_readable_report() {
        let report = TestReport {
            exercise: "Demo".into(),
            checks: vec![
                CheckResult {
                    name: "metadata",
                    outcome: Outcome::Passed,
                },
                CheckResult {
                    name: "score_bounds",
                    outcome: failed("too much"),
                },
            ],
        };
        let text = report.to_string();
        assert!(text.contains("ok      metadata"));
        assert!(text.contains("FAILED  score_bounds: too much"));
        assert_eq!(report.failures().count(), 1);
    }
}
