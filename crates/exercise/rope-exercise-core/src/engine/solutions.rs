//! Sample solutions: explicit ones from the callbacks, implicit ones from
//! parameters named like an input field without its trailing underscore.

use log::debug;

use rope_api_core::error::{IllPosedError, RopeError};
use rope_api_core::Value;
use rope_field_core::Slot;

use super::{kwargs, Answers, ParametrizedExercise};
use crate::outputs::SolutionOutput;

fn keyed(output: SolutionOutput, names: &[String], what: &str) -> Result<Answers, IllPosedError> {
    match output {
        SolutionOutput::None => Ok(Answers::new()),
        SolutionOutput::Fields(fields) => Ok(fields),
        SolutionOutput::Single(value) => match names {
            [name] => Ok(Answers::from([(name.clone(), Some(value))])),
            _ => Err(IllPosedError::new(format!(
                "Unless there is only a single input field, {what} must be a dictionary."
            ))),
        },
    }
}

fn is_empty_answer(value: &Option<Value>) -> bool {
    match value {
        None => true,
        Some(Value::Text(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Invalid sample solutions are authoring errors.
fn authoring(name: &str, err: RopeError) -> RopeError {
    match err {
        RopeError::Validation(invalid) => IllPosedError::new(format!(
            "Invalid sample solution for input field '{name}': {invalid}"
        ))
        .into(),
        other => other,
    }
}

impl ParametrizedExercise {
    /// The unique solution per field; implicit solutions included.
    pub fn the_solution(&mut self) -> Result<Answers, RopeError> {
        if let Some(solution) = &self.memo.the_solution {
            return Ok(solution.clone());
        }
        let params = self.parameters()?;
        let names = self.field_names()?;
        let output = self.exercise.the_solution.apply(&kwargs(&params))?;
        let mut solution = keyed(output, &names, "the solution")?;
        for name in &names {
            let Some(stem) = name.strip_suffix('_') else {
                continue;
            };
            if solution.contains_key(name) {
                continue;
            }
            if let Some(value) = params.get(stem) {
                debug!("{}: implicit solution for {name}", self.exercise.name());
                solution.insert(name.clone(), Some(value.clone()));
            }
        }
        let written = self.write_solution(Slot::TheSolution, solution)?;
        self.memo.the_solution = Some(written.clone());
        Ok(written)
    }

    /// One of possibly many solutions per field.
    pub fn a_solution(&mut self) -> Result<Answers, RopeError> {
        if let Some(solution) = &self.memo.a_solution {
            return Ok(solution.clone());
        }
        let params = self.parameters()?;
        let names = self.field_names()?;
        let output = self.exercise.a_solution.apply(&kwargs(&params))?;
        let solution = keyed(output, &names, "a solution")?;
        let written = self.write_solution(Slot::ASolution, solution)?;
        self.memo.a_solution = Some(written.clone());
        Ok(written)
    }

    /// Whichever solution each field has.
    pub fn solution(&mut self) -> Result<Answers, RopeError> {
        self.the_solution()?;
        self.a_solution()?;
        let tree = self.tree()?;
        let mut solution = Answers::new();
        for name in tree.field_names() {
            let value = tree
                .get(&name, Slot::Solution)
                .map_err(|err| authoring(&name, err))?;
            solution.insert(name, value);
        }
        Ok(solution)
    }

    /// Fields whose expected answer is empty.
    pub fn none_solution_fields(&mut self) -> Result<Vec<String>, RopeError> {
        self.the_solution()?;
        self.a_solution()?;
        Ok(self.memo.none_solution.iter().cloned().collect())
    }

    fn write_solution(&mut self, slot: Slot, solution: Answers) -> Result<Answers, RopeError> {
        let exercise = self.exercise.clone();
        let tree = self.tree()?;
        let mut expected_empty = Vec::new();
        for (name, value) in solution {
            if tree.field_id(&name).is_none() {
                return Err(IllPosedError::new(format!("Unknown input field '{name}'.")).into());
            }
            if is_empty_answer(&value) {
                if tree.treat_none_manually(&name) {
                    expected_empty.push(name);
                } else {
                    debug!(
                        "{}: empty solution for {name} left unset, the field does not treat None manually",
                        exercise.name()
                    );
                }
                continue;
            }
            tree.set(&name, slot, value)
                .map_err(|err| authoring(&name, err))?;
        }
        let mut written = Answers::new();
        for name in tree.field_names() {
            let value = tree.get(&name, slot).map_err(|err| authoring(&name, err))?;
            written.insert(name, value);
        }
        self.memo.none_solution.extend(expected_empty);
        Ok(written)
    }
}
