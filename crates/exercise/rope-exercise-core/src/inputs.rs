//! Enumeration of candidate answers for exercise tests.

use rope_api_core::Value;

use crate::engine::Answers;

/// Cartesian product over per-field candidates, last field varying fastest.
/// Every field also offers the empty answer first.
#[derive(Clone, Debug)]
pub struct InputGenerator {
    names: Vec<String>,
    factors: Vec<Vec<Option<Value>>>,
    indices: Vec<usize>,
    done: bool,
}

impl InputGenerator {
    /// Duplicate candidates of a field are dropped.
    pub fn new(names: Vec<String>, candidates: Vec<Vec<Value>>) -> Self {
        let factors: Vec<Vec<Option<Value>>> = candidates
            .into_iter()
            .map(|values| {
                let mut factor: Vec<Option<Value>> = vec![None];
                for value in values {
                    let value = Some(value);
                    if !factor.contains(&value) {
                        factor.push(value);
                    }
                }
                factor
            })
            .collect();
        InputGenerator {
            indices: vec![0; factors.len()],
            names,
            factors,
            done: false,
        }
    }

    /// Number of combinations in total.
    pub fn combinations(&self) -> usize {
        self.factors.iter().map(Vec::len).product()
    }
}

impl Iterator for InputGenerator {
    type Item = Answers;

    fn next(&mut self) -> Option<Answers> {
        if self.done {
            return None;
        }
        let item = self
            .names
            .iter()
            .zip(&self.factors)
            .zip(&self.indices)
            .map(|((name, factor), &idx)| (name.clone(), factor[idx].clone()))
            .collect();

        self.done = true;
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.factors[pos].len() {
                self.done = false;
                break;
            }
            self.indices[pos] = 0;
        }
        Some(item)
    }
}
