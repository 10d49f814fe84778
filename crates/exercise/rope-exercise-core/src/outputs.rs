//! Shapes author callbacks may return.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rope_api_core::Value;

/// Result of a solution callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SolutionOutput {
    /// No solution given.
    #[default]
    None,
    /// The solution of the only input field.
    Single(Value),
    /// Solutions keyed by input field. `None` and `""` stand for an expected
    /// empty answer on fields that treat empty answers manually.
    Fields(IndexMap<String, Option<Value>>),
}

impl SolutionOutput {
    pub fn fields<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<Value>>,
    {
        SolutionOutput::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for SolutionOutput {
    fn from(value: Value) -> Self {
        SolutionOutput::Single(value)
    }
}

impl From<Option<Value>> for SolutionOutput {
    fn from(value: Option<Value>) -> Self {
        value.map_or(SolutionOutput::None, SolutionOutput::Single)
    }
}

impl From<i64> for SolutionOutput {
    fn from(value: i64) -> Self {
        SolutionOutput::Single(Value::Int(value))
    }
}

/// Score of one input field inside [`ScoreOutput::Fields`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldScore {
    Score(f64),
    /// Score and maximal score.
    Pair(f64, f64),
}

impl From<f64> for FieldScore {
    fn from(score: f64) -> Self {
        FieldScore::Score(score)
    }
}

impl From<bool> for FieldScore {
    fn from(score: bool) -> Self {
        FieldScore::Score(if score { 1.0 } else { 0.0 })
    }
}

impl From<(f64, f64)> for FieldScore {
    fn from((score, max): (f64, f64)) -> Self {
        FieldScore::Pair(score, max)
    }
}

/// Result of the scores callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScoreOutput {
    /// Score every field automatically against its sample solution.
    #[default]
    Auto,
    /// Total score; the maximum is found by scoring the sample solution.
    Total(f64),
    /// Total score and maximal total score.
    Pair(f64, f64),
    /// Scores per input field; missing or `None` entries are scored
    /// automatically.
    Fields(IndexMap<String, Option<FieldScore>>),
}

impl ScoreOutput {
    pub fn fields<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldScore>,
    {
        ScoreOutput::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            ScoreOutput::Auto => "none",
            ScoreOutput::Total(_) => "number",
            ScoreOutput::Pair(..) => "pair",
            ScoreOutput::Fields(_) => "dictionary",
        }
    }
}

impl From<f64> for ScoreOutput {
    fn from(score: f64) -> Self {
        ScoreOutput::Total(score)
    }
}

impl From<i64> for ScoreOutput {
    fn from(score: i64) -> Self {
        ScoreOutput::Total(score as f64)
    }
}

impl From<bool> for ScoreOutput {
    fn from(score: bool) -> Self {
        ScoreOutput::Total(if score { 1.0 } else { 0.0 })
    }
}

impl From<(f64, f64)> for ScoreOutput {
    fn from((score, max): (f64, f64)) -> Self {
        ScoreOutput::Pair(score, max)
    }
}

/// Hints shown on request; one string is one hint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints(pub Vec<String>);

impl From<&str> for Hints {
    fn from(hint: &str) -> Self {
        Hints(vec![hint.to_string()])
    }
}

impl From<String> for Hints {
    fn from(hint: String) -> Self {
        Hints(vec![hint])
    }
}

impl From<Vec<String>> for Hints {
    fn from(hints: Vec<String>) -> Self {
        Hints(hints)
    }
}

impl From<Vec<&str>> for Hints {
    fn from(hints: Vec<&str>) -> Self {
        Hints(hints.into_iter().map(str::to_string).collect())
    }
}
