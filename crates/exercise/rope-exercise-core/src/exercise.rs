//! Exercise definitions.
//!
//! An [`Exercise`] is an immutable bundle of metadata, settings and author
//! callbacks. It is shared behind `Arc` by every attempt built from it; all
//! per-attempt state lives in [`crate::ParametrizedExercise`].

use std::fmt;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rope_api_core::error::IllPosedError;
use rope_api_core::Value;
use rope_field_core::FieldBlueprint;

use crate::callback::{Args, Callback, ParametersCallback, Signature};
use crate::outputs::{Hints, ScoreOutput, SolutionOutput};

/// Levels of Bloom's taxonomy accepted in [`Metadata::taxonomy`].
pub const TAXONOMY_LEVELS: [&str; 6] = [
    "knowledge",
    "comprehension",
    "application",
    "analysis",
    "synthesis",
    "evaluation",
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub origin: Option<String>,
    pub discipline: Option<String>,
    pub area: Option<String>,
    pub topics: Vec<String>,
    pub topic_contingents: Vec<String>,
    pub keywords: Vec<String>,
    pub taxonomy: Vec<String>,
}

impl Metadata {
    pub fn titled(title: &str) -> Self {
        Metadata {
            title: Some(title.to_string()),
            ..Metadata::default()
        }
    }

    /// Problems with the metadata, one message each.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, values) in [
            ("topics", &self.topics),
            ("topic_contingents", &self.topic_contingents),
            ("keywords", &self.keywords),
            ("taxonomy", &self.taxonomy),
        ] {
            if values.iter().any(|v| v.contains(',')) {
                problems.push(format!(
                    "Multiple values for '{name}' have to be listed separately, not inside a string."
                ));
            }
        }
        for level in &self.taxonomy {
            if !TAXONOMY_LEVELS.contains(&level.as_str()) {
                problems.push(format!("{level} is not a valid level in Bloom's taxonomy."));
            }
        }
        problems
    }
}

/// Score weights: one factor for every field, or one per named field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weights {
    Uniform(f64),
    /// Unnamed fields keep weight 1.
    PerField(IndexMap<String, f64>),
}

impl Default for Weights {
    fn default() -> Self {
        Weights::Uniform(1.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_difficulty: Option<f64>,
    pub max_difficulty: Option<f64>,
    pub weights: Weights,
}

impl Settings {
    pub fn validate(&self) -> Result<(), IllPosedError> {
        if let Some(min) = self.min_difficulty {
            check_difficulty("min_difficulty", min)?;
        }
        if let Some(max) = self.max_difficulty {
            check_difficulty("max_difficulty", max)?;
        }
        Ok(())
    }
}

pub(crate) fn check_difficulty(name: &str, value: f64) -> Result<f64, IllPosedError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(IllPosedError::new(format!(
            "'{name}' has to be a number in [0, 1], got {value}."
        )))
    }
}

#[derive(Clone)]
pub struct Exercise {
    name: String,
    source: Option<String>,
    metadata: Metadata,
    settings: Settings,
    pub(crate) preamble: Callback<String>,
    pub(crate) parameters: ParametersCallback,
    pub(crate) problem: Callback<FieldBlueprint>,
    pub(crate) the_solution: Callback<SolutionOutput>,
    pub(crate) a_solution: Callback<SolutionOutput>,
    pub(crate) hints: Callback<Hints>,
    pub(crate) scores: Callback<ScoreOutput>,
    pub(crate) feedback: Callback<String>,
}

impl fmt::Debug for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exercise")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Exercise {
    /// An exercise whose problem is built by `problem` from the declared
    /// parameters.
    pub fn new<S, F, P>(name: &str, signature: S, problem: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<P> + Send + Sync + 'static,
        P: Into<FieldBlueprint>,
    {
        Exercise {
            name: name.to_string(),
            source: None,
            metadata: Metadata::default(),
            settings: Settings::default(),
            preamble: Callback::constant(String::new()),
            parameters: ParametersCallback::default(),
            problem: Callback::new(signature.into(), problem),
            the_solution: Callback::constant(SolutionOutput::None),
            a_solution: Callback::constant(SolutionOutput::None),
            hints: Callback::constant(Hints::default()),
            scores: Callback::constant(ScoreOutput::Auto),
            feedback: Callback::constant(String::new()),
        }
    }

    /// Source text the exercise identity is derived from. Without it the
    /// attempts are not persisted.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.settings.weights = weights;
        self
    }

    pub fn with_difficulty_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.settings.min_difficulty = min;
        self.settings.max_difficulty = max;
        self
    }

    pub fn with_preamble(mut self, preamble: &str) -> Self {
        self.preamble = Callback::constant(preamble.to_string());
        self
    }

    pub fn with_preamble_fn<S, F, R>(mut self, signature: S, preamble: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<String>,
    {
        self.preamble = Callback::new(signature.into(), preamble);
        self
    }

    /// Parameters receive `difficulty` and the global parameters; every
    /// argument should declare a default.
    pub fn with_parameters<S, F>(mut self, signature: S, parameters: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args, &mut StdRng) -> anyhow::Result<IndexMap<String, Value>>
            + Send
            + Sync
            + 'static,
    {
        self.parameters = ParametersCallback::new(signature.into(), parameters);
        self
    }

    pub fn with_the_solution<S, F, R>(mut self, signature: S, solution: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<SolutionOutput>,
    {
        self.the_solution = Callback::new(signature.into(), solution);
        self
    }

    pub fn with_a_solution<S, F, R>(mut self, signature: S, solution: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<SolutionOutput>,
    {
        self.a_solution = Callback::new(signature.into(), solution);
        self
    }

    pub fn with_hints<S, F, R>(mut self, signature: S, hints: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Hints>,
    {
        self.hints = Callback::new(signature.into(), hints);
        self
    }

    pub fn with_scores<S, F, R>(mut self, signature: S, scores: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<ScoreOutput>,
    {
        self.scores = Callback::new(signature.into(), scores);
        self
    }

    pub fn with_feedback<S, F, R>(mut self, signature: S, feedback: F) -> Self
    where
        S: Into<Signature>,
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<String>,
    {
        self.feedback = Callback::new(signature.into(), feedback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// SHA-256 hex digest of the source text.
    pub fn id(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|source| format!("{:x}", Sha256::digest(source.as_bytes())))
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn parameters_signature(&self) -> &Signature {
        self.parameters.signature()
    }

    /// Label used by result stores: the title, else the name.
    pub fn label(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rope_field_core::{fields, Problem};

    fn trivial() -> Exercise {
        Exercise::new("Trivial", Signature::default(), |_| {
            Ok(Problem::new("<<x>>").field("x", fields::int()))
        })
    }

    #[test]
    fn it_should_hash_the_source() {
        assert_eq!(trivial().id(), None);
        let ex = trivial().with_source("abc");
        assert_eq!(
            ex.id().as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn it_should_flag_unknown_taxonomy_levels() {
        let metadata = Metadata {
            taxonomy: vec!["application".into(), "guessing".into()],
            keywords: vec!["a, b".into()],
            ..Metadata::default()
        };
        let problems = metadata.problems();
        assert_eq!(problems.len(), 2);
        assert!(problems[1].starts_with("guessing"));
    }

    #[test]
    fn it_should_check_difficulty_bounds() {
        let settings = Settings {
            min_difficulty: Some(1.5),
            ..Settings::default()
        };
        assert_eq!(
            settings.validate().expect_err("out of range").to_string(),
            "'min_difficulty' has to be a number in [0, 1], got 1.5."
        );
    }

    #[test]
    fn it_should_read_weights_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"weights": {"a": 2.0}}"#).expect("settings");
        assert!(matches!(settings.weights, Weights::PerField(ref w) if w["a"] == 2.0));
        let settings: Settings = serde_json::from_str(r#"{"weights": 0.5}"#).expect("settings");
        assert_eq!(settings.weights, Weights::Uniform(0.5));
    }
}
