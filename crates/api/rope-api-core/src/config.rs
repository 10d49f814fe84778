//! Engine-wide configuration.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Parsing behaviours available to the symbolic expression parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    /// `^` means exponentiation.
    ConvertXor,
    /// Postfix `!` means factorial.
    FactorialNotation,
    /// Unknown names become symbols.
    AutoSymbol,
    /// Integer literals become exact numbers.
    AutoNumber,
    /// Decimal literals become exact rationals.
    Rationalize,
    /// `0.1[6]` means 0.1666...
    RepeatedDecimals,
    /// `2x` and `x y` mean products.
    ImplicitMultiplication,
    /// `sin x` means `sin(x)`.
    ImplicitApplication,
    /// `xy` means `x*y`.
    SplitSymbols,
    /// `sin^2(x)` means `sin(x)^2`.
    FunctionExponentiation,
}

impl Transformation {
    pub fn defaults() -> Vec<Transformation> {
        vec![
            Transformation::ConvertXor,
            Transformation::FactorialNotation,
            Transformation::AutoSymbol,
            Transformation::AutoNumber,
            Transformation::Rationalize,
            Transformation::RepeatedDecimals,
        ]
    }
}

/// Post-processing applied to scores before they are shown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreProcessing {
    Identity,
    Round { digits: u32 },
}

impl ScoreProcessing {
    pub fn apply(&self, score: f64) -> f64 {
        match *self {
            ScoreProcessing::Identity => score,
            ScoreProcessing::Round { digits } => {
                let factor = 10f64.powi(digits as i32);
                (score * factor).round() / factor
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw text longer than this is rejected before any parser runs.
    pub maximum_input_length: usize,
    /// Cap on generated inputs and repeated runs in exercise tests.
    pub maximum_test_repetitions: usize,
    /// `(false, true)` spellings accepted for boolean input.
    pub boolean_representations: Vec<(String, String)>,
    pub transformations: Vec<Transformation>,
    pub score_processing: ScoreProcessing,
    pub total_score_processing: ScoreProcessing,
    /// Enumerations with more options than this get a dropdown.
    pub one_of_maximum_radio_buttons: usize,
}

impl Default for Config {
    fn default() -> Self {
        let pairs = [
            ("0", "1"),
            ("false", "true"),
            ("False", "True"),
            ("f", "t"),
            ("F", "T"),
            ("n", "y"),
            ("N", "Y"),
            ("no", "yes"),
            ("No", "Yes"),
            ("off", "on"),
            ("Off", "On"),
        ];
        Self {
            maximum_input_length: 256,
            maximum_test_repetitions: 1024,
            boolean_representations: pairs
                .iter()
                .map(|(f, t)| (f.to_string(), t.to_string()))
                .collect(),
            transformations: Transformation::defaults(),
            score_processing: ScoreProcessing::Round { digits: 1 },
            total_score_processing: ScoreProcessing::Round { digits: 1 },
            one_of_maximum_radio_buttons: 5,
        }
    }
}

static SHARED_DEFAULT: Lazy<Arc<Config>> = Lazy::new(|| Arc::new(Config::default()));

impl Config {
    /// Process-wide default configuration.
    pub fn shared_default() -> Arc<Config> {
        SHARED_DEFAULT.clone()
    }

    #[inline]
    pub fn has(&self, transformation: Transformation) -> bool {
        self.transformations.contains(&transformation)
    }

    /// Interpret `text` through the boolean representation pairs.
    pub fn boolean(&self, text: &str) -> Option<bool> {
        self.boolean_representations.iter().find_map(|(f, t)| {
            if text == f {
                Some(false)
            } else if text == t {
                Some(true)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal_by_default() {
        let cfg = Config::default();
        assert_eq!(cfg.score_processing.apply(0.6666), 0.7);
        assert_eq!(cfg.total_score_processing.apply(2.04), 2.0);
        assert_eq!(ScoreProcessing::Identity.apply(0.123), 0.123);
    }

    #[test]
    fn boolean_representations_are_paired() {
        let cfg = Config::default();
        assert_eq!(cfg.boolean("yes"), Some(true));
        assert_eq!(cfg.boolean("0"), Some(false));
        assert_eq!(cfg.boolean("maybe"), None);
    }

    #[test]
    fn deserializes_partial_overrides() {
        let cfg: Config =
            serde_json::from_str(r#"{"maximum_input_length": 16}"#).expect("config json");
        assert_eq!(cfg.maximum_input_length, 16);
        assert_eq!(cfg.maximum_test_repetitions, 1024);
        assert!(cfg.has(Transformation::AutoSymbol));
    }
}
