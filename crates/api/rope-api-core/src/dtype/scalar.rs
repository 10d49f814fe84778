use num_complex::Complex64;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use super::{bad_type, is_close, DataType};
use crate::coercion::{integral, real_part, to_complex};
use crate::config::Config;
use crate::error::{IllPosedError, ValidationError};
use crate::literal;
use crate::rational;
use crate::value::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolType {}

impl DataType for BoolType {
    fn info(&self) -> String {
        "a boolean".to_string()
    }

    fn parse_text(&self, text: &str, config: &Config) -> Result<Value, ValidationError> {
        config
            .boolean(text.trim())
            .map(Value::Bool)
            .ok_or_else(|| ValidationError::new(format!("'{}' is not a boolean.", text.trim())))
    }

    fn cast(&self, value: Value, config: &Config) -> Value {
        match value {
            Value::Text(text) => match config.boolean(&text) {
                Some(b) => Value::Bool(b),
                None => Value::Text(text),
            },
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Bool(_) => Ok(()),
            other => Err(bad_type(other, "bool")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Bool(false))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Bool(true))
    }
}

/// Integer with optional inclusive bounds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntType {
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

impl IntType {
    pub fn new(minimum: Option<i64>, maximum: Option<i64>) -> Self {
        IntType { minimum, maximum }
    }
}

impl DataType for IntType {
    fn info(&self) -> String {
        match (self.minimum, self.maximum) {
            (None, None) => "an integer".to_string(),
            (Some(min), None) => format!("an integer greater equal {min}"),
            (None, Some(max)) => format!("an integer less or equal {max}"),
            (Some(min), Some(max)) => format!("an integer between {min} and {max}"),
        }
    }

    fn validate(&self) -> Result<(), IllPosedError> {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if min >= max => Err(IllPosedError::new(format!(
                "'minimum' ({min}) must be less than 'maximum' ({max})."
            ))),
            _ => Ok(()),
        }
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        let narrowed = match &value {
            Value::Real(x) => integral(*x),
            Value::Complex(c) => real_part(c).and_then(integral),
            Value::Rational(q) if q.is_integer() => Some(q.to_integer()),
            _ => None,
        };
        narrowed.map(Value::Int).unwrap_or(value)
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::Int(i) = value else {
            return Err(bad_type(value, "int"));
        };
        if let Some(min) = self.minimum {
            if *i < min {
                return Err(ValidationError::new(format!(
                    "{i} is smaller than the minimum {min}."
                )));
            }
        }
        if let Some(max) = self.maximum {
            if *i > max {
                return Err(ValidationError::new(format!(
                    "{i} is larger than the maximum {max}."
                )));
            }
        }
        Ok(())
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Int(0))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Int(self.minimum.or(self.maximum).unwrap_or(1)))
    }
}

/// Real number; compared exactly unless tolerances are set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealType {
    pub rtol: f64,
    pub atol: f64,
}

impl DataType for RealType {
    fn info(&self) -> String {
        "a real number".to_string()
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::Int(i) => Value::Real(i as f64),
            Value::Rational(q) => Value::Real(rational::to_f64(&q)),
            Value::Complex(c) => match real_part(&c) {
                Some(re) => Value::Real(re),
                None => Value::Complex(c),
            },
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Real(_) => Ok(()),
            other => Err(bad_type(other, "real")),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) if is_close((a - b).abs(), b.abs(), self.rtol, self.atol) => 1.0,
            _ => 0.0,
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Real(0.0))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Real(0.5))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    pub rtol: f64,
    pub atol: f64,
}

impl DataType for ComplexType {
    fn info(&self) -> String {
        "a complex number".to_string()
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::Int(_) | Value::Real(_) | Value::Rational(_) => {
                to_complex(&value).map(Value::Complex).unwrap_or(value)
            }
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Complex(_) => Ok(()),
            other => Err(bad_type(other, "complex")),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match (to_complex(lhs), to_complex(rhs)) {
            (Some(a), Some(b)) if is_close((a - b).norm(), b.norm(), self.rtol, self.atol) => 1.0,
            _ => 0.0,
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Complex(Complex64::new(0.0, 0.0)))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Complex(Complex64::new(0.0, 1.0)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RationalType {}

impl DataType for RationalType {
    fn info(&self) -> String {
        "a rational number".to_string()
    }

    fn parse_text(&self, text: &str, _config: &Config) -> Result<Value, ValidationError> {
        rational::parse_fraction(text)
            .map(Value::Rational)
            .map_err(ValidationError::new)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::Int(i) => Value::Rational(Rational64::from_integer(i)),
            Value::Real(x) => rational::from_f64(x)
                .map(Value::Rational)
                .unwrap_or(Value::Real(x)),
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Rational(_) => Ok(()),
            other => Err(bad_type(other, "rational")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Rational(Rational64::from_integer(0)))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Rational(Rational64::new(1, 2)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StringType {
    pub strip: bool,
}

impl DataType for StringType {
    fn info(&self) -> String {
        "a string".to_string()
    }

    fn parse_text(&self, text: &str, _config: &Config) -> Result<Value, ValidationError> {
        Ok(Value::text(text))
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::Text(text) => Value::Text(text),
            other => Value::Text(other.to_string()),
        }
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Text(text) if self.strip => Value::text(text.trim()),
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Text(_) => Ok(()),
            other => Err(bad_type(other, "string")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::text(""))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::text("rope"))
    }
}

/// One of a fixed list of options of a single kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OneOfType {
    pub options: Vec<Value>,
}

impl OneOfType {
    pub fn new<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        OneOfType {
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

impl DataType for OneOfType {
    fn info(&self) -> String {
        format!("one of {}", Value::Tuple(self.options.clone()))
    }

    fn validate(&self) -> Result<(), IllPosedError> {
        match self.options.as_slice() {
            [] => Err(IllPosedError::new("No options given.")),
            [_] => Err(IllPosedError::new("A single option is nonsense.")),
            [first, rest @ ..] => {
                if rest.iter().any(|o| o.kind() != first.kind()) {
                    return Err(IllPosedError::new(
                        "All options have to be of the same data type.",
                    ));
                }
                Ok(())
            }
        }
    }

    fn parse_text(&self, text: &str, _config: &Config) -> Result<Value, ValidationError> {
        let text = text.trim();
        if let Some(option) = self.options.iter().find(|o| o.to_string() == text) {
            return Ok(option.clone());
        }
        literal::parse_literal(text).map_err(ValidationError::new)
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        if let Some(first) = self.options.first() {
            if first.kind() != value.kind() {
                return Err(bad_type(value, first.kind().name()));
            }
        }
        if !self.options.contains(value) {
            return Err(ValidationError::new(format!(
                "'{value}' is not in {}.",
                Value::Tuple(self.options.clone())
            )));
        }
        Ok(())
    }

    fn trivial(&self) -> Option<Value> {
        self.options.first().cloned()
    }

    fn dummy(&self) -> Option<Value> {
        self.options.last().cloned()
    }
}
