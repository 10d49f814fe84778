//! Data types of answers.
//!
//! [`DType`] is a closed enum with one variant per answer domain. Every variant
//! implements [`DataType`], the shared contract of the value pipeline:
//! raw text is parsed, the result is cast leniently, normalized, then checked
//! strictly; two checked values are compared to a score in `[0, 1]`.

mod collections;
mod matrix;
mod scalar;
mod symbolic;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{IllPosedError, ValidationError};
use crate::literal;
use crate::value::Value;

pub use collections::{DictType, ListType, SetComparison, SetType, TupleType};
pub use matrix::{ElementType, MatrixType, Orientation, VectorType};
pub use scalar::{BoolType, ComplexType, IntType, OneOfType, RationalType, RealType, StringType};
pub use symbolic::{EquationType, ExpressionType, PolynomialType};

pub trait DataType {
    /// Human readable description shown next to an input field.
    fn info(&self) -> String;

    /// Parse non-empty text that already passed the length guard.
    fn parse_text(&self, text: &str, _config: &Config) -> Result<Value, ValidationError> {
        literal::parse_literal(text.trim()).map_err(ValidationError::new)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        value
    }

    fn normalize(&self, value: Value) -> Value {
        value
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError>;

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        exact(lhs, rhs)
    }

    fn trivial(&self) -> Option<Value>;

    fn dummy(&self) -> Option<Value>;

    /// Constraints on the type's own configuration.
    fn validate(&self) -> Result<(), IllPosedError> {
        Ok(())
    }
}

pub(crate) fn exact(lhs: &Value, rhs: &Value) -> f64 {
    if lhs == rhs {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn bad_type(value: &Value, expected: &str) -> ValidationError {
    ValidationError::new(format!(
        "Bad type: '{expected}' expected, got '{}'.",
        value.kind().name()
    ))
}

/// `|a - b| <= atol + rtol * |b|`
pub(crate) fn is_close(distance: f64, rhs_norm: f64, rtol: f64, atol: f64) -> bool {
    distance <= atol + rtol * rhs_norm
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum DType {
    Bool(BoolType),
    Int(IntType),
    Real(RealType),
    Complex(ComplexType),
    Rational(RationalType),
    String(StringType),
    Set(SetType),
    Tuple(TupleType),
    List(ListType),
    Dict(DictType),
    Matrix(MatrixType),
    Vector(VectorType),
    Expression(ExpressionType),
    Equation(EquationType),
    Polynomial(PolynomialType),
    OneOf(OneOfType),
}

impl DType {
    fn inner(&self) -> &dyn DataType {
        match self {
            DType::Bool(t) => t,
            DType::Int(t) => t,
            DType::Real(t) => t,
            DType::Complex(t) => t,
            DType::Rational(t) => t,
            DType::String(t) => t,
            DType::Set(t) => t,
            DType::Tuple(t) => t,
            DType::List(t) => t,
            DType::Dict(t) => t,
            DType::Matrix(t) => t,
            DType::Vector(t) => t,
            DType::Expression(t) => t,
            DType::Equation(t) => t,
            DType::Polynomial(t) => t,
            DType::OneOf(t) => t,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool(_) => "bool",
            DType::Int(_) => "int",
            DType::Real(_) => "real",
            DType::Complex(_) => "complex",
            DType::Rational(_) => "rational",
            DType::String(_) => "string",
            DType::Set(_) => "set",
            DType::Tuple(_) => "tuple",
            DType::List(_) => "list",
            DType::Dict(_) => "dict",
            DType::Matrix(_) => "matrix",
            DType::Vector(_) => "vector",
            DType::Expression(_) => "expression",
            DType::Equation(_) => "equation",
            DType::Polynomial(_) => "polynomial",
            DType::OneOf(_) => "one_of",
        }
    }

    pub fn info(&self) -> String {
        self.inner().info()
    }

    pub fn validate(&self) -> Result<(), IllPosedError> {
        self.inner().validate()
    }

    /// Parse raw learner text. Oversized input is refused before any parser
    /// sees it; blank input means "no answer".
    pub fn parse(&self, raw: &str, config: &Config) -> Result<Option<Value>, ValidationError> {
        let length = raw.chars().count();
        if length > config.maximum_input_length {
            return Err(ValidationError::new(format!(
                "Input too long: {length} characters, at most {} allowed.",
                config.maximum_input_length
            )));
        }
        if raw.trim().is_empty() {
            return Ok(None);
        }
        self.inner().parse_text(raw, config).map(Some)
    }

    pub fn cast(&self, value: Value, config: &Config) -> Value {
        self.inner().cast(value, config)
    }

    pub fn normalize(&self, value: Value) -> Value {
        self.inner().normalize(value)
    }

    pub fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        self.inner().check_type(value)
    }

    /// cast, normalize, check
    pub fn coerce(&self, value: Value, config: &Config) -> Result<Value, ValidationError> {
        let value = self.normalize(self.cast(value, config));
        self.check_type(&value)?;
        Ok(value)
    }

    /// Score of `lhs` against `rhs`, clamped to `[0, 1]`.
    pub fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        let score = self.inner().compare(lhs, rhs);
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    /// Canonical "empty" value, or `None` when it violates the constraints.
    pub fn trivial_value(&self) -> Option<Value> {
        let inner = self.inner();
        inner.trivial().filter(|v| inner.check_type(v).is_ok())
    }

    /// Canonical non-trivial value, or `None` when it violates the constraints.
    pub fn dummy_value(&self) -> Option<Value> {
        let inner = self.inner();
        inner.dummy().filter(|v| inner.check_type(v).is_ok())
    }
}
