use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{bad_type, DataType};
use crate::coercion::to_expr;
use crate::config::{Config, Transformation};
use crate::error::ValidationError;
use crate::symbolic::{self, parse_expr, Equation, Expr};
use crate::value::Value;

fn declared(symbols: &str) -> Option<BTreeSet<String>> {
    let symbols = symbolic::symbols(symbols);
    (!symbols.is_empty()).then_some(symbols)
}

fn parse_with(
    text: &str,
    symbols: &Option<BTreeSet<String>>,
    transformations: &Option<Vec<Transformation>>,
    config: &Config,
) -> Result<Expr, ValidationError> {
    let empty = BTreeSet::new();
    let known = symbols.as_ref().unwrap_or(&empty);
    let transformations = transformations
        .as_deref()
        .unwrap_or(config.transformations.as_slice());
    parse_expr(text.trim(), transformations, known)
        .map_err(|e| ValidationError::new(format!("Invalid expression '{}': {e}.", text.trim())))
}

fn check_symbols(
    found: BTreeSet<String>,
    allowed: &Option<BTreeSet<String>>,
) -> Result<(), ValidationError> {
    let Some(allowed) = allowed else {
        return Ok(());
    };
    let unknown: Vec<String> = found.difference(allowed).cloned().collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Unknown symbol(s): {}.",
            unknown.join(", ")
        )))
    }
}

fn symbol_suffix(symbols: &Option<BTreeSet<String>>) -> String {
    match symbols {
        Some(s) => format!(" in {}", s.iter().cloned().collect::<Vec<_>>().join(", ")),
        None => String::new(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionType {
    /// Allowed free symbols; any symbol is accepted when unset.
    pub symbols: Option<BTreeSet<String>>,
    /// Overrides the configured parser transformations.
    pub transformations: Option<Vec<Transformation>>,
}

impl ExpressionType {
    pub fn new(symbols: &str) -> Self {
        ExpressionType {
            symbols: declared(symbols),
            transformations: None,
        }
    }
}

impl DataType for ExpressionType {
    fn info(&self) -> String {
        format!("an expression{}", symbol_suffix(&self.symbols))
    }

    fn parse_text(&self, text: &str, config: &Config) -> Result<Value, ValidationError> {
        parse_with(text, &self.symbols, &self.transformations, config).map(Value::Expr)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match to_expr(&value) {
            Some(expr) => Value::Expr(expr),
            None => value,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Expr(expr) => check_symbols(expr.free_symbols(), &self.symbols),
            other => Err(bad_type(other, "expression")),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match (lhs, rhs) {
            (Value::Expr(a), Value::Expr(b)) if a.equals(b) => 1.0,
            _ => 0.0,
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Expr(Expr::zero()))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Expr(Expr::one()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquationType {
    pub symbols: Option<BTreeSet<String>>,
    pub transformations: Option<Vec<Transformation>>,
}

impl EquationType {
    pub fn new(symbols: &str) -> Self {
        EquationType {
            symbols: declared(symbols),
            transformations: None,
        }
    }
}

impl DataType for EquationType {
    fn info(&self) -> String {
        format!("an equation{}", symbol_suffix(&self.symbols))
    }

    fn parse_text(&self, text: &str, config: &Config) -> Result<Value, ValidationError> {
        let mut sides = text.split('=');
        let (Some(lhs), Some(rhs)) = (sides.next(), sides.next()) else {
            return Err(ValidationError::new("An equation needs an equal sign."));
        };
        if sides.next().is_some() {
            return Err(ValidationError::new("Equation contains multiple equal signs."));
        }
        let lhs = parse_with(lhs, &self.symbols, &self.transformations, config)?;
        let rhs = parse_with(rhs, &self.symbols, &self.transformations, config)?;
        Ok(Value::Equation(Equation::new(lhs, rhs)))
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Equation(eq) => check_symbols(eq.free_symbols(), &self.symbols),
            other => Err(bad_type(other, "equation")),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match (lhs, rhs) {
            (Value::Equation(a), Value::Equation(b)) if a.equals(b) => 1.0,
            _ => 0.0,
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Equation(Equation::new(Expr::zero(), Expr::zero())))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Equation(Equation::new(Expr::one(), Expr::zero())))
    }
}

/// Polynomial in the declared symbols, optionally bounded in total degree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialType {
    pub symbols: Option<BTreeSet<String>>,
    pub degree: Option<u32>,
    pub transformations: Option<Vec<Transformation>>,
}

impl PolynomialType {
    pub fn new(symbols: &str, degree: Option<u32>) -> Self {
        PolynomialType {
            symbols: declared(symbols),
            degree,
            transformations: None,
        }
    }
}

impl DataType for PolynomialType {
    fn info(&self) -> String {
        let mut info = format!("a polynomial{}", symbol_suffix(&self.symbols));
        if let Some(degree) = self.degree {
            info.push_str(&format!(" of degree at most {degree}"));
        }
        info
    }

    fn parse_text(&self, text: &str, config: &Config) -> Result<Value, ValidationError> {
        parse_with(text, &self.symbols, &self.transformations, config).map(Value::Expr)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match to_expr(&value) {
            Some(expr) => Value::Expr(expr),
            None => value,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::Expr(expr) = value else {
            return Err(bad_type(value, "polynomial"));
        };
        check_symbols(expr.free_symbols(), &self.symbols)?;
        let variables = self.symbols.clone().unwrap_or_else(|| expr.free_symbols());
        let Some(degree) = expr.polynomial_degree(&variables) else {
            return Err(ValidationError::new(format!("{expr} is not a polynomial.")));
        };
        match self.degree {
            Some(max) if degree > max => Err(ValidationError::new(format!(
                "Expected a polynomial of degree at most {max}, got degree {degree}."
            ))),
            _ => Ok(()),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match (lhs, rhs) {
            (Value::Expr(a), Value::Expr(b)) if a.equals(b) => 1.0,
            _ => 0.0,
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Expr(Expr::zero()))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Expr(Expr::one()))
    }
}
