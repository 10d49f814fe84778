//! Value: answers, solutions and parameters as they travel through the engine.
//! Display follows the notation learners type, so a displayed value parses back.

use std::fmt;

use num_complex::Complex64;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::symbolic::{Equation, Expr};

/// Coarse kind of a value, used for dispatch and type error messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Real,
    Complex,
    Rational,
    Text,
    Tuple,
    List,
    Set,
    Dict,
    Matrix,
    Expr,
    Equation,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Real => "real",
            ValueKind::Complex => "complex",
            ValueKind::Rational => "rational",
            ValueKind::Text => "string",
            ValueKind::Tuple => "tuple",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Dict => "dict",
            ValueKind::Matrix => "matrix",
            ValueKind::Expr => "expression",
            ValueKind::Equation => "equation",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Complex(Complex64),
    Rational(Rational64),
    Text(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    /// Unordered, duplicate free. Build through [`Value::set`].
    Set(Vec<Value>),
    /// Key/value pairs with unique keys; order is irrelevant for equality.
    Dict(Vec<(Value, Value)>),
    Matrix(Matrix),
    Expr(Expr),
    Equation(Equation),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Complex(_) => ValueKind::Complex,
            Value::Rational(_) => ValueKind::Rational,
            Value::Text(_) => ValueKind::Text,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Dict(_) => ValueKind::Dict,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Expr(_) => ValueKind::Expr,
            Value::Equation(_) => ValueKind::Equation,
        }
    }

    /// Build a set, dropping duplicates.
    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Value {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    pub fn text(text: impl Into<String>) -> Value {
        Value::Text(text.into())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Real-valued numbers as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Rational(q) => Some(crate::rational::to_f64(q)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Real(_) | Value::Complex(_) | Value::Rational(_)
        )
    }

    /// Container elements, if this is a tuple, list or set.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Text form used inside containers: strings get quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Matrix(a), Value::Matrix(b)) => a == b,
            (Value::Expr(a), Value::Expr(b)) => a == b,
            (Value::Equation(a), Value::Equation(b)) => a == b,
            _ => false,
        }
    }
}

/// Reals print with a decimal point so they read back as reals.
pub(crate) fn format_real(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "inf" } else { "-inf" })
    } else if value == value.trunc() && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn format_component(value: f64) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < 1e16 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub(crate) fn format_complex(c: &Complex64) -> String {
    if c.re == 0.0 && !c.re.is_sign_negative() {
        return format!("{}j", format_component(c.im));
    }
    let sign = if c.im < 0.0 { '-' } else { '+' };
    format!(
        "({}{}{}j)",
        format_component(c.re),
        sign,
        format_component(c.im.abs())
    )
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{}", format_real(*r)),
            Value::Complex(c) => write!(f, "{}", format_complex(c)),
            Value::Rational(q) => {
                if *q.denom() == 1 {
                    write!(f, "{}", q.numer())
                } else {
                    write!(f, "{}/{}", q.numer(), q.denom())
                }
            }
            Value::Text(s) => write!(f, "{s}"),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::List(items) => write!(f, "[{}]", join_repr(items)),
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => write!(f, "{{{}}}", join_repr(items)),
            Value::Dict(pairs) => {
                let body = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{body}}}")
            }
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Expr(e) => write!(f, "{e}"),
            Value::Equation(eq) => write!(f, "{eq}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<Complex64> for Value {
    fn from(v: Complex64) -> Self {
        Value::Complex(v)
    }
}

impl From<Rational64> for Value {
    fn from(v: Rational64) -> Self {
        Value::Rational(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Matrix> for Value {
    fn from(v: Matrix) -> Self {
        Value::Matrix(v)
    }
}

impl From<Expr> for Value {
    fn from(v: Expr) -> Self {
        Value::Expr(v)
    }
}

impl From<Equation> for Value {
    fn from(v: Equation) -> Self {
        Value::Equation(v)
    }
}

/// Finest number domain that holds every entry of a matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Integral,
    Real,
    Complex,
}

/// Dense two-dimensional numeric matrix, stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    nrows: usize,
    ncols: usize,
    entries: Vec<Complex64>,
}

impl Matrix {
    pub fn new(nrows: usize, ncols: usize, entries: Vec<Complex64>) -> Option<Self> {
        if nrows.checked_mul(ncols)? != entries.len() {
            return None;
        }
        Some(Matrix {
            nrows,
            ncols,
            entries,
        })
    }

    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Matrix {
            nrows,
            ncols,
            entries: vec![Complex64::new(0.0, 0.0); nrows * ncols],
        }
    }

    pub fn from_reals(nrows: usize, ncols: usize, entries: &[f64]) -> Option<Self> {
        Matrix::new(
            nrows,
            ncols,
            entries.iter().map(|r| Complex64::new(*r, 0.0)).collect(),
        )
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn entries(&self) -> &[Complex64] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same entries under a new shape.
    pub fn reshaped(&self, nrows: usize, ncols: usize) -> Option<Self> {
        Matrix::new(nrows, ncols, self.entries.clone())
    }

    pub fn entry_kind(&self) -> EntryKind {
        self.entries
            .iter()
            .map(|c| {
                if c.im != 0.0 {
                    EntryKind::Complex
                } else if c.re.is_finite() && c.re == c.re.trunc() {
                    EntryKind::Integral
                } else {
                    EntryKind::Real
                }
            })
            .max()
            .unwrap_or(EntryKind::Integral)
    }

    /// Entry `idx` in the matrix-wide number domain.
    pub fn entry_value(&self, idx: usize) -> Option<Value> {
        let c = self.entries.get(idx)?;
        Some(match self.entry_kind() {
            EntryKind::Integral => Value::Int(c.re as i64),
            EntryKind::Real => Value::Real(c.re),
            EntryKind::Complex => Value::Complex(*c),
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.entry_kind();
        let cell = |c: &Complex64| match kind {
            EntryKind::Integral => format!("{}", c.re as i64),
            EntryKind::Real => format_real(c.re),
            EntryKind::Complex => format_complex(c),
        };
        write!(f, "[")?;
        for row in 0..self.nrows {
            if row > 0 {
                write!(f, ", ")?;
            }
            let start = row * self.ncols;
            let cells: Vec<String> = self.entries[start..start + self.ncols]
                .iter()
                .map(cell)
                .collect();
            write!(f, "[{}]", cells.join(", "))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_ignore_order_and_duplicates() {
        let a = Value::set([Value::Int(1), Value::Int(2), Value::Int(1)]);
        let b = Value::set([Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
        assert_eq!(a.items().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn displays_in_input_notation() {
        assert_eq!(Value::Real(2.0).to_string(), "2.0");
        assert_eq!(Value::Complex(Complex64::new(1.0, -2.0)).to_string(), "(1-2j)");
        assert_eq!(Value::Complex(Complex64::new(0.0, 1.0)).to_string(), "1j");
        assert_eq!(Value::Rational(Rational64::new(6, 4)).to_string(), "3/2");
        assert_eq!(Value::Tuple(vec![Value::Int(0)]).to_string(), "(0,)");
        assert_eq!(
            Value::List(vec![Value::text("a"), Value::Bool(true)]).to_string(),
            "['a', True]"
        );
        assert_eq!(Value::Set(vec![]).to_string(), "set()");
    }

    #[test]
    fn matrix_reports_its_entry_domain() {
        let ints = Matrix::from_reals(2, 2, &[1.0, 2.0, 3.0, 4.0]).expect("2x2");
        assert_eq!(ints.entry_kind(), EntryKind::Integral);
        assert_eq!(ints.to_string(), "[[1, 2], [3, 4]]");
        let reals = Matrix::from_reals(1, 2, &[0.5, 1.0]).expect("1x2");
        assert_eq!(reals.entry_kind(), EntryKind::Real);
        assert_eq!(reals.entry_value(1), Some(Value::Real(1.0)));
        assert!(Matrix::new(2, 2, vec![]).is_none());
    }
}
