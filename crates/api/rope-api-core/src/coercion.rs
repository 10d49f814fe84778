//! Coercion helpers behind the lenient `cast` step of each data type.
//! Rules:
//! - integer-valued reals and zero-imaginary complex numbers narrow
//! - nested lists/tuples of numbers become matrices
//! - plain numbers become constant expressions

use num_complex::Complex64;

use crate::rational;
use crate::symbolic::Expr;
use crate::value::{Matrix, Value};

/// `Some(i)` when `x` is a finite integer inside the `i64` range.
pub fn integral(x: f64) -> Option<i64> {
    if !x.is_finite() || x != x.trunc() || x.abs() >= 9.2e18 {
        return None;
    }
    Some(x as i64)
}

/// Any number as a complex number.
pub fn to_complex(value: &Value) -> Option<Complex64> {
    match value {
        Value::Complex(c) => Some(*c),
        other => other.as_f64().map(|re| Complex64::new(re, 0.0)),
    }
}

/// Real part of `c` when the imaginary part is exactly zero.
pub fn real_part(c: &Complex64) -> Option<f64> {
    (c.im == 0.0).then_some(c.re)
}

/// Elements of a flat list or tuple of numbers.
pub fn flat_numbers(value: &Value) -> Option<Vec<Complex64>> {
    match value {
        Value::List(items) | Value::Tuple(items) => items.iter().map(to_complex).collect(),
        _ => None,
    }
}

/// Rows of numbers with a common length as a matrix.
pub fn to_matrix(value: &Value) -> Option<Matrix> {
    match value {
        Value::Matrix(m) => Some(m.clone()),
        Value::List(rows) | Value::Tuple(rows) => {
            let rows: Vec<Vec<Complex64>> = rows.iter().map(flat_numbers).collect::<Option<_>>()?;
            let ncols = rows.first().map(Vec::len).unwrap_or(0);
            if rows.iter().any(|r| r.len() != ncols) {
                return None;
            }
            let nrows = rows.len();
            Matrix::new(nrows, ncols, rows.into_iter().flatten().collect())
        }
        _ => None,
    }
}

/// Numbers as constant expressions.
pub fn to_expr(value: &Value) -> Option<Expr> {
    match value {
        Value::Expr(e) => Some(e.clone()),
        Value::Int(i) => Some(Expr::int(*i)),
        Value::Rational(q) => Some(Expr::Number(*q)),
        Value::Real(x) => Some(
            rational::from_f64(*x)
                .map(Expr::Number)
                .unwrap_or(Expr::Float(*x)),
        ),
        _ => None,
    }
}
