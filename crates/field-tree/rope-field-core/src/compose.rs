//! Assembly of a composite value from sub-field values and the inverse split.

use indexmap::IndexMap;
use num_complex::Complex64;
use num_rational::Rational64;

use rope_api_core::coercion::{to_complex, to_expr, to_matrix};
use rope_api_core::error::ValidationError;
use rope_api_core::symbolic::{Equation, Expr};
use rope_api_core::Value;

use crate::blueprint::FieldKind;

type Parts = IndexMap<String, Value>;

fn part<'a>(parts: &'a Parts, name: &str) -> Result<&'a Value, ValidationError> {
    parts
        .get(name)
        .ok_or_else(|| ValidationError::new(format!("Missing sub-field '{name}'.")))
}

fn real(value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| ValidationError::new(format!("'{value}' is not a real number.")))
}

fn expr(value: &Value) -> Result<Expr, ValidationError> {
    to_expr(value)
        .ok_or_else(|| ValidationError::new(format!("'{value}' is not an expression.")))
}

/// Combine sub-field values into the value of a node of `kind`.
pub(crate) fn assemble(kind: &FieldKind, parts: Parts) -> Result<Value, ValidationError> {
    match kind {
        FieldKind::Problem => Ok(Value::Dict(
            parts
                .into_iter()
                .map(|(name, value)| (Value::Text(name), value))
                .collect(),
        )),
        FieldKind::Widget(_) | FieldKind::Single => {
            let count = parts.len();
            match parts.into_iter().next() {
                Some((_, value)) if count == 1 => Ok(value),
                _ => Err(ValidationError::new(format!(
                    "Cannot assemble a value from {count} sub-fields."
                ))),
            }
        }
        FieldKind::ElementwiseComplex => {
            let a = real(part(&parts, "a")?)?;
            let b = real(part(&parts, "b")?)?;
            Ok(Value::Complex(Complex64::new(a, b)))
        }
        FieldKind::ElementwiseRational => {
            let (a, b) = (part(&parts, "a")?, part(&parts, "b")?);
            let (Some(a), Some(b)) = (a.as_int(), b.as_int()) else {
                return Err(ValidationError::new("Numerator and denominator must be integers."));
            };
            if b == 0 {
                return Err(ValidationError::new(format!(
                    "Fraction({a}, 0): division by zero."
                )));
            }
            Ok(Value::Rational(Rational64::new(a, b)))
        }
        FieldKind::ElementwiseEquation => {
            let lhs = expr(part(&parts, "lhs")?)?;
            let rhs = expr(part(&parts, "rhs")?)?;
            Ok(Value::Equation(Equation::new(lhs, rhs)))
        }
        FieldKind::ElementwiseVector => {
            if let Some(v) = parts.values().find(|v| !v.is_number()) {
                return Err(ValidationError::new(format!("'{v}' is not a number.")));
            }
            // shaped into a row or column by the vector type's cast
            Ok(Value::List(parts.into_values().collect()))
        }
        FieldKind::ElementwisePolynomial { symbol } => {
            let degree = parts.len().saturating_sub(1);
            let coeffs = (0..=degree)
                .map(|k| {
                    let value = part(&parts, &format!("c{k}"))?;
                    match value {
                        Value::Rational(q) => Ok(*q),
                        Value::Int(i) => Ok(Rational64::from_integer(*i)),
                        other => Err(ValidationError::new(format!(
                            "'{other}' is not a rational coefficient."
                        ))),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Expr(Expr::from_coefficients(symbol, &coeffs)))
        }
    }
}

/// Split `value` into sub-field values keyed by the names in `names`.
pub(crate) fn disassemble(
    kind: &FieldKind,
    names: &[String],
    value: Value,
) -> Result<Parts, ValidationError> {
    let named = |values: Vec<Value>| -> Result<Parts, ValidationError> {
        if values.len() != names.len() {
            return Err(ValidationError::new(format!(
                "Expected {} parts, not {}.",
                names.len(),
                values.len()
            )));
        }
        Ok(names.iter().cloned().zip(values).collect())
    };
    match kind {
        FieldKind::Problem => {
            let Value::Dict(pairs) = value else {
                return Err(ValidationError::new("Problem values are dictionaries."));
            };
            let mut parts = Parts::new();
            for (key, value) in pairs {
                match key {
                    Value::Text(name) => {
                        parts.insert(name, value);
                    }
                    other => {
                        return Err(ValidationError::new(format!(
                            "Input field names are strings, not '{other}'."
                        )))
                    }
                }
            }
            Ok(parts)
        }
        FieldKind::Widget(_) | FieldKind::Single => named(vec![value]),
        FieldKind::ElementwiseComplex => {
            let c = to_complex(&value)
                .ok_or_else(|| ValidationError::new(format!("'{value}' is not a number.")))?;
            Ok(Parts::from([
                ("a".to_string(), Value::Real(c.re)),
                ("b".to_string(), Value::Real(c.im)),
            ]))
        }
        FieldKind::ElementwiseRational => {
            let q = match value {
                Value::Rational(q) => q,
                Value::Int(i) => Rational64::from_integer(i),
                other => {
                    return Err(ValidationError::new(format!("'{other}' is not a fraction.")))
                }
            };
            Ok(Parts::from([
                ("a".to_string(), Value::Int(*q.numer())),
                ("b".to_string(), Value::Int(*q.denom())),
            ]))
        }
        FieldKind::ElementwiseEquation => match value {
            Value::Equation(eq) => Ok(Parts::from([
                ("lhs".to_string(), Value::Expr(eq.lhs)),
                ("rhs".to_string(), Value::Expr(eq.rhs)),
            ])),
            other => Err(ValidationError::new(format!("'{other}' is not an equation."))),
        },
        FieldKind::ElementwiseVector => {
            let m = to_matrix(&value)
                .ok_or_else(|| ValidationError::new(format!("'{value}' is not a vector.")))?;
            let entries = (0..m.entries().len())
                .filter_map(|idx| m.entry_value(idx))
                .collect();
            named(entries)
        }
        FieldKind::ElementwisePolynomial { symbol } => {
            let Value::Expr(e) = value else {
                return Err(ValidationError::new(format!("'{value}' is not a polynomial.")));
            };
            let mut coeffs = e.coefficients(symbol).ok_or_else(|| {
                ValidationError::new(format!("{e} has no rational coefficients in {symbol}."))
            })?;
            if coeffs.len() > names.len() {
                return Err(ValidationError::new(format!(
                    "Expected a polynomial of degree at most {}.",
                    names.len().saturating_sub(1)
                )));
            }
            coeffs.resize(names.len(), Rational64::from_integer(0));
            Ok((0..coeffs.len())
                .map(|k| (format!("c{k}"), Value::Rational(coeffs[k])))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(pairs: &[(&str, Value)]) -> Parts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn it_should_assemble_and_split_fractions() {
        let q = assemble(
            &FieldKind::ElementwiseRational,
            parts(&[("a", Value::Int(3)), ("b", Value::Int(2))]),
        )
        .expect("assemble");
        assert_eq!(q, Value::Rational(Rational64::new(3, 2)));
        let back = disassemble(&FieldKind::ElementwiseRational, &names(&["a", "b"]), q)
            .expect("disassemble");
        assert_eq!(back["a"], Value::Int(3));
        assert_eq!(back["b"], Value::Int(2));
    }

    #[test]
    fn it_should_refuse_a_zero_denominator() {
        let err = assemble(
            &FieldKind::ElementwiseRational,
            parts(&[("a", Value::Int(1)), ("b", Value::Int(0))]),
        )
        .expect_err("zero");
        assert_eq!(err.message, "Fraction(1, 0): division by zero.");
    }

    #[test]
    fn it_should_split_complex_numbers_into_parts() {
        let z = Value::Complex(Complex64::new(1.5, -2.0));
        let back = disassemble(&FieldKind::ElementwiseComplex, &names(&["a", "b"]), z.clone())
            .expect("disassemble");
        let again = assemble(&FieldKind::ElementwiseComplex, back).expect("assemble");
        assert_eq!(again, z);
    }

    #[test]
    fn it_should_pad_polynomial_coefficients() {
        let kind = FieldKind::ElementwisePolynomial {
            symbol: "x".to_string(),
        };
        let e = Expr::parse("2*x + 1").expect("parse");
        let back = disassemble(&kind, &names(&["c2", "c1", "c0"]), Value::Expr(e.clone()))
            .expect("disassemble");
        assert_eq!(back["c2"], Value::Rational(Rational64::from_integer(0)));
        assert_eq!(back["c1"], Value::Rational(Rational64::from_integer(2)));
        match assemble(&kind, back).expect("assemble") {
            Value::Expr(again) => assert!(again.equals(&e)),
            other => panic!("expected expression, got {other:?}"),
        }
    }
}
