use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{bad_type, is_close, DataType};
use crate::coercion::{flat_numbers, to_matrix};
use crate::config::Config;
use crate::error::{IllPosedError, ValidationError};
use crate::value::{EntryKind, Matrix, Value};

/// Number domain required of every matrix entry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Integral,
    Rational,
    Real,
    Complex,
    #[default]
    Number,
}

impl ElementType {
    fn accepts(&self, kind: EntryKind) -> bool {
        match self {
            ElementType::Integral => kind == EntryKind::Integral,
            // entries are stored as floats, finite reals stand in for fractions
            ElementType::Rational | ElementType::Real => kind <= EntryKind::Real,
            ElementType::Complex | ElementType::Number => true,
        }
    }

    fn adjective(&self) -> Option<&'static str> {
        match self {
            ElementType::Integral => Some("integral"),
            ElementType::Rational => Some("rational"),
            ElementType::Real => Some("real"),
            ElementType::Complex => Some("complex"),
            ElementType::Number => None,
        }
    }

    fn suffix(&self) -> String {
        self.adjective()
            .map(|adj| format!(" of {adj} numbers"))
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixType {
    pub nrows: Option<usize>,
    pub ncols: Option<usize>,
    pub sub_dtype: ElementType,
    /// Score the fraction of matching entries instead of all-or-nothing.
    pub compare_elementwise: bool,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for MatrixType {
    fn default() -> Self {
        MatrixType {
            nrows: None,
            ncols: None,
            sub_dtype: ElementType::Number,
            compare_elementwise: true,
            rtol: 0.0,
            atol: 0.0,
        }
    }
}

impl MatrixType {
    pub fn with_shape(mut self, nrows: Option<usize>, ncols: Option<usize>) -> Self {
        self.nrows = nrows;
        self.ncols = ncols;
        self
    }

    pub fn with_sub_dtype(mut self, sub_dtype: ElementType) -> Self {
        self.sub_dtype = sub_dtype;
        self
    }

    fn close(&self, a: &Complex64, b: &Complex64) -> bool {
        is_close((a - b).norm(), b.norm(), self.rtol, self.atol)
    }
}

impl DataType for MatrixType {
    fn info(&self) -> String {
        let shape = match (self.nrows, self.ncols) {
            (None, None) => "a matrix".to_string(),
            (Some(r), None) => format!("a matrix with {r} rows"),
            (None, Some(c)) => format!("a matrix with {c} columns"),
            (Some(r), Some(c)) => format!("a {r}x{c} matrix"),
        };
        format!("{shape}{}", self.sub_dtype.suffix())
    }

    fn validate(&self) -> Result<(), IllPosedError> {
        if self.nrows == Some(0) {
            return Err(IllPosedError::new("Number of rows must be positive."));
        }
        if self.ncols == Some(0) {
            return Err(IllPosedError::new("Number of columns must be positive."));
        }
        Ok(())
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match to_matrix(&value) {
            Some(m) => Value::Matrix(m),
            None => value,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        let m = match value {
            Value::Matrix(m) => m,
            other if flat_numbers(other).is_some() => {
                return Err(ValidationError::new("Expected two dimensions, not 1."));
            }
            other => return Err(bad_type(other, "matrix")),
        };
        if m.is_empty() {
            return Err(ValidationError::new("Empty matrix."));
        }
        if let Some(nrows) = self.nrows {
            if m.nrows() != nrows {
                return Err(ValidationError::new(format!(
                    "Expected {nrows} rows, not {}.",
                    m.nrows()
                )));
            }
        }
        if let Some(ncols) = self.ncols {
            if m.ncols() != ncols {
                return Err(ValidationError::new(format!(
                    "Expected {ncols} columns, not {}.",
                    m.ncols()
                )));
            }
        }
        if !self.sub_dtype.accepts(m.entry_kind()) {
            if let Some(adj) = self.sub_dtype.adjective() {
                return Err(ValidationError::new(format!("Entries must be {adj}.")));
            }
        }
        Ok(())
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        let (Value::Matrix(a), Value::Matrix(b)) = (lhs, rhs) else {
            return 0.0;
        };
        if a.shape() != b.shape() || a.is_empty() {
            return 0.0;
        }
        let hits = a
            .entries()
            .iter()
            .zip(b.entries())
            .filter(|(x, y)| self.close(x, y))
            .count();
        let total = a.entries().len();
        if self.compare_elementwise {
            hits as f64 / total as f64
        } else if hits == total {
            1.0
        } else {
            0.0
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Matrix(Matrix::zeros(1, 1)))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Matrix(Matrix::zeros(
            self.nrows.unwrap_or(1),
            self.ncols.unwrap_or(1),
        )))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Column,
    Row,
}

impl Orientation {
    fn name(&self) -> &'static str {
        match self {
            Orientation::Column => "column",
            Orientation::Row => "row",
        }
    }
}

/// A matrix with a single column (or row).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorType {
    pub dim: Option<usize>,
    pub orientation: Orientation,
    /// Accept `[1, 2, 3]` in place of `[[1], [2], [3]]`.
    pub allow_flat_list: bool,
    pub sub_dtype: ElementType,
    pub compare_elementwise: bool,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for VectorType {
    fn default() -> Self {
        VectorType {
            dim: None,
            orientation: Orientation::Column,
            allow_flat_list: true,
            sub_dtype: ElementType::Number,
            compare_elementwise: true,
            rtol: 0.0,
            atol: 0.0,
        }
    }
}

impl VectorType {
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    fn as_matrix(&self) -> MatrixType {
        let (nrows, ncols) = match self.orientation {
            Orientation::Column => (self.dim, Some(1)),
            Orientation::Row => (Some(1), self.dim),
        };
        MatrixType {
            nrows,
            ncols,
            sub_dtype: self.sub_dtype,
            compare_elementwise: self.compare_elementwise,
            rtol: self.rtol,
            atol: self.atol,
        }
    }
}

impl DataType for VectorType {
    fn info(&self) -> String {
        let shape = match self.dim {
            Some(dim) => format!("a {dim}-dimensional {} vector", self.orientation.name()),
            None => format!("a {} vector", self.orientation.name()),
        };
        format!("{shape}{}", self.sub_dtype.suffix())
    }

    fn validate(&self) -> Result<(), IllPosedError> {
        match self.dim {
            Some(0) => Err(IllPosedError::new("Dimension must be positive, not 0.")),
            _ => Ok(()),
        }
    }

    fn cast(&self, value: Value, config: &Config) -> Value {
        if self.allow_flat_list {
            if let Some(entries) = flat_numbers(&value) {
                let n = entries.len();
                let shaped = match self.orientation {
                    Orientation::Column => Matrix::new(n, 1, entries),
                    Orientation::Row => Matrix::new(1, n, entries),
                };
                if let Some(m) = shaped {
                    return Value::Matrix(m);
                }
            }
        }
        self.as_matrix().cast(value, config)
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        self.as_matrix().check_type(value)
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        self.as_matrix().compare(lhs, rhs)
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Matrix(Matrix::zeros(1, 1)))
    }

    fn dummy(&self) -> Option<Value> {
        self.as_matrix().dummy()
    }
}
