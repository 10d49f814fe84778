use serde::{Deserialize, Serialize};

use super::{bad_type, exact, DataType};
use crate::config::Config;
use crate::error::ValidationError;
use crate::value::Value;

fn container_info(article: &str, noun: &str, count: Option<usize>) -> String {
    match count {
        None => format!("{article} {noun}"),
        Some(0) => format!("an empty {noun}"),
        Some(1) => format!("{article} {noun} with one element"),
        Some(n) => format!("{article} {noun} with {n} elements"),
    }
}

fn check_count(noun: &str, count: Option<usize>, len: usize) -> Result<(), ValidationError> {
    match count {
        Some(count) if count != len => Err(ValidationError::new(format!(
            "Expected {noun} with {count} elements, not {len}."
        ))),
        _ => Ok(()),
    }
}

fn zeros(count: Option<usize>) -> Vec<Value> {
    match count {
        None => vec![Value::Int(0)],
        Some(n) => vec![Value::Int(0); n],
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetComparison {
    #[default]
    #[serde(rename = "equality")]
    Equality,
    /// Intersection over union.
    #[serde(rename = "IoU")]
    IoU,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetType {
    pub count: Option<usize>,
    #[serde(default)]
    pub comparison: SetComparison,
}

impl DataType for SetType {
    fn info(&self) -> String {
        container_info("a", "set", self.count)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            // `{}` reads as a dictionary
            Value::Dict(pairs) if pairs.is_empty() => Value::Set(Vec::new()),
            Value::List(items) | Value::Tuple(items) => Value::set(items),
            other => other,
        }
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Set(items) => Value::set(items),
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Set(items) => check_count("set", self.count, items.len()),
            other => Err(bad_type(other, "set")),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> f64 {
        match self.comparison {
            SetComparison::Equality => exact(lhs, rhs),
            SetComparison::IoU => {
                let (Value::Set(a), Value::Set(b)) = (lhs, rhs) else {
                    return 0.0;
                };
                let common = a.iter().filter(|item| b.contains(item)).count();
                let union = a.len() + b.len() - common;
                if union == 0 {
                    1.0
                } else {
                    common as f64 / union as f64
                }
            }
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Set(Vec::new()))
    }

    fn dummy(&self) -> Option<Value> {
        let n = self.count.unwrap_or(1) as i64;
        Some(Value::Set((0..n).map(Value::Int).collect()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TupleType {
    pub count: Option<usize>,
}

impl DataType for TupleType {
    fn info(&self) -> String {
        container_info("a", "tuple", self.count)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::List(items) => Value::Tuple(items),
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Tuple(items) => check_count("tuple", self.count, items.len()),
            other => Err(bad_type(other, "tuple")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Tuple(Vec::new()))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::Tuple(zeros(self.count)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListType {
    pub count: Option<usize>,
}

impl DataType for ListType {
    fn info(&self) -> String {
        container_info("a", "list", self.count)
    }

    fn cast(&self, value: Value, _config: &Config) -> Value {
        match value {
            Value::Tuple(items) => Value::List(items),
            other => other,
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::List(items) => check_count("list", self.count, items.len()),
            other => Err(bad_type(other, "list")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::List(Vec::new()))
    }

    fn dummy(&self) -> Option<Value> {
        Some(Value::List(zeros(self.count)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DictType {
    pub count: Option<usize>,
}

impl DataType for DictType {
    fn info(&self) -> String {
        container_info("a", "dictionary", self.count)
    }

    fn check_type(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Dict(pairs) => check_count("dictionary", self.count, pairs.len()),
            other => Err(bad_type(other, "dict")),
        }
    }

    fn trivial(&self) -> Option<Value> {
        Some(Value::Dict(Vec::new()))
    }

    fn dummy(&self) -> Option<Value> {
        let n = self.count.unwrap_or(1) as i64;
        Some(Value::Dict(
            (0..n).map(|i| (Value::Int(i), Value::Bool(true))).collect(),
        ))
    }
}
