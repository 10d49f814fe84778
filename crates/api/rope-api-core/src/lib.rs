//! Core value layer of the rope exercise engine: values, data types,
//! configuration, errors and the literal and symbolic parsers they rely on.

pub mod coercion;
pub mod config;
pub mod dtype;
pub mod error;
pub mod ids;
pub mod literal;
pub mod rational;
pub mod symbolic;
pub mod value;

pub use config::{Config, ScoreProcessing, Transformation};
pub use dtype::{DType, DataType};
pub use error::{IllPosedError, RopeError, ValidationError};
pub use ids::FieldId;
pub use symbolic::{Equation, Expr};
pub use value::{EntryKind, Matrix, Value, ValueKind};
