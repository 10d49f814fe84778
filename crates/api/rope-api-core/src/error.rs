//! Error kinds shared by every rope crate.
//!
//! Two kinds are kept apart on purpose: [`IllPosedError`] reports a broken
//! exercise definition and goes to the author, [`ValidationError`] reports bad
//! learner input and stays at the input field that produced it.

use thiserror::Error;

use crate::ids::FieldId;

/// Learner input failed parsing, casting or type checking.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Field whose pipeline rejected the value.
    pub field: Option<FieldId>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Attach the offending field unless an inner field was already recorded.
    pub fn at(mut self, field: FieldId) -> Self {
        if self.field.is_none() {
            self.field = Some(field);
        }
        self
    }
}

/// The exercise definition is inconsistent.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct IllPosedError(pub String);

impl IllPosedError {
    pub fn new(message: impl Into<String>) -> Self {
        IllPosedError(message.into())
    }
}

/// Union returned by engine entry points.
#[derive(Debug, Error)]
pub enum RopeError {
    #[error(transparent)]
    IllPosed(#[from] IllPosedError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Any other failure raised inside author code.
    #[error(transparent)]
    Callback(anyhow::Error),
}

impl From<anyhow::Error> for RopeError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<IllPosedError>() {
            Ok(ill_posed) => return RopeError::IllPosed(ill_posed),
            Err(err) => err,
        };
        match err.downcast::<ValidationError>() {
            Ok(invalid) => RopeError::Validation(invalid),
            Err(err) => RopeError::Callback(err),
        }
    }
}

impl RopeError {
    pub fn is_ill_posed(&self) -> bool {
        matches!(self, RopeError::IllPosed(_))
    }
}

pub type Result<T, E = RopeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_errors_keep_their_kind() {
        let err: RopeError = anyhow::Error::new(IllPosedError::new("Missing parameter: a.")).into();
        assert!(err.is_ill_posed());
        assert_eq!(err.to_string(), "Missing parameter: a.");

        let err: RopeError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, RopeError::Callback(_)));
    }

    #[test]
    fn innermost_field_wins() {
        let inner = FieldId::fresh();
        let outer = FieldId::fresh();
        let err = ValidationError::new("bad").at(inner).at(outer);
        assert_eq!(err.field, Some(inner));
    }
}
