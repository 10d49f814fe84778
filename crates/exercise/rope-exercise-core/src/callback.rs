//! Author callbacks and the argument manifests they are bound through.
//!
//! Every callback declares the names it reads. The engine forwards exactly
//! those names from what is available at the call site, fills declared
//! defaults, and rejects a call when a required name is missing.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use indexmap::IndexMap;
use rand::rngs::StdRng;

use rope_api_core::error::{IllPosedError, RopeError};
use rope_api_core::Value;

/// Values available at a call site. `None` marks an empty answer.
pub type Kwargs = IndexMap<String, Option<Value>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    /// `Some` makes the parameter optional; the inner `None` is an empty
    /// default.
    pub default: Option<Option<Value>>,
}

/// Declared parameter list of one callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(required: &[&str]) -> Self {
        Signature {
            params: required
                .iter()
                .map(|name| Param {
                    name: name.to_string(),
                    default: None,
                })
                .collect(),
        }
    }

    pub fn with_default(mut self, name: &str, default: impl Into<Option<Value>>) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            default: Some(default.into()),
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Select the declared subset of `available`.
    pub fn bind(&self, available: &Kwargs) -> Result<Args, IllPosedError> {
        let mut values = IndexMap::with_capacity(self.params.len());
        for param in &self.params {
            let value = match (available.get(&param.name), &param.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(IllPosedError::new(format!(
                        "Missing parameter: {}.",
                        param.name
                    )))
                }
            };
            values.insert(param.name.clone(), value);
        }
        Ok(Args { values })
    }
}

impl<const N: usize> From<[&str; N]> for Signature {
    fn from(required: [&str; N]) -> Self {
        Signature::new(&required)
    }
}

impl From<&[&str]> for Signature {
    fn from(required: &[&str]) -> Self {
        Signature::new(required)
    }
}

/// Arguments handed to a callback after binding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: Kwargs,
}

impl Args {
    /// Value of `name`; `None` when it is empty or was not declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn is_none(&self, name: &str) -> bool {
        self.get(name).is_none()
    }

    pub fn value(&self, name: &str) -> anyhow::Result<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Argument '{name}' is empty."))
    }

    pub fn int(&self, name: &str) -> anyhow::Result<i64> {
        let value = self.value(name)?;
        value
            .as_int()
            .ok_or_else(|| anyhow!("Argument '{name}' is not an integer: {value}."))
    }

    pub fn real(&self, name: &str) -> anyhow::Result<f64> {
        let value = self.value(name)?;
        value
            .as_f64()
            .ok_or_else(|| anyhow!("Argument '{name}' is not a real number: {value}."))
    }

    /// Elements of a set, tuple or list argument.
    pub fn items(&self, name: &str) -> anyhow::Result<Vec<Value>> {
        let value = self.value(name)?;
        value
            .items()
            .map(<[Value]>::to_vec)
            .ok_or_else(|| anyhow!("Argument '{name}' is not a collection: {value}."))
    }
}

type Func<T> = dyn Fn(&Args) -> anyhow::Result<T> + Send + Sync;
type ParamsFunc = dyn Fn(&Args, &mut StdRng) -> anyhow::Result<IndexMap<String, Value>> + Send + Sync;

/// A callback together with its manifest.
pub struct Callback<T> {
    signature: Signature,
    func: Arc<Func<T>>,
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Callback {
            signature: self.signature.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Callback<T> {
    pub fn new<F, R>(signature: Signature, func: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<T>,
    {
        Callback {
            signature,
            func: Arc::new(move |args: &Args| func(args).map(Into::into)),
        }
    }

    /// Callback without parameters that always yields `value`.
    pub fn constant(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Callback {
            signature: Signature::default(),
            func: Arc::new(move |_: &Args| Ok(value.clone())),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn apply(&self, available: &Kwargs) -> Result<T, RopeError> {
        let args = self.signature.bind(available)?;
        (self.func)(&args).map_err(RopeError::from)
    }
}

/// The parameters callback; it alone draws randomness.
pub struct ParametersCallback {
    signature: Signature,
    func: Arc<ParamsFunc>,
}

impl Clone for ParametersCallback {
    fn clone(&self) -> Self {
        ParametersCallback {
            signature: self.signature.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl fmt::Debug for ParametersCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametersCallback")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Default for ParametersCallback {
    fn default() -> Self {
        ParametersCallback::new(Signature::default(), |_, _| Ok(IndexMap::new()))
    }
}

impl ParametersCallback {
    pub fn new<F>(signature: Signature, func: F) -> Self
    where
        F: Fn(&Args, &mut StdRng) -> anyhow::Result<IndexMap<String, Value>>
            + Send
            + Sync
            + 'static,
    {
        ParametersCallback {
            signature,
            func: Arc::new(func),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn apply(
        &self,
        available: &Kwargs,
        rng: &mut StdRng,
    ) -> Result<IndexMap<String, Value>, RopeError> {
        let args = self.signature.bind(available)?;
        (self.func)(&args, rng).map_err(RopeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Kwargs {
        let mut kwargs = Kwargs::new();
        kwargs.insert("a".into(), Some(Value::Int(2)));
        kwargs.insert("b".into(), None);
        kwargs.insert("unused".into(), Some(Value::Int(9)));
        kwargs
    }

    #[test]
    fn it_should_forward_only_declared_names() {
        let args = Signature::new(&["a", "b"]).bind(&available()).expect("bind");
        assert_eq!(args.int("a").expect("a"), 2);
        assert!(args.is_none("b"));
        assert!(args.get("unused").is_none());
    }

    #[test]
    fn it_should_reject_missing_required_names() {
        let err = Signature::new(&["c"]).bind(&available()).expect_err("missing");
        assert_eq!(err.to_string(), "Missing parameter: c.");
    }

    #[test]
    fn it_should_fill_declared_defaults() {
        let sig = Signature::default().with_default("c", Value::Int(5));
        let args = sig.bind(&available()).expect("bind");
        assert_eq!(args.int("c").expect("c"), 5);
    }

    #[test]
    fn it_should_keep_the_kind_of_callback_errors() {
        let cb: Callback<String> = Callback::new(Signature::default(), |_| {
            Err::<String, _>(IllPosedError::new("broken").into())
        });
        let err = cb.apply(&Kwargs::new()).expect_err("ill posed");
        assert!(err.is_ill_posed());
    }
}
