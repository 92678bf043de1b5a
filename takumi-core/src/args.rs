//! Decoded call arguments.
//!
//! A call arrives from the codec already split into positional and keyword
//! arguments. Values are dynamic (`serde_json::Value`); handlers pull typed
//! values out with [`CallArgs::get`], [`CallArgs::get_kw`] or [`CallArgs::param`].

use crate::error::ArgError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Positional and keyword arguments of a single call.
///
/// Keyword arguments keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl CallArgs {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from already-decoded parts.
    pub fn from_parts(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Positional arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Keyword arguments.
    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    /// Split back into positional and keyword parts.
    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.args, self.kwargs)
    }

    /// Deserialize the positional argument at `index`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgError> {
        let value = self
            .args
            .get(index)
            .ok_or(ArgError::MissingPositional(index))?;
        decode(index.to_string(), value)
    }

    /// Deserialize the keyword argument `name`.
    pub fn get_kw<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgError> {
        let value = self
            .kwargs
            .get(name)
            .ok_or_else(|| ArgError::MissingKeyword(name.to_string()))?;
        decode(name.to_string(), value)
    }

    /// Deserialize a parameter passed either by position or by keyword.
    ///
    /// The positional slot wins when both are present.
    pub fn param<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ArgError> {
        match self.args.get(index) {
            Some(value) => decode(name.to_string(), value),
            None => self.get_kw(name),
        }
    }
}

fn decode<T: DeserializeOwned>(name: String, value: &Value) -> Result<T, ArgError> {
    T::deserialize(value).map_err(|source| ArgError::Invalid { name, source })
}

/// Renders `a,b,key=value` with values in their JSON literal form.
///
/// Positional arguments come first, then keyword arguments in insertion order.
pub struct DisplayArgs<'a> {
    args: &'a [Value],
    kwargs: &'a Map<String, Value>,
}

impl<'a> DisplayArgs<'a> {
    /// Borrow separate positional and keyword parts for display.
    pub fn new(args: &'a [Value], kwargs: &'a Map<String, Value>) -> Self {
        Self { args, kwargs }
    }
}

impl fmt::Display for DisplayArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positional = self.args.iter().map(|v| (None, v));
        let keyword = self.kwargs.iter().map(|(k, v)| (Some(k), v));
        for (i, (key, value)) in positional.chain(keyword).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match key {
                Some(key) => write!(f, "{key}={value}")?,
                None => write!(f, "{value}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DisplayArgs::new(&self.args, &self.kwargs).fmt(f)
    }
}
