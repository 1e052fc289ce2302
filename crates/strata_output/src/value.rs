//! Untyped values, runtime type tags and narrowing conversions.
//!
//! Engines report resource state as loosely typed JSON values. This module
//! narrows an `Output<Value>` into a concrete typed output with a runtime
//! type check. A mismatch fails only the narrowed output, never its source.
//!
//! # Absent values
//!
//! A `null` (or missing) value narrowed to a string-like type
//! ([`String`], [`ResourceId`]) resolves to the empty value instead of
//! failing, so optional string outputs can be consumed without ceremony.
//! Every other narrowing of `null` fails with a type mismatch: a missing
//! number or flag has no meaningful zero.

use core::fmt;

use serde_json::Value;

use crate::all::all;
use crate::error::OutputError;
use crate::id::ResourceId;
use crate::output::{Output, OutputState, OutputValue};

/// Resolved state of a resource, keyed by property name.
pub type PropertyBag = serde_json::Map<String, Value>;

/// Sentinel the engine substitutes for values it cannot know yet.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Returns `true` if the value is the engine's unknown sentinel.
#[must_use]
pub fn is_unknown_value(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == UNKNOWN_VALUE)
}

/// Runtime type tag of an untyped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null` or absent.
    Null,
    /// A boolean.
    Bool,
    /// A number.
    Number,
    /// A string.
    String,
    /// A sequence.
    Array,
    /// A nested mapping.
    Object,
}

impl ValueKind {
    /// Returns the type tag of a value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Types an untyped value can be narrowed into.
pub trait Narrow: OutputValue {
    /// Name of the expected type, used in mismatch errors.
    const EXPECTED: &'static str;

    /// Converts the value, failing on a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::TypeMismatch`] naming both the expected and
    /// the actual type when the value has the wrong runtime type.
    fn narrow(value: Value) -> Result<Self, OutputError>;
}

fn mismatch<T: Narrow>(value: &Value) -> OutputError {
    OutputError::TypeMismatch {
        expected: T::EXPECTED,
        actual: ValueKind::of(value),
    }
}

impl Narrow for String {
    const EXPECTED: &'static str = "string";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Narrow for ResourceId {
    const EXPECTED: &'static str = "identifier";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match value {
            Value::Null => Ok(ResourceId::default()),
            Value::String(s) => Ok(ResourceId::from(s)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Narrow for f64 {
    const EXPECTED: &'static str = "number";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match &value {
            Value::Number(n) => n.as_f64().ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Narrow for i64 {
    const EXPECTED: &'static str = "integer";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        let Value::Number(n) = &value else {
            return Err(mismatch::<Self>(&value));
        };
        if let Some(int) = n.as_i64() {
            return Ok(int);
        }
        // Engines report every number as a float; truncate toward zero.
        match n.as_f64() {
            Some(float)
                if float.is_finite() && float >= i64::MIN as f64 && float < i64::MAX as f64 =>
            {
                Ok(float.trunc() as i64)
            }
            _ => Err(OutputError::msg(format!(
                "number {n} is out of range for integer"
            ))),
        }
    }
}

impl Narrow for bool {
    const EXPECTED: &'static str = "bool";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Narrow for Vec<Value> {
    const EXPECTED: &'static str = "array";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match value {
            Value::Array(items) => Ok(items),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Narrow for PropertyBag {
    const EXPECTED: &'static str = "object";

    fn narrow(value: Value) -> Result<Self, OutputError> {
        match value {
            Value::Object(bag) => Ok(bag),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Output<Value> {
    /// Narrows the untyped value into `T`.
    ///
    /// The engine's unknown sentinel narrows to an unknown output.
    pub fn narrow<T: Narrow>(&self) -> Output<T> {
        self.apply_state(|value| {
            if is_unknown_value(&value) {
                return OutputState::Unknown;
            }
            match T::narrow(value) {
                Ok(narrowed) => OutputState::Known(narrowed),
                Err(err) => OutputState::Failed(err),
            }
        })
    }

    /// Narrows to a string; `null` becomes `""`.
    pub fn as_string(&self) -> Output<String> {
        self.narrow()
    }

    /// Narrows to a resource identifier; `null` becomes the empty identifier.
    pub fn as_id(&self) -> Output<ResourceId> {
        self.narrow()
    }

    /// Narrows to a floating point number.
    pub fn as_f64(&self) -> Output<f64> {
        self.narrow()
    }

    /// Narrows to an integer, truncating fractional numbers.
    pub fn as_i64(&self) -> Output<i64> {
        self.narrow()
    }

    /// Narrows to a boolean.
    pub fn as_bool(&self) -> Output<bool> {
        self.narrow()
    }

    /// Narrows to a sequence.
    pub fn as_array(&self) -> Output<Vec<Value>> {
        self.narrow()
    }

    /// Narrows to a nested property bag.
    pub fn as_bag(&self) -> Output<PropertyBag> {
        self.narrow()
    }
}

impl Output<PropertyBag> {
    /// Looks up a property whose key may itself be an output.
    ///
    /// Computed as `All(key, bag).Apply(bag[key])`, so it works for bags
    /// whose keys are only known after resolution. A missing key yields a
    /// known `null`, not an error.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::{Value, json};
    /// use strata_output::{Output, OutputState, PropertyBag};
    ///
    /// # futures::executor::block_on(async {
    /// let Value::Object(bag) = json!({ "url": "https://x" }) else { unreachable!() };
    /// let outputs: Output<PropertyBag> = Output::known(bag);
    ///
    /// let url = outputs.lookup("url").as_string();
    /// assert!(matches!(url.state().await, OutputState::Known(u) if u == "https://x"));
    ///
    /// let missing = outputs.lookup("missing").as_string();
    /// assert!(matches!(missing.state().await, OutputState::Known(u) if u.is_empty()));
    /// # });
    /// ```
    pub fn lookup(&self, key: impl Into<Output<String>>) -> Output<Value> {
        all((key.into(), self.clone())).apply_state(|(key, bag)| match bag.get(&key) {
            Some(value) if is_unknown_value(value) => OutputState::Unknown,
            Some(value) => OutputState::Known(value.clone()),
            None => OutputState::Known(Value::Null),
        })
    }
}
