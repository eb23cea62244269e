// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Database values and conversions.
//!
//! [`Value`] is the currency between generated code and drivers: parameters
//! are converted with [`ToValue`], cells are converted back with
//! [`FromValue`].

/// One database value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,

    /// Boolean.
    Bool(bool),

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit float.
    Float(f64),

    /// Text.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>)
}

impl Value {
    /// Whether this is `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short kind name used in decode errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes"
        }
    }
}

/// Conversion into a bound parameter value.
pub trait ToValue {
    /// Produce the parameter value.
    fn to_value(&self) -> Value;
}

/// Failed conversion from a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    /// Requested Rust type.
    pub expected: &'static str,

    /// Value kind that was found.
    pub found: &'static str
}

/// Conversion from a result cell.
pub trait FromValue: Sized {
    /// Convert, consuming the value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the value kind does not fit `Self`.
    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            other => Err(mismatch("bool", &other))
        }
    }
}

macro_rules! int_values {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, DecodeError> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| DecodeError {
                        expected: stringify!($ty),
                        found:    "out-of-range integer"
                    }),
                    Value::Bool(b) => Ok(<$ty>::from(b)),
                    other => Err(mismatch(stringify!($ty), &other))
                }
            }
        }
    )*};
}

int_values!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_int_values {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, DecodeError> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| DecodeError {
                        expected: stringify!($ty),
                        found:    "out-of-range integer"
                    }),
                    other => Err(mismatch(stringify!($ty), &other))
                }
            }
        }
    )*};
}

wide_int_values!(u64, usize);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Float(f) => Ok(f),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("f64", &other))
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        #[allow(clippy::cast_possible_truncation)]
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("String", &other))
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("Vec<u8>", &other))
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> DecodeError {
    DecodeError {
        expected,
        found: found.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_null() {
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(Some(5_i32).to_value(), Value::Int(5));
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
    }

    #[test]
    fn references_forward() {
        let name = "Ann";
        assert_eq!((&name).to_value(), Value::Text("Ann".into()));
        let owned = String::from("Bob");
        assert_eq!((&&owned).to_value(), Value::Text("Bob".into()));
    }

    #[test]
    fn integer_range_is_checked() {
        assert_eq!(i8::from_value(Value::Int(12)), Ok(12));
        assert!(i8::from_value(Value::Int(1_000)).is_err());
        assert!(u64::from_value(Value::Int(-1)).is_err());
        assert_eq!(usize::from_value(Value::Int(7)), Ok(7));
    }

    #[test]
    fn null_into_plain_type_fails() {
        let err = String::from_value(Value::Null).unwrap_err();
        assert_eq!(err.expected, "String");
        assert_eq!(err.found, "NULL");
    }

    #[test]
    fn bool_accepts_integers() {
        assert_eq!(bool::from_value(Value::Int(0)), Ok(false));
        assert_eq!(bool::from_value(Value::Int(1)), Ok(true));
    }

    #[test]
    fn float_accepts_integers() {
        assert_eq!(f64::from_value(Value::Int(2)), Ok(2.0));
    }
}
