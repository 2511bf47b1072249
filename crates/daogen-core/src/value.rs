// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Column values and conversions.
//!
//! Every value crossing the storage boundary is a [`Value`]. Generated code
//! binds arguments through [`ToValue`] and reads columns through
//! [`FromValue`]; custom types plug in with a [`TypeConverter`].
//!
//! | Rust type | Storage class |
//! |-----------|---------------|
//! | `i8`..`i64`, `u8`..`u32`, `bool` | `Integer` |
//! | `f32`, `f64` | `Real` |
//! | `String`, `&str` | `Text` |
//! | `Vec<u8>`, `&[u8]` | `Blob` |
//! | `Option<T>` | `Null` or the class of `T` |

/// A single column value in one of the storage classes of the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,

    /// 64-bit signed integer.
    Integer(i64),

    /// 64-bit float.
    Real(f64),

    /// UTF-8 text.
    Text(String),

    /// Raw bytes.
    Blob(Vec<u8>)
}

impl Value {
    /// Check if this is SQL `NULL`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Storage class name used in conversion errors.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Real(_) => "REAL",
            Self::Text(_) => "TEXT",
            Self::Blob(_) => "BLOB"
        }
    }
}

/// Failure to read a [`Value`] as a Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// The value was `NULL` but the target type is not an `Option`.
    UnexpectedNull,

    /// The storage class does not fit the target type.
    Mismatch {
        /// Target type.
        expected: &'static str,
        /// Storage class found.
        found:    &'static str
    }
}

/// Conversion of a Rust value into a bindable [`Value`].
pub trait ToValue {
    /// Produce the value to bind.
    fn to_value(&self) -> Value;
}

/// Conversion of a column [`Value`] into a Rust value.
pub trait FromValue: Sized {
    /// Read the value.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Custom mapping between a domain type and a storable column type.
///
/// Converters are stateless; generated code calls the associated functions
/// directly and reports the converter path from `required_converters()`.
///
/// # Example
///
/// ```rust
/// use daogen_core::TypeConverter;
///
/// pub struct Celsius(pub f64);
///
/// pub struct CelsiusConverter;
///
/// impl TypeConverter for CelsiusConverter {
///     type Value = Celsius;
///     type Column = f64;
///
///     fn to_column(value: &Celsius) -> f64 {
///         value.0
///     }
///
///     fn from_column(column: f64) -> Celsius {
///         Celsius(column)
///     }
/// }
/// ```
pub trait TypeConverter {
    /// Domain type seen by the interface.
    type Value;

    /// Type actually stored in the column.
    type Column: ToValue + FromValue;

    /// Convert a domain value for binding.
    fn to_column(value: &Self::Value) -> Self::Column;

    /// Convert a read column back into the domain type.
    fn from_column(column: Self::Column) -> Self::Value;
}

const fn mismatch(expected: &'static str, value: &Value) -> ConversionError {
    match value {
        Value::Null => ConversionError::UnexpectedNull,
        other => ConversionError::Mismatch {
            expected,
            found: other.type_name()
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Integer(v) => Ok(*v),
            other => Err(mismatch("i64", other))
        }
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Integer(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::Mismatch {
                                expected: stringify!($ty),
                                found:    "INTEGER"
                            }
                        }),
                        other => Err(mismatch(stringify!($ty), other))
                    }
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, u8, u16, u32);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Integer(v) => Ok(*v != 0),
            other => Err(mismatch("bool", other))
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Real(v) => Ok(*v),
            // Numeric affinity may store whole reals as integers.
            #[allow(clippy::cast_precision_loss)]
            Value::Integer(v) => Ok(*v as f64),
            other => Err(mismatch("f64", other))
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        f64::from_value(value)
            .map(|v| v as f32)
            .map_err(|err| match err {
                ConversionError::Mismatch {
                    found, ..
                } => ConversionError::Mismatch {
                    expected: "f32",
                    found
                },
                null => null
            })
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
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch("String", other))
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Blob(v) => Ok(v.clone()),
            other => Err(mismatch("Vec<u8>", other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_round_trip() {
        assert_eq!(42_i64.to_value(), Value::Integer(42));
        assert_eq!(i32::from_value(&Value::Integer(-7)), Ok(-7));
        assert_eq!(u8::from_value(&Value::Integer(255)), Ok(255));
    }

    #[test]
    fn narrow_integer_overflow_is_mismatch() {
        let err = u8::from_value(&Value::Integer(256)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Mismatch {
                expected: "u8",
                found:    "INTEGER"
            }
        );
    }

    #[test]
    fn null_into_non_option_fails() {
        assert_eq!(
            String::from_value(&Value::Null),
            Err(ConversionError::UnexpectedNull)
        );
    }

    #[test]
    fn option_reads_null_as_none() {
        assert_eq!(Option::<String>::from_value(&Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(&Value::Text("a".into())),
            Ok(Some("a".to_owned()))
        );
        assert_eq!(None::<i64>.to_value(), Value::Null);
    }

    #[test]
    fn bool_uses_integer_storage() {
        assert_eq!(true.to_value(), Value::Integer(1));
        assert_eq!(bool::from_value(&Value::Integer(0)), Ok(false));
    }

    #[test]
    fn real_accepts_integer_storage() {
        assert_eq!(f64::from_value(&Value::Integer(3)), Ok(3.0));
    }

    #[test]
    fn references_bind_like_owned() {
        let name = "ada";
        assert_eq!((&name).to_value(), Value::Text("ada".into()));
        assert_eq!(vec![1_u8, 2].to_value(), Value::Blob(vec![1, 2]));
    }

    #[test]
    fn text_into_integer_is_mismatch() {
        assert_eq!(
            i64::from_value(&Value::Text("x".into())),
            Err(ConversionError::Mismatch {
                expected: "i64",
                found:    "TEXT"
            })
        );
    }
}
