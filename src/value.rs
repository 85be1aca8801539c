//! Values produced and consumed by message formatting.
//!
//! A [`Value`] is either a string, a number, or a hole marker for something
//! that could not be resolved. Numbers are carried as `f32`; every numeric
//! context input is widened to that. Display of a hole renders as
//! `{label}`, keeping the failure visible in-band in the formatted output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A function callable from a pattern: positional arguments first, named
/// arguments second. Registered through a
/// [`FormatContext`](crate::bundle::FormatContext).
pub type Function = Arc<dyn Fn(&[Value], &HashMap<String, Value>) -> Value + Send + Sync>;

/// The result of resolving one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain string.
    String(String),
    /// A number; formats as the shortest decimal that round-trips.
    Number(f32),
    /// No real value could be built; the label describes what was missing
    /// and renders inside braces.
    None(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(value) => f.write_str(value),
            Value::Number(value) => write!(f, "{value}"),
            Value::None(label) => write!(f, "{{{label}}}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value as f32)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f32)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_displays_verbatim() {
        assert_eq!(Value::String("hi".into()).to_string(), "hi");
    }

    #[test]
    fn test_number_displays_shortest_form() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Number(-2.25).to_string(), "-2.25");
    }

    #[test]
    fn test_none_renders_as_hole() {
        assert_eq!(Value::None("$count".into()).to_string(), "{$count}");
    }

    #[test]
    fn test_integer_inputs_widen_to_number() {
        assert_eq!(Value::from(7u8), Value::Number(7.0));
        assert_eq!(Value::from(-7i64), Value::Number(-7.0));
        assert_eq!(Value::from(1.5f64), Value::Number(1.5));
    }
}
