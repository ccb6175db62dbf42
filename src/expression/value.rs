use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types a [`Var`] can carry; indexes the dispatch matrix
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Int = 0,
    Double = 1,
    String = 2,
    Bool = 3,
    Invalid = 4,
}

impl DType {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int | DType::Double)
    }
}

/// Values flowing through evaluation and the dispatch matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Var {
    Int(i64),
    Double(f64),
    String(String),
    Bool(bool),
    /// Evaluation could not produce a value
    Invalid,
}

impl Var {
    /// Get the data type of this value
    pub fn dtype(&self) -> DType {
        match self {
            Var::Int(_) => DType::Int,
            Var::Double(_) => DType::Double,
            Var::String(_) => DType::String,
            Var::Bool(_) => DType::Bool,
            Var::Invalid => DType::Invalid,
        }
    }

    /// Numeric view; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Var::Int(i) => Some(*i as f64),
            Var::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Var::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Var::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.dtype().is_numeric()
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Var::Invalid)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Int(i) => write!(f, "{}", i),
            Var::Double(d) => write!(f, "{}", d),
            Var::String(s) => write!(f, "{}", s),
            Var::Bool(b) => write!(f, "{}", b),
            Var::Invalid => write!(f, "<invalid>"),
        }
    }
}

impl From<i64> for Var {
    fn from(value: i64) -> Self {
        Var::Int(value)
    }
}

impl From<f64> for Var {
    fn from(value: f64) -> Self {
        Var::Double(value)
    }
}

impl From<bool> for Var {
    fn from(value: bool) -> Self {
        Var::Bool(value)
    }
}

impl From<&str> for Var {
    fn from(value: &str) -> Self {
        Var::String(value.to_string())
    }
}

impl From<String> for Var {
    fn from(value: String) -> Self {
        Var::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype() {
        assert_eq!(Var::Int(1).dtype(), DType::Int);
        assert_eq!(Var::from(1.5).dtype(), DType::Double);
        assert_eq!(Var::from("x").dtype(), DType::String);
        assert_eq!(Var::from(true).dtype(), DType::Bool);
        assert_eq!(Var::Invalid.dtype(), DType::Invalid);
        assert!(DType::Int.is_numeric());
        assert!(!DType::Bool.is_numeric());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Var::Int(3).as_f64(), Some(3.0));
        assert_eq!(Var::Double(2.5).as_f64(), Some(2.5));
        assert_eq!(Var::from("a").as_f64(), None);
        assert_eq!(Var::Bool(false).as_bool(), Some(false));
        assert_eq!(Var::from("abc").as_str(), Some("abc"));
        assert!(Var::Invalid.is_invalid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Var::Int(42).to_string(), "42");
        assert_eq!(Var::Double(0.5).to_string(), "0.5");
        assert_eq!(Var::Bool(true).to_string(), "true");
        assert_eq!(Var::Invalid.to_string(), "<invalid>");
    }
}
