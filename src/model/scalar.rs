//! Scalar node values.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::fmt;
use std::str::FromStr;

/// A leaf value carried by a node.
///
/// Integers and decimals are arbitrary precision. Two decimals compare equal when their
/// numeric values are equal, regardless of scale (`1.0 == 1.00`).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// UTF-8 text
    Text(String),
    /// Arbitrary-precision integer
    Integer(BigInt),
    /// Arbitrary-precision decimal, printed with its original scale
    Decimal(BigDecimal),
    /// Boolean
    Boolean(bool),
}

impl Scalar {
    /// Build a decimal scalar from an `f64` using its shortest round-trip text form.
    ///
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        BigDecimal::from_str(&value.to_string()).ok().map(Scalar::Decimal)
    }

    /// The text content, if this is a text scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content as a decimal, for integers and decimals.
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Scalar::Integer(i) => Some(BigDecimal::from(i.clone())),
            Scalar::Decimal(d) => Some(d.clone()),
            _ => None,
        }
    }

    /// The boolean content, if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// True for integers and decimals.
    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Integer(_) | Scalar::Decimal(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Decimal(d) => write!(f, "{}", d),
            Scalar::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(BigInt::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(BigInt::from(value))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Scalar {
    fn from(value: BigInt) -> Self {
        Scalar::Integer(value)
    }
}

impl From<BigDecimal> for Scalar {
    fn from(value: BigDecimal) -> Self {
        Scalar::Decimal(value)
    }
}
