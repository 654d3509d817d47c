//! Dynamic value type for command arguments.

use std::fmt::{Display, Formatter};

/// A parsed argument value.
///
/// The parser coerces every token in order: the literals `true`/`false`
/// become [`Bool`](Self::Bool), a full signed-integer parse becomes
/// [`Int`](Self::Int), a full finite-float parse becomes
/// [`Float`](Self::Float), anything else stays a [`Str`](Self::Str).
#[derive(Debug, Clone, PartialEq)]
pub enum CommandValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CommandValue {
    /// Coerces a raw token, mirroring the parser's precedence rules.
    pub fn coerce(token: &str) -> Self {
        if token.is_empty() {
            return Self::Str(String::new());
        }
        if token == "true" || token == "false" {
            return Self::Bool(token == "true");
        }
        if let Ok(int) = token.parse::<i64>() {
            return Self::Int(int);
        }
        if let Ok(float) = token.parse::<f64>() {
            if float.is_finite() {
                return Self::Float(float);
            }
        }
        Self::Str(token.to_owned())
    }

    /// String form of any variant.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Integer value, converting from a numeric string if necessary.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Float value, converting from an integer or a numeric string.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Boolean value. Strings match `"true"`, `"1"` and `"yes"`; integers
    /// are true when nonzero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(s) => Some(s == "true" || s == "1" || s == "yes"),
            Self::Int(i) => Some(*i != 0),
            Self::Float(_) => None,
        }
    }
}

impl Display for CommandValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for CommandValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for CommandValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for CommandValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for CommandValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for CommandValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
