//! Runtime value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Num(f64),
    Bool(bool),
}

impl Val {
    /// Check if value is truthy (for `if`)
    ///
    /// `false` and `0` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Num(n) => *n != 0.0,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Num(_) => "number",
            Val::Bool(_) => "boolean",
        }
    }

    /// Parse a literal token (`3`, `-2.5`, `true`, `false`)
    ///
    /// Only tokens that look like numbers are parsed as numbers, so names such
    /// as `inf` or `nan` stay instructions.
    pub fn parse_literal(token: &str) -> Option<Val> {
        match token {
            "true" => return Some(Val::Bool(true)),
            "false" => return Some(Val::Bool(false)),
            _ => {}
        }

        let digits = token.strip_prefix(&['-', '+'][..]).unwrap_or(token);
        let digits = digits.strip_prefix('.').unwrap_or(digits);
        if !digits.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        token.parse::<f64>().ok().map(Val::Num)
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Num(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Val::Num(n) => write!(f, "{}", n),
            Val::Bool(b) => write!(f, "{}", b),
        }
    }
}
