use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A dynamically typed argument or return value.
///
/// Keyword hosts pass loosely typed data, and automation engines answer in
/// kind, so every call crossing the library boundary is expressed in `Value`s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

/// Keyword arguments in the order the caller supplied them.
pub type KwArgs = Vec<(String, Value)>;

impl Value {
    /// Engine-style truthiness: null, false, zero, empty text and empty lists
    /// are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Interpret the value as an integer.
    ///
    /// Hosts frequently hand numbers over as text, so numeric strings are
    /// accepted. Floats are truncated toward zero.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    /// Parse a command-line token into the most specific value it denotes.
    pub fn parse_token(token: &str) -> Self {
        if let Ok(i) = token.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
        match token {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            _ => Value::Text(token.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Text(s) => write!(f, "'{}'", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            // Objects have no engine-side counterpart; pass them on as JSON text.
            object @ serde_json::Value::Object(_) => Value::Text(object.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Screen geometry
// ---------------------------------------------------------------------------

/// A rectangular screen region in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::from(vec!["a"]).is_truthy());
    }

    #[test]
    fn test_as_int_accepts_numeric_text() {
        assert_eq!(Value::from("5").as_int(), Some(5));
        assert_eq!(Value::from(" 7 ").as_int(), Some(7));
        assert_eq!(Value::from("2.9").as_int(), Some(2));
        assert_eq!(Value::from("five").as_int(), None);
        assert_eq!(Value::Float(-1.0).as_int(), Some(-1));
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(Value::parse_token("42"), Value::Int(42));
        assert_eq!(Value::parse_token("0.5"), Value::Float(0.5));
        assert_eq!(Value::parse_token("true"), Value::Bool(true));
        assert_eq!(Value::parse_token("Calculator"), Value::from("Calculator"));
        assert_eq!(Value::parse_token("inf"), Value::from("inf"));
    }

    #[test]
    fn test_from_json_keeps_shape() {
        let json = serde_json::json!([1, 2.5, "x", null, true]);
        assert_eq!(
            Value::from(json),
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Null,
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn test_display_list() {
        let v = Value::List(vec![Value::from("a"), Value::Int(2)]);
        assert_eq!(v.to_string(), "['a', 2]");
    }
}
