//! Statically declared native keywords.
//!
//! Each keyword carries its ordered parameter list so calls can be bound by
//! position or name and rendered in call traces without runtime reflection.

use autokw_core::{KeywordError, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::registry::CATALOG_ACCESSOR;

/// Default used when an optional parameter is not supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Text(&'static str),
    Int(i64),
}

impl Fallback {
    fn to_value(self) -> Value {
        match self {
            Fallback::Text(s) => Value::Text(s.to_string()),
            Fallback::Int(i) => Value::Int(i),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub default: Option<Fallback>,
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, default: Fallback) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }
}

/// The native operation a keyword maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOp {
    KeywordNames,
    Version,
    EngineVersion,
    ScreenImage,
    ActiveWindowImage,
    Run,
    WinWait,
    WinWaitActive,
    WinWaitClose,
    WaitForActiveWindow,
}

/// A keyword implemented by the library itself.
#[derive(Debug)]
pub struct NativeKeyword {
    pub name: &'static str,
    pub params: &'static [Param],
    pub op: NativeOp,
}

const FILE_PATH: &[Param] = &[Param::required("FilePath")];

const RUN: &[Param] = &[
    Param::required("FileName"),
    Param::optional("WorkingDir", Fallback::Text("")),
    Param::optional("Flag", Fallback::Text("")),
];

const WINDOW_WAIT: &[Param] = &[
    Param::required("WindowTitle"),
    Param::optional("WindowText", Fallback::Text("")),
    Param::optional("TimeOut", Fallback::Int(crate::TIMEOUT_UNSET)),
];

pub static NATIVE_KEYWORDS: &[NativeKeyword] = &[
    NativeKeyword {
        name: CATALOG_ACCESSOR,
        params: &[],
        op: NativeOp::KeywordNames,
    },
    NativeKeyword {
        name: "GetVersion",
        params: &[],
        op: NativeOp::Version,
    },
    NativeKeyword {
        name: "GetEngineVersion",
        params: &[],
        op: NativeOp::EngineVersion,
    },
    NativeKeyword {
        name: "GetScreenImage",
        params: FILE_PATH,
        op: NativeOp::ScreenImage,
    },
    NativeKeyword {
        name: "GetActiveWindowImage",
        params: FILE_PATH,
        op: NativeOp::ActiveWindowImage,
    },
    NativeKeyword {
        name: "Run",
        params: RUN,
        op: NativeOp::Run,
    },
    NativeKeyword {
        name: "WinWait",
        params: WINDOW_WAIT,
        op: NativeOp::WinWait,
    },
    NativeKeyword {
        name: "WinWaitActive",
        params: WINDOW_WAIT,
        op: NativeOp::WinWaitActive,
    },
    NativeKeyword {
        name: "WinWaitClose",
        params: WINDOW_WAIT,
        op: NativeOp::WinWaitClose,
    },
    NativeKeyword {
        name: "WaitForActiveWindow",
        params: WINDOW_WAIT,
        op: NativeOp::WaitForActiveWindow,
    },
];

/// Find a native keyword by exact name.
pub fn lookup(name: &str) -> Option<&'static NativeKeyword> {
    static INDEX: OnceLock<HashMap<&'static str, &'static NativeKeyword>> = OnceLock::new();
    INDEX
        .get_or_init(|| NATIVE_KEYWORDS.iter().map(|kw| (kw.name, kw)).collect())
        .get(name)
        .copied()
}

impl NativeKeyword {
    /// Declared parameter names in order.
    pub fn param_names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    /// Bind positional and keyword arguments to the declared parameters,
    /// filling defaults for optional ones.
    pub fn bind(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<BoundArgs, KeywordError> {
        if args.len() > self.params.len() {
            return Err(KeywordError::invalid(format!(
                "{} expected at most {} arguments, got {}",
                self.name,
                self.params.len(),
                args.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, arg) in slots.iter_mut().zip(args) {
            *slot = Some(arg.clone());
        }

        for (key, value) in kwargs {
            let index = self
                .params
                .iter()
                .position(|p| p.name == key)
                .ok_or_else(|| {
                    KeywordError::invalid(format!(
                        "{} got an unexpected argument '{}'",
                        self.name, key
                    ))
                })?;
            if slots[index].is_some() {
                return Err(KeywordError::invalid(format!(
                    "{} got multiple values for argument '{}'",
                    self.name, key
                )));
            }
            slots[index] = Some(value.clone());
        }

        let values = self
            .params
            .iter()
            .zip(slots)
            .map(|(param, slot)| match (slot, param.default) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.to_value()),
                (None, None) => Err(KeywordError::invalid(format!(
                    "{} missing required argument '{}'",
                    self.name, param.name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BoundArgs {
            keyword: self.name,
            values,
        })
    }
}

/// Arguments bound to a native keyword's parameters, in declaration order.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    keyword: &'static str,
    values: Vec<Value>,
}

impl BoundArgs {
    pub fn value(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(index).unwrap_or(&NULL)
    }

    /// Text form of an argument; hosts may hand over numbers or booleans
    /// where text is expected.
    pub fn text(&self, index: usize) -> String {
        match self.value(index) {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Whole-number argument. Numeric text is accepted; fractional values
    /// are rejected rather than truncated.
    pub fn int(&self, index: usize) -> Result<i64, KeywordError> {
        let value = self.value(index);
        let whole = match value {
            Value::Float(f) if f.fract() != 0.0 => None,
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            other => other.as_int(),
        };
        whole.ok_or_else(|| {
            KeywordError::invalid(format!(
                "{} expected an integer, got '{}'",
                self.keyword, value
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str, value: impl Into<Value>) -> (String, Value) {
        (name.to_string(), value.into())
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(lookup("WinWait").map(|k| k.op), Some(NativeOp::WinWait));
        assert!(lookup("winwait").is_none());
        assert_eq!(lookup(CATALOG_ACCESSOR).map(|k| k.op), Some(NativeOp::KeywordNames));
    }

    #[test]
    fn test_bind_fills_defaults() {
        let keyword = lookup("WinWait").unwrap();
        let bound = keyword.bind(&[Value::from("Calc")], &[]).unwrap();
        assert_eq!(bound.text(0), "Calc");
        assert_eq!(bound.text(1), "");
        assert_eq!(bound.int(2).unwrap(), crate::TIMEOUT_UNSET);
    }

    #[test]
    fn test_bind_by_name() {
        let keyword = lookup("WinWait").unwrap();
        let bound = keyword
            .bind(&[Value::from("Calc")], &[kw("TimeOut", "5")])
            .unwrap();
        assert_eq!(bound.int(2).unwrap(), 5);
    }

    #[test]
    fn test_bind_rejects_bad_calls() {
        let keyword = lookup("WinWait").unwrap();
        let too_many = vec![Value::Int(1); 4];
        assert!(matches!(
            keyword.bind(&too_many, &[]),
            Err(KeywordError::InvalidArgument(_))
        ));
        assert!(keyword.bind(&[], &[]).is_err());
        assert!(keyword
            .bind(&[Value::from("Calc")], &[kw("Color", "red")])
            .is_err());
        assert!(keyword
            .bind(&[Value::from("Calc")], &[kw("WindowTitle", "Other")])
            .is_err());
    }

    #[test]
    fn test_int_conversion_error_names_keyword() {
        let keyword = lookup("WinWait").unwrap();
        let bound = keyword
            .bind(&[Value::from("Calc"), Value::from(""), Value::from("soon")], &[])
            .unwrap();
        let err = bound.int(2).unwrap_err();
        assert!(err.to_string().contains("WinWait"));
    }

    #[test]
    fn test_fractional_timeout_rejected() {
        let keyword = lookup("WinWait").unwrap();
        for timeout in [Value::Float(2.5), Value::from("2.5")] {
            let bound = keyword.bind(&[Value::from("Calc")], &[kw("TimeOut", timeout)]).unwrap();
            assert!(matches!(bound.int(2), Err(KeywordError::InvalidArgument(_))));
        }
        let bound = keyword
            .bind(&[Value::from("Calc")], &[kw("TimeOut", 3.0)])
            .unwrap();
        assert_eq!(bound.int(2).unwrap(), 3);
    }
}
