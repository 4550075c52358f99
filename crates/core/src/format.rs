//! Call-trace formatting.
//!
//! Renders a keyword invocation as `name=value, name=value, ...` for the
//! single-line log trace each keyword emits on entry.

use crate::models::{KwArgs, Value};

/// Implicit receiver name stripped from declared parameter lists.
const RECEIVER: &str = "self";

/// Separator between rendered arguments.
const SEPARATOR: &str = ", ";

/// Significant digits used for general-form float rendering.
const FLOAT_PRECISION: i32 = 6;

/// An ephemeral description of one call, used only to build a log line.
#[derive(Debug, Clone, Copy)]
pub struct CallRecord<'a> {
    pub operation: &'a str,
    pub params: &'a [&'a str],
    pub args: &'a [Value],
    pub kwargs: &'a [(String, Value)],
}

impl<'a> CallRecord<'a> {
    pub fn new(
        operation: &'a str,
        params: &'a [&'a str],
        args: &'a [Value],
        kwargs: &'a [(String, Value)],
    ) -> Self {
        Self {
            operation,
            params,
            args,
            kwargs,
        }
    }

    /// Rendered argument list for this call.
    pub fn format_args(&self) -> String {
        format_call_args(self.params, self.args, self.kwargs)
    }
}

/// Format positional and keyword arguments against a declared parameter list.
///
/// Positionals come first in declaration order, then declared parameters that
/// were supplied by keyword, then undeclared keywords in the order given.
/// Positionals beyond the declared list are labelled `arg<N>`.
pub fn format_call_args(params: &[&str], args: &[Value], kwargs: &[(String, Value)]) -> String {
    let params = match params.first() {
        Some(&first) if first == RECEIVER => &params[1..],
        _ => params,
    };

    let mut line = String::new();

    for (i, arg) in args.iter().enumerate() {
        match params.get(i) {
            Some(name) => push_arg(&mut line, name, arg),
            None => push_arg(&mut line, &format!("arg{}", i), arg),
        }
    }

    let mut remaining: KwArgs = kwargs.to_vec();
    for name in params.iter().skip(args.len()) {
        if let Some(pos) = remaining.iter().position(|(key, _)| key == name) {
            let (key, value) = remaining.remove(pos);
            push_arg(&mut line, &key, &value);
        }
    }

    for (key, value) in &remaining {
        push_arg(&mut line, key, value);
    }

    line
}

fn push_arg(line: &mut String, name: &str, value: &Value) {
    if !line.is_empty() {
        line.push_str(SEPARATOR);
    }
    line.push_str(&format_arg(name, value));
}

/// Render one `name=value` pair.
pub fn format_arg(name: &str, value: &Value) -> String {
    match value {
        Value::Int(i) => format!("{}={}", name, i),
        Value::Bool(b) => format!("{}={}", name, i64::from(*b)),
        Value::Float(f) => format!("{}={}", name, format_general(*f)),
        other => format!("{}='{}'", name, format_ascii(other)),
    }
}

/// Best-effort ASCII rendering of a value.
///
/// Plain ASCII conversions are used directly. Text with non-ASCII content has
/// each character above U+0080 replaced by its escape sequence, one at a time.
/// Any other value falls back to its debug representation.
pub fn format_ascii(value: &Value) -> String {
    let direct = value.to_string();
    if direct.is_ascii() {
        return direct;
    }
    match value {
        Value::Text(s) => escape_non_ascii(s),
        other => escape_non_ascii(&format!("{:?}", other)),
    }
}

fn escape_non_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        // U+0080 itself is kept verbatim.
        if code > 0x80 {
            let escape = match code {
                0..=0xff => format!("\\x{:02x}", code),
                0x100..=0xffff => format!("\\u{:04x}", code),
                _ => format!("\\U{:08x}", code),
            };
            out.push_str(&escape);
        } else {
            out.push(c);
        }
    }
    out
}

/// Render a float in `%g` form: six significant digits, trailing zeros
/// removed, exponent notation for very small or large magnitudes.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= FLOAT_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (FLOAT_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str, value: impl Into<Value>) -> (String, Value) {
        (name.to_string(), value.into())
    }

    #[test]
    fn test_positional_then_declared_keywords() {
        let line = format_call_args(
            &["title", "text", "timeout"],
            &[Value::from("Calc"), Value::from("")],
            &[kw("timeout", 5)],
        );
        assert_eq!(line, "title='Calc', text='', timeout=5");
    }

    #[test]
    fn test_receiver_is_stripped() {
        let line = format_call_args(&["self", "FileName"], &[Value::from("calc.exe")], &[]);
        assert_eq!(line, "FileName='calc.exe'");
    }

    #[test]
    fn test_declared_keywords_follow_declaration_order() {
        let line = format_call_args(
            &["a", "b", "c"],
            &[],
            &[kw("c", 3), kw("extra", "x"), kw("a", 1)],
        );
        assert_eq!(line, "a=1, c=3, extra='x'");
    }

    #[test]
    fn test_keyword_repeating_a_positional_is_treated_as_extra() {
        let line = format_call_args(&["a", "b"], &[Value::Int(1)], &[kw("a", 2), kw("b", 3)]);
        assert_eq!(line, "a=1, b=3, a=2");
    }

    #[test]
    fn test_surplus_positionals_are_labelled() {
        let line = format_call_args(&["a"], &[Value::Int(1), Value::Int(2)], &[]);
        assert_eq!(line, "a=1, arg1=2");
    }

    #[test]
    fn test_empty_call() {
        assert_eq!(format_call_args(&["a"], &[], &[]), "");
    }

    #[test]
    fn test_separator_never_leads_or_trails() {
        let line = format_call_args(&[], &[], &[kw("only", 1)]);
        assert!(!line.starts_with(SEPARATOR));
        assert!(!line.ends_with(SEPARATOR));
        assert_eq!(line, "only=1");
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(format_arg("n", &Value::Int(-12)), "n=-12");
        assert_eq!(format_arg("b", &Value::Bool(true)), "b=1");
        assert_eq!(format_arg("f", &Value::Float(5.0)), "f=5");
        assert_eq!(format_arg("f", &Value::Float(0.25)), "f=0.25");
        assert_eq!(format_arg("s", &Value::Null), "s='None'");
        assert_eq!(format_arg("l", &Value::from(vec![1, 2])), "l='[1, 2]'");
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(1234567.0), "1.23457e+06");
        assert_eq!(format_general(123456.0), "123456");
        assert_eq!(format_general(0.0001), "0.0001");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(3.14159265), "3.14159");
        assert_eq!(format_general(-2.5), "-2.5");
        assert_eq!(format_general(f64::INFINITY), "inf");
        assert_eq!(format_general(f64::NAN), "nan");
        assert_eq!(format_general(0.0), "0");
    }

    #[test]
    fn test_non_ascii_text_is_escaped_per_character() {
        assert_eq!(format_ascii(&Value::from("café")), "caf\\xe9");
        assert_eq!(format_ascii(&Value::from("5€")), "5\\u20ac");
        assert_eq!(format_ascii(&Value::from("a😀")), "a\\U0001f600");
        assert_eq!(format_ascii(&Value::from("plain")), "plain");
    }

    #[test]
    fn test_escape_boundary() {
        assert_eq!(escape_non_ascii("\u{80}\u{81}"), "\u{80}\\x81");
        assert_eq!(escape_non_ascii("\u{ff}\u{100}"), "\\xff\\u0100");
    }

    #[test]
    fn test_non_ascii_composite_falls_back_to_debug() {
        let value = Value::List(vec![Value::from("é")]);
        let rendered = format_ascii(&value);
        assert!(rendered.starts_with("List("));
        assert!(rendered.is_ascii());
    }
}
