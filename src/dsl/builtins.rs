//! Allow-listed functions and methods available to expressions.
//!
//! Nothing outside these tables is callable. Functions are looked up by
//! their dotted name (`Math.max`, `String`); methods by receiver type and
//! name. Higher-order array methods (`map`, `filter`, ...) need lambda
//! evaluation and live in the evaluator instead.

use super::evaluator::EvalError;
use super::value::{
    format_number, is_truthy, number, strict_eq, to_display_string, to_number,
};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

type Arg = Option<Value>;
type BuiltinFn = fn(&[Arg]) -> Result<Option<Value>, EvalError>;

// ─── Function table ───────────────────────────────────────────────────────────

static FUNCTIONS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
    m.insert("Math.abs", |a| math1(a, f64::abs));
    m.insert("Math.ceil", |a| math1(a, f64::ceil));
    m.insert("Math.floor", |a| math1(a, f64::floor));
    // JS rounds halves towards +Infinity
    m.insert("Math.round", |a| math1(a, |x| (x + 0.5).floor()));
    m.insert("Math.trunc", |a| math1(a, f64::trunc));
    m.insert("Math.sqrt", |a| math1(a, f64::sqrt));
    m.insert("Math.sign", |a| {
        math1(a, |x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                x
            }
        })
    });
    m.insert("Math.pow", |a| {
        Ok(Some(number(to_number(arg(a, 0)).powf(to_number(arg(a, 1))))))
    });
    m.insert("Math.max", |a| {
        Ok(Some(number(
            a.iter()
                .map(|v| to_number(v.as_ref()))
                .fold(f64::NEG_INFINITY, f64::max),
        )))
    });
    m.insert("Math.min", |a| {
        Ok(Some(number(
            a.iter()
                .map(|v| to_number(v.as_ref()))
                .fold(f64::INFINITY, f64::min),
        )))
    });
    m.insert("String", |a| {
        Ok(Some(Value::String(if a.is_empty() {
            String::new()
        } else {
            to_display_string(arg(a, 0))
        })))
    });
    m.insert("Number", |a| Ok(Some(number(to_number(arg(a, 0))))));
    m.insert("Boolean", |a| Ok(Some(Value::Bool(is_truthy(arg(a, 0))))));
    m.insert("parseInt", |a| {
        let radix = match arg(a, 1) {
            None => 10,
            r => to_number(r) as u32,
        };
        Ok(Some(number(parse_int_prefix(&to_display_string(arg(a, 0)), radix))))
    });
    m.insert("parseFloat", |a| {
        Ok(Some(number(parse_float_prefix(&to_display_string(arg(a, 0))))))
    });
    m.insert("isNaN", |a| Ok(Some(Value::Bool(to_number(arg(a, 0)).is_nan()))));
    m.insert("Array.isArray", |a| {
        Ok(Some(Value::Bool(matches!(arg(a, 0), Some(Value::Array(_))))))
    });
    m.insert("JSON.stringify", |a| match arg(a, 0) {
        None => Ok(None),
        Some(v) => serde_json::to_string(v)
            .map(|s| Some(Value::String(s)))
            .map_err(|e| bad_args("JSON.stringify", e.to_string())),
    });
    m.insert("Object.keys", |a| match arg(a, 0) {
        Some(Value::Object(o)) => Ok(Some(Value::Array(
            o.keys().cloned().map(Value::String).collect(),
        ))),
        Some(Value::Array(items)) => Ok(Some(Value::Array(
            (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
        ))),
        _ => Ok(Some(Value::Array(Vec::new()))),
    });
    m.insert("Object.values", |a| match arg(a, 0) {
        Some(Value::Object(o)) => Ok(Some(Value::Array(o.values().cloned().collect()))),
        Some(Value::Array(items)) => Ok(Some(Value::Array(items.clone()))),
        _ => Ok(Some(Value::Array(Vec::new()))),
    });
    m
});

/// Namespaces whose members are reachable through [`FUNCTIONS`] or
/// [`constant`]. A bare namespace is not a value.
pub const NAMESPACES: &[&str] = &["Math", "JSON", "Array", "Object"];

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

pub fn call_function(name: &str, args: &[Arg]) -> Result<Option<Value>, EvalError> {
    match FUNCTIONS.get(name) {
        Some(f) => f(args),
        None => Err(EvalError::NotCallable(name.to_string())),
    }
}

pub fn constant(name: &str) -> Option<Value> {
    match name {
        "Math.PI" => Some(Value::from(std::f64::consts::PI)),
        "Math.E" => Some(Value::from(std::f64::consts::E)),
        _ => None,
    }
}

// ─── Methods ──────────────────────────────────────────────────────────────────

/// Call a first-order method on `receiver`.
pub fn call_method(receiver: &Value, method: &str, args: &[Arg]) -> Result<Option<Value>, EvalError> {
    match receiver {
        Value::String(s) => string_method(s, method, args),
        Value::Array(items) => array_method(items, method, args),
        Value::Number(n) => number_method(n.as_f64().unwrap_or(f64::NAN), method, args),
        Value::Bool(b) if method == "toString" => Ok(Some(Value::String(b.to_string()))),
        _ => Err(EvalError::NotCallable(format!(
            "{}.{}",
            super::value::type_name(Some(receiver)),
            method
        ))),
    }
}

fn string_method(s: &str, method: &str, args: &[Arg]) -> Result<Option<Value>, EvalError> {
    let chars: Vec<char> = s.chars().collect();
    let text = |i: usize| to_display_string(arg(args, i));
    let out = match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Bool(s.contains(text(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text(0).as_str())),
        "indexOf" => {
            let needle = text(0);
            number(match s.find(needle.as_str()) {
                Some(byte) => s[..byte].chars().count() as f64,
                None => -1.0,
            })
        }
        "charAt" => {
            let i = to_number(arg(args, 0));
            let i = if i.is_nan() { 0.0 } else { i };
            Value::String(
                chars
                    .get(i as usize)
                    .filter(|_| i >= 0.0)
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            )
        }
        "slice" => {
            let (start, end) = slice_bounds(chars.len(), arg(args, 0), arg(args, 1));
            Value::String(chars[start..end].iter().collect())
        }
        "substring" => {
            let clamp = |v: Option<&Value>, default: usize| match v {
                None => default,
                v => {
                    let n = to_number(v);
                    if n.is_nan() || n < 0.0 {
                        0
                    } else {
                        (n as usize).min(chars.len())
                    }
                }
            };
            let a = clamp(arg(args, 0), 0);
            let b = clamp(arg(args, 1), chars.len());
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Value::String(chars[lo..hi].iter().collect())
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                None => vec![Value::String(s.to_string())],
                Some(sep) => {
                    let sep = to_display_string(Some(sep));
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str())
                            .map(|p| Value::String(p.to_string()))
                            .collect()
                    }
                }
            };
            Value::Array(parts)
        }
        "replace" => Value::String(s.replacen(text(0).as_str(), text(1).as_str(), 1)),
        "padStart" => {
            let width = to_number(arg(args, 0));
            if width > MAX_PAD_WIDTH as f64 {
                return Err(bad_args("padStart", format!("width must not exceed {}", MAX_PAD_WIDTH)));
            }
            let width = if width.is_nan() { 0 } else { width.max(0.0) as usize };
            let fill = match arg(args, 1) {
                None => " ".to_string(),
                v => to_display_string(v),
            };
            if chars.len() >= width || fill.is_empty() {
                Value::String(s.to_string())
            } else {
                let pad: String = fill.chars().cycle().take(width - chars.len()).collect();
                Value::String(format!("{}{}", pad, s))
            }
        }
        _ => return Err(EvalError::NotCallable(format!("string.{}", method))),
    };
    Ok(Some(out))
}

fn array_method(items: &[Value], method: &str, args: &[Arg]) -> Result<Option<Value>, EvalError> {
    let out = match method {
        "join" => {
            let sep = match arg(args, 0) {
                None => ",".to_string(),
                v => to_display_string(v),
            };
            Value::String(
                items
                    .iter()
                    .map(|v| super::value::to_text(Some(v)))
                    .collect::<Vec<_>>()
                    .join(&sep),
            )
        }
        "includes" => Value::Bool(items.iter().any(|v| strict_eq(Some(v), arg(args, 0)))),
        "indexOf" => number(
            items
                .iter()
                .position(|v| strict_eq(Some(v), arg(args, 0)))
                .map_or(-1.0, |i| i as f64),
        ),
        "slice" => {
            let (start, end) = slice_bounds(items.len(), arg(args, 0), arg(args, 1));
            Value::Array(items[start..end].to_vec())
        }
        "concat" => {
            let mut out = items.to_vec();
            for a in args.iter().flatten() {
                match a {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::Array(out)
        }
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        "toString" => Value::String(to_display_string(Some(&Value::Array(items.to_vec())))),
        _ => return Err(EvalError::NotCallable(format!("array.{}", method))),
    };
    Ok(Some(out))
}

fn number_method(n: f64, method: &str, args: &[Arg]) -> Result<Option<Value>, EvalError> {
    match method {
        "toFixed" => {
            let digits = match arg(args, 0) {
                None => 0.0,
                v => to_number(v),
            };
            if !(0.0..=100.0).contains(&digits) {
                return Err(bad_args("toFixed", "digits must be between 0 and 100".into()));
            }
            Ok(Some(Value::String(format!("{:.*}", digits as usize, n))))
        }
        "toString" => Ok(Some(Value::String(format_number(n)))),
        _ => Err(EvalError::NotCallable(format!("number.{}", method))),
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Longest string `padStart` will build.
const MAX_PAD_WIDTH: usize = 10_000;

fn arg(args: &[Arg], i: usize) -> Option<&Value> {
    args.get(i).and_then(|a| a.as_ref())
}

fn bad_args(function: &str, message: String) -> EvalError {
    EvalError::BadArguments {
        function: function.to_string(),
        message,
    }
}

fn math1(args: &[Arg], f: impl Fn(f64) -> f64) -> Result<Option<Value>, EvalError> {
    Ok(Some(number(f(to_number(arg(args, 0))))))
}

/// JS `slice` bounds: negative indices count from the end, everything is
/// clamped to `0..=len`, and an inverted range is empty.
fn slice_bounds(len: usize, start: Option<&Value>, end: Option<&Value>) -> (usize, usize) {
    let resolve = |v: Option<&Value>, default: usize| -> usize {
        match v {
            None => default,
            v => {
                let n = to_number(v);
                if n.is_nan() {
                    0
                } else if n < 0.0 {
                    (len as f64 + n).max(0.0) as usize
                } else {
                    (n as usize).min(len)
                }
            }
        }
    };
    let s = resolve(start, 0);
    let e = resolve(end, len);
    if s > e {
        (s, s)
    } else {
        (s, e)
    }
}

fn parse_int_prefix(s: &str, radix: u32) -> f64 {
    let radix = if radix == 0 { 10 } else { radix };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let t = s.trim_start();
    let (sign, digits) = match t.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, t.strip_prefix('+').unwrap_or(t)),
    };
    let prefix: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if prefix.is_empty() {
        return f64::NAN;
    }
    i64::from_str_radix(&prefix, radix)
        .map(|v| sign * v as f64)
        .unwrap_or(f64::NAN)
}

fn parse_float_prefix(s: &str) -> f64 {
    let t = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in t.char_indices() {
        let ok = c.is_ascii_digit()
            || (c == '.' && !seen_dot)
            || (i == 0 && (c == '-' || c == '+'));
        if !ok {
            break;
        }
        if c == '.' {
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    t[..end].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Vec<Value>) -> Option<Value> {
        let args: Vec<Arg> = args.into_iter().map(Some).collect();
        call_function(name, &args).unwrap()
    }

    #[test]
    fn math_functions() {
        assert_eq!(call("Math.max", vec![json!(1), json!(7), json!(3)]), Some(json!(7)));
        assert_eq!(call("Math.round", vec![json!(2.5)]), Some(json!(3)));
        assert_eq!(call("Math.round", vec![json!(-2.5)]), Some(json!(-2)));
        assert_eq!(call("Math.pow", vec![json!(2), json!(10)]), Some(json!(1024)));
    }

    #[test]
    fn parse_int_and_float() {
        assert_eq!(call("parseInt", vec![json!("42px")]), Some(json!(42)));
        assert_eq!(call("parseInt", vec![json!("ff"), json!(16)]), Some(json!(255)));
        assert_eq!(call("parseFloat", vec![json!("3.5em")]), Some(json!(3.5)));
        assert_eq!(call("parseInt", vec![json!("px")]), Some(Value::Null));
    }

    #[test]
    fn unknown_function_is_rejected() {
        assert!(matches!(
            call_function("eval", &[]),
            Err(EvalError::NotCallable(name)) if name == "eval"
        ));
    }

    #[test]
    fn string_methods() {
        let s = json!("Hello World");
        let m = |name: &str, args: Vec<Value>| {
            let args: Vec<Arg> = args.into_iter().map(Some).collect();
            call_method(&s, name, &args).unwrap()
        };
        assert_eq!(m("toUpperCase", vec![]), Some(json!("HELLO WORLD")));
        assert_eq!(m("slice", vec![json!(-5)]), Some(json!("World")));
        assert_eq!(m("split", vec![json!(" ")]), Some(json!(["Hello", "World"])));
        assert_eq!(m("padStart", vec![json!(13), json!("*")]), Some(json!("**Hello World")));
        assert_eq!(m("indexOf", vec![json!("World")]), Some(json!(6)));
    }

    #[test]
    fn pad_start_width_is_bounded() {
        let s = json!("x");
        assert_eq!(
            call_method(&s, "padStart", &[Some(json!(10_000)), Some(json!("-"))])
                .unwrap()
                .and_then(|v| v.as_str().map(str::len)),
            Some(10_000)
        );
        assert!(matches!(
            call_method(&s, "padStart", &[Some(json!(1e10))]),
            Err(EvalError::BadArguments { .. })
        ));
    }

    #[test]
    fn array_and_number_methods() {
        let arr = json!([1, 2, 3]);
        assert_eq!(
            call_method(&arr, "join", &[Some(json!("-"))]).unwrap(),
            Some(json!("1-2-3"))
        );
        assert_eq!(
            call_method(&json!(3.14159), "toFixed", &[Some(json!(2))]).unwrap(),
            Some(json!("3.14"))
        );
        assert!(call_method(&json!({}), "keys", &[]).is_err());
        assert_eq!(call_method(&json!(2.7), "toFixed", &[]).unwrap(), Some(json!("3")));
    }
}
