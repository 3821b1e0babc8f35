/// Expression evaluator for schema bindings.
///
/// Evaluates expressions such as `count * 2 + 1` or
/// `user.tags.filter(t => t.active).length` against a context object.
/// The context is projected into a flat scope: its own keys first, then the
/// keys of nested plain objects (outer names win). Only the allow-listed
/// built-ins in [`super::builtins`] are callable.
use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::builtins;
use super::value::{
    is_truthy, loose_eq, number, strict_eq, to_display_string, to_number, type_name,
};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("'{0}' is not defined")]
    UnknownIdentifier(String),

    #[error("cannot read property '{property}' of {target}")]
    NullAccess {
        property: String,
        target: &'static str,
    },

    #[error("'{0}' is not an allowed function")]
    NotCallable(String),

    #[error("arrow functions are only allowed as arguments to array methods")]
    LambdaOutsideCall,

    #[error("{function}: {message}")]
    BadArguments { function: String, message: String },
}

/// The result type for expression evaluation. `Ok(None)` is `undefined`.
pub type EvalResult = Result<Option<Value>, EvalError>;

// ─── Scope ────────────────────────────────────────────────────────────────────

/// How deep nested plain objects are flattened into the scope.
const MAX_FLATTEN_DEPTH: usize = 8;

/// Names visible to an expression, borrowed from the context.
pub struct Scope<'a> {
    vars: HashMap<&'a str, &'a Value>,
}

impl<'a> Scope<'a> {
    /// Project `context` into a flat name table. Top-level keys are
    /// inserted first; nested plain objects are walked breadth-first so a
    /// shallower name is never shadowed by a deeper one. Arrays are not
    /// descended into.
    pub fn from_context(context: &'a Value) -> Self {
        let mut vars: HashMap<&'a str, &'a Value> = HashMap::new();
        let mut queue: VecDeque<(&'a serde_json::Map<String, Value>, usize)> = VecDeque::new();
        if let Value::Object(root) = context {
            queue.push_back((root, 0));
        }
        while let Some((obj, depth)) = queue.pop_front() {
            for (k, v) in obj {
                vars.entry(k.as_str()).or_insert(v);
            }
            if depth + 1 >= MAX_FLATTEN_DEPTH {
                continue;
            }
            for v in obj.values() {
                if let Value::Object(inner) = v {
                    queue.push_back((inner, depth + 1));
                }
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.vars.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

// ─── Parse cache ──────────────────────────────────────────────────────────────

const PARSE_CACHE_LIMIT: usize = 1024;

static PARSE_CACHE: Lazy<Mutex<HashMap<String, Arc<Expr>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn parse_cached(src: &str) -> Result<Arc<Expr>, EvalError> {
    if let Ok(cache) = PARSE_CACHE.lock() {
        if let Some(hit) = cache.get(src) {
            return Ok(Arc::clone(hit));
        }
    }
    let parsed = Arc::new(super::parser::parse(src)?);
    if let Ok(mut cache) = PARSE_CACHE.lock() {
        if cache.len() >= PARSE_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(src.to_string(), Arc::clone(&parsed));
    }
    Ok(parsed)
}

// ─── Public entry points ──────────────────────────────────────────────────────

/// Evaluate `expr` against `context`. Never fails: errors are logged and
/// reported as `None` (undefined).
pub fn evaluate(expr: &str, context: &Value) -> Option<Value> {
    match try_evaluate(expr, context) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(expression = expr, error = %err, "expression evaluation failed");
            None
        }
    }
}

/// Evaluate `expr`, reporting failures to the caller.
pub fn try_evaluate(expr: &str, context: &Value) -> EvalResult {
    let ast = parse_cached(expr.trim())?;
    let scope = Scope::from_context(context);
    let mut eval = Evaluator {
        scope: &scope,
        locals: Vec::new(),
    };
    eval.eval(&ast)
}

/// Dot-separated traversal of `data`. Purely numeric segments index arrays.
/// Any missing or null intermediate yields `None`.
pub fn resolve_data_path<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(data);
    }
    let mut current = data;
    for segment in path.split('.') {
        let segment = segment.trim();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => {
                items.get(segment.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}

// ─── Tree walker ──────────────────────────────────────────────────────────────

struct Evaluator<'s, 'a> {
    scope: &'s Scope<'a>,
    /// Arrow-function parameters, innermost last.
    locals: Vec<(String, Option<Value>)>,
}

impl<'s, 'a> Evaluator<'s, 'a> {
    fn eval(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(v) => Ok(Some(v.clone())),
            Expr::Undefined => Ok(None),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                if let Some(name) = expr.dotted_name() {
                    if let Some(c) = self.builtin_constant(&name) {
                        return Ok(Some(c));
                    }
                }
                let target = self.eval(object)?;
                get_property(target.as_ref(), property, *optional || chain_is_optional(object))
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                let property = match &key {
                    Some(Value::Number(n)) => match n.as_f64() {
                        Some(f) if f >= 0.0 && f.fract() == 0.0 => format!("{}", f as u64),
                        _ => to_display_string(key.as_ref()),
                    },
                    other => to_display_string(other.as_ref()),
                };
                get_property(target.as_ref(), &property, *optional || chain_is_optional(object))
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Lambda { .. } => Err(EvalError::LambdaOutsideCall),
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                Ok(Some(match op {
                    UnaryOp::Not => Value::Bool(!is_truthy(v.as_ref())),
                    UnaryOp::Neg => number(-to_number(v.as_ref())),
                    UnaryOp::Plus => number(to_number(v.as_ref())),
                    UnaryOp::TypeOf => Value::String(
                        match v.as_ref() {
                            Some(Value::Array(_)) | Some(Value::Null) => "object",
                            other => type_name(other),
                        }
                        .to_string(),
                    ),
                }))
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Ok(Some(binary(*op, l.as_ref(), r.as_ref())))
            }
            Expr::Logical { op, left, right } => {
                let l = self.eval(left)?;
                let short = match op {
                    LogicalOp::And => !is_truthy(l.as_ref()),
                    LogicalOp::Or => is_truthy(l.as_ref()),
                    LogicalOp::Nullish => !matches!(l, None | Some(Value::Null)),
                };
                if short {
                    Ok(l)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if is_truthy(self.eval(test)?.as_ref()) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.locals.iter().any(|(n, _)| n == name) || self.scope.contains(name)
    }

    fn lookup(&self, name: &str) -> EvalResult {
        if let Some((_, v)) = self.locals.iter().rev().find(|(n, _)| n == name) {
            return Ok(v.clone());
        }
        match self.scope.get(name) {
            Some(v) => Ok(Some(v.clone())),
            None => Err(EvalError::UnknownIdentifier(name.to_string())),
        }
    }

    /// `Math.PI` and friends, unless the namespace is shadowed by context.
    fn builtin_constant(&self, dotted: &str) -> Option<Value> {
        let root = dotted.split('.').next().unwrap_or(dotted);
        if self.is_bound(root) {
            return None;
        }
        builtins::constant(dotted)
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult {
        // Allow-listed free functions: `String(x)`, `Math.max(a, b)`.
        if let Some(name) = callee.dotted_name() {
            let root = name.split('.').next().unwrap_or(&name);
            if !self.is_bound(root) {
                if builtins::is_function(&name) {
                    let values = self.eval_args(args)?;
                    return builtins::call_function(&name, &values);
                }
                if builtins::NAMESPACES.contains(&root) || !name.contains('.') {
                    return Err(EvalError::NotCallable(name));
                }
            }
        }

        // Method call on a value: `name.toUpperCase()`, `items.map(i => i.id)`.
        let (object, method, optional) = match callee {
            Expr::Member {
                object,
                property,
                optional,
            } => (object.as_ref(), property.as_str(), *optional),
            other => {
                return Err(EvalError::NotCallable(
                    other.dotted_name().unwrap_or_else(|| "expression".to_string()),
                ))
            }
        };
        let receiver = self.eval(object)?;
        let receiver = match receiver {
            Some(v) if !v.is_null() => v,
            nullish => {
                if optional || chain_is_optional(object) {
                    return Ok(None);
                }
                return Err(EvalError::NullAccess {
                    property: method.to_string(),
                    target: type_name(nullish.as_ref()),
                });
            }
        };

        if let Value::Array(items) = &receiver {
            if let Some(result) = self.array_higher_order(items, method, args)? {
                return Ok(result);
            }
        }
        let values = self.eval_args(args)?;
        builtins::call_method(&receiver, method, &values)
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Option<Value>>, EvalError> {
        args.iter().map(|a| self.eval(a)).collect()
    }

    /// `map`, `filter`, `find`, `findIndex`, `some`, `every`. Returns
    /// `Ok(None)` when `method` is not one of them.
    fn array_higher_order(
        &mut self,
        items: &[Value],
        method: &str,
        args: &[Expr],
    ) -> Result<Option<Option<Value>>, EvalError> {
        if !matches!(method, "map" | "filter" | "find" | "findIndex" | "some" | "every") {
            return Ok(None);
        }
        let (param, body) = match args.first() {
            Some(Expr::Lambda { param, body }) => (param.clone(), body.as_ref()),
            _ => {
                return Err(EvalError::BadArguments {
                    function: method.to_string(),
                    message: "expected an arrow function".to_string(),
                })
            }
        };

        let mut mapped = Vec::new();
        for (i, item) in items.iter().enumerate() {
            self.locals.push((param.clone(), Some(item.clone())));
            let result = self.eval(body);
            self.locals.pop();
            let result = result?;
            let hit = is_truthy(result.as_ref());
            match method {
                "map" => mapped.push(result.unwrap_or(Value::Null)),
                "filter" if hit => mapped.push(item.clone()),
                "find" if hit => return Ok(Some(Some(item.clone()))),
                "findIndex" if hit => return Ok(Some(Some(number(i as f64)))),
                "some" if hit => return Ok(Some(Some(Value::Bool(true)))),
                "every" if !hit => return Ok(Some(Some(Value::Bool(false)))),
                _ => {}
            }
        }
        Ok(Some(match method {
            "map" | "filter" => Some(Value::Array(mapped)),
            "find" => None,
            "findIndex" => Some(number(-1.0)),
            "some" => Some(Value::Bool(false)),
            _ => Some(Value::Bool(true)),
        }))
    }
}

/// True when any link of a member/index chain used `?.`, in which case a
/// nullish intermediate short-circuits the whole chain to undefined.
fn chain_is_optional(expr: &Expr) -> bool {
    match expr {
        Expr::Member {
            object, optional, ..
        }
        | Expr::Index {
            object, optional, ..
        } => *optional || chain_is_optional(object),
        Expr::Call { callee, .. } => chain_is_optional(callee),
        _ => false,
    }
}

fn get_property(target: Option<&Value>, property: &str, optional: bool) -> EvalResult {
    match target {
        None | Some(Value::Null) => {
            if optional {
                Ok(None)
            } else {
                Err(EvalError::NullAccess {
                    property: property.to_string(),
                    target: type_name(target),
                })
            }
        }
        Some(Value::Object(map)) => Ok(map.get(property).cloned()),
        Some(Value::Array(items)) => Ok(if property == "length" {
            Some(number(items.len() as f64))
        } else {
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
        }),
        Some(Value::String(s)) => Ok(if property == "length" {
            Some(number(s.chars().count() as f64))
        } else {
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
        }),
        Some(_) => Ok(None),
    }
}

fn binary(op: BinaryOp, l: Option<&Value>, r: Option<&Value>) -> Value {
    match op {
        BinaryOp::Add => {
            let stringy = |v: Option<&Value>| {
                matches!(v, Some(Value::String(_)) | Some(Value::Array(_)) | Some(Value::Object(_)))
            };
            if stringy(l) || stringy(r) {
                Value::String(format!("{}{}", to_display_string(l), to_display_string(r)))
            } else {
                number(to_number(l) + to_number(r))
            }
        }
        BinaryOp::Sub => number(to_number(l) - to_number(r)),
        BinaryOp::Mul => number(to_number(l) * to_number(r)),
        BinaryOp::Div => number(to_number(l) / to_number(r)),
        BinaryOp::Rem => number(to_number(l) % to_number(r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (l, r) {
                (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
                _ => to_number(l).partial_cmp(&to_number(r)),
            };
            Value::Bool(match ordering {
                None => false,
                Some(o) => match op {
                    BinaryOp::Lt => o.is_lt(),
                    BinaryOp::Le => o.is_le(),
                    BinaryOp::Gt => o.is_gt(),
                    _ => o.is_ge(),
                },
            })
        }
        BinaryOp::Eq => Value::Bool(loose_eq(l, r)),
        BinaryOp::Ne => Value::Bool(!loose_eq(l, r)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(l, r)),
        BinaryOp::StrictNe => Value::Bool(!strict_eq(l, r)),
    }
}
