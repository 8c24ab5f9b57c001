//! Runtime values.

use std::fmt;
use std::rc::Rc;

use kiln_hooks::DispatchFn;
use kiln_ir::{Name, Span};

use crate::ast::FunctionDef;
use crate::environment::{LocalScope, Scope};
use crate::errors::EvalResult;
use crate::interpreter::Interpreter;
use crate::sources::SourceId;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    /// A `sub` or `fn`.
    Function(Rc<FunctionValue>),
    /// A function implemented in Rust.
    Native(Rc<NativeFunction>),
    /// A depth's dispatch function. Only ever reachable through the
    /// `at_runtime::dispatch` glob, and only callable, never loaded.
    Dispatch(DispatchFn<DeferredBlock>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Function(_) => "sub",
            Value::Native(_) => "native sub",
            Value::Dispatch(_) => "dispatch function",
        }
    }

    /// `nil`, `false`, `0` and `""` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(false) | Value::Int(0) => false,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Dispatch(a), Value::Dispatch(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Function(_) => f.write_str("<sub>"),
            Value::Native(_) => f.write_str("<native sub>"),
            Value::Dispatch(dispatch) => write!(f, "<dispatch depth {}>", dispatch.depth()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Function(func) => write!(f, "Function({:?})", func.name),
            Value::Native(native) => write!(f, "Native({:?})", native.name),
            Value::Dispatch(dispatch) => write!(f, "{dispatch:?}"),
            other => write!(f, "{other}"),
        }
    }
}

/// A `sub` or closure.
pub struct FunctionValue {
    /// Name used for call frames: the sub name, or `__ANON__`.
    pub name: Name,
    pub def: Rc<FunctionDef>,
    /// Enclosing lexicals for closures; `None` for subs.
    pub captured: Option<LocalScope<Scope>>,
    /// Unit the body was parsed from.
    pub source: Option<SourceId>,
}

/// Signature of a native function body.
pub type NativeFn = dyn Fn(&mut Interpreter, &[Value], Span) -> EvalResult;

pub struct NativeFunction {
    pub name: Name,
    pub func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: Name,
        func: impl Fn(&mut Interpreter, &[Value], Span) -> EvalResult + 'static,
    ) -> Self {
        NativeFunction {
            name,
            func: Box::new(func),
        }
    }
}

/// A callable queued by `at_runtime`/`after_runtime`.
#[derive(Clone, Debug, PartialEq)]
pub struct DeferredBlock {
    pub callable: Value,
    /// Frame name the block runs under, e.g. `main::(at_runtime)`.
    pub label: Name,
}
