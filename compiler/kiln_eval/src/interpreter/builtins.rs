//! Built-in functions, installed as native globals when an interpreter is
//! built.
//!
//! | Builtin                | Phase        | Effect                                   |
//! |------------------------|--------------|------------------------------------------|
//! | `print(a, ...)`        | any          | one line, arguments concatenated         |
//! | `at_runtime(f)`        | construction | defer `f` to the matching runtime point  |
//! | `after_runtime(f)`     | construction | run `f` when that runtime block exits    |
//! | `lex_stuff(text)`      | construction | splice `text` into the unit              |
//! | `at_runtime::clear(d)` | construction | self-clearing marker, injected only      |
//! | `eval(text)`           | any          | construct and run `text`                 |
//! | `require(name)`        | any          | construct and run a module once          |
//! | `callers()`            | any          | frame names, innermost first             |
//! | `die(a, ...)`          | any          | raise an error                           |
//! | `len(x)`, `str(x)`     | any          | length of a string or list, display form |

use kiln_ir::Span;

use super::Interpreter;
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::value::Value;

pub(super) fn register(interp: &mut Interpreter) {
    interp.define_native("print", builtin_print);
    interp.define_native("at_runtime", |interp, args, _| {
        let [callable] = expect_args::<1>("at_runtime", args)?;
        interp.at_runtime(callable.clone())?;
        Ok(Value::Nil)
    });
    interp.define_native("after_runtime", |interp, args, _| {
        let [callable] = expect_args::<1>("after_runtime", args)?;
        interp.after_runtime(callable.clone())?;
        Ok(Value::Nil)
    });
    interp.define_native("lex_stuff", |interp, args, _| {
        let [text] = expect_args::<1>("lex_stuff", args)?;
        interp.lex_stuff(expect_str("lex_stuff", text)?)?;
        Ok(Value::Nil)
    });
    interp.define_native(kiln_hooks::CLEAR_NAME, builtin_clear);
    interp.define_native("eval", |interp, args, _| {
        let [text] = expect_args::<1>("eval", args)?;
        interp.eval_string(expect_str("eval", text)?)
    });
    interp.define_native("require", |interp, args, _| {
        let [name] = expect_args::<1>("require", args)?;
        interp.require(expect_str("require", name)?)
    });
    interp.define_native("callers", |interp, args, _| {
        expect_args::<0>("callers", args)?;
        let frames = interp.callers().into_iter().map(Value::string).collect();
        Ok(Value::list(frames))
    });
    interp.define_native("die", |_, args, _| Err(EvalError::die(concat(args))));
    interp.define_native("len", |_, args, _| {
        let [value] = expect_args::<1>("len", args)?;
        let len = match value {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.len(),
            other => {
                return Err(EvalError::new(EvalErrorKind::WrongArgType {
                    name: "len".to_owned(),
                    expected: "str or list",
                    got: other.type_name(),
                }))
            }
        };
        i64::try_from(len)
            .map(Value::Int)
            .map_err(|_| EvalError::new(EvalErrorKind::IntegerOverflow { op: "len" }))
    });
    interp.define_native("str", |_, args, _| {
        let [value] = expect_args::<1>("str", args)?;
        Ok(Value::string(value.to_string()))
    });
}

fn builtin_print(interp: &mut Interpreter, args: &[Value], _: Span) -> EvalResult {
    interp.print_handler.println(&concat(args));
    Ok(Value::Nil)
}

/// Runs inside the injected `begin { at_runtime::clear(d) }` marker.
fn builtin_clear(interp: &mut Interpreter, args: &[Value], _: Span) -> EvalResult {
    let [depth] = expect_args::<1>(kiln_hooks::CLEAR_NAME, args)?;
    let depth = match depth {
        Value::Int(n) => usize::try_from(*n).ok(),
        _ => None,
    }
    .ok_or_else(|| {
        EvalError::new(EvalErrorKind::WrongArgType {
            name: kiln_hooks::CLEAR_NAME.to_owned(),
            expected: "a depth",
            got: depth.type_name(),
        })
    })?;
    interp.lowering.clear(&mut interp.site, depth)?;
    tracing::debug!(depth, "hook slot cleared");
    Ok(Value::Nil)
}

fn concat(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

fn expect_args<'a, const N: usize>(name: &str, args: &'a [Value]) -> EvalResult<&'a [Value; N]> {
    args.try_into().map_err(|_| {
        EvalError::new(EvalErrorKind::ArityMismatch {
            name: name.to_owned(),
            expected: N,
            got: args.len(),
        })
    })
}

fn expect_str<'a>(name: &str, value: &'a Value) -> EvalResult<&'a str> {
    value.as_str().ok_or_else(|| {
        EvalError::new(EvalErrorKind::WrongArgType {
            name: name.to_owned(),
            expected: "str",
            got: value.type_name(),
        })
    })
}
