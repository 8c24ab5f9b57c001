//! Statement execution, expression evaluation and calls.

use std::rc::Rc;

use kiln_hooks::{DispatchFn, Hook};
use kiln_ir::Span;
use smallvec::SmallVec;

use super::Interpreter;
use crate::ast::{BinaryOp, Block, Expr, ExprKind, Stmt, StmtKind};
use crate::diagnostics::{CallFrame, FrameKind};
use crate::environment::{LocalScope, Scope};
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::value::{DeferredBlock, FunctionValue, Value};

/// How a statement or block finished.
pub(crate) enum Flow {
    /// Fell off the end. Carries the value of the last expression statement.
    Normal(Value),
    Return(Value),
}

impl Flow {
    pub(crate) fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Return(value) => value,
        }
    }
}

impl Interpreter {
    /// Push `frame`, run `f` in a scope detached from the caller's, pop.
    pub(super) fn run_in_frame<R>(
        &mut self,
        frame: CallFrame,
        parent: Option<LocalScope<Scope>>,
        f: impl FnOnce(&mut Interpreter) -> EvalResult<R>,
    ) -> EvalResult<R> {
        self.call_stack.push(frame)?;
        let result = self
            .with_detached_scope(parent, f)
            .map_err(|err| self.attach_backtrace(err));
        self.call_stack.pop();
        result
    }

    // ===== Blocks and statements =====

    /// Run `block` in the current scope, then its exit actions.
    pub(super) fn exec_block(&mut self, block: &Block) -> EvalResult<Flow> {
        self.exit_actions.push(Vec::new());
        let mut result = Ok(Flow::Normal(Value::Nil));
        for stmt in &block.stmts {
            match self.exec_stmt(stmt) {
                Ok(Flow::Normal(value)) => result = Ok(Flow::Normal(value)),
                other => {
                    result = other;
                    break;
                }
            }
        }
        let actions = self.exit_actions.pop().unwrap_or_default();
        self.run_exit_actions(actions, block.span, result)
    }

    fn exec_scoped_block(&mut self, block: &Block) -> EvalResult<Flow> {
        self.with_env_scope(|interp| interp.exec_block(block))
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.eval_expr(value)?;
                self.env.define(*name, value);
            }
            StmtKind::AssignLocal { name, value } => {
                let value = self.eval_expr(value)?;
                self.env.assign(*name, value).map_err(|_| {
                    let err = EvalError::new(EvalErrorKind::UndefinedVariable {
                        name: self.interner.lookup(*name).to_owned(),
                    });
                    self.locate(err, stmt.span)
                })?;
            }
            StmtKind::AssignGlobal { glob, value } => {
                let value = self.eval_expr(value)?;
                let previous = glob.set(value);
                drop(previous);
            }
            StmtKind::Expr(expr) => return self.eval_expr(expr).map(Flow::Normal),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Block(block) => {
                if let Flow::Return(value) = self.exec_scoped_block(block)? {
                    return Ok(Flow::Return(value));
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.eval_expr(cond)?.is_truthy() {
                    Some(then_branch)
                } else {
                    else_branch.as_ref()
                };
                if let Some(branch) = branch {
                    if let Flow::Return(value) = self.exec_scoped_block(branch)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    if let Flow::Return(value) = self.exec_scoped_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    /// Run `after_runtime` blocks scheduled in the block that just exited,
    /// last scheduled first. They run on error exit too; the block's own
    /// error wins over theirs.
    fn run_exit_actions(
        &mut self,
        actions: Vec<DeferredBlock>,
        span: Span,
        mut result: EvalResult<Flow>,
    ) -> EvalResult<Flow> {
        for action in actions.into_iter().rev() {
            if let Err(err) = self.run_deferred(&action, span) {
                if result.is_ok() {
                    result = Err(err);
                } else {
                    tracing::warn!(%err, "after_runtime block failed during error exit");
                }
            }
        }
        result
    }

    // ===== Expressions =====

    pub(super) fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        kiln_stack::ensure_sufficient_stack(|| self.eval_expr_inner(expr))
            .map_err(|err| self.attach_backtrace(self.locate(err, expr.span)))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Str(s) => Ok(Value::string(self.interner.lookup(*s))),
            ExprKind::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::list(values))
            }
            ExprKind::Local(name) => self.env.lookup(*name).ok_or_else(|| {
                EvalError::new(EvalErrorKind::UndefinedVariable {
                    name: self.interner.lookup(*name).to_owned(),
                })
            }),
            ExprKind::Global(glob) => match glob.get() {
                Some(Value::Dispatch(_)) => Err(EvalError::new(EvalErrorKind::DispatchAsValue)),
                Some(value) => Ok(value),
                None => Err(EvalError::new(EvalErrorKind::UndefinedVariable {
                    name: self.interner.lookup(glob.name()).to_owned(),
                })),
            },
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Closure(def) => Ok(Value::Function(Rc::new(FunctionValue {
                name: self.names.anon,
                def: Rc::clone(def),
                captured: Some(self.env.current_scope()),
                source: self.current_source,
            }))),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                evaluate_unary(&value, *op)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(left),
                    BinaryOp::Or if left.is_truthy() => Ok(left),
                    BinaryOp::And | BinaryOp::Or => self.eval_expr(right),
                    _ => {
                        let right = self.eval_expr(right)?;
                        evaluate_binary(&left, &right, *op)
                    }
                }
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> EvalResult {
        // A global callee is read straight from its glob: this is the one
        // place a dispatch function may be reached.
        let func = match &callee.kind {
            ExprKind::Global(glob) => glob.get().ok_or_else(|| {
                let err = EvalError::new(EvalErrorKind::UndefinedSub {
                    name: self.interner.lookup(glob.name()).to_owned(),
                });
                self.locate(err, callee.span)
            })?,
            _ => self.eval_expr(callee)?,
        };
        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<EvalResult<SmallVec<[Value; 4]>>>()?;
        self.call_value(&func, &args, span)
    }

    /// Call `func` with `args`.
    pub(crate) fn call_value(&mut self, func: &Value, args: &[Value], span: Span) -> EvalResult {
        match func {
            Value::Function(f) => {
                let frame = CallFrame::new(f.name, FrameKind::Sub, Some(span));
                self.call_function(f, args, frame)
            }
            Value::Native(native) => (native.func)(self, args, span),
            Value::Dispatch(dispatch) => {
                if !args.is_empty() {
                    return Err(EvalError::new(EvalErrorKind::ArityMismatch {
                        name: kiln_hooks::DISPATCH_NAME.to_owned(),
                        expected: 0,
                        got: args.len(),
                    }));
                }
                self.run_dispatch(dispatch, span)
            }
            other => Err(EvalError::new(EvalErrorKind::NotCallable {
                type_name: other.type_name(),
            })),
        }
    }

    fn call_function(
        &mut self,
        func: &Rc<FunctionValue>,
        args: &[Value],
        frame: CallFrame,
    ) -> EvalResult {
        let params = &func.def.params;
        if params.len() != args.len() {
            return Err(EvalError::new(EvalErrorKind::ArityMismatch {
                name: self.interner.lookup(func.name).to_owned(),
                expected: params.len(),
                got: args.len(),
            }));
        }
        let flow = self.in_source(func.source, |interp| {
            interp.run_in_frame(frame, func.captured.clone(), |interp| {
                for (param, arg) in params.iter().zip(args) {
                    interp.env.define(*param, arg.clone());
                }
                interp.exec_scoped_block(&func.def.body)
            })
        })?;
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal(_) => Value::Nil,
        })
    }

    // ===== Deferred blocks =====

    /// Body of a constructed `at_runtime::dispatch()` call.
    fn run_dispatch(&mut self, dispatch: &DispatchFn<DeferredBlock>, span: Span) -> EvalResult {
        let dispatch = Rc::clone(dispatch);
        tracing::trace!(depth = dispatch.depth(), hooks = dispatch.len(), "dispatch");

        // Called from Rust with no Kiln block running: the call itself is
        // the enclosing block for `after_runtime` hooks.
        let detached = self.exit_actions.is_empty();
        if detached {
            tracing::warn!(
                depth = dispatch.depth(),
                "dispatch called outside any block; after_runtime hooks run when it returns"
            );
            self.exit_actions.push(Vec::new());
        }

        let frame = CallFrame::new(self.names.dispatch, FrameKind::Dispatch, Some(span));
        let mut result = self.call_stack.push(frame);
        if result.is_ok() {
            result = dispatch.run(|hook| match hook {
                Hook::AtRuntime(block) => self.run_deferred(&block, span).map(drop),
                Hook::AfterRuntime(block) => {
                    if let Some(actions) = self.exit_actions.last_mut() {
                        actions.push(block);
                    }
                    Ok(())
                }
            });
            result = result.map_err(|err| self.attach_backtrace(err));
            self.call_stack.pop();
        }

        let flow = result.map(|()| Flow::Normal(Value::Nil));
        let flow = if detached {
            let actions = self.exit_actions.pop().unwrap_or_default();
            self.run_exit_actions(actions, span, flow)
        } else {
            flow
        };
        flow.map(Flow::into_value)
    }

    /// Run a deferred block in a frame named by its label.
    fn run_deferred(&mut self, block: &DeferredBlock, span: Span) -> EvalResult {
        let frame = CallFrame::new(block.label, FrameKind::Hook, Some(span));
        match &block.callable {
            Value::Function(f) => self.call_function(f, &[], frame),
            Value::Native(native) => {
                let native = Rc::clone(native);
                self.run_in_frame(frame, None, |interp| (native.func)(interp, &[], span))
            }
            other => Err(EvalError::new(EvalErrorKind::NotCallable {
                type_name: other.type_name(),
            })),
        }
    }
}
