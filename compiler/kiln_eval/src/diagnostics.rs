//! Live call stack and the backtraces captured from it.
//!
//! Every sub call, `begin` block, hook body and dispatch call pushes a
//! [`CallFrame`]. Native functions do not, so `callers()` sees its caller
//! as the innermost frame. When an error is raised the stack is captured
//! into a [`Backtrace`], innermost frame first.

use std::fmt;

use kiln_ir::{Name, Span, StringInterner};

use crate::errors::{EvalError, EvalErrorKind};

/// What pushed a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Top level of a unit being executed.
    Unit,
    /// A `begin` block running at construction time.
    Begin,
    /// A `sub` or closure call.
    Sub,
    /// A call to `at_runtime::dispatch`.
    Dispatch,
    /// A deferred block run by a dispatch call or at scope exit.
    Hook,
}

#[derive(Clone, Debug)]
pub struct CallFrame {
    pub name: Name,
    pub kind: FrameKind,
    /// Where the call was made, when there is a call site.
    pub call_span: Option<Span>,
}

impl CallFrame {
    pub fn new(name: Name, kind: FrameKind, call_span: Option<Span>) -> Self {
        CallFrame {
            name,
            kind,
            call_span,
        }
    }
}

/// Live call stack with an optional depth limit.
///
/// ```text
/// stack.push(CallFrame::new(name, FrameKind::Sub, Some(span)))?;
/// // ... evaluate the body ...
/// stack.pop();
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame. Fails without pushing when the limit is reached.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(EvalError::new(EvalErrorKind::StackOverflow { depth: max }));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = &CallFrame> {
        self.frames.iter().rev()
    }

    pub fn capture(&self, interner: &StringInterner) -> Backtrace {
        let frames = self
            .frames()
            .map(|frame| BacktraceFrame {
                name: interner.lookup(frame.name).to_owned(),
                kind: frame.kind,
                span: frame.call_span,
            })
            .collect();
        Backtrace { frames }
    }

    /// Attach a backtrace unless `err` already carries one.
    ///
    /// The first capture is the deepest, so errors passing back up through
    /// outer frames keep it.
    pub fn attach_backtrace(&self, err: EvalError, interner: &StringInterner) -> EvalError {
        if err.backtrace.is_some() || self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture(interner))
    }
}

/// Snapshot of the call stack at an error site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backtrace {
    frames: Vec<BacktraceFrame>,
}

impl Backtrace {
    /// Frames, innermost first.
    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: String,
    pub kind: FrameKind,
    pub span: Option<Span>,
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
