//! Queued hooks and the dispatch function that owns them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A block queued at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hook<B> {
    /// Runs when the dispatch call is reached.
    AtRuntime(B),
    /// Runs when the runtime block enclosing the dispatch call exits.
    AfterRuntime(B),
}

impl<B> Hook<B> {
    pub fn block(&self) -> &B {
        match self {
            Hook::AtRuntime(block) | Hook::AfterRuntime(block) => block,
        }
    }
}

/// Ordered hooks for one depth.
///
/// Appended to only while the depth's registry slot exists; read when the
/// constructed dispatch call runs.
pub struct HookList<B> {
    depth: usize,
    hooks: RefCell<Vec<Hook<B>>>,
}

/// Handle to a depth's dispatch function.
///
/// Shared by the registry slot (until cleared), the host's dispatch binding,
/// and every constructed call to it.
pub type DispatchFn<B> = Rc<HookList<B>>;

impl<B> HookList<B> {
    pub(crate) fn new(depth: usize) -> DispatchFn<B> {
        Rc::new(HookList {
            depth,
            hooks: RefCell::new(Vec::new()),
        })
    }

    /// Construction depth this list was created for.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.borrow().is_empty()
    }

    pub(crate) fn push(&self, hook: Hook<B>) {
        self.hooks.borrow_mut().push(hook);
    }
}

impl<B: Clone> HookList<B> {
    /// Run `f` on each hook in registration order.
    ///
    /// Each hook is cloned out before `f` runs, so `f` may re-enter the list.
    /// Stops at the first error.
    pub fn run<E>(&self, mut f: impl FnMut(Hook<B>) -> Result<(), E>) -> Result<(), E> {
        let mut index = 0;
        loop {
            let hook = self.hooks.borrow().get(index).cloned();
            let Some(hook) = hook else {
                return Ok(());
            };
            f(hook)?;
            index += 1;
        }
    }
}

impl<B> fmt::Debug for HookList<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookList")
            .field("depth", &self.depth)
            .field("len", &self.len())
            .finish()
    }
}
