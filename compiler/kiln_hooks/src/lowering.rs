//! The lowering protocol: turn a construction-time hook into a runtime
//! dispatch point.

use crate::{ConstructionSite, Hook, HookError, HookRegistry, InjectionMode, Registration};

/// Runtime-visible name of the active depth's dispatch function.
pub const DISPATCH_NAME: &str = "at_runtime::dispatch";

/// Construction-time builtin the self-clearing marker calls.
pub const CLEAR_NAME: &str = "at_runtime::clear";

/// Fragment injected on the first registration at `depth`.
///
/// The dispatch call is constructed first; the `begin` after it then runs
/// at `depth` and clears the slot, so later registrations at the same depth
/// start a fresh dispatch point further on.
pub fn dispatch_fragment(depth: usize) -> String {
    format!("{DISPATCH_NAME}(); {}", clear_fragment(depth))
}

/// The self-clearing marker for `depth`.
pub fn clear_fragment(depth: usize) -> String {
    format!("begin {{ {CLEAR_NAME}({depth}) }}")
}

/// Registry plus injection strategy; one per interpreter.
pub struct Lowering<B> {
    registry: HookRegistry<B>,
    mode: InjectionMode,
}

impl<B> Lowering<B> {
    pub fn new(mode: InjectionMode) -> Self {
        Lowering {
            registry: HookRegistry::new(),
            mode,
        }
    }

    pub fn mode(&self) -> InjectionMode {
        self.mode
    }

    pub fn registry(&self) -> &HookRegistry<B> {
        &self.registry
    }

    /// Queue `hook` to run at the current construction point.
    ///
    /// All checks, including the injection itself, happen before the
    /// registry is modified.
    pub fn defer<S>(&mut self, site: &mut S, hook: Hook<B>) -> Result<Registration<B>, HookError>
    where
        S: ConstructionSite<B> + ?Sized,
    {
        let depth = site.depth();
        if depth == 0 {
            return Err(HookError::NotConstructing);
        }
        if site.compiling_string_eval() {
            return Err(HookError::StringEval);
        }
        if self.registry.has_slot(depth) {
            return self.registry.register(depth, hook);
        }

        site.inject(self.mode, &dispatch_fragment(depth))?;
        let registration = self.registry.register(depth, hook)?;
        if let Registration::Created(dispatch) = &registration {
            site.bind(depth, std::rc::Rc::clone(dispatch));
        }
        Ok(registration)
    }

    /// Splice raw `text` into the unit under construction.
    pub fn inject_text<S>(&self, site: &mut S, text: &str) -> Result<(), HookError>
    where
        S: ConstructionSite<B> + ?Sized,
    {
        site.inject(self.mode, text)?;
        Ok(())
    }

    /// Run by the self-clearing marker: drop the slot at `depth` and fall
    /// back to the nearest enclosing depth's dispatch function.
    pub fn clear<S>(&mut self, site: &mut S, depth: usize) -> Result<(), HookError>
    where
        S: ConstructionSite<B> + ?Sized,
    {
        let parent = self.registry.clear(depth)?;
        let parent_depth = parent.as_ref().map_or(0, |p| p.depth());
        site.unbind_to(parent_depth, parent);
        Ok(())
    }

    /// Forget slots deeper than `depth` after an aborted construction.
    pub fn unwind_to<S>(&mut self, site: &mut S, depth: usize)
    where
        S: ConstructionSite<B> + ?Sized,
    {
        if self.registry.unwind_to(depth) > 0 {
            let parent = self.registry.nearest_at_or_below(depth);
            site.unbind_to(parent.as_ref().map_or(0, |p| p.depth()), parent);
        }
    }
}
