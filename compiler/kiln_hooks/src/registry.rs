//! Depth-indexed arena of pending hook slots.

use std::rc::Rc;

use crate::{DispatchFn, Hook, HookError, HookList};

/// Outcome of [`HookRegistry::register`].
#[derive(Debug)]
pub enum Registration<B> {
    /// The hook opened a new slot; the caller must inject a dispatch call
    /// for this function and bind it.
    Created(DispatchFn<B>),
    /// The hook joined an existing slot.
    Queued,
}

impl<B> Registration<B> {
    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

struct Slot<B> {
    dispatch: DispatchFn<B>,
}

/// One optional slot per construction depth.
///
/// Index 0 is never occupied. A slot exists at depth `d` exactly when a hook
/// has been registered at `d` since `d` was last cleared.
pub struct HookRegistry<B> {
    slots: Vec<Option<Slot<B>>>,
}

impl<B> Default for HookRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> HookRegistry<B> {
    pub fn new() -> Self {
        HookRegistry { slots: Vec::new() }
    }

    pub fn has_slot(&self, depth: usize) -> bool {
        self.slot(depth).is_some()
    }

    /// Dispatch function of the slot at `depth`, if any.
    pub fn dispatch_at(&self, depth: usize) -> Option<&DispatchFn<B>> {
        self.slot(depth).map(|slot| &slot.dispatch)
    }

    /// Depths that currently hold a slot, shallowest first.
    pub fn active_depths(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(depth, slot)| slot.as_ref().map(|_| depth))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn slot(&self, depth: usize) -> Option<&Slot<B>> {
        self.slots.get(depth).and_then(Option::as_ref)
    }

    /// Append `hook` at `depth`, opening the slot if needed.
    pub fn register(&mut self, depth: usize, hook: Hook<B>) -> Result<Registration<B>, HookError> {
        if depth == 0 {
            return Err(HookError::NotConstructing);
        }
        if let Some(slot) = self.slot(depth) {
            slot.dispatch.push(hook);
            tracing::trace!(depth, queued = slot.dispatch.len(), "hook queued");
            return Ok(Registration::Queued);
        }

        if self.slots.len() <= depth {
            self.slots.resize_with(depth + 1, || None);
        }
        let dispatch = HookList::new(depth);
        dispatch.push(hook);
        self.slots[depth] = Some(Slot {
            dispatch: Rc::clone(&dispatch),
        });
        tracing::debug!(depth, "hook slot created");
        Ok(Registration::Created(dispatch))
    }

    /// Remove the slot at `depth`.
    ///
    /// Returns the dispatch function the binding should fall back to: that of
    /// the nearest shallower slot, or `None` when there is none.
    pub fn clear(&mut self, depth: usize) -> Result<Option<DispatchFn<B>>, HookError> {
        let removed = self
            .slots
            .get_mut(depth)
            .and_then(Option::take)
            .ok_or(HookError::NoSlot { depth })?;
        tracing::debug!(depth, hooks = removed.dispatch.len(), "hook slot cleared");
        self.trim();
        Ok(self.nearest_at_or_below(depth.saturating_sub(1)))
    }

    /// Remove every slot deeper than `depth`.
    ///
    /// Used when a nested construction aborts before its self-clearing
    /// marker ran. Returns the number of slots removed.
    pub fn unwind_to(&mut self, depth: usize) -> usize {
        let removed = self
            .slots
            .iter_mut()
            .skip(depth + 1)
            .filter_map(Option::take)
            .count();
        if removed > 0 {
            tracing::debug!(depth, removed, "hook slots unwound");
        }
        self.trim();
        removed
    }

    /// Dispatch function of the deepest slot no deeper than `depth`.
    pub fn nearest_at_or_below(&self, depth: usize) -> Option<DispatchFn<B>> {
        (1..=depth)
            .rev()
            .find_map(|d| self.dispatch_at(d))
            .map(Rc::clone)
    }

    fn trim(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }
}
