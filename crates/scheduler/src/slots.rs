//! One outstanding render per surface.
//!
//! [`SlotRegistry`] maps each drawable surface to the render currently
//! targeting it. Issuing a render for a surface cancels whatever was there
//! before, so at most one live token exists per surface.

use crate::cancel::CancellationToken;
use crate::generation::Generation;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot {
    generation: Generation,
    token: CancellationToken,
}

impl Slot {
    fn is_live(&self, generation: Generation) -> bool {
        self.generation == generation && !self.token.is_cancelled()
    }
}

#[derive(Debug)]
pub struct SlotRegistry<K> {
    slots: RefCell<HashMap<K, Slot>>,
}

impl<K> Default for SlotRegistry<K> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
        }
    }
}

impl<K> SlotRegistry<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a render of `generation` on `surface`, cancelling the
    /// previous one, and returns the token for the new render.
    pub fn issue(&self, surface: K, generation: Generation) -> CancellationToken {
        let token = CancellationToken::new();
        let slot = Slot {
            generation,
            token: token.clone(),
        };
        let previous = self.slots.borrow_mut().insert(surface, slot);

        if let Some(previous) = previous {
            tracing::trace!(
                ?surface,
                superseded = previous.generation.raw(),
                by = generation.raw(),
                "cancelling superseded render"
            );
            previous.token.cancel();
        }

        token
    }

    /// Whether the render of `generation` still owns `surface`.
    pub fn is_current(&self, surface: K, generation: Generation) -> bool {
        self.slots
            .borrow()
            .get(&surface)
            .is_some_and(|slot| slot.is_live(generation))
    }

    /// Releases `surface` once its render finished. Returns false when the
    /// render had already been superseded, in which case nothing changes.
    pub fn complete(&self, surface: K, generation: Generation) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get(&surface) {
            Some(slot) if slot.generation == generation => {
                slots.remove(&surface);
                true
            }
            _ => false,
        }
    }

    /// Cancels the render on `surface`, if any. Returns whether one existed.
    pub fn cancel(&self, surface: K) -> bool {
        match self.slots.borrow_mut().remove(&surface) {
            Some(slot) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every outstanding render and returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.slots.borrow_mut().drain().collect();
        for (_, slot) in &drained {
            slot.token.cancel();
        }
        drained.len()
    }

    /// Number of surfaces with a render in flight.
    pub fn in_flight(&self) -> usize {
        self.slots.borrow().len()
    }
}
