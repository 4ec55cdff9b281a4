//! Bookkeeping for the render resources mounted for each overlay.
//!
//! Each overlay owns at most one mounted view. Replacing one overlay by
//! another tears the old view down completely before the new one is mounted,
//! with a single in-flight guard so the two never coexist.

use crate::overlay::OverlayId;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    #[error("{0} already has a mounted view")]
    AlreadyMounted(OverlayId),
    #[error("{0} has no mounted view")]
    NotMounted(OverlayId),
    #[error("teardown of {0} is still in flight")]
    TeardownInFlight(OverlayId),
}

/// Mounted views keyed by overlay.
#[derive(Debug)]
pub struct RenderSlots<V> {
    mounted: HashMap<OverlayId, V>,
    tearing_down: Option<OverlayId>,
}

impl<V> Default for RenderSlots<V> {
    fn default() -> Self {
        Self {
            mounted: HashMap::new(),
            tearing_down: None,
        }
    }
}

impl<V> RenderSlots<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, id: OverlayId, view: V) -> Result<(), SlotError> {
        if let Some(busy) = self.tearing_down {
            return Err(SlotError::TeardownInFlight(busy));
        }
        if self.mounted.contains_key(&id) {
            return Err(SlotError::AlreadyMounted(id));
        }
        self.mounted.insert(id, view);
        Ok(())
    }

    /// Detaches a view and marks its teardown as in flight until
    /// [`finish_teardown`](Self::finish_teardown) is called.
    pub fn begin_teardown(&mut self, id: OverlayId) -> Result<V, SlotError> {
        if let Some(busy) = self.tearing_down {
            return Err(SlotError::TeardownInFlight(busy));
        }
        let view = self.mounted.remove(&id).ok_or(SlotError::NotMounted(id))?;
        self.tearing_down = Some(id);
        Ok(view)
    }

    pub fn finish_teardown(&mut self) {
        self.tearing_down = None;
    }

    #[cfg(test)]
    fn is_tearing_down(&self) -> bool {
        self.tearing_down.is_some()
    }

    /// Tears down and drops a view in one step.
    pub fn unmount(&mut self, id: OverlayId) -> Result<(), SlotError> {
        let view = self.begin_teardown(id)?;
        drop(view);
        self.finish_teardown();
        Ok(())
    }

    /// Tears down `old`, then mounts `view` for `new`.
    ///
    /// A missing `old` view is reported through the returned value but does
    /// not stop the new view from being mounted.
    pub fn replace(
        &mut self,
        old: OverlayId,
        new: OverlayId,
        view: V,
    ) -> Result<Option<SlotError>, SlotError> {
        let teardown = match self.unmount(old) {
            Ok(()) => None,
            Err(err @ SlotError::NotMounted(_)) => Some(err),
            Err(err) => return Err(err),
        };
        self.mount(new, view)?;
        Ok(teardown)
    }

    pub fn get(&self, id: OverlayId) -> Option<&V> {
        self.mounted.get(&id)
    }

    #[cfg(test)]
    fn is_mounted(&self, id: OverlayId) -> bool {
        self.mounted.contains_key(&id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (OverlayId, &mut V)> {
        self.mounted.iter_mut().map(|(id, view)| (*id, view))
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }
}
