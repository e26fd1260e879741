use crate::model::CellId;
use crate::view::CellState;

/// Receives state lifecycle notifications from the view.
pub trait RenderListener {
    /// A state finished validation (not sent for the drill-down root).
    fn state_validated(&mut self, _state: &CellState) {}

    /// A state left the cache.
    fn state_removed(&mut self, _state: &CellState) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderListener for NullRenderer {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    Validated(CellId),
    Removed(CellId),
}

/// Records notifications in order.
#[derive(Debug, Default, Clone)]
pub struct RenderLog {
    pub events: Vec<RenderEvent>,
}

impl RenderLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validated(&self) -> impl Iterator<Item = CellId> + '_ {
        self.events.iter().filter_map(|e| match e {
            RenderEvent::Validated(id) => Some(*id),
            RenderEvent::Removed(_) => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = CellId> + '_ {
        self.events.iter().filter_map(|e| match e {
            RenderEvent::Removed(id) => Some(*id),
            RenderEvent::Validated(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RenderListener for RenderLog {
    fn state_validated(&mut self, state: &CellState) {
        self.events.push(RenderEvent::Validated(state.cell));
    }

    fn state_removed(&mut self, state: &CellState) {
        self.events.push(RenderEvent::Removed(state.cell));
    }
}
