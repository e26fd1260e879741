use super::GraphView;
use crate::model::{CellId, GraphModel, ModelChange};
use crate::render::RenderListener;

impl<R: RenderListener> GraphView<R> {
    /// Marks the state of `cell` (default: the model root) invalid, then its
    /// descendants and connected edges. Cells without a state are still
    /// walked so that edges of deeper cells are reached.
    pub fn invalidate(
        &mut self,
        model: &GraphModel,
        cell: Option<CellId>,
        recurse: bool,
        include_edges: bool,
    ) {
        let cell = cell.unwrap_or(model.root());
        self.states.mark_invalid(cell);

        // Re-entry guard for edges that connect to their own ancestors.
        if !self.invalidating.insert(cell) {
            return;
        }
        if recurse {
            for &child in model.children(cell) {
                self.invalidate(model, Some(child), recurse, include_edges);
            }
        }
        if include_edges {
            for &edge in model.edges(cell) {
                self.invalidate(model, Some(edge), recurse, include_edges);
            }
        }
        self.invalidating.remove(&cell);
    }

    /// Evicts the state of `cell` (default: the model root) and, with
    /// `recurse`, its whole subtree. Without `force` the drill-down root is
    /// only invalidated.
    pub fn clear(&mut self, model: &GraphModel, cell: Option<CellId>, force: bool, recurse: bool) {
        let cell = cell.unwrap_or(model.root());
        self.remove_state(cell);
        if recurse && (force || Some(cell) != self.current_root) {
            for &child in model.children(cell) {
                self.clear(model, Some(child), force, recurse);
            }
        } else {
            self.invalidate(model, Some(cell), true, true);
        }
    }

    /// Evicts every state.
    pub fn clear_all(&mut self) {
        for state in self.states.clear() {
            self.renderer.state_removed(&state);
        }
    }

    /// Translates model mutations into invalidation and eviction. The model
    /// must already reflect `changes`; call [`GraphView::validate`] after.
    pub fn apply_changes(&mut self, model: &GraphModel, changes: &[ModelChange]) {
        for change in changes {
            tracing::trace!(?change, "applying model change");
            match *change {
                ModelChange::ChildAdded {
                    parent,
                    child,
                    previous,
                } => {
                    self.invalidate(model, Some(child), true, true);
                    if !model.contains(parent) || model.is_collapsed(parent) {
                        self.clear(model, Some(child), true, true);
                    }
                    self.invalidate(model, Some(parent), false, false);
                    if let Some(previous) = previous {
                        self.invalidate(model, Some(previous), false, false);
                    }
                }
                ModelChange::ChildRemoved { parent, child } => {
                    self.invalidate(model, Some(child), true, true);
                    self.clear(model, Some(child), true, true);
                    self.invalidate(model, Some(parent), false, false);
                    if let Some(root) = self.current_root {
                        if !model.contains(root) {
                            self.current_root = None;
                            self.clear_all();
                        }
                    }
                }
                ModelChange::TerminalChanged { edge, .. } => {
                    self.invalidate(model, Some(edge), true, true);
                }
                ModelChange::GeometryChanged(cell) => {
                    self.invalidate(model, Some(cell), true, true);
                }
                // Descendants may change visibility; rebuild the subtree.
                ModelChange::VisibilityChanged(cell) | ModelChange::CollapsedChanged(cell) => {
                    self.invalidate(model, Some(cell), true, true);
                    self.clear(model, Some(cell), true, true);
                }
                ModelChange::StyleChanged(cell) => {
                    self.invalidate(model, Some(cell), true, true);
                    if let Some(state) = self.states.get_mut(cell) {
                        state.invalid_style = true;
                    }
                }
                ModelChange::ValueChanged(cell) => {
                    self.invalidate(model, Some(cell), false, false);
                }
                ModelChange::RootChanged(_) => {
                    self.current_root = None;
                    self.clear_all();
                }
            }
        }
    }
}
