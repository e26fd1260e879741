mod bounds;
mod edge;
mod invalidate;
mod resolve;
mod state;

pub use state::{CellState, StateCache, StateHandle};

use crate::config::{Config, RoutingConfig, ViewConfig};
use crate::constraint::{ConstraintResolver, StyleConstraints};
use crate::geometry::{Point, Rect};
use crate::model::{CellId, GraphModel};
use crate::registry::StyleRegistry;
use crate::render::{NullRenderer, RenderListener};
use crate::stencil::StencilRegistry;
use crate::style::{StyleResolver, Stylesheet};
use crate::text::TextMeasure;
use std::collections::HashSet;

type ChildOffsetFn = Box<dyn Fn(&GraphModel, CellId) -> Option<Point>>;

/// Cache of derived view state for a [`GraphModel`].
///
/// The model is passed into every call; the view owns only derived data.
/// States are created by [`GraphView::validate`], marked stale through
/// [`GraphView::invalidate`] or [`GraphView::apply_changes`] and recomputed
/// by the next validation.
pub struct GraphView<R: RenderListener = NullRenderer> {
    states: StateCache,
    scale: f64,
    translate: Point,
    current_root: Option<CellId>,
    graph_bounds: Rect,
    view_config: ViewConfig,
    routing: RoutingConfig,
    styles: Box<dyn StyleResolver>,
    registry: StyleRegistry,
    constraints: Box<dyn ConstraintResolver>,
    stencils: StencilRegistry,
    renderer: R,
    text: Option<Box<dyn TextMeasure>>,
    child_offset: Option<ChildOffsetFn>,
    invalidating: HashSet<CellId>,
}

impl Default for GraphView<NullRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphView<NullRenderer> {
    pub fn new() -> Self {
        Self::with_renderer(NullRenderer)
    }
}

impl<R: RenderListener> GraphView<R> {
    pub fn with_renderer(renderer: R) -> Self {
        let view_config = ViewConfig::default();
        Self {
            states: StateCache::new(),
            scale: view_config.scale,
            translate: view_config.translate,
            current_root: None,
            graph_bounds: Rect::default(),
            view_config,
            routing: RoutingConfig::default(),
            styles: Box::new(Stylesheet::new()),
            registry: StyleRegistry::new(),
            constraints: Box::new(StyleConstraints),
            stencils: StencilRegistry::new(),
            renderer,
            text: None,
            child_offset: None,
            invalidating: HashSet::new(),
        }
    }

    /// Applies scale, translate, view flags, routing options and named styles.
    pub fn configure(mut self, config: &Config) -> Self {
        self.scale = config.view.scale;
        self.translate = config.view.translate;
        self.view_config = config.view.clone();
        self.routing = config.routing.clone();
        if !config.styles.is_empty() {
            let mut sheet = Stylesheet::new();
            for (name, style) in &config.styles {
                sheet.put_cell_style(name.clone(), style.clone());
            }
            self.styles = Box::new(sheet);
        }
        self
    }

    pub fn set_style_resolver(&mut self, resolver: impl StyleResolver + 'static) {
        self.styles = Box::new(resolver);
    }

    pub fn set_constraint_resolver(&mut self, resolver: impl ConstraintResolver + 'static) {
        self.constraints = Box::new(resolver);
    }

    pub fn set_text_measure(&mut self, measure: impl TextMeasure + 'static) {
        self.text = Some(Box::new(measure));
    }

    /// Installs an extra per-cell origin offset added before the geometry.
    pub fn set_child_offset(
        &mut self,
        hook: impl Fn(&GraphModel, CellId) -> Option<Point> + 'static,
    ) {
        self.child_offset = Some(Box::new(hook));
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StyleRegistry {
        &mut self.registry
    }

    pub fn stencils_mut(&mut self) -> &mut StencilRegistry {
        &mut self.stencils
    }

    pub fn view_config(&self) -> &ViewConfig {
        &self.view_config
    }

    pub fn view_config_mut(&mut self) -> &mut ViewConfig {
        &mut self.view_config
    }

    pub fn routing_config_mut(&mut self) -> &mut RoutingConfig {
        &mut self.routing
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    pub fn current_root(&self) -> Option<CellId> {
        self.current_root
    }

    /// Bounding box computed by the last validation.
    pub fn graph_bounds(&self) -> Rect {
        self.graph_bounds
    }

    pub fn states(&self) -> &StateCache {
        &self.states
    }

    /// Cached state of `cell`, without creating one.
    pub fn state(&self, cell: CellId) -> Option<&CellState> {
        self.states.get(cell)
    }

    pub fn resolve(&self, handle: StateHandle) -> Option<&CellState> {
        self.states.resolve(handle)
    }

    /// State of the nearest visible terminal of an edge, as cached by its
    /// last validation.
    pub fn visible_terminal_state(&self, edge: CellId, source: bool) -> Option<&CellState> {
        let handle = self.states.get(edge)?.visible_terminal(source)?;
        self.states.resolve(handle)
    }

    /// Returns the cached state; with `create`, allocates an invalid state
    /// for a visible cell that has none.
    pub fn get_state(
        &mut self,
        model: &GraphModel,
        cell: CellId,
        create: bool,
    ) -> Option<&CellState> {
        if create && model.is_visible(cell) {
            if !self.states.contains(cell) {
                if let Some(kind) = model.kind(cell) {
                    self.states.insert(CellState::new(cell, kind));
                }
            } else if self.view_config.update_style {
                let style = self.styles.cell_style(model, cell);
                if let Some(state) = self.states.get_mut(cell) {
                    state.style = style;
                    state.invalid_style = false;
                }
            }
        }
        self.states.get(cell)
    }

    /// Detaches the state of `cell` (not its descendants).
    pub fn remove_state(&mut self, cell: CellId) -> Option<CellState> {
        let mut state = self.states.remove(cell)?;
        state.invalid = true;
        self.renderer.state_removed(&state);
        Some(state)
    }

    /// Brings the cache up to date for the subtree under `cell`, or under
    /// the drill-down root, or the model root. Returns the new graph bounds.
    pub fn validate(&mut self, model: &GraphModel, cell: Option<CellId>) -> Rect {
        let span = tracing::debug_span!("validate", states = self.states.len());
        let _enter = span.enter();

        self.invalidating.clear();
        let root = cell.or(self.current_root).unwrap_or(model.root());
        self.validate_cell(model, root, true);
        self.validate_cell_state(model, root, true);
        self.graph_bounds = self
            .bounding_box(model, root, true)
            .unwrap_or_else(|| self.empty_bounds());
        tracing::debug!(states = self.states.len(), bounds = ?self.graph_bounds, "validated view");
        self.graph_bounds
    }

    /// Creates states for visible cells and evicts the subtrees of hidden ones.
    pub fn validate_cell(&mut self, model: &GraphModel, cell: CellId, visible: bool) {
        let visible = visible && model.is_visible(cell);
        let has_state = self.get_state(model, cell, visible).is_some();
        if has_state && !visible {
            self.clear(model, Some(cell), true, true);
            return;
        }
        let expand = visible && (!model.is_collapsed(cell) || Some(cell) == self.current_root);
        for &child in model.children(cell) {
            self.validate_cell(model, child, expand);
        }
    }

    /// Recomputes an invalid state after its parent and terminals, then
    /// optionally descends into the children.
    pub fn validate_cell_state(
        &mut self,
        model: &GraphModel,
        cell: CellId,
        recurse: bool,
    ) -> Option<StateHandle> {
        let state = self.states.get_mut(cell)?;
        if state.invalid {
            state.invalid = false;
            if state.invalid_style {
                let style = self.styles.cell_style(model, cell);
                if let Some(state) = self.states.get_mut(cell) {
                    state.style = style;
                    state.invalid_style = false;
                }
            }

            if Some(cell) != self.current_root {
                if let Some(parent) = model.parent(cell) {
                    self.validate_cell_state(model, parent, false);
                }
            }

            let source = self
                .visible_terminal(model, cell, true)
                .and_then(|t| self.validate_cell_state(model, t, false));
            let target = self
                .visible_terminal(model, cell, false)
                .and_then(|t| self.validate_cell_state(model, t, false));
            if let Some(state) = self.states.get_mut(cell) {
                state.set_visible_terminal(source, true);
                state.set_visible_terminal(target, false);
            }

            self.update_cell_state(model, cell);

            if self.states.get(cell).is_some_and(|s| !s.invalid) {
                self.states.stamp(cell);
                self.update_boxes(model, cell);
                if Some(cell) != self.current_root {
                    if let Some(state) = self.states.get(cell) {
                        self.renderer.state_validated(state);
                    }
                }
                tracing::trace!(%cell, "validated state");
            }
        }

        if recurse && self.states.get(cell).is_some_and(|s| !s.invalid) {
            for &child in model.children(cell) {
                self.validate_cell_state(model, child, true);
            }
        }
        self.states.handle(cell)
    }

    /// Nearest ancestor-or-self of an edge terminal that is displayed.
    pub fn visible_terminal(&self, model: &GraphModel, edge: CellId, source: bool) -> Option<CellId> {
        let terminal = model.terminal(edge, source)?;
        let mut result = Some(terminal);
        let mut best = terminal;
        while let Some(cell) = result {
            if Some(cell) == self.current_root {
                break;
            }
            if !model.is_visible(best) || model.is_collapsed(cell) {
                best = cell;
            }
            result = model.parent(cell);
        }

        let stale = !model.contains(best)
            || model.parent(best) == Some(model.root())
            || Some(best) == self.current_root;
        if stale { None } else { Some(best) }
    }

    pub fn set_scale(&mut self, model: &GraphModel, scale: f64) {
        if self.scale != scale {
            self.scale = scale;
            self.revalidate(model);
        }
    }

    pub fn set_translate(&mut self, model: &GraphModel, dx: f64, dy: f64) {
        if self.translate.x != dx || self.translate.y != dy {
            self.translate = Point::new(dx, dy);
            self.revalidate(model);
        }
    }

    pub fn scale_and_translate(&mut self, model: &GraphModel, scale: f64, dx: f64, dy: f64) {
        let changed =
            self.scale != scale || self.translate.x != dx || self.translate.y != dy;
        self.scale = scale;
        self.translate = Point::new(dx, dy);
        if changed {
            self.revalidate(model);
        }
    }

    /// Invalidates everything and validates again.
    pub fn revalidate(&mut self, model: &GraphModel) {
        self.invalidate(model, None, true, true);
        self.validate(model, None);
    }

    /// Drops the cache when drilled down, then revalidates.
    pub fn refresh(&mut self, model: &GraphModel) {
        if self.current_root.is_some() {
            self.clear(model, None, false, true);
        }
        self.revalidate(model);
    }

    /// Drills down into `root`, or back to the model root with `None`.
    pub fn set_current_root(&mut self, model: &GraphModel, root: Option<CellId>) {
        if self.current_root == root {
            return;
        }
        self.current_root = root;
        self.clear(model, None, true, true);
        self.validate(model, None);
    }

    /// Accumulated unscaled origin of `cell`, validating its ancestor chain
    /// on demand.
    pub fn origin(&mut self, model: &GraphModel, cell: CellId) -> Option<Point> {
        if let Some(state) = self.states.get(cell) {
            if !state.invalid {
                return Some(state.origin);
            }
        }

        let root = self.current_root.unwrap_or(model.root());
        let mut chain = Vec::new();
        let mut current = Some(cell);
        while let Some(c) = current {
            chain.push(c);
            if c == root {
                break;
            }
            current = model.parent(c);
        }
        if chain.last() != Some(&root) {
            return None;
        }

        for &c in chain.iter().rev() {
            if !model.is_visible(c) {
                return None;
            }
            self.get_state(model, c, true);
            if c != cell && model.is_collapsed(c) && Some(c) != self.current_root {
                return None;
            }
        }
        self.validate_cell_state(model, cell, false);
        self.states.get(cell).map(|s| s.origin)
    }

    fn empty_bounds(&self) -> Rect {
        Rect::new(
            self.translate.x * self.scale,
            self.translate.y * self.scale,
            0.0,
            0.0,
        )
    }
}
