use crate::geometry::{Point, Rect};
use crate::model::{CellId, CellKind};
use crate::style::{self, Style};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Typed reference to a cached state, valid only for the validation that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle {
    cell: CellId,
    stamp: u64,
}

impl StateHandle {
    pub fn cell(&self) -> CellId {
        self.cell
    }
}

/// Derived view geometry of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub cell: CellId,
    pub kind: CellKind,
    pub style: Style,
    pub invalid: bool,
    pub invalid_style: bool,
    /// Scaled, translated bounds in view coordinates.
    pub bounds: Rect,
    pub unscaled_width: f64,
    pub unscaled_height: f64,
    /// Accumulated unscaled offset from the drill-down root.
    pub origin: Point,
    /// Label anchor: an offset from the center for vertices, an absolute point
    /// for edges.
    pub absolute_offset: Point,
    pub absolute_points: Vec<Point>,
    pub segments: Vec<f64>,
    pub length: f64,
    pub terminal_distance: f64,
    pub visible_source: Option<StateHandle>,
    pub visible_target: Option<StateHandle>,
    pub shape_bounds: Option<Rect>,
    pub label_bounds: Option<Rect>,
    pub(crate) stamp: u64,
}

impl CellState {
    pub fn new(cell: CellId, kind: CellKind) -> Self {
        Self {
            cell,
            kind,
            style: Style::new(),
            invalid: true,
            invalid_style: true,
            bounds: Rect::default(),
            unscaled_width: 0.0,
            unscaled_height: 0.0,
            origin: Point::default(),
            absolute_offset: Point::default(),
            absolute_points: Vec::new(),
            segments: Vec::new(),
            length: 0.0,
            terminal_distance: 0.0,
            visible_source: None,
            visible_target: None,
            shape_bounds: None,
            label_bounds: None,
            stamp: 0,
        }
    }

    pub fn is_edge(&self) -> bool {
        self.kind == CellKind::Edge
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == CellKind::Vertex
    }

    pub fn x(&self) -> f64 {
        self.bounds.x
    }

    pub fn y(&self) -> f64 {
        self.bounds.y
    }

    pub fn width(&self) -> f64 {
        self.bounds.width
    }

    pub fn height(&self) -> f64 {
        self.bounds.height
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn center_x(&self) -> f64 {
        self.bounds.center_x()
    }

    pub fn center_y(&self) -> f64 {
        self.bounds.center_y()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds.contains(x, y)
    }

    /// Horizontal routing center, shifted by `routingCenterX` times the width.
    pub fn routing_center_x(&self) -> f64 {
        self.center_x() + self.style.number_or(style::ROUTING_CENTER_X, 0.0) * self.width()
    }

    pub fn routing_center_y(&self) -> f64 {
        self.center_y() + self.style.number_or(style::ROUTING_CENTER_Y, 0.0) * self.height()
    }

    pub fn rotation(&self) -> f64 {
        self.style.rotation()
    }

    pub fn visible_terminal(&self, source: bool) -> Option<StateHandle> {
        if source {
            self.visible_source
        } else {
            self.visible_target
        }
    }

    pub(crate) fn set_visible_terminal(&mut self, handle: Option<StateHandle>, source: bool) {
        if source {
            self.visible_source = handle;
        } else {
            self.visible_target = handle;
        }
    }

    /// Point the label is centered on.
    pub fn label_anchor(&self) -> Point {
        if self.is_edge() {
            self.absolute_offset
        } else {
            Point::new(
                self.center_x() + self.absolute_offset.x,
                self.center_y() + self.absolute_offset.y,
            )
        }
    }

    pub fn first_point(&self) -> Option<Point> {
        self.absolute_points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.absolute_points.last().copied()
    }
}

/// Owner of every cached state.
///
/// `generation` grows on every invalidation, eviction and validation; a
/// validated state records the value it was stamped with.
#[derive(Debug, Default)]
pub struct StateCache {
    states: BTreeMap<CellId, CellState>,
    generation: u64,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellId) -> Option<&CellState> {
        self.states.get(&cell)
    }

    pub(crate) fn get_mut(&mut self, cell: CellId) -> Option<&mut CellState> {
        self.states.get_mut(&cell)
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.states.contains_key(&cell)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellState> {
        self.states.values()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle to the current incarnation of a state.
    pub fn handle(&self, cell: CellId) -> Option<StateHandle> {
        self.states.get(&cell).map(|s| StateHandle {
            cell,
            stamp: s.stamp,
        })
    }

    /// Resolves a handle if the state is still present, valid and unchanged.
    pub fn resolve(&self, handle: StateHandle) -> Option<&CellState> {
        self.states
            .get(&handle.cell)
            .filter(|s| !s.invalid && s.stamp == handle.stamp)
    }

    pub(crate) fn insert(&mut self, mut state: CellState) -> &mut CellState {
        state.stamp = self.bump();
        match self.states.entry(state.cell) {
            Entry::Occupied(mut slot) => {
                slot.insert(state);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(state),
        }
    }

    pub(crate) fn put_back(&mut self, state: CellState) {
        self.states.insert(state.cell, state);
    }

    pub(crate) fn take(&mut self, cell: CellId) -> Option<CellState> {
        self.states.remove(&cell)
    }

    pub(crate) fn remove(&mut self, cell: CellId) -> Option<CellState> {
        let removed = self.states.remove(&cell);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub(crate) fn mark_invalid(&mut self, cell: CellId) -> bool {
        match self.states.get_mut(&cell) {
            Some(state) => {
                state.invalid = true;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Stamps a freshly validated state.
    pub(crate) fn stamp(&mut self, cell: CellId) {
        let next = self.bump();
        if let Some(state) = self.states.get_mut(&cell) {
            state.stamp = next;
        }
    }

    pub(crate) fn clear(&mut self) -> Vec<CellState> {
        self.bump();
        std::mem::take(&mut self.states).into_values().collect()
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
