use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Root, layers and other pure containers.
    #[default]
    Plain,
    Vertex,
    Edge,
}

/// Logical geometry of a cell.
///
/// With `relative` set, `x`/`y` are fractions of the parent's unscaled size
/// (vertex parents) or a position along the parent's path in `[-1, 1]` plus
/// a perpendicular distance (edge parents). `offset` is added in pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub relative: bool,
    pub offset: Option<Point>,
    /// Edge waypoints in the parent's coordinate space.
    pub points: Vec<Point>,
    pub source_point: Option<Point>,
    pub target_point: Option<Point>,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn relative(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            relative: true,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_terminal_point(mut self, point: Point, source: bool) -> Self {
        if source {
            self.source_point = Some(point);
        } else {
            self.target_point = Some(point);
        }
        self
    }

    pub fn terminal_point(&self, source: bool) -> Option<Point> {
        if source {
            self.source_point
        } else {
            self.target_point
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub parent: Option<CellId>,
    pub children: Vec<CellId>,
    /// Edges that use this cell as a terminal.
    pub edges: Vec<CellId>,
    pub kind: CellKind,
    pub geometry: Option<Geometry>,
    pub style: Option<String>,
    pub value: Option<String>,
    pub visible: bool,
    pub collapsed: bool,
    pub source: Option<CellId>,
    pub target: Option<CellId>,
}

impl Cell {
    fn new(id: CellId, kind: CellKind) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            edges: Vec::new(),
            kind,
            geometry: None,
            style: None,
            value: None,
            visible: true,
            collapsed: false,
            source: None,
            target: None,
        }
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == CellKind::Vertex
    }

    pub fn is_edge(&self) -> bool {
        self.kind == CellKind::Edge
    }

    pub fn terminal(&self, source: bool) -> Option<CellId> {
        if source { self.source } else { self.target }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown cell {0}")]
    UnknownCell(CellId),
    #[error("moving {child} under {parent} would make it its own ancestor")]
    Cycle { parent: CellId, child: CellId },
    #[error("cell {0} is not an edge")]
    NotAnEdge(CellId),
    #[error("the model root {0} cannot be removed")]
    RootRemoval(CellId),
    #[error("cell {0} is attached to a parent and cannot become the root")]
    AttachedRoot(CellId),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A single mutation record, consumed by `GraphView::apply_changes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChange {
    ChildAdded {
        parent: CellId,
        child: CellId,
        previous: Option<CellId>,
    },
    ChildRemoved {
        parent: CellId,
        child: CellId,
    },
    TerminalChanged {
        edge: CellId,
        source: bool,
    },
    GeometryChanged(CellId),
    StyleChanged(CellId),
    ValueChanged(CellId),
    VisibilityChanged(CellId),
    CollapsedChanged(CellId),
    RootChanged(CellId),
}

/// Arena of cells forming a single tree under `root`.
///
/// Removed cells stay in the arena, detached, so that edges pointing at them
/// keep a terminal id that no longer resolves through [`GraphModel::contains`].
#[derive(Debug, Clone)]
pub struct GraphModel {
    cells: BTreeMap<CellId, Cell>,
    root: CellId,
    next_id: u32,
    changes: Vec<ModelChange>,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel {
    /// Creates a model with a root cell and one default layer.
    pub fn new() -> Self {
        let root = CellId(0);
        let layer = CellId(1);
        let mut cells = BTreeMap::new();
        let mut root_cell = Cell::new(root, CellKind::Plain);
        root_cell.children.push(layer);
        let mut layer_cell = Cell::new(layer, CellKind::Plain);
        layer_cell.parent = Some(root);
        cells.insert(root, root_cell);
        cells.insert(layer, layer_cell);
        Self {
            cells,
            root,
            next_id: 2,
            changes: Vec::new(),
        }
    }

    pub fn root(&self) -> CellId {
        self.root
    }

    /// First layer under the root, where cells go by default.
    pub fn default_parent(&self) -> CellId {
        self.children(self.root)
            .first()
            .copied()
            .unwrap_or(self.root)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn parent(&self, id: CellId) -> Option<CellId> {
        self.cells.get(&id).and_then(|c| c.parent)
    }

    pub fn children(&self, id: CellId) -> &[CellId] {
        self.cells
            .get(&id)
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges(&self, id: CellId) -> &[CellId] {
        self.cells
            .get(&id)
            .map(|c| c.edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn geometry(&self, id: CellId) -> Option<&Geometry> {
        self.cells.get(&id).and_then(|c| c.geometry.as_ref())
    }

    pub fn style(&self, id: CellId) -> Option<&str> {
        self.cells.get(&id).and_then(|c| c.style.as_deref())
    }

    pub fn value(&self, id: CellId) -> Option<&str> {
        self.cells.get(&id).and_then(|c| c.value.as_deref())
    }

    pub fn kind(&self, id: CellId) -> Option<CellKind> {
        self.cells.get(&id).map(|c| c.kind)
    }

    pub fn is_vertex(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(Cell::is_vertex)
    }

    pub fn is_edge(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(Cell::is_edge)
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.visible)
    }

    pub fn is_collapsed(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(|c| c.collapsed)
    }

    pub fn terminal(&self, edge: CellId, source: bool) -> Option<CellId> {
        self.cells.get(&edge).and_then(|c| c.terminal(source))
    }

    /// True if the cell is attached to the tree under the current root.
    pub fn contains(&self, id: CellId) -> bool {
        let mut current = Some(id);
        let mut steps = 0usize;
        while let Some(cell) = current {
            if cell == self.root {
                return true;
            }
            steps += 1;
            if steps > self.cells.len() {
                return false;
            }
            current = self.parent(cell);
        }
        false
    }

    /// True if `ancestor` is `cell` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: CellId, cell: CellId) -> bool {
        let mut current = Some(cell);
        let mut steps = 0usize;
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.cells.len() {
                return false;
            }
            current = self.parent(c);
        }
        false
    }

    /// Appends a new cell of the given kind under `parent`.
    pub fn add_cell(&mut self, parent: CellId, kind: CellKind) -> Result<CellId> {
        if !self.cells.contains_key(&parent) {
            return Err(ModelError::UnknownCell(parent));
        }
        let id = CellId(self.next_id);
        self.next_id += 1;
        let mut cell = Cell::new(id, kind);
        cell.parent = Some(parent);
        self.cells.insert(id, cell);
        if let Some(p) = self.cells.get_mut(&parent) {
            p.children.push(id);
        }
        self.changes.push(ModelChange::ChildAdded {
            parent,
            child: id,
            previous: None,
        });
        Ok(id)
    }

    pub fn add_layer(&mut self) -> Result<CellId> {
        let root = self.root;
        self.add_cell(root, CellKind::Plain)
    }

    pub fn add_vertex(
        &mut self,
        parent: CellId,
        value: Option<&str>,
        geometry: Geometry,
        style: Option<&str>,
    ) -> Result<CellId> {
        let id = self.add_cell(parent, CellKind::Vertex)?;
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.value = value.map(str::to_string);
            cell.geometry = Some(geometry);
            cell.style = style.map(str::to_string);
        }
        Ok(id)
    }

    pub fn add_edge(
        &mut self,
        parent: CellId,
        value: Option<&str>,
        source: Option<CellId>,
        target: Option<CellId>,
        style: Option<&str>,
    ) -> Result<CellId> {
        let id = self.add_cell(parent, CellKind::Edge)?;
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.value = value.map(str::to_string);
            cell.geometry = Some(Geometry::relative(0.0, 0.0));
            cell.style = style.map(str::to_string);
        }
        self.set_terminal(id, source, true)?;
        self.set_terminal(id, target, false)?;
        Ok(id)
    }

    /// Moves `cell` under `parent` at `index` (appended when `None`).
    pub fn set_parent(&mut self, cell: CellId, parent: CellId, index: Option<usize>) -> Result<()> {
        if !self.cells.contains_key(&cell) {
            return Err(ModelError::UnknownCell(cell));
        }
        if !self.cells.contains_key(&parent) {
            return Err(ModelError::UnknownCell(parent));
        }
        if self.is_ancestor(cell, parent) {
            return Err(ModelError::Cycle {
                parent,
                child: cell,
            });
        }
        let previous = self.detach(cell);
        if let Some(p) = self.cells.get_mut(&parent) {
            let at = index.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(at, cell);
        }
        if let Some(c) = self.cells.get_mut(&cell) {
            c.parent = Some(parent);
        }
        self.changes.push(ModelChange::ChildAdded {
            parent,
            child: cell,
            previous,
        });
        Ok(())
    }

    /// Detaches `cell` and its subtree from the tree.
    pub fn remove(&mut self, cell: CellId) -> Result<()> {
        if cell == self.root {
            return Err(ModelError::RootRemoval(cell));
        }
        if !self.cells.contains_key(&cell) {
            return Err(ModelError::UnknownCell(cell));
        }
        if let Some(parent) = self.detach(cell) {
            self.changes.push(ModelChange::ChildRemoved {
                parent,
                child: cell,
            });
        }
        Ok(())
    }

    /// Replaces the root with a detached cell.
    pub fn set_root(&mut self, root: CellId) -> Result<()> {
        let cell = self.cells.get(&root).ok_or(ModelError::UnknownCell(root))?;
        if cell.parent.is_some() {
            return Err(ModelError::AttachedRoot(root));
        }
        self.root = root;
        self.changes.push(ModelChange::RootChanged(root));
        Ok(())
    }

    pub fn set_geometry(&mut self, cell: CellId, geometry: Option<Geometry>) -> Result<()> {
        self.cell_mut(cell)?.geometry = geometry;
        self.changes.push(ModelChange::GeometryChanged(cell));
        Ok(())
    }

    pub fn set_style(&mut self, cell: CellId, style: Option<&str>) -> Result<()> {
        self.cell_mut(cell)?.style = style.map(str::to_string);
        self.changes.push(ModelChange::StyleChanged(cell));
        Ok(())
    }

    pub fn set_value(&mut self, cell: CellId, value: Option<&str>) -> Result<()> {
        self.cell_mut(cell)?.value = value.map(str::to_string);
        self.changes.push(ModelChange::ValueChanged(cell));
        Ok(())
    }

    pub fn set_visible(&mut self, cell: CellId, visible: bool) -> Result<()> {
        let c = self.cell_mut(cell)?;
        if c.visible != visible {
            c.visible = visible;
            self.changes.push(ModelChange::VisibilityChanged(cell));
        }
        Ok(())
    }

    pub fn set_collapsed(&mut self, cell: CellId, collapsed: bool) -> Result<()> {
        let c = self.cell_mut(cell)?;
        if c.collapsed != collapsed {
            c.collapsed = collapsed;
            self.changes.push(ModelChange::CollapsedChanged(cell));
        }
        Ok(())
    }

    /// Connects (or disconnects, with `None`) one end of an edge.
    pub fn set_terminal(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
    ) -> Result<()> {
        if !self.is_edge(edge) {
            return if self.cells.contains_key(&edge) {
                Err(ModelError::NotAnEdge(edge))
            } else {
                Err(ModelError::UnknownCell(edge))
            };
        }
        if let Some(t) = terminal {
            if !self.cells.contains_key(&t) {
                return Err(ModelError::UnknownCell(t));
            }
        }
        let previous = self.terminal(edge, source);
        if previous == terminal {
            return Ok(());
        }
        if let Some(c) = self.cells.get_mut(&edge) {
            if source {
                c.source = terminal;
            } else {
                c.target = terminal;
            }
        }
        if let Some(old) = previous {
            if self.terminal(edge, !source) != Some(old) {
                if let Some(c) = self.cells.get_mut(&old) {
                    c.edges.retain(|e| *e != edge);
                }
            }
        }
        if let Some(c) = terminal.and_then(|t| self.cells.get_mut(&t)) {
            if !c.edges.contains(&edge) {
                c.edges.push(edge);
            }
        }
        self.changes.push(ModelChange::TerminalChanged { edge, source });
        Ok(())
    }

    /// Drains the change records accumulated since the last call.
    pub fn take_changes(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn pending_changes(&self) -> &[ModelChange] {
        &self.changes
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells.get_mut(&id).ok_or(ModelError::UnknownCell(id))
    }

    fn detach(&mut self, cell: CellId) -> Option<CellId> {
        let parent = self.cells.get_mut(&cell).and_then(|c| c.parent.take())?;
        if let Some(p) = self.cells.get_mut(&parent) {
            p.children.retain(|c| *c != cell);
        }
        Some(parent)
    }
}
