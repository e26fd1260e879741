use super::{CellState, GraphView};
use crate::geometry::{Point, Rect};
use crate::model::{CellId, CellKind, Geometry, GraphModel};
use crate::render::RenderListener;
use crate::style;

impl<R: RenderListener> GraphView<R> {
    /// Recomputes origin, bounds and label offset of `cell` from its
    /// geometry and its parent's state. Edges are routed afterwards.
    pub(super) fn update_cell_state(&mut self, model: &GraphModel, cell: CellId) {
        let is_root = Some(cell) == self.current_root;
        let geo = model.geometry(cell);
        let kind = model.kind(cell).unwrap_or_default();
        let scale = self.scale;
        let t = self.translate;

        let mut origin = Point::default();
        let mut absolute_offset = Point::default();
        let mut bounds = None;
        // The drill-down root keeps its size for relative children.
        let unscaled = geo.map(|g| (g.width, g.height));

        if !is_root {
            let parent = model.parent(cell).and_then(|p| self.states.get(p));
            if let Some(p) = parent.filter(|p| Some(p.cell) != self.current_root) {
                origin.x += p.origin.x;
                origin.y += p.origin.y;
            }
            if let Some(hook) = &self.child_offset {
                if let Some(offset) = hook(model, cell) {
                    origin.x += offset.x;
                    origin.y += offset.y;
                }
            }

            if let Some(geo) = geo {
                if kind != CellKind::Edge {
                    let offset = geo.offset.unwrap_or_default();
                    match parent {
                        Some(p) if geo.relative && p.is_edge() => {
                            let pt = self.get_point(p, Some(geo));
                            origin.x += pt.x / scale - p.origin.x - t.x;
                            origin.y += pt.y / scale - p.origin.y - t.y;
                        }
                        Some(p) if geo.relative => {
                            origin.x += geo.x * p.unscaled_width + offset.x;
                            origin.y += geo.y * p.unscaled_height + offset.y;
                        }
                        _ => {
                            absolute_offset = Point::new(scale * offset.x, scale * offset.y);
                            origin.x += geo.x;
                            origin.y += geo.y;
                        }
                    }
                }
                bounds = Some(Rect::new(
                    scale * (t.x + origin.x),
                    scale * (t.y + origin.y),
                    scale * geo.width,
                    scale * geo.height,
                ));
            }
        }

        let Some(state) = self.states.get_mut(cell) else {
            return;
        };
        state.origin = origin;
        state.absolute_offset = absolute_offset;
        state.length = 0.0;
        if kind != CellKind::Edge {
            state.absolute_points.clear();
            state.segments.clear();
        }
        if let Some(rect) = bounds {
            state.bounds = rect;
        }
        if let Some((w, h)) = unscaled {
            state.unscaled_width = w;
            state.unscaled_height = h;
        }

        if is_root {
            return;
        }
        let Some(geo) = geo else {
            if kind == CellKind::Edge {
                tracing::debug!(%cell, "pruning edge without geometry");
                self.clear(model, Some(cell), true, true);
            }
            return;
        };
        match kind {
            CellKind::Vertex => self.update_vertex_state(model, cell, geo),
            CellKind::Edge => self.update_edge_state(model, cell, geo),
            CellKind::Plain => {}
        }
    }

    /// Rotates a relative child around its rotated parent and places the label.
    fn update_vertex_state(&mut self, model: &GraphModel, cell: CellId, geo: &Geometry) {
        let pivot = if geo.relative {
            model
                .parent(cell)
                .and_then(|p| self.states.get(p))
                .filter(|p| !p.is_edge())
                .map(|p| (p.rotation(), p.center()))
        } else {
            None
        };

        let Some(state) = self.states.get_mut(cell) else {
            return;
        };
        if let Some((rotation, center)) = pivot {
            if rotation != 0.0 {
                let rad = rotation.to_radians();
                let c = state.center().rotated(rad.cos(), rad.sin(), center);
                state.bounds.x = c.x - state.width() / 2.0;
                state.bounds.y = c.y - state.height() / 2.0;
            }
        }
        update_vertex_label_offset(state, self.scale);
    }

    /// Point on `state` described by `geometry`: a fraction along the path
    /// of an edge for relative geometries, else the center plus offset.
    pub fn get_point(&self, state: &CellState, geometry: Option<&Geometry>) -> Point {
        let mut x = state.center_x();
        let mut y = state.center_y();

        if !state.segments.is_empty() && geometry.is_none_or(|g| g.relative) {
            let gx = geometry.map_or(0.0, |g| g.x / 2.0);
            let count = state.absolute_points.len();
            let dist = (gx + 0.5) * state.length;
            let mut segment = state.segments[0];
            let mut length = 0.0;
            let mut index = 1;

            while dist >= length + segment && index + 1 < count {
                length += segment;
                segment = state.segments.get(index).copied().unwrap_or(0.0);
                index += 1;
            }

            let factor = if segment == 0.0 {
                0.0
            } else {
                (dist - length) / segment
            };
            let (Some(p0), Some(pe)) = (
                state.absolute_points.get(index - 1),
                state.absolute_points.get(index),
            ) else {
                return Point::new(x, y);
            };

            let mut gy = 0.0;
            let mut offset_x = 0.0;
            let mut offset_y = 0.0;
            if let Some(g) = geometry {
                gy = g.y;
                if let Some(offset) = g.offset {
                    offset_x = offset.x;
                    offset_y = offset.y;
                }
            }
            let dx = pe.x - p0.x;
            let dy = pe.y - p0.y;
            let nx = if segment == 0.0 { 0.0 } else { dy / segment };
            let ny = if segment == 0.0 { 0.0 } else { dx / segment };

            x = p0.x + dx * factor + (nx * gy + offset_x) * self.scale;
            y = p0.y + dy * factor - (ny * gy - offset_y) * self.scale;
        } else if let Some(offset) = geometry.and_then(|g| g.offset) {
            x += offset.x;
            y += offset.y;
        }
        Point::new(x, y)
    }
}

/// Shifts the label anchor of a vertex for outside label positions.
fn update_vertex_label_offset(state: &mut CellState, scale: f64) {
    let w = state.width();
    let h = state.height();
    match state.style.get(style::LABEL_POSITION) {
        Some("left") => {
            let lw = state.style.number(style::LABEL_WIDTH).map_or(w, |lw| lw * scale);
            state.absolute_offset.x -= lw;
        }
        Some("right") => state.absolute_offset.x += w,
        _ => {
            if let Some(lw) = state.style.number(style::LABEL_WIDTH) {
                let dx = match state.style.get(style::ALIGN) {
                    Some("left") => 0.0,
                    Some("right") => 1.0,
                    _ => 0.5,
                };
                state.absolute_offset.x -= (lw * scale - w) * dx;
            }
        }
    }

    match state.style.get(style::VERTICAL_LABEL_POSITION) {
        Some("top") => state.absolute_offset.y -= h,
        Some("bottom") => state.absolute_offset.y += h,
        _ => {}
    }
}
