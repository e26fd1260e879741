use super::GraphView;
use crate::geometry::Rect;
use crate::model::{CellId, CellKind, GraphModel};
use crate::render::RenderListener;
use crate::style;

impl<R: RenderListener> GraphView<R> {
    /// Union of the shape and label boxes of `cell` and, with `recurse`, of
    /// every descendant that has a state.
    pub fn bounding_box(&self, model: &GraphModel, cell: CellId, recurse: bool) -> Option<Rect> {
        let state = self.states.get(cell)?;
        let mut bbox = match (state.shape_bounds, state.label_bounds) {
            (Some(shape), Some(label)) => Some(shape.union(&label)),
            (shape, label) => shape.or(label),
        };
        if recurse {
            for &child in model.children(cell) {
                if let Some(bounds) = self.bounding_box(model, child, true) {
                    bbox = Some(match bbox {
                        Some(b) => b.union(&bounds),
                        None => bounds,
                    });
                }
            }
        }
        bbox
    }

    /// Union of the state bounds of the given vertices and edges.
    pub fn bounds(&self, cells: &[CellId]) -> Option<Rect> {
        cells
            .iter()
            .filter_map(|&cell| self.states.get(cell))
            .filter(|s| s.is_vertex() || s.is_edge())
            .map(|s| s.bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Shape and label boxes of a freshly validated state.
    pub(super) fn update_boxes(&mut self, model: &GraphModel, cell: CellId) {
        let is_root = Some(cell) == self.current_root;
        let has_geometry = model.geometry(cell).is_some();
        let label_size = self.text.as_ref().and_then(|measure| {
            let value = model.value(cell).filter(|v| !v.is_empty())?;
            let state = self.states.get(cell)?;
            let font_size = state.style.number_or(style::FONT_SIZE, style::DEFAULT_FONT_SIZE);
            Some(measure.measure(value, font_size))
        });
        let scale = self.scale;

        let Some(state) = self.states.get_mut(cell) else {
            return;
        };
        state.shape_bounds = match state.kind {
            _ if is_root => None,
            CellKind::Vertex if has_geometry => {
                let rotation = state.rotation();
                if rotation != 0.0 {
                    Some(state.bounds.rotated_bounds(rotation, None))
                } else {
                    Some(state.bounds)
                }
            }
            CellKind::Edge => Rect::from_points(&state.absolute_points),
            _ => None,
        };
        state.label_bounds = match label_size {
            Some((w, h)) if !is_root && state.kind != CellKind::Plain => {
                let anchor = state.label_anchor();
                let (w, h) = (w * scale, h * scale);
                Some(Rect::new(anchor.x - w / 2.0, anchor.y - h / 2.0, w, h))
            }
            _ => None,
        };
    }
}
