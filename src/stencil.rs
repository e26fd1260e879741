use crate::geometry::Rect;
use crate::perimeter::Direction;
use std::collections::HashMap;

/// Shape metadata needed for routing: natural size and aspect handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    pub w0: f64,
    pub h0: f64,
    pub fixed_aspect: bool,
}

impl Stencil {
    pub fn new(w0: f64, h0: f64, fixed_aspect: bool) -> Self {
        Self {
            w0,
            h0,
            fixed_aspect,
        }
    }

    /// Returns origin and per-axis scale (as width/height) of the stencil
    /// drawn into `bounds`.
    pub(crate) fn compute_aspect(&self, bounds: &Rect, direction: Option<Direction>) -> Rect {
        let Rect {
            x,
            y,
            width: w,
            height: h,
        } = *bounds;
        let mut x0 = x;
        let mut y0 = y;
        let mut sx = w / self.w0;
        let mut sy = h / self.h0;
        let inverse = direction.is_some_and(Direction::is_vertical);

        if inverse {
            sy = w / self.h0;
            sx = h / self.w0;
            let delta = (w - h) / 2.0;
            x0 += delta;
            y0 -= delta;
        }

        if self.fixed_aspect {
            sy = sx.min(sy);
            sx = sy;
            if inverse {
                x0 += (h - self.w0 * sx) / 2.0;
                y0 += (w - self.h0 * sy) / 2.0;
            } else {
                x0 += (w - self.w0 * sx) / 2.0;
                y0 += (h - self.h0 * sy) / 2.0;
            }
        }

        Rect::new(x0, y0, sx, sy)
    }

    /// Bounds of the stencil's natural-aspect drawing inside `bounds`.
    pub fn aspect_bounds(&self, bounds: &Rect, direction: Option<&str>) -> Rect {
        if !self.fixed_aspect || self.w0 <= 0.0 || self.h0 <= 0.0 {
            return *bounds;
        }
        let aspect = self.compute_aspect(bounds, Direction::parse(direction));
        Rect::new(aspect.x, aspect.y, self.w0 * aspect.width, self.h0 * aspect.height)
    }
}

/// Stencils keyed by the `shape` style value.
#[derive(Debug, Clone, Default)]
pub struct StencilRegistry {
    stencils: HashMap<String, Stencil>,
}

impl StencilRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, stencil: Stencil) {
        self.stencils.insert(name.into(), stencil);
    }

    pub fn get(&self, name: &str) -> Option<&Stencil> {
        self.stencils.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }
}
