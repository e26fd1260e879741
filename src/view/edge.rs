use super::{CellState, GraphView};
use crate::constraint::ConnectionConstraint;
use crate::edge_style::{EdgeStyle, RouteContext};
use crate::geometry::{Point, Rect, point_segment_distance_sq, relative_ccw};
use crate::model::{CellId, Geometry, GraphModel};
use crate::perimeter::{Direction, Perimeter};
use crate::render::RenderListener;
use crate::stencil::Stencil;
use crate::style;
use std::borrow::Cow;

impl<R: RenderListener> GraphView<R> {
    /// Routes an edge between its visible terminals, or evicts it when an
    /// end cannot be resolved.
    pub(super) fn update_edge_state(&mut self, model: &GraphModel, cell: CellId, geo: &Geometry) {
        let Some(mut edge) = self.states.take(cell) else {
            return;
        };
        match self.route_edge(model, &edge, geo) {
            Some(points) => {
                edge.absolute_points = points;
                update_edge_bounds(&mut edge);
                self.update_edge_label_offset(&mut edge, geo);
                self.states.put_back(edge);
            }
            None => {
                self.states.put_back(edge);
                tracing::debug!(%cell, "pruning edge with unresolved end");
                self.clear(model, Some(cell), true, true);
            }
        }
    }

    fn route_edge(&self, model: &GraphModel, edge: &CellState, geo: &Geometry) -> Option<Vec<Point>> {
        let source = edge.visible_source.and_then(|h| self.states.resolve(h));
        let target = edge.visible_target.and_then(|h| self.states.resolve(h));

        let dangling = |terminal: Option<&CellState>, src: bool| {
            (model.terminal(edge.cell, src).is_some() && terminal.is_none())
                || (terminal.is_none() && geo.terminal_point(src).is_none())
        };
        if dangling(source, true) || dangling(target, false) {
            return None;
        }

        let sc = self.constraints.constraint(edge, source, true);
        let tc = self.constraints.constraint(edge, target, false);
        let p0 = self.fixed_terminal_point(edge, source, true, &sc, geo);
        let pe = self.fixed_terminal_point(edge, target, false, &tc, geo);

        let ctx = RouteContext {
            model,
            edge,
            scale: self.scale,
            translate: self.translate,
            source_point: p0,
            target_point: pe,
            grid_size: self.view_config.grid_size,
            routing: &self.routing,
        };

        let mut pts = vec![p0];
        match self.edge_style_for(edge, &geo.points, source, target, &sc, &tc) {
            Some(edge_style) => {
                let src = self.terminal_port(edge, source, true).map(|s| self.routing_bounds(s));
                let trg = self.terminal_port(edge, target, false).map(|s| self.routing_bounds(s));
                let mut routed = Vec::new();
                edge_style.route(&ctx, src.as_deref(), trg.as_deref(), &geo.points, &mut routed);
                pts.extend(routed.into_iter().map(Some));
            }
            None => {
                pts.extend(geo.points.iter().map(|p| Some(ctx.transform_control_point(*p))));
            }
        }
        pts.push(pe);

        let last = pts.len() - 1;
        if pe.is_none() {
            if let Some(target) = target {
                pts[last] = Some(self.floating_terminal_point(edge, &pts, target, source, false));
            }
        }
        if p0.is_none() {
            if let Some(source) = source {
                pts[0] = Some(self.floating_terminal_point(edge, &pts, source, target, true));
            }
        }

        pts.into_iter().collect()
    }

    /// Fixed end of an edge: a constrained connection point on the terminal,
    /// or the geometry's dangling point when there is no terminal.
    fn fixed_terminal_point(
        &self,
        edge: &CellState,
        terminal: Option<&CellState>,
        source: bool,
        constraint: &ConnectionConstraint,
        geo: &Geometry,
    ) -> Option<Point> {
        let pt = terminal.and_then(|t| self.connection_point(t, constraint));
        if pt.is_some() || terminal.is_some() {
            return pt;
        }
        geo.terminal_point(source).map(|p| {
            Point::new(
                self.scale * (self.translate.x + p.x + edge.origin.x),
                self.scale * (self.translate.y + p.y + edge.origin.y),
            )
        })
    }

    /// Resolves a normalized constraint point against the terminal's
    /// perimeter bounds, honoring direction, rotation and flips.
    pub fn connection_point(
        &self,
        vertex: &CellState,
        constraint: &ConnectionConstraint,
    ) -> Option<Point> {
        let anchor = constraint.point?;
        let mut bounds = self.perimeter_bounds(vertex, 0.0);
        let center = bounds.center();
        let direction = Direction::parse(vertex.style.get(style::DIRECTION));

        let mut r1: f64 = 0.0;
        if let Some(direction) = direction {
            if vertex.style.number_or(style::ANCHOR_POINT_DIRECTION, 1.0) != 0.0 {
                r1 = match direction {
                    Direction::North => 270.0,
                    Direction::West => 180.0,
                    Direction::South => 90.0,
                    Direction::East => 0.0,
                };
                if direction.is_vertical() {
                    bounds.rotate90();
                }
            }
        }

        let mut point = Point::new(
            bounds.x + anchor.x * bounds.width + constraint.dx * self.scale,
            bounds.y + anchor.y * bounds.height + constraint.dy * self.scale,
        );
        let mut r2 = vertex.rotation();

        if constraint.perimeter {
            if r1 != 0.0 {
                let rad = r1.to_radians();
                point = point.rotated(rad.cos(), rad.sin(), center);
            }
            point = self.perimeter_point(vertex, Some(point), false, 0.0);
        } else {
            r2 += r1;
            if vertex.is_vertex() {
                let (mut flip_h, mut flip_v) = self.flips(vertex);
                if direction.is_some_and(Direction::is_vertical) {
                    std::mem::swap(&mut flip_h, &mut flip_v);
                }
                point = point.flipped(bounds.center(), flip_h, flip_v);
            }
        }

        if r2 != 0.0 {
            let rad = r2.to_radians();
            point = point.rotated(rad.cos(), rad.sin(), center);
        }
        Some(point)
    }

    fn floating_terminal_point(
        &self,
        edge: &CellState,
        pts: &[Option<Point>],
        start: &CellState,
        end: Option<&CellState>,
        source: bool,
    ) -> Point {
        let start = self.terminal_port(edge, Some(start), source).unwrap_or(start);
        let mut next = next_point(pts, end, source);

        let alpha = start.rotation().to_radians();
        let center = start.center();
        if alpha != 0.0 {
            next = next.map(|p| p.rotated((-alpha).cos(), (-alpha).sin(), center));
        }

        let spacing_key = if source {
            style::SOURCE_PERIMETER_SPACING
        } else {
            style::TARGET_PERIMETER_SPACING
        };
        let border = edge.style.number_or(style::PERIMETER_SPACING, 0.0)
            + edge.style.number_or(spacing_key, 0.0);
        let orthogonal = alpha == 0.0 && self.is_orthogonal(edge);
        let pt = self.perimeter_point(start, next, orthogonal, border);

        if alpha != 0.0 {
            pt.rotated(alpha.cos(), alpha.sin(), center)
        } else {
            pt
        }
    }

    /// Intersection of the ray towards `next` with the terminal's perimeter.
    /// Falls back to the terminal center.
    pub fn perimeter_point(
        &self,
        terminal: &CellState,
        next: Option<Point>,
        orthogonal: bool,
        border: f64,
    ) -> Point {
        let mut point = None;
        if let (Some(perimeter), Some(next)) = (self.perimeter_function(terminal), next) {
            let bounds = self.perimeter_bounds(terminal, border);
            if bounds.width > 0.0 || bounds.height > 0.0 {
                let (flip_h, flip_v) = if terminal.is_vertex() {
                    self.flips(terminal)
                } else {
                    (false, false)
                };
                let center = bounds.center();
                let next = next.flipped(center, flip_h, flip_v);
                point = perimeter
                    .point(&bounds, terminal, next, orthogonal)
                    .map(|p| p.flipped(center, flip_h, flip_v));
            }
        }
        point.unwrap_or_else(|| self.get_point(terminal, None))
    }

    /// Terminal bounds grown by `border` plus the terminal's own
    /// `perimeterSpacing`, in unscaled units.
    pub fn perimeter_bounds(&self, terminal: &CellState, border: f64) -> Rect {
        let border = border + terminal.style.number_or(style::PERIMETER_SPACING, 0.0);
        let mut bounds = terminal.bounds;
        if let Some(stencil) = self.stencil(terminal) {
            bounds = stencil.aspect_bounds(&bounds, terminal.style.get(style::DIRECTION));
        }
        if border != 0.0 {
            bounds.grow(border * self.scale);
        }
        bounds
    }

    pub fn perimeter_function(&self, terminal: &CellState) -> Option<Perimeter> {
        let name = terminal.style.get(style::PERIMETER)?;
        let perimeter = self.registry.perimeter(name, self.view_config.allow_eval);
        if perimeter.is_none() {
            tracing::debug!(name, cell = %terminal.cell, "unknown perimeter");
        }
        perimeter
    }

    /// Whether floating ends should prefer axis-aligned final segments.
    pub fn is_orthogonal(&self, edge: &CellState) -> bool {
        if let Some(orthogonal) = edge.style.flag(style::ORTHOGONAL) {
            return orthogonal;
        }
        if let Some(orthogonal) = self.routing.orthogonal {
            return orthogonal;
        }
        if edge.style.flag_or(style::NO_EDGE_STYLE, false) {
            return false;
        }
        edge.style
            .get(style::EDGE_STYLE)
            .and_then(|name| self.registry.edge_style(name, self.view_config.allow_eval))
            .is_some_and(|s| s.is_orthogonal())
    }

    /// Edge style for this routing pass: the loop style for a self-loop,
    /// else the `edgeStyle` entry.
    fn edge_style_for(
        &self,
        edge: &CellState,
        points: &[Point],
        source: Option<&CellState>,
        target: Option<&CellState>,
        sc: &ConnectionConstraint,
        tc: &ConnectionConstraint,
    ) -> Option<EdgeStyle> {
        let is_loop = points.len() < 2
            && sc.point.is_none()
            && tc.point.is_none()
            && matches!((source, target), (Some(s), Some(t)) if s.cell == t.cell);

        let name = if is_loop {
            edge.style
                .get(style::LOOP_STYLE)
                .unwrap_or(self.view_config.default_loop_style.as_str())
        } else if !edge.style.flag_or(style::NO_EDGE_STYLE, false) {
            edge.style.get(style::EDGE_STYLE)?
        } else {
            return None;
        };

        let resolved = self.registry.edge_style(name, self.view_config.allow_eval);
        if resolved.is_none() {
            tracing::debug!(name, edge = %edge.cell, "unknown edge style");
        }
        resolved
    }

    /// Port state named by `sourcePort`/`targetPort`, else the terminal.
    fn terminal_port<'s>(
        &'s self,
        edge: &CellState,
        terminal: Option<&'s CellState>,
        source: bool,
    ) -> Option<&'s CellState> {
        let key = if source { style::SOURCE_PORT } else { style::TARGET_PORT };
        let port = edge
            .style
            .get(key)
            .and_then(|id| id.trim().parse::<u32>().ok())
            .and_then(|id| self.states.get(CellId(id)));
        port.or(terminal)
    }

    /// Terminal as seen by the routers: stencils with a fixed aspect route
    /// around their drawn bounds.
    fn routing_bounds<'s>(&self, state: &'s CellState) -> Cow<'s, CellState> {
        match self.stencil(state).filter(|s| s.fixed_aspect) {
            Some(stencil) => {
                let mut copy = state.clone();
                copy.bounds = stencil.aspect_bounds(&state.bounds, state.style.get(style::DIRECTION));
                Cow::Owned(copy)
            }
            None => Cow::Borrowed(state),
        }
    }

    fn stencil(&self, state: &CellState) -> Option<&Stencil> {
        self.stencils.get(state.style.get(style::SHAPE)?)
    }

    /// Horizontal and vertical flip of a vertex, including stencil flips.
    fn flips(&self, vertex: &CellState) -> (bool, bool) {
        let mut flip_h = vertex.style.flag_or(style::FLIP_H, false);
        let mut flip_v = vertex.style.flag_or(style::FLIP_V, false);
        if self.stencil(vertex).is_some() {
            flip_h = vertex.style.flag_or(style::STENCIL_FLIP_H, false) || flip_h;
            flip_v = vertex.style.flag_or(style::STENCIL_FLIP_V, false) || flip_v;
        }
        (flip_h, flip_v)
    }

    fn update_edge_label_offset(&self, state: &mut CellState, geo: &Geometry) {
        state.absolute_offset = state.center();
        if state.absolute_points.is_empty() || state.segments.is_empty() {
            return;
        }
        if geo.relative {
            state.absolute_offset = self.get_point(state, Some(geo));
            return;
        }
        if let (Some(p0), Some(pe)) = (state.first_point(), state.last_point()) {
            let offset = geo.offset.unwrap_or_default();
            state.absolute_offset = Point::new(
                p0.x + (pe.x - p0.x) / 2.0 + offset.x * self.scale,
                p0.y + (pe.y - p0.y) / 2.0 + offset.y * self.scale,
            );
        }
    }

    /// Inverse of [`GraphView::get_point`] for a relative edge geometry:
    /// the `(x, y)` that places a label at the given view point.
    pub fn get_relative_point(&self, model: &GraphModel, edge: CellId, x: f64, y: f64) -> Point {
        let (Some(state), Some(geo)) = (self.states.get(edge), model.geometry(edge)) else {
            return Point::default();
        };
        let pts = &state.absolute_points;
        if !geo.relative || pts.len() < 2 || state.segments.len() + 1 < pts.len() {
            return Point::default();
        }

        let p = Point::new(x, y);
        let mut min_dist = point_segment_distance_sq(pts[0], pts[1], p);
        let mut length = 0.0;
        let mut index = 0;
        let mut walked = 0.0;
        for i in 2..pts.len() {
            let dist = point_segment_distance_sq(pts[i - 1], pts[i], p);
            walked += state.segments[i - 2];
            if dist <= min_dist {
                min_dist = dist;
                index = i - 1;
                length = walked;
            }
        }

        let seg = state.segments[index];
        let p0 = pts[index];
        let pe = pts[index + 1];
        let x_segment = p0.x - pe.x;
        let y_segment = p0.y - pe.y;
        let px = x_segment - (x - pe.x);
        let py = y_segment - (y - pe.y);
        let dot = px * x_segment + py * y_segment;
        let proj_len_sq = if dot <= 0.0 {
            0.0
        } else {
            dot * dot / (x_segment * x_segment + y_segment * y_segment)
        };
        let proj_len = proj_len_sq.sqrt().min(seg);

        let mut y_distance = point_segment_distance_sq(p0, pe, p).sqrt();
        if relative_ccw(p0, pe, p) == -1 {
            y_distance = -y_distance;
        }

        let total = state.length;
        if total == 0.0 {
            return Point::new(0.0, y_distance / self.scale);
        }
        Point::new(
            (total / 2.0 - length - proj_len) / total * -2.0,
            y_distance / self.scale,
        )
    }
}

/// Neighbor used to aim a floating end: the adjacent routed point, else the
/// opposite terminal's center.
fn next_point(pts: &[Option<Point>], opposite: Option<&CellState>, source: bool) -> Option<Point> {
    let count = pts.len();
    let mut point = None;
    if count >= 2 {
        point = if source { pts[1] } else { pts[count - 2] };
    }
    point.or_else(|| opposite.map(CellState::center))
}

/// Path length, segment lengths and bounds of a routed edge. Bounds are at
/// least one unit wide and tall.
fn update_edge_bounds(state: &mut CellState) {
    let (Some(p0), Some(pe)) = (state.first_point(), state.last_point()) else {
        return;
    };
    state.terminal_distance = p0.distance(pe);

    let mut segments = Vec::with_capacity(state.absolute_points.len().saturating_sub(1));
    let mut length = 0.0;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (p0.x, p0.y, p0.x, p0.y);
    for pair in state.absolute_points.windows(2) {
        let segment = pair[0].distance(pair[1]);
        segments.push(segment);
        length += segment;
        let pt = pair[1];
        min_x = min_x.min(pt.x);
        min_y = min_y.min(pt.y);
        max_x = max_x.max(pt.x);
        max_y = max_y.max(pt.y);
    }

    state.length = length;
    state.segments = segments;
    state.bounds = Rect::new(min_x, min_y, (max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
}
