use crate::config::RoutingConfig;
use crate::geometry::{Point, Rect};
use crate::model::GraphModel;
use crate::style;
use crate::view::CellState;
use std::fmt;
use std::sync::Arc;

pub const LOOP: &str = "loopEdgeStyle";
pub const ELBOW: &str = "elbowEdgeStyle";
pub const SIDE_TO_SIDE: &str = "sideToSideEdgeStyle";
pub const TOP_TO_BOTTOM: &str = "topToBottomEdgeStyle";
pub const ENTITY_RELATION: &str = "entityRelationEdgeStyle";

/// Inputs shared by every routing strategy for one edge.
pub struct RouteContext<'a> {
    pub model: &'a GraphModel,
    pub edge: &'a CellState,
    pub scale: f64,
    pub translate: Point,
    /// Fixed terminal points resolved before routing, if any.
    pub source_point: Option<Point>,
    pub target_point: Option<Point>,
    pub grid_size: f64,
    pub routing: &'a RoutingConfig,
}

impl RouteContext<'_> {
    /// Maps a waypoint from the edge's parent space into view coordinates.
    pub fn transform_control_point(&self, pt: Point) -> Point {
        let origin = self.edge.origin;
        Point::new(
            self.scale * (pt.x + self.translate.x + origin.x),
            self.scale * (pt.y + self.translate.y + origin.y),
        )
    }
}

/// User-supplied routing strategy. Appends the intermediate points of the
/// edge to `result`; the terminal points are added by the caller.
pub trait EdgeRouter: Send + Sync {
    fn route(
        &self,
        ctx: &RouteContext<'_>,
        source: Option<&CellState>,
        target: Option<&CellState>,
        points: &[Point],
        result: &mut Vec<Point>,
    );

    fn is_orthogonal(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub enum EdgeStyle {
    Loop,
    Elbow,
    SideToSide,
    TopToBottom,
    EntityRelation,
    Custom(Arc<dyn EdgeRouter>),
}

impl fmt::Debug for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStyle::Loop => f.write_str("Loop"),
            EdgeStyle::Elbow => f.write_str("Elbow"),
            EdgeStyle::SideToSide => f.write_str("SideToSide"),
            EdgeStyle::TopToBottom => f.write_str("TopToBottom"),
            EdgeStyle::EntityRelation => f.write_str("EntityRelation"),
            EdgeStyle::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl EdgeStyle {
    pub fn builtins() -> [(&'static str, EdgeStyle); 5] {
        [
            (LOOP, EdgeStyle::Loop),
            (ELBOW, EdgeStyle::Elbow),
            (SIDE_TO_SIDE, EdgeStyle::SideToSide),
            (TOP_TO_BOTTOM, EdgeStyle::TopToBottom),
            (ENTITY_RELATION, EdgeStyle::EntityRelation),
        ]
    }

    /// Strategies whose output is made of axis-aligned segments.
    pub fn is_orthogonal(&self) -> bool {
        match self {
            EdgeStyle::Loop => false,
            EdgeStyle::Elbow
            | EdgeStyle::SideToSide
            | EdgeStyle::TopToBottom
            | EdgeStyle::EntityRelation => true,
            EdgeStyle::Custom(router) => router.is_orthogonal(),
        }
    }

    pub fn route(
        &self,
        ctx: &RouteContext<'_>,
        source: Option<&CellState>,
        target: Option<&CellState>,
        points: &[Point],
        result: &mut Vec<Point>,
    ) {
        match self {
            EdgeStyle::Loop => route_loop(ctx, source, points, result),
            EdgeStyle::Elbow => route_elbow(ctx, source, target, points, result),
            EdgeStyle::SideToSide => route_side_to_side(ctx, source, target, points, result),
            EdgeStyle::TopToBottom => route_top_to_bottom(ctx, source, target, points, result),
            EdgeStyle::EntityRelation => route_entity_relation(ctx, source, target, result),
            EdgeStyle::Custom(router) => router.route(ctx, source, target, points, result),
        }
    }
}

/// Terminal box as seen by the routers: either a state or a fixed point.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    rect: Rect,
    routing_x: f64,
    routing_y: f64,
}

impl Anchor {
    fn of(state: &CellState) -> Self {
        Self {
            rect: state.bounds,
            routing_x: state.style.number_or(style::ROUTING_CENTER_X, 0.0),
            routing_y: state.style.number_or(style::ROUTING_CENTER_Y, 0.0),
        }
    }

    fn at(p: Point) -> Self {
        Self {
            rect: Rect::new(p.x, p.y, 0.0, 0.0),
            routing_x: 0.0,
            routing_y: 0.0,
        }
    }

    fn resolve(fixed: Option<Point>, state: Option<&CellState>) -> Option<Self> {
        match fixed {
            Some(p) => Some(Self::at(p)),
            None => state.map(Self::of),
        }
    }

    fn routing_center_x(&self) -> f64 {
        self.rect.center_x() + self.routing_x * self.rect.width
    }

    fn routing_center_y(&self) -> f64 {
        self.rect.center_y() + self.routing_y * self.rect.height
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.rect.contains(x, y)
    }
}

fn route_loop(
    ctx: &RouteContext<'_>,
    source: Option<&CellState>,
    points: &[Point],
    result: &mut Vec<Point>,
) {
    if ctx.source_point.is_some() && ctx.target_point.is_some() {
        result.extend(points.iter().map(|p| ctx.transform_control_point(*p)));
        return;
    }
    let Some(source) = source else {
        return;
    };

    let pt = points
        .first()
        .map(|p| ctx.transform_control_point(*p))
        .filter(|p| !source.contains(p.x, p.y));

    let seg = ctx.edge.style.number_or(style::SEGMENT, ctx.grid_size) * ctx.scale;
    let dir = ctx.edge.style.get(style::DIRECTION).unwrap_or("west");

    let mut x = 0.0;
    let mut y = 0.0;
    let mut dx = 0.0;
    let mut dy = 0.0;
    if dir == "north" || dir == "south" {
        x = source.routing_center_x();
        dx = seg;
    } else {
        y = source.routing_center_y();
        dy = seg;
    }

    match pt {
        Some(p) if p.x >= source.x() && p.x <= source.bounds.right() => {
            x = source.routing_center_x();
            dx = (x - p.x).abs().max(dy);
            y = p.y;
            dy = 0.0;
        }
        Some(p) => {
            x = p.x;
            dy = (y - p.y).abs().max(dy);
        }
        None => match dir {
            "north" => y = source.y() - 2.0 * dx,
            "south" => y = source.bounds.bottom() + 2.0 * dx,
            "east" => x = source.x() - 2.0 * dy,
            _ => x = source.bounds.right() + 2.0 * dy,
        },
    }

    result.push(Point::new(x - dx, y - dy));
    result.push(Point::new(x + dx, y + dy));
}

fn route_elbow(
    ctx: &RouteContext<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    points: &[Point],
    result: &mut Vec<Point>,
) {
    let mut vertical = false;
    let mut horizontal = false;

    if let (Some(s), Some(t)) = (source, target) {
        if let Some(first) = points.first() {
            let left = s.x().min(t.x());
            let right = s.bounds.right().max(t.bounds.right());
            let top = s.y().min(t.y());
            let bottom = s.bounds.bottom().max(t.bounds.bottom());
            let pt = ctx.transform_control_point(*first);
            vertical = pt.y < top || pt.y > bottom;
            horizontal = pt.x < left || pt.x > right;
        } else {
            let left = s.x().max(t.x());
            let right = s.bounds.right().min(t.bounds.right());
            vertical = right == left;
            if !vertical {
                let top = s.y().max(t.y());
                let bottom = s.bounds.bottom().min(t.bounds.bottom());
                horizontal = bottom == top;
            }
        }
    }

    let elbow_vertical = ctx.edge.style.get(style::ELBOW) == Some("vertical");
    if !horizontal && (vertical || elbow_vertical) {
        route_top_to_bottom(ctx, source, target, points, result);
    } else {
        route_side_to_side(ctx, source, target, points, result);
    }
}

fn route_side_to_side(
    ctx: &RouteContext<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    points: &[Point],
    result: &mut Vec<Point>,
) {
    let pt = points.first().map(|p| ctx.transform_control_point(*p));
    let (Some(s), Some(t)) = (
        Anchor::resolve(ctx.source_point, source),
        Anchor::resolve(ctx.target_point, target),
    ) else {
        return;
    };

    let l = s.rect.x.max(t.rect.x);
    let r = s.rect.right().min(t.rect.right());
    let x = pt.map_or(r + (l - r) / 2.0, |p| p.x);

    let mut y1 = s.routing_center_y();
    let mut y2 = t.routing_center_y();
    if let Some(p) = pt {
        if p.y >= s.rect.y && p.y <= s.rect.bottom() {
            y1 = p.y;
        }
        if p.y >= t.rect.y && p.y <= t.rect.bottom() {
            y2 = p.y;
        }
    }

    let start = result.len();
    if !t.contains(x, y1) && !s.contains(x, y1) {
        result.push(Point::new(x, y1));
    }
    if !t.contains(x, y2) && !s.contains(x, y2) {
        result.push(Point::new(x, y2));
    }

    if result.len() == start + 1 {
        match pt {
            Some(p) => {
                if !t.contains(x, p.y) && !s.contains(x, p.y) {
                    result.push(Point::new(x, p.y));
                }
            }
            None => {
                let top = s.rect.y.max(t.rect.y);
                let bottom = s.rect.bottom().min(t.rect.bottom());
                result.push(Point::new(x, top + (bottom - top) / 2.0));
            }
        }
    }
}

fn route_top_to_bottom(
    ctx: &RouteContext<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    points: &[Point],
    result: &mut Vec<Point>,
) {
    let pt = points.first().map(|p| ctx.transform_control_point(*p));
    let (Some(s), Some(t)) = (
        Anchor::resolve(ctx.source_point, source),
        Anchor::resolve(ctx.target_point, target),
    ) else {
        return;
    };

    let top = s.rect.y.max(t.rect.y);
    let bottom = s.rect.bottom().min(t.rect.bottom());

    let mut x = s.routing_center_x();
    if let Some(p) = pt {
        if p.x >= s.rect.x && p.x <= s.rect.right() {
            x = p.x;
        }
    }
    let y = pt.map_or(bottom + (top - bottom) / 2.0, |p| p.y);

    let start = result.len();
    if !t.contains(x, y) && !s.contains(x, y) {
        result.push(Point::new(x, y));
    }

    x = match pt {
        Some(p) if p.x >= t.rect.x && p.x <= t.rect.right() => p.x,
        _ => t.routing_center_x(),
    };
    if !t.contains(x, y) && !s.contains(x, y) {
        result.push(Point::new(x, y));
    }

    if result.len() == start + 1 {
        match pt {
            Some(p) => {
                if !t.contains(p.x, y) && !s.contains(p.x, y) {
                    result.push(Point::new(p.x, y));
                }
            }
            None => {
                let l = s.rect.x.max(t.rect.x);
                let r = s.rect.right().min(t.rect.right());
                result.push(Point::new(l + (r - l) / 2.0, y));
            }
        }
    }
}

fn port_side(terminal: &CellState) -> Option<bool> {
    match terminal.style.get(style::PORT_CONSTRAINT)? {
        "west" => Some(true),
        "east" => Some(false),
        _ => None,
    }
}

fn route_entity_relation(
    ctx: &RouteContext<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    result: &mut Vec<Point>,
) {
    let segment = ctx
        .edge
        .style
        .number_or(style::SEGMENT, ctx.routing.entity_segment)
        * ctx.scale;
    let p0 = ctx.source_point;
    let pe = ctx.target_point;

    let mut source_left = false;
    if let Some(s) = source {
        match ctx.model.geometry(s.cell) {
            Some(geo) if geo.relative => source_left = geo.x <= 0.5,
            _ => {
                if let Some(t) = target {
                    let target_x = pe.map_or(t.bounds.right(), |p| p.x);
                    source_left = target_x < p0.map_or(s.x(), |p| p.x);
                }
            }
        }
    }
    if p0.is_none() {
        if let Some(side) = source.and_then(port_side) {
            source_left = side;
        }
    }

    let mut target_left = true;
    if let Some(t) = target {
        match ctx.model.geometry(t.cell) {
            Some(geo) if geo.relative => target_left = geo.x <= 0.5,
            _ => {
                if let Some(s) = source {
                    let source_x = p0.map_or(s.bounds.right(), |p| p.x);
                    target_left = source_x < pe.map_or(t.x(), |p| p.x);
                }
            }
        }
    }
    if pe.is_none() {
        if let Some(side) = target.and_then(port_side) {
            target_left = side;
        }
    }

    let (Some(s), Some(t)) = (Anchor::resolve(p0, source), Anchor::resolve(pe, target)) else {
        return;
    };

    let x0 = if source_left { s.rect.x } else { s.rect.right() };
    let y0 = s.routing_center_y();
    let xe = if target_left { t.rect.x } else { t.rect.right() };
    let ye = t.routing_center_y();

    let dep = Point::new(x0 + if source_left { -segment } else { segment }, y0);
    let arr = Point::new(xe + if target_left { -segment } else { segment }, ye);

    if source_left == target_left {
        let x = if source_left {
            x0.min(xe) - segment
        } else {
            x0.max(xe) + segment
        };
        result.push(Point::new(x, y0));
        result.push(Point::new(x, ye));
    } else if (dep.x < arr.x) == source_left {
        let mid_y = y0 + (ye - y0) / 2.0;
        result.push(dep);
        result.push(Point::new(dep.x, mid_y));
        result.push(Point::new(arr.x, mid_y));
        result.push(arr);
    } else {
        result.push(dep);
        result.push(arr);
    }
}
