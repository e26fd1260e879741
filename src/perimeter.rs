use crate::geometry::{Point, Rect, ray_ellipse_intersection, ray_polygon_intersection, segment_intersection};
use crate::style;
use crate::view::CellState;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// User-supplied perimeter projection.
pub trait PerimeterFn: Send + Sync {
    /// Projects the ray from the shape center towards `next` onto the outline
    /// of `bounds`. With `orthogonal`, prefer a point that keeps the final
    /// segment axis-aligned.
    fn point(&self, bounds: &Rect, vertex: &CellState, next: Point, orthogonal: bool)
    -> Option<Point>;
}

#[derive(Clone)]
pub enum Perimeter {
    Rectangle,
    Ellipse,
    Rhombus,
    Triangle,
    Hexagon,
    Custom(Arc<dyn PerimeterFn>),
}

impl fmt::Debug for Perimeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perimeter::Rectangle => f.write_str("Rectangle"),
            Perimeter::Ellipse => f.write_str("Ellipse"),
            Perimeter::Rhombus => f.write_str("Rhombus"),
            Perimeter::Triangle => f.write_str("Triangle"),
            Perimeter::Hexagon => f.write_str("Hexagon"),
            Perimeter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub const RECTANGLE: &str = "rectanglePerimeter";
pub const ELLIPSE: &str = "ellipsePerimeter";
pub const RHOMBUS: &str = "rhombusPerimeter";
pub const TRIANGLE: &str = "trianglePerimeter";
pub const HEXAGON: &str = "hexagonPerimeter";

impl Perimeter {
    pub fn builtins() -> [(&'static str, Perimeter); 5] {
        [
            (RECTANGLE, Perimeter::Rectangle),
            (ELLIPSE, Perimeter::Ellipse),
            (RHOMBUS, Perimeter::Rhombus),
            (TRIANGLE, Perimeter::Triangle),
            (HEXAGON, Perimeter::Hexagon),
        ]
    }

    pub fn point(
        &self,
        bounds: &Rect,
        vertex: &CellState,
        next: Point,
        orthogonal: bool,
    ) -> Option<Point> {
        match self {
            Perimeter::Rectangle => Some(rectangle(bounds, next, orthogonal)),
            Perimeter::Ellipse => ellipse(bounds, next, orthogonal),
            Perimeter::Rhombus => rhombus(bounds, next, orthogonal),
            Perimeter::Triangle => Some(triangle(bounds, direction(vertex), next, orthogonal)),
            Perimeter::Hexagon => hexagon(bounds, direction(vertex), next, orthogonal),
            Perimeter::Custom(f) => f.point(bounds, vertex, next, orthogonal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub(crate) fn parse(value: Option<&str>) -> Option<Direction> {
        match value? {
            "north" => Some(Direction::North),
            "south" => Some(Direction::South),
            "east" => Some(Direction::East),
            "west" => Some(Direction::West),
            _ => None,
        }
    }

    pub(crate) fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

fn direction(vertex: &CellState) -> Direction {
    Direction::parse(vertex.style.get(style::DIRECTION)).unwrap_or(Direction::East)
}

fn rectangle(bounds: &Rect, next: Point, orthogonal: bool) -> Point {
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    let alpha = (next.y - cy).atan2(next.x - cx);
    let beta = PI / 2.0 - alpha;
    let t = bounds.height.atan2(bounds.width);
    let mut p = if alpha < -PI + t || alpha > PI - t {
        Point::new(bounds.x, cy - bounds.width * alpha.tan() / 2.0)
    } else if alpha < -t {
        Point::new(cx - bounds.height * beta.tan() / 2.0, bounds.y)
    } else if alpha < t {
        Point::new(bounds.right(), cy + bounds.width * alpha.tan() / 2.0)
    } else {
        Point::new(cx + bounds.height * beta.tan() / 2.0, bounds.bottom())
    };

    if orthogonal {
        if next.x >= bounds.x && next.x <= bounds.right() {
            p.x = next.x;
        } else if next.y >= bounds.y && next.y <= bounds.bottom() {
            p.y = next.y;
        }
        if next.x < bounds.x {
            p.x = bounds.x;
        } else if next.x > bounds.right() {
            p.x = bounds.right();
        }
        if next.y < bounds.y {
            p.y = bounds.y;
        } else if next.y > bounds.bottom() {
            p.y = bounds.bottom();
        }
    }
    p
}

fn ellipse(bounds: &Rect, next: Point, orthogonal: bool) -> Option<Point> {
    let a = bounds.width / 2.0;
    let b = bounds.height / 2.0;
    let center = bounds.center();
    let dx = next.x - center.x;
    let dy = next.y - center.y;

    if dx == 0.0 && dy == 0.0 {
        return Some(next);
    }
    if dx == 0.0 {
        return Some(Point::new(center.x, center.y + b * dy.signum()));
    }

    if orthogonal {
        if next.y >= bounds.y && next.y <= bounds.bottom() {
            let ty = next.y - center.y;
            let mut tx = (a * a * (1.0 - (ty * ty) / (b * b))).max(0.0).sqrt();
            if next.x <= bounds.x {
                tx = -tx;
            }
            return Some(Point::new(center.x + tx, next.y));
        }
        if next.x >= bounds.x && next.x <= bounds.right() {
            let tx = next.x - center.x;
            let mut ty = (b * b * (1.0 - (tx * tx) / (a * a))).max(0.0).sqrt();
            if next.y <= bounds.y {
                ty = -ty;
            }
            return Some(Point::new(next.x, center.y + ty));
        }
    }

    ray_ellipse_intersection(center, Point::new(dx, dy), center, a, b)
}

fn rhombus(bounds: &Rect, next: Point, orthogonal: bool) -> Option<Point> {
    let x = bounds.x;
    let y = bounds.y;
    let cx = bounds.center_x();
    let cy = bounds.center_y();

    if cx == next.x {
        let y = if cy > next.y { y } else { bounds.bottom() };
        return Some(Point::new(cx, y));
    }
    if cy == next.y {
        let x = if cx > next.x { x } else { bounds.right() };
        return Some(Point::new(x, cy));
    }

    let mut tx = cx;
    let mut ty = cy;
    if orthogonal {
        if next.x >= x && next.x <= bounds.right() {
            tx = next.x;
        } else if next.y >= y && next.y <= bounds.bottom() {
            ty = next.y;
        }
    }
    let inner = Point::new(tx, ty);
    let top = Point::new(cx, y);
    let bottom = Point::new(cx, bounds.bottom());
    let left = Point::new(x, cy);
    let right = Point::new(bounds.right(), cy);

    if next.x < cx {
        if next.y < cy {
            segment_intersection(next, inner, top, left)
        } else {
            segment_intersection(next, inner, bottom, left)
        }
    } else if next.y < cy {
        segment_intersection(next, inner, top, right)
    } else {
        segment_intersection(next, inner, bottom, right)
    }
}

fn triangle(bounds: &Rect, direction: Direction, next: Point, orthogonal: bool) -> Point {
    let vertical = direction.is_vertical();
    let x = bounds.x;
    let y = bounds.y;
    let w = bounds.width;
    let h = bounds.height;
    let mut cx = bounds.center_x();
    let mut cy = bounds.center_y();

    let (start, corner, end) = match direction {
        Direction::North => (
            Point::new(x, y + h),
            Point::new(cx, y),
            Point::new(x + w, y + h),
        ),
        Direction::South => (Point::new(x, y), Point::new(cx, y + h), Point::new(x + w, y)),
        Direction::West => (
            Point::new(x + w, y),
            Point::new(x, cy),
            Point::new(x + w, y + h),
        ),
        Direction::East => (Point::new(x, y), Point::new(x + w, cy), Point::new(x, y + h)),
    };

    let dx = next.x - cx;
    let dy = next.y - cy;
    let alpha = if vertical { dx.atan2(dy) } else { dy.atan2(dx) };
    let t = if vertical { w.atan2(h) } else { h.atan2(w) };

    let base = if matches!(direction, Direction::North | Direction::West) {
        alpha > -t && alpha < t
    } else {
        alpha < -PI + t || alpha > PI - t
    };

    let result = if base {
        let along_base = if vertical {
            next.x >= start.x && next.x <= end.x
        } else {
            next.y >= start.y && next.y <= end.y
        };
        if orthogonal && along_base {
            if vertical {
                Some(Point::new(next.x, start.y))
            } else {
                Some(Point::new(start.x, next.y))
            }
        } else {
            Some(match direction {
                Direction::North => Point::new(x + w / 2.0 + h * alpha.tan() / 2.0, y + h),
                Direction::South => Point::new(x + w / 2.0 - h * alpha.tan() / 2.0, y),
                Direction::West => Point::new(x + w, y + h / 2.0 + w * alpha.tan() / 2.0),
                Direction::East => Point::new(x, y + h / 2.0 - w * alpha.tan() / 2.0),
            })
        }
    } else {
        if orthogonal {
            let mut pt = Point::new(cx, cy);
            if next.y >= y && next.y <= y + h {
                pt.x = if vertical {
                    cx
                } else if direction == Direction::West {
                    x + w
                } else {
                    x
                };
                pt.y = next.y;
            } else if next.x >= x && next.x <= x + w {
                pt.x = next.x;
                pt.y = if !vertical {
                    cy
                } else if direction == Direction::North {
                    y + h
                } else {
                    y
                };
            }
            cx = pt.x;
            cy = pt.y;
        }
        let inner = Point::new(cx, cy);
        if (vertical && next.x <= x + w / 2.0) || (!vertical && next.y <= y + h / 2.0) {
            segment_intersection(next, inner, start, corner)
        } else {
            segment_intersection(next, inner, corner, end)
        }
    };

    result.unwrap_or(Point::new(cx, cy))
}

fn hexagon(bounds: &Rect, direction: Direction, next: Point, orthogonal: bool) -> Option<Point> {
    let x = bounds.x;
    let y = bounds.y;
    let w = bounds.width;
    let h = bounds.height;
    let center = bounds.center();
    let outline = if direction.is_vertical() {
        [
            Point::new(center.x, y),
            Point::new(x + w, y + h / 4.0),
            Point::new(x + w, y + 3.0 * h / 4.0),
            Point::new(center.x, y + h),
            Point::new(x, y + 3.0 * h / 4.0),
            Point::new(x, y + h / 4.0),
        ]
    } else {
        [
            Point::new(x + w / 4.0, y),
            Point::new(x + 3.0 * w / 4.0, y),
            Point::new(x + w, center.y),
            Point::new(x + 3.0 * w / 4.0, y + h),
            Point::new(x + w / 4.0, y + h),
            Point::new(x, center.y),
        ]
    };

    if orthogonal {
        if next.x >= x && next.x <= x + w && next.y != center.y {
            let origin = Point::new(next.x, center.y);
            let dir = Point::new(0.0, (next.y - center.y).signum());
            if let Some(p) = ray_polygon_intersection(origin, dir, &outline) {
                return Some(p);
            }
        } else if next.y >= y && next.y <= y + h && next.x != center.x {
            let origin = Point::new(center.x, next.y);
            let dir = Point::new((next.x - center.x).signum(), 0.0);
            if let Some(p) = ray_polygon_intersection(origin, dir, &outline) {
                return Some(p);
            }
        }
    }

    let dir = Point::new(next.x - center.x, next.y - center.y);
    if dir.x == 0.0 && dir.y == 0.0 {
        return Some(next);
    }
    ray_polygon_intersection(center, dir, &outline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellId, CellKind};

    fn vertex(style: &[(&str, &str)]) -> CellState {
        let mut state = CellState::new(CellId(2), CellKind::Vertex);
        state.style = style.iter().copied().collect();
        state
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn rectangle_hits_facing_side() {
        let b = Rect::new(0.0, 0.0, 80.0, 40.0);
        let v = vertex(&[]);
        let right = Perimeter::Rectangle.point(&b, &v, Point::new(240.0, 20.0), false);
        assert!(close(right.unwrap(), Point::new(80.0, 20.0)));
        let top = Perimeter::Rectangle.point(&b, &v, Point::new(40.0, -100.0), false);
        assert!(close(top.unwrap(), Point::new(40.0, 0.0)));
    }

    #[test]
    fn rectangle_orthogonal_keeps_the_axis_of_next() {
        let b = Rect::new(0.0, 0.0, 80.0, 40.0);
        let v = vertex(&[]);
        let p = Perimeter::Rectangle
            .point(&b, &v, Point::new(60.0, 200.0), true)
            .unwrap();
        assert!(close(p, Point::new(60.0, 40.0)));
    }

    #[test]
    fn ellipse_points_lie_on_the_outline() {
        let b = Rect::new(0.0, 0.0, 100.0, 50.0);
        let v = vertex(&[]);
        let p = Perimeter::Ellipse
            .point(&b, &v, Point::new(300.0, 125.0), false)
            .unwrap();
        let nx = (p.x - 50.0) / 50.0;
        let ny = (p.y - 25.0) / 25.0;
        assert!((nx * nx + ny * ny - 1.0).abs() < 1e-9);
        let below = Perimeter::Ellipse
            .point(&b, &v, Point::new(50.0, 90.0), false)
            .unwrap();
        assert!(close(below, Point::new(50.0, 50.0)));
    }

    #[test]
    fn rhombus_hits_the_facing_edge() {
        let b = Rect::new(0.0, 0.0, 40.0, 40.0);
        let v = vertex(&[]);
        let p = Perimeter::Rhombus
            .point(&b, &v, Point::new(60.0, 60.0), false)
            .unwrap();
        assert!(close(p, Point::new(30.0, 30.0)));
        let right = Perimeter::Rhombus
            .point(&b, &v, Point::new(90.0, 20.0), false)
            .unwrap();
        assert!(close(right, Point::new(40.0, 20.0)));
    }

    #[test]
    fn triangle_respects_direction() {
        let b = Rect::new(0.0, 0.0, 40.0, 40.0);
        let east = Perimeter::Triangle
            .point(&b, &vertex(&[]), Point::new(100.0, 20.0), false)
            .unwrap();
        assert!(close(east, Point::new(40.0, 20.0)));
        let west = Perimeter::Triangle
            .point(&b, &vertex(&[("direction", "west")]), Point::new(-100.0, 20.0), false)
            .unwrap();
        assert!(close(west, Point::new(0.0, 20.0)));
        let base = Perimeter::Triangle
            .point(&b, &vertex(&[]), Point::new(-100.0, 20.0), false)
            .unwrap();
        assert!(close(base, Point::new(0.0, 20.0)));
    }

    #[test]
    fn hexagon_hits_pointed_side() {
        let b = Rect::new(0.0, 0.0, 80.0, 40.0);
        let p = Perimeter::Hexagon
            .point(&b, &vertex(&[]), Point::new(200.0, 20.0), false)
            .unwrap();
        assert!(close(p, Point::new(80.0, 20.0)));
    }

    #[test]
    fn custom_perimeter_is_called() {
        struct Center;
        impl PerimeterFn for Center {
            fn point(&self, bounds: &Rect, _: &CellState, _: Point, _: bool) -> Option<Point> {
                Some(bounds.center())
            }
        }
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        let p = Perimeter::Custom(Arc::new(Center))
            .point(&b, &vertex(&[]), Point::new(50.0, 50.0), false);
        assert_eq!(p, Some(Point::new(5.0, 5.0)));
    }
}
