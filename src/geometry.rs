use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Rotates the point around `center` using precomputed `cos`/`sin`.
    pub fn rotated(self, cos: f64, sin: f64, center: Point) -> Point {
        let x = self.x - center.x;
        let y = self.y - center.y;
        Point::new(
            x * cos - y * sin + center.x,
            y * cos + x * sin + center.y,
        )
    }

    /// Mirrors the point through `center` on the requested axes.
    pub fn flipped(self, center: Point, flip_h: bool, flip_v: bool) -> Point {
        Point::new(
            if flip_h { 2.0 * center.x - self.x } else { self.x },
            if flip_v { 2.0 * center.y - self.y } else { self.y },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test (points on the border count as inside).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && self.right() >= x && self.y <= y && self.bottom() >= y
    }

    pub fn grow(&mut self, amount: f64) {
        self.x -= amount;
        self.y -= amount;
        self.width += 2.0 * amount;
        self.height += 2.0 * amount;
    }

    pub fn grown(mut self, amount: f64) -> Rect {
        self.grow(amount);
        self
    }

    /// Extends this rectangle to cover `other`.
    pub fn add(&mut self, other: &Rect) {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        self.x = min_x;
        self.y = min_y;
        self.width = max_x - min_x;
        self.height = max_y - min_y;
    }

    pub fn union(mut self, other: &Rect) -> Rect {
        self.add(other);
        self
    }

    /// Swaps width and height around the center.
    pub fn rotate90(&mut self) {
        let t = (self.width - self.height) / 2.0;
        self.x += t;
        self.y -= t;
        std::mem::swap(&mut self.width, &mut self.height);
    }

    /// Axis-aligned box of this rectangle rotated by `degrees` around `center`.
    pub fn rotated_bounds(&self, degrees: f64, center: Option<Point>) -> Rect {
        if degrees == 0.0 {
            return *self;
        }
        let rad = degrees.to_radians();
        let cos = rad.cos();
        let sin = rad.sin();
        let c = center.unwrap_or_else(|| self.center());
        let corners = [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ];
        let mut iter = corners.iter().map(|p| p.rotated(cos, sin, c));
        let first = iter.next().unwrap_or(c);
        let mut out = Rect::new(first.x, first.y, 0.0, 0.0);
        for p in iter {
            out.add(&Rect::new(p.x, p.y, 0.0, 0.0));
        }
        out
    }

    pub fn from_points(points: &[Point]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let mut out = Rect::new(first.x, first.y, 0.0, 0.0);
        for p in rest {
            out.add(&Rect::new(p.x, p.y, 0.0, 0.0));
        }
        Some(out)
    }
}

/// Intersection of segments `p0-p1` and `p2-p3`, if they cross.
pub fn segment_intersection(p0: Point, p1: Point, p2: Point, p3: Point) -> Option<Point> {
    let denom = (p3.y - p2.y) * (p1.x - p0.x) - (p3.x - p2.x) * (p1.y - p0.y);
    if denom == 0.0 {
        return None;
    }
    let ua = ((p3.x - p2.x) * (p0.y - p2.y) - (p3.y - p2.y) * (p0.x - p2.x)) / denom;
    let ub = ((p1.x - p0.x) * (p0.y - p2.y) - (p1.y - p0.y) * (p0.x - p2.x)) / denom;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Point::new(p0.x + ua * (p1.x - p0.x), p0.y + ua * (p1.y - p0.y)))
    } else {
        None
    }
}

pub fn ray_polygon_intersection(origin: Point, dir: Point, poly: &[Point]) -> Option<Point> {
    if poly.len() < 2 {
        return None;
    }
    let mut best_t: Option<f64> = None;
    for (i, a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        let sx = b.x - a.x;
        let sy = b.y - a.y;
        let qx = a.x - origin.x;
        let qy = a.y - origin.y;
        let denom = dir.x * sy - dir.y * sx;
        if denom.abs() < 1e-12 {
            continue;
        }
        let t = (qx * sy - qy * sx) / denom;
        let u = (qx * dir.y - qy * dir.x) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            match best_t {
                Some(best) if t >= best => {}
                _ => best_t = Some(t),
            }
        }
    }
    best_t.map(|t| Point::new(origin.x + dir.x * t, origin.y + dir.y * t))
}

pub fn ray_ellipse_intersection(
    origin: Point,
    dir: Point,
    center: Point,
    rx: f64,
    ry: f64,
) -> Option<Point> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let ox = origin.x - center.x;
    let oy = origin.y - center.y;
    let a = (dir.x * dir.x) / (rx * rx) + (dir.y * dir.y) / (ry * ry);
    let b = 2.0 * ((ox * dir.x) / (rx * rx) + (oy * dir.y) / (ry * ry));
    let c = (ox * ox) / (rx * rx) + (oy * oy) / (ry * ry) - 1.0;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 || a.abs() < 1e-12 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        t2
    } else {
        return None;
    };
    Some(Point::new(origin.x + dir.x * t, origin.y + dir.y * t))
}

/// Squared distance from `p` to the segment `a-b`.
pub fn point_segment_distance_sq(a: Point, b: Point, p: Point) -> f64 {
    let x2 = b.x - a.x;
    let y2 = b.y - a.y;
    let mut px = p.x - a.x;
    let mut py = p.y - a.y;
    let mut dot = px * x2 + py * y2;
    let proj_len_sq;
    if dot <= 0.0 {
        proj_len_sq = 0.0;
    } else {
        px = x2 - px;
        py = y2 - py;
        dot = px * x2 + py * y2;
        proj_len_sq = if dot <= 0.0 {
            0.0
        } else {
            dot * dot / (x2 * x2 + y2 * y2)
        };
    }
    (px * px + py * py - proj_len_sq).max(0.0)
}

/// Which side of the directed line `a-b` the point `p` lies on: -1, 0 or 1.
pub fn relative_ccw(a: Point, b: Point, p: Point) -> i32 {
    let x2 = b.x - a.x;
    let y2 = b.y - a.y;
    let mut px = p.x - a.x;
    let mut py = p.y - a.y;
    let mut ccw = px * y2 - py * x2;
    if ccw == 0.0 {
        ccw = px * x2 + py * y2;
        if ccw > 0.0 {
            px -= x2;
            py -= y2;
            ccw = px * x2 + py * y2;
            if ccw < 0.0 {
                ccw = 0.0;
            }
        }
    }
    if ccw < 0.0 {
        -1
    } else if ccw > 0.0 {
        1
    } else {
        0
    }
}
