//! Pure geometry kernel: rectangle/segment intersection, distances,
//! inflation and overlap tests. No state, no allocation beyond return
//! values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn inflate(&self, padding: f32) -> Rect {
        Rect {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// Axis-aligned overlap test. Degenerate rectangles (non-positive extent)
/// never overlap anything.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    if a.width <= 0.0 || a.height <= 0.0 || b.width <= 0.0 || b.height <= 0.0 {
        return false;
    }
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// Distance from a point to a rectangle: 0 inside, otherwise the Euclidean
/// distance to the nearest clamped boundary point.
pub fn point_rect_distance(p: Point, rect: &Rect) -> f32 {
    let dx = if p.x < rect.x {
        rect.x - p.x
    } else if p.x > rect.right() {
        p.x - rect.right()
    } else {
        0.0
    };
    let dy = if p.y < rect.y {
        rect.y - p.y
    } else if p.y > rect.bottom() {
        p.y - rect.bottom()
    } else {
        0.0
    };
    (dx * dx + dy * dy).sqrt()
}

/// Closest boundary crossing of the segment `p1 -> p2` with `rect`, clamping
/// against each of the four half-plane edges and keeping the smallest
/// positive parametric distance. Returns `None` for a degenerate segment or
/// when the segment never reaches the boundary.
pub fn segment_rect_intersection(p1: Point, p2: Point, rect: &Rect) -> Option<Point> {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    if dx.abs() < 1e-6 && dy.abs() < 1e-6 {
        return None;
    }

    let mut best_t: Option<f32> = None;
    let mut consider = |t: f32, on_axis: f32, lo: f32, hi: f32| {
        if t < 0.0 || t > 1.0 {
            return;
        }
        if on_axis < lo - 1e-4 || on_axis > hi + 1e-4 {
            return;
        }
        match best_t {
            Some(best) if t >= best => {}
            _ => best_t = Some(t),
        }
    };

    if dx.abs() > 1e-6 {
        let t = (rect.x - p1.x) / dx;
        consider(t, p1.y + dy * t, rect.y, rect.bottom());
        let t = (rect.right() - p1.x) / dx;
        consider(t, p1.y + dy * t, rect.y, rect.bottom());
    }
    if dy.abs() > 1e-6 {
        let t = (rect.y - p1.y) / dy;
        consider(t, p1.x + dx * t, rect.x, rect.right());
        let t = (rect.bottom() - p1.y) / dy;
        consider(t, p1.x + dx * t, rect.x, rect.right());
    }

    best_t.map(|t| Point::new(p1.x + dx * t, p1.y + dy * t))
}

pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len2 = vx * vx + vy * vy;
    if len2 <= 1e-6 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + vx * t, a.y + vy * t))
}

pub fn polyline_length(points: &[Point]) -> f32 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Point at `distance` along the polyline, clamped to the endpoints.
/// A polyline with fewer than two points yields its sole point or origin.
pub fn point_at_arc_length(points: &[Point], distance: f32) -> Point {
    match points {
        [] => Point::default(),
        [only] => *only,
        _ => {
            let mut remaining = distance.max(0.0);
            for w in points.windows(2) {
                let seg = w[0].distance_to(w[1]);
                if seg <= 1e-6 {
                    continue;
                }
                if remaining <= seg {
                    let t = remaining / seg;
                    return Point::new(
                        w[0].x + (w[1].x - w[0].x) * t,
                        w[0].y + (w[1].y - w[0].y) * t,
                    );
                }
                remaining -= seg;
            }
            points[points.len() - 1]
        }
    }
}
