//! Path generation for the three routing styles: straight (with symmetric
//! quadratic fan-out for parallel edges), orthogonal-free "Manhattan", and
//! orthogonal-ported "clean".

use std::collections::HashMap;

use crate::config::RoutingConfig;
use crate::geometry::{Point, segment_rect_intersection};

use super::types::{
    BendPreference, EdgeRef, NodeRect, PortAssignment, RoutePath, RoutingMode, Side,
};

/// Number of line segments used to approximate a fanned quadratic curve.
const QUADRATIC_FLATTEN_STEPS: usize = 16;

/// Position of an edge within the group of edges connecting the same
/// unordered node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanPosition {
    pub index: usize,
    pub count: usize,
}

impl Default for FanPosition {
    fn default() -> Self {
        Self { index: 0, count: 1 }
    }
}

impl FanPosition {
    /// Perpendicular offset for this edge, centered so the whole fan is
    /// symmetric about the node-pair centerline.
    pub fn offset(&self, spacing: f32) -> f32 {
        (self.index as f32 - (self.count as f32 - 1.0) / 2.0) * spacing
    }
}

/// Group edges by unordered node pair, assigning each a stable index within
/// its group (order of first appearance).
pub fn fan_positions(edges: &[EdgeRef]) -> HashMap<String, FanPosition> {
    let mut group_sizes: HashMap<(String, String), usize> = HashMap::new();
    let mut indices: Vec<usize> = Vec::with_capacity(edges.len());
    for edge in edges {
        let (a, b) = edge.node_pair();
        let counter = group_sizes.entry((a.to_string(), b.to_string())).or_insert(0);
        indices.push(*counter);
        *counter += 1;
    }
    edges
        .iter()
        .zip(indices)
        .map(|(edge, index)| {
            let (a, b) = edge.node_pair();
            let count = group_sizes[&(a.to_string(), b.to_string())];
            (edge.id.clone(), FanPosition { index, count })
        })
        .collect()
}

/// Compute the polyline for one edge. Returns `None` when the edge has no
/// routable geometry this frame (missing dimensions or a self-edge); the
/// host simply retries next frame.
pub fn generate_path(
    edge: &EdgeRef,
    source: &NodeRect,
    dest: &NodeRect,
    mode: RoutingMode,
    ports: Option<&PortAssignment>,
    fan: FanPosition,
    config: &RoutingConfig,
) -> Option<RoutePath> {
    if edge.source == edge.destination || !source.has_geometry() || !dest.has_geometry() {
        return None;
    }
    match mode {
        RoutingMode::Straight => Some(straight_path(source, dest, fan, config)),
        RoutingMode::Manhattan => Some(manhattan_path(source, dest, config)),
        RoutingMode::Clean => match ports {
            Some(assignment) => Some(clean_path(assignment, config)),
            // Port resolution skipped this edge; degrade to a straight line.
            None => Some(straight_path(source, dest, FanPosition::default(), config)),
        },
    }
}

/// Direct segment between node boundaries, bowed into a quadratic when the
/// edge is part of a multi-edge fan.
fn straight_path(source: &NodeRect, dest: &NodeRect, fan: FanPosition, config: &RoutingConfig) -> RoutePath {
    let sc = source.center();
    let dc = dest.center();
    let start = segment_rect_intersection(sc, dc, &source.rect()).unwrap_or(sc);
    let end = segment_rect_intersection(dc, sc, &dest.rect()).unwrap_or(dc);

    let offset = fan.offset(config.curve_spacing);
    if fan.count <= 1 || offset.abs() < 1e-6 {
        return RoutePath {
            points: vec![start, end],
            control: None,
            corner_radius: 0.0,
        };
    }

    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        return RoutePath {
            points: vec![start, end],
            control: None,
            corner_radius: 0.0,
        };
    }
    let mid = start.midpoint(end);
    let control = Point::new(mid.x - dy / len * offset, mid.y + dx / len * offset);
    RoutePath {
        points: flatten_quadratic(start, control, end),
        control: Some(control),
        corner_radius: 0.0,
    }
}

/// Orthogonal route anchored at side midpoints, bend count from the
/// entry/exit orientations: matching orientations always take the two-bend
/// "Z" (kept for visual consistency even when one bend would fit),
/// differing orientations take the one-bend "L".
fn manhattan_path(source: &NodeRect, dest: &NodeRect, config: &RoutingConfig) -> RoutePath {
    let (source_side, start) = nearest_side_midpoint(source, dest.center());
    let (dest_side, end) = nearest_side_midpoint(dest, source.center());
    orthogonal_route(start, source_side, end, dest_side, config)
}

/// Orthogonal route anchored at the port resolver's staggered points.
fn clean_path(assignment: &PortAssignment, config: &RoutingConfig) -> RoutePath {
    orthogonal_route(
        assignment.source_point,
        assignment.source_side,
        assignment.dest_point,
        assignment.dest_side,
        config,
    )
}

fn orthogonal_route(
    start: Point,
    start_side: Side,
    end: Point,
    end_side: Side,
    config: &RoutingConfig,
) -> RoutePath {
    let start_horizontal = start_side.axis_horizontal();
    let two_bends = match config.bend_preference {
        BendPreference::One => false,
        BendPreference::Two => true,
        BendPreference::Auto => start_horizontal == end_side.axis_horizontal(),
    };

    let raw = if two_bends {
        if start_horizontal {
            let mid_x = (start.x + end.x) / 2.0;
            vec![
                start,
                Point::new(mid_x, start.y),
                Point::new(mid_x, end.y),
                end,
            ]
        } else {
            let mid_y = (start.y + end.y) / 2.0;
            vec![
                start,
                Point::new(start.x, mid_y),
                Point::new(end.x, mid_y),
                end,
            ]
        }
    } else {
        let corner = if start_horizontal {
            Point::new(end.x, start.y)
        } else {
            Point::new(start.x, end.y)
        };
        vec![start, corner, end]
    };

    RoutePath {
        points: compress_path(&raw),
        control: None,
        corner_radius: config.corner_radius,
    }
}

/// Side midpoint of `node` closest to `toward` (ties resolved in
/// left/right/top/bottom order, which keeps output deterministic).
fn nearest_side_midpoint(node: &NodeRect, toward: Point) -> (Side, Point) {
    let rect = node.rect();
    let center = rect.center();
    let candidates = [
        (Side::Left, Point::new(rect.x, center.y)),
        (Side::Right, Point::new(rect.right(), center.y)),
        (Side::Top, Point::new(center.x, rect.y)),
        (Side::Bottom, Point::new(center.x, rect.bottom())),
    ];
    let mut best = candidates[0];
    let mut best_dist = toward.distance_to(candidates[0].1);
    for candidate in &candidates[1..] {
        let dist = toward.distance_to(candidate.1);
        if dist < best_dist {
            best = *candidate;
            best_dist = dist;
        }
    }
    best
}

fn flatten_quadratic(start: Point, control: Point, end: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(QUADRATIC_FLATTEN_STEPS + 1);
    for step in 0..=QUADRATIC_FLATTEN_STEPS {
        let t = step as f32 / QUADRATIC_FLATTEN_STEPS as f32;
        let u = 1.0 - t;
        points.push(Point::new(
            u * u * start.x + 2.0 * u * t * control.x + t * t * end.x,
            u * u * start.y + 2.0 * u * t * control.y + t * t * end.y,
        ));
    }
    points
}

/// Drop duplicate points and interior points collinear with their axis-
/// aligned neighbors, so degenerate bends collapse to plain segments.
pub(super) fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.x - prev.x).abs() <= 1e-4 && (curr.y - prev.y).abs() <= 1e-4 {
            continue;
        }
        let next = points[idx + 1];
        let dx1 = curr.x - prev.x;
        let dy1 = curr.y - prev.y;
        let dx2 = next.x - curr.x;
        let dy2 = next.y - curr.y;
        if (dx1.abs() <= 1e-4 && dx2.abs() <= 1e-4) || (dy1.abs() <= 1e-4 && dy2.abs() <= 1e-4) {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if (last.x - tail.x).abs() > 1e-4 || (last.y - tail.y).abs() > 1e-4 || out.len() == 1 {
        out.push(last);
    }
    out
}
