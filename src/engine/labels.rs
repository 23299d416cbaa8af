//! Collision-aware label placement. Strategies are tried in a fixed
//! cascade; the first one that produces an obstacle-free rectangle wins,
//! and a deterministic fallback accepts overlap when every candidate is
//! exhausted (a slightly overlapping label beats a missing one).

use crate::config::LabelConfig;
use crate::geometry::{Point, Rect, point_at_arc_length, polyline_length, rects_overlap};

use super::types::{LabelPlacement, NodeRect, ObstacleRect};

/// Perpendicular nudges tried from a segment midpoint (strategy 1).
const PATH_OFFSETS: [f32; 5] = [0.0, 12.0, -12.0, 24.0, -24.0];
/// Offsets along the overall perpendicular (strategy 2).
const PARALLEL_OFFSETS: [f32; 6] = [40.0, -40.0, 60.0, -60.0, 80.0, -80.0];
/// Vertical offsets for short connections (strategy 3).
const PERPENDICULAR_OFFSETS: [f32; 6] = [30.0, -30.0, 50.0, -50.0, 70.0, -70.0];
/// Gap between stacked labels (strategy 4).
const STACK_GAP: f32 = 8.0;
/// Two path directions within this many degrees (mod 180) stack together.
const STACK_ANGLE_TOLERANCE: f32 = 15.0;
/// Last-resort ring around the path midpoint, in label-size units.
const FALLBACK_RING: [(f32, f32); 9] = [
    (0.0, -1.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, -1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (1.0, 1.0),
    (0.0, -2.0),
];

/// Segment-orientation priorities: horizontal text reads best, vertical is
/// acceptable, diagonal is the last resort.
const PRIORITY_HORIZONTAL: u8 = 3;
const PRIORITY_VERTICAL: u8 = 2;
const PRIORITY_DIAGONAL: u8 = 1;

/// Estimated label box for `text`: a flat per-character width (no font
/// metrics by design) with a floor, and a line height slightly above the
/// font size.
pub fn estimate_label_size(text: &str, font_size: f32, config: &LabelConfig) -> (f32, f32) {
    let chars = text.chars().count() as f32;
    let width = (chars * config.width_per_char * font_size).max(config.min_width);
    let height = font_size * config.height_factor;
    (width, height)
}

/// Axis-aligned bounds of a `width x height` label rotated by `angle`
/// degrees around `center`.
pub fn label_bounds(center: Point, width: f32, height: f32, angle: f32) -> Rect {
    let rad = angle.to_radians();
    let cos = rad.cos().abs();
    let sin = rad.sin().abs();
    let w = width * cos + height * sin;
    let h = width * sin + height * cos;
    Rect::from_center(center, w, h)
}

/// Normalize an angle in degrees to `(-90, 90]` so text never renders
/// upside-down.
pub fn normalize_label_angle(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    if a > 90.0 {
        a -= 180.0;
    } else if a <= -90.0 {
        a += 180.0;
    }
    a
}

fn direction_angle_mod180(from: Point, to: Point) -> f32 {
    let mut a = (to.y - from.y).atan2(to.x - from.x).to_degrees();
    while a < 0.0 {
        a += 180.0;
    }
    while a >= 180.0 {
        a -= 180.0;
    }
    a
}

fn angle_diff_mod180(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(180.0);
    d.min(180.0 - d)
}

struct PlacedLabel {
    rect: Rect,
    path_angle: f32,
}

struct PlacementContext<'a> {
    path: &'a [Point],
    width: f32,
    height: f32,
    obstacles: &'a [ObstacleRect],
    placed: &'a [PlacedLabel],
}

impl PlacementContext<'_> {
    fn clears(&self, rect: &Rect) -> bool {
        !self.obstacles.iter().any(|o| rects_overlap(o, rect))
    }

    fn bounds(&self, center: Point, angle: f32) -> Rect {
        label_bounds(center, self.width, self.height, angle)
    }

    fn overall_direction(&self) -> Option<(f32, f32)> {
        let start = *self.path.first()?;
        let end = *self.path.last()?;
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-6 {
            return None;
        }
        Some((dx / len, dy / len))
    }

    fn arc_midpoint(&self) -> Point {
        point_at_arc_length(self.path, polyline_length(self.path) / 2.0)
    }
}

struct LabelCandidate {
    center: Point,
    angle: f32,
}

type Strategy = fn(&PlacementContext<'_>, &LabelConfig) -> Option<LabelCandidate>;

/// Ordered cascade; the fallback below never fails and is applied last.
const STRATEGIES: &[Strategy] = &[
    place_along_segments,
    place_parallel,
    place_perpendicular,
    place_stacked,
];

/// Strategy 1: the midpoint of a long-enough path segment, preferring
/// horizontal segments over vertical over diagonal, nudged perpendicular by
/// the smallest offset that clears the obstacle set.
fn place_along_segments(ctx: &PlacementContext<'_>, config: &LabelConfig) -> Option<LabelCandidate> {
    let min_len = config.min_segment_length.max(ctx.width + config.segment_margin);
    let mut best: Option<(u8, f32, LabelCandidate)> = None;

    for seg in ctx.path.windows(2) {
        let dx = seg[1].x - seg[0].x;
        let dy = seg[1].y - seg[0].y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < min_len {
            continue;
        }
        let raw_angle = dy.atan2(dx).to_degrees();
        let priority = segment_priority(raw_angle);
        let angle = normalize_label_angle(raw_angle);
        let mid = seg[0].midpoint(seg[1]);
        let nx = -dy / len;
        let ny = dx / len;
        for offset in PATH_OFFSETS {
            let center = Point::new(mid.x + nx * offset, mid.y + ny * offset);
            if !ctx.clears(&ctx.bounds(center, angle)) {
                continue;
            }
            let better = match &best {
                None => true,
                Some((p, off, _)) => priority > *p || (priority == *p && offset.abs() < *off),
            };
            if better {
                best = Some((priority, offset.abs(), LabelCandidate { center, angle }));
            }
            break;
        }
    }
    best.map(|(_, _, candidate)| candidate)
}

fn segment_priority(angle_deg: f32) -> u8 {
    let folded = {
        let mut a = angle_deg.rem_euclid(180.0);
        if a > 90.0 {
            a = 180.0 - a;
        }
        a
    };
    if folded < 15.0 {
        PRIORITY_HORIZONTAL
    } else if folded > 75.0 {
        PRIORITY_VERTICAL
    } else {
        PRIORITY_DIAGONAL
    }
}

/// Strategy 2: offset from the overall start-to-end midpoint along the
/// perpendicular of the overall direction.
fn place_parallel(ctx: &PlacementContext<'_>, _config: &LabelConfig) -> Option<LabelCandidate> {
    let (dx, dy) = ctx.overall_direction()?;
    let start = *ctx.path.first()?;
    let end = *ctx.path.last()?;
    let mid = start.midpoint(end);
    let angle = normalize_label_angle(dy.atan2(dx).to_degrees());
    for offset in PARALLEL_OFFSETS {
        let center = Point::new(mid.x - dy * offset, mid.y + dx * offset);
        if ctx.clears(&ctx.bounds(center, angle)) {
            return Some(LabelCandidate { center, angle });
        }
    }
    None
}

/// Strategy 3: purely vertical offsets from the arc-length midpoint with
/// the label kept horizontal. Suits short connections where rotated text
/// would be cramped.
fn place_perpendicular(ctx: &PlacementContext<'_>, _config: &LabelConfig) -> Option<LabelCandidate> {
    let mid = ctx.arc_midpoint();
    for offset in PERPENDICULAR_OFFSETS {
        let center = Point::new(mid.x, mid.y + offset);
        if ctx.clears(&ctx.bounds(center, 0.0)) {
            return Some(LabelCandidate { center, angle: 0.0 });
        }
    }
    None
}

/// Strategy 4: stack next to an already-placed label whose edge runs in
/// nearly the same direction.
fn place_stacked(ctx: &PlacementContext<'_>, _config: &LabelConfig) -> Option<LabelCandidate> {
    let (dx, dy) = ctx.overall_direction()?;
    let start = *ctx.path.first()?;
    let end = *ctx.path.last()?;
    let own_mod180 = direction_angle_mod180(start, end);
    let angle = normalize_label_angle(dy.atan2(dx).to_degrees());

    for neighbor in ctx.placed {
        if angle_diff_mod180(own_mod180, neighbor.path_angle) > STACK_ANGLE_TOLERANCE {
            continue;
        }
        let nc = neighbor.rect.center();
        let dy_step = neighbor.rect.height / 2.0 + ctx.height / 2.0 + STACK_GAP;
        let dx_step = neighbor.rect.width / 2.0 + ctx.width / 2.0 + STACK_GAP;
        let adjacents = [
            Point::new(nc.x, nc.y - dy_step),
            Point::new(nc.x, nc.y + dy_step),
            Point::new(nc.x - dx_step, nc.y),
            Point::new(nc.x + dx_step, nc.y),
        ];
        for center in adjacents {
            if ctx.clears(&ctx.bounds(center, angle)) {
                return Some(LabelCandidate { center, angle });
            }
        }
    }
    None
}

/// Final fallback: the arc-length midpoint, then a fixed ring around it,
/// and if everything overlaps, the midpoint anyway.
fn fallback_placement(ctx: &PlacementContext<'_>) -> LabelCandidate {
    let mid = ctx.arc_midpoint();
    let angle = segment_angle_at(ctx.path, polyline_length(ctx.path) / 2.0);
    if ctx.clears(&ctx.bounds(mid, angle)) {
        return LabelCandidate { center: mid, angle };
    }
    let step_x = ctx.width + STACK_GAP;
    let step_y = ctx.height + STACK_GAP;
    for (ux, uy) in FALLBACK_RING {
        let center = Point::new(mid.x + ux * step_x, mid.y + uy * step_y);
        if ctx.clears(&ctx.bounds(center, angle)) {
            return LabelCandidate { center, angle };
        }
    }
    // Accepted degradation: overlap is better than a missing label.
    LabelCandidate { center: mid, angle }
}

/// Direction of the segment containing the point `distance` along the
/// path, normalized for display.
fn segment_angle_at(path: &[Point], distance: f32) -> f32 {
    if path.len() < 2 {
        return 0.0;
    }
    let mut remaining = distance.max(0.0);
    for seg in path.windows(2) {
        let len = seg[0].distance_to(seg[1]);
        if len <= 1e-6 {
            continue;
        }
        if remaining <= len {
            let angle = (seg[1].y - seg[0].y).atan2(seg[1].x - seg[0].x).to_degrees();
            return normalize_label_angle(angle);
        }
        remaining -= len;
    }
    0.0
}

/// One placement pass over a frame's edges, in render order. Obstacles
/// accumulate as labels are committed, so later edges avoid earlier labels.
pub struct PlacementPass {
    obstacles: Vec<ObstacleRect>,
    placed: Vec<PlacedLabel>,
}

impl PlacementPass {
    pub fn new(obstacles: Vec<ObstacleRect>) -> Self {
        Self {
            obstacles,
            placed: Vec::new(),
        }
    }

    /// Seed the obstacle set with every measured node rectangle, inflated
    /// by `padding`.
    pub fn for_nodes(nodes: &[NodeRect], padding: f32) -> Self {
        let obstacles = nodes
            .iter()
            .filter(|n| n.has_geometry())
            .map(|n| n.rect().inflate(padding))
            .collect();
        Self::new(obstacles)
    }

    pub fn obstacles(&self) -> &[ObstacleRect] {
        &self.obstacles
    }

    /// Choose a placement for one label. Never fails; the fallback accepts
    /// overlap when the cascade is exhausted. Does not register the result:
    /// call [`PlacementPass::commit`] with the placement the host keeps.
    pub fn place(
        &self,
        edge_id: &str,
        path: &[Point],
        text: &str,
        font_size: f32,
        config: &LabelConfig,
    ) -> LabelPlacement {
        let (width, height) = estimate_label_size(text, font_size, config);
        let ctx = PlacementContext {
            path,
            width,
            height,
            obstacles: &self.obstacles,
            placed: &self.placed,
        };
        let mut chosen = None;
        for strategy in STRATEGIES {
            if let Some(candidate) = strategy(&ctx, config) {
                chosen = Some(candidate);
                break;
            }
        }
        let candidate = chosen.unwrap_or_else(|| fallback_placement(&ctx));
        LabelPlacement {
            edge_id: edge_id.to_string(),
            x: candidate.center.x,
            y: candidate.center.y,
            angle: candidate.angle,
            rect: label_bounds(candidate.center, width, height, candidate.angle),
        }
    }

    /// Register an accepted placement so labels placed later in this pass
    /// avoid it.
    pub fn commit(&mut self, placement: &LabelPlacement, path: &[Point]) {
        let path_angle = match (path.first(), path.last()) {
            (Some(start), Some(end)) => direction_angle_mod180(*start, *end),
            _ => 0.0,
        };
        self.obstacles.push(placement.rect);
        self.placed.push(PlacedLabel {
            rect: placement.rect,
            path_angle,
        });
    }
}
