use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Axis-aligned bounding box of a node, owned by the host graph store.
/// The engine treats it as read-only for the duration of a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRect {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeRect {
    pub fn new(id: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// A node without measured dimensions cannot anchor an edge this frame.
    pub fn has_geometry(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// A connection between two nodes. Identity is stable across frames and is
/// the key for the placement stability cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRef {
    pub id: String,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub arrow_start: bool,
    #[serde(default)]
    pub arrow_end: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl EdgeRef {
    pub fn new(id: impl Into<String>, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            destination: destination.into(),
            label: None,
            arrow_start: false,
            arrow_end: true,
            color: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Unordered node pair, used to group parallel edges for fan-out.
    pub fn node_pair(&self) -> (&str, &str) {
        if self.source <= self.destination {
            (&self.source, &self.destination)
        } else {
            (&self.destination, &self.source)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// True when an edge leaving through this side initially travels
    /// horizontally.
    pub fn axis_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }
}

/// Resolved attachment for one edge in ported ("clean") mode. Recomputed
/// every frame, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortAssignment {
    pub edge_id: String,
    pub source_side: Side,
    pub source_point: Point,
    pub dest_side: Side,
    pub dest_point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Straight,
    Manhattan,
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BendPreference {
    #[default]
    Auto,
    One,
    Two,
}

/// The visual path of one edge: an ordered polyline (minimum two points),
/// plus the quadratic control point when the edge is part of a straight-mode
/// fan. The polyline already approximates the curve, so collision checks can
/// use `points` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePath {
    pub points: Vec<Point>,
    pub control: Option<Point>,
    pub corner_radius: f32,
}

impl RoutePath {
    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn length(&self) -> f32 {
        crate::geometry::polyline_length(&self.points)
    }

    /// Effective rounding radius at each interior point. A corner whose
    /// shorter adjoining segment is under `2 x radius` renders sharp, so a
    /// rounded join never overshoots or reverses direction.
    pub fn corner_radii(&self) -> Vec<f32> {
        if self.points.len() < 3 || self.corner_radius <= 0.0 {
            return vec![0.0; self.points.len().saturating_sub(2)];
        }
        self.points
            .windows(3)
            .map(|w| {
                let before = w[0].distance_to(w[1]);
                let after = w[1].distance_to(w[2]);
                let shorter = before.min(after);
                if shorter >= self.corner_radius * 2.0 {
                    self.corner_radius
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// A placed edge label: anchor point, rotation in degrees (normalized to
/// `(-90, 90]`), and the axis-aligned rect used for collision checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub edge_id: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub rect: Rect,
}

/// Inflated node or label rectangle that a label placement must avoid.
pub type ObstacleRect = Rect;
