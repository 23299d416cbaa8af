//! Placement stability cache. Raw placement output jitters by fractions of
//! a pixel as nodes move, which reads as label shimmer at high zoom. The
//! cache quantizes accepted placements to the screen pixel grid and holds a
//! label still while a new candidate stays inside a small deadband.
//!
//! Time is injected by the host through [`FrameInput::now_ms`]. The cache
//! never reads a clock, so frames replay deterministically in tests.

use std::collections::HashMap;

use crate::config::CacheConfig;

use super::types::LabelPlacement;

/// Angle drift below this many degrees is treated as unchanged.
const ANGLE_TOLERANCE: f32 = 0.05;

/// Per-frame interaction state supplied by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// Monotonic timestamp in milliseconds.
    pub now_ms: f64,
    /// Current camera zoom factor. Quantization snaps to `1 / zoom` world
    /// units so labels land on whole screen pixels.
    pub zoom: f32,
    /// True while the user is dragging a node.
    pub node_drag_active: bool,
    /// True while the camera is panning or zooming.
    pub camera_moving: bool,
    /// True when grid snapping is enabled in the host editor.
    pub grid_snap: bool,
}

impl FrameInput {
    pub fn at(now_ms: f64, zoom: f32) -> Self {
        Self {
            now_ms,
            zoom,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    placement: LabelPlacement,
}

/// Keyed by edge id; entries survive across frames until invalidated.
#[derive(Debug, Default)]
pub struct LabelCache {
    entries: HashMap<String, CacheEntry>,
    drag_was_active: bool,
    camera_pending: bool,
    last_camera_move_ms: f64,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame prologue: handles drag-start invalidation and the camera
    /// settle debounce. Call once per frame before any [`LabelCache::apply`].
    pub fn begin_frame(&mut self, frame: &FrameInput, config: &CacheConfig) {
        if frame.node_drag_active && !self.drag_was_active {
            // Drag start: stale positions would fight the drag.
            self.entries.clear();
        }
        self.drag_was_active = frame.node_drag_active;

        if frame.camera_moving {
            self.camera_pending = true;
            self.last_camera_move_ms = frame.now_ms;
        } else if self.camera_pending
            && frame.now_ms - self.last_camera_move_ms >= config.camera_debounce_ms
        {
            // Camera settled: re-place everything once at the new zoom.
            self.entries.clear();
            self.camera_pending = false;
        }
    }

    /// Stabilize one candidate placement. The candidate is quantized to the
    /// screen pixel grid; when it lands within the active deadband of the
    /// cached position the cached placement is returned unchanged, otherwise
    /// the quantized candidate is stored and returned.
    pub fn apply(
        &mut self,
        candidate: LabelPlacement,
        frame: &FrameInput,
        config: &CacheConfig,
    ) -> LabelPlacement {
        let deadband = if frame.node_drag_active {
            config.drag_deadband
        } else if frame.grid_snap {
            config.grid_snap_deadband
        } else {
            config.deadband
        };
        let zoom = if frame.zoom > 0.0 { frame.zoom } else { 1.0 };

        let quantized = quantize_placement(candidate, zoom);
        if let Some(entry) = self.entries.get(&quantized.edge_id) {
            let held = &entry.placement;
            let dx = (quantized.x - held.x).abs() * zoom;
            let dy = (quantized.y - held.y).abs() * zoom;
            if dx.max(dy) <= deadband && (quantized.angle - held.angle).abs() <= ANGLE_TOLERANCE {
                return held.clone();
            }
        }

        self.entries.insert(
            quantized.edge_id.clone(),
            CacheEntry {
                placement: quantized.clone(),
            },
        );
        quantized
    }

    /// Drop entries for edges no longer present, so deleted edges cannot
    /// leak cache memory across long sessions.
    pub fn retain_edges(&mut self, keep: impl Fn(&str) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.drag_was_active = false;
        self.camera_pending = false;
        self.last_camera_move_ms = 0.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snap the anchor to whole screen pixels (`round(v * zoom) / zoom`) and
/// shift the collision rect by the same delta so they stay in agreement.
fn quantize_placement(mut placement: LabelPlacement, zoom: f32) -> LabelPlacement {
    let qx = (placement.x * zoom).round() / zoom;
    let qy = (placement.y * zoom).round() / zoom;
    placement.rect.x += qx - placement.x;
    placement.rect.y += qy - placement.y;
    placement.x = qx;
    placement.y = qy;
    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn placement(edge_id: &str, x: f32, y: f32) -> LabelPlacement {
        LabelPlacement {
            edge_id: edge_id.to_string(),
            x,
            y,
            angle: 0.0,
            rect: Rect::from_center(crate::geometry::Point::new(x, y), 40.0, 18.0),
        }
    }

    fn config() -> CacheConfig {
        CacheConfig::default()
    }

    #[test]
    fn sub_deadband_motion_is_absorbed() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let frame = FrameInput::at(0.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        let first = cache.apply(placement("e", 100.0, 50.0), &frame, &cfg);

        let frame = FrameInput::at(16.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        let second = cache.apply(placement("e", 100.6, 50.4), &frame, &cfg);
        assert_eq!(first, second, "motion under 1px should hold the old placement");
    }

    #[test]
    fn motion_past_deadband_reanchors() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let frame = FrameInput::at(0.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        let first = cache.apply(placement("e", 100.0, 50.0), &frame, &cfg);

        let frame = FrameInput::at(16.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        let second = cache.apply(placement("e", 103.0, 50.0), &frame, &cfg);
        assert_ne!(first.x, second.x);
        assert_eq!(second.x, 103.0);
    }

    #[test]
    fn quantization_snaps_to_screen_pixels() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let frame = FrameInput::at(0.0, 2.0);
        cache.begin_frame(&frame, &cfg);
        let out = cache.apply(placement("e", 100.3, 50.2), &frame, &cfg);
        // Zoom 2: world coordinates land on multiples of 0.5.
        assert_eq!(out.x, 100.5);
        assert_eq!(out.y, 50.0);
        // Rect follows the anchor shift.
        assert!((out.rect.center().x - 100.5).abs() < 1e-4);
    }

    #[test]
    fn drag_start_clears_and_tracks_exactly() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let frame = FrameInput::at(0.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        cache.apply(placement("e", 100.0, 50.0), &frame, &cfg);
        assert_eq!(cache.len(), 1);

        let mut drag_frame = FrameInput::at(16.0, 1.0);
        drag_frame.node_drag_active = true;
        cache.begin_frame(&drag_frame, &cfg);
        assert!(cache.is_empty(), "drag start invalidates every entry");

        // Deadband 0 while dragging: every move re-anchors.
        let a = cache.apply(placement("e", 100.0, 50.0), &drag_frame, &cfg);
        let b = cache.apply(placement("e", 100.6, 50.0), &drag_frame, &cfg);
        assert_ne!(a.x, b.x);
    }

    #[test]
    fn camera_settle_debounce_clears_after_window() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let still = FrameInput::at(0.0, 1.0);
        cache.begin_frame(&still, &cfg);
        cache.apply(placement("e", 100.0, 50.0), &still, &cfg);

        let mut panning = FrameInput::at(100.0, 1.0);
        panning.camera_moving = true;
        cache.begin_frame(&panning, &cfg);
        assert_eq!(cache.len(), 1, "entries survive while the camera moves");

        // Settled but inside the debounce window.
        let settling = FrameInput::at(100.0 + cfg.camera_debounce_ms / 2.0, 1.0);
        cache.begin_frame(&settling, &cfg);
        assert_eq!(cache.len(), 1);

        let settled = FrameInput::at(100.0 + cfg.camera_debounce_ms + 1.0, 1.0);
        cache.begin_frame(&settled, &cfg);
        assert!(cache.is_empty(), "debounce expiry invalidates entries");
    }

    #[test]
    fn retain_edges_drops_removed_ids() {
        let mut cache = LabelCache::new();
        let cfg = config();
        let frame = FrameInput::at(0.0, 1.0);
        cache.begin_frame(&frame, &cfg);
        cache.apply(placement("keep", 0.0, 0.0), &frame, &cfg);
        cache.apply(placement("drop", 10.0, 0.0), &frame, &cfg);
        cache.retain_edges(|id| id == "keep");
        assert_eq!(cache.len(), 1);
    }
}
