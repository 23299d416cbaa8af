//! Edge routing and label placement engine. The host calls
//! [`route_frame`] once per frame with the current node geometry and edge
//! list; the engine is otherwise stateless apart from the label stability
//! cache it is handed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::config::EngineConfig;
use crate::geometry::Point;

pub mod cache;
pub mod labels;
pub mod paths;
pub mod ports;
pub mod types;

pub use cache::{FrameInput, LabelCache};
pub use labels::{PlacementPass, estimate_label_size, label_bounds, normalize_label_angle};
pub use paths::{FanPosition, fan_positions, generate_path};
pub use ports::resolve_ports;
pub use types::*;

/// Everything the host needs to draw one frame. Maps are ordered by edge id
/// so identical input produces byte-identical serialized output.
#[derive(Debug, Default)]
pub struct FrameOutput {
    pub ports: BTreeMap<String, PortAssignment>,
    pub paths: BTreeMap<String, RoutePath>,
    pub labels: BTreeMap<String, LabelPlacement>,
}

/// Route every edge and place every label for one frame.
///
/// Edges are processed in input order, which is the host's render order, so
/// label collision avoidance favors edges drawn first. Edges without
/// routable geometry are omitted from the output and retried next frame.
pub fn route_frame(
    nodes: &[NodeRect],
    edges: &[EdgeRef],
    config: &EngineConfig,
    frame: &FrameInput,
    label_cache: &mut LabelCache,
) -> FrameOutput {
    label_cache.begin_frame(frame, &config.cache);

    let node_map: HashMap<&str, &NodeRect> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let ports = if config.routing.mode == RoutingMode::Clean {
        resolve_ports(
            nodes,
            edges,
            config.routing.corner_radius,
            config.routing.lane_spacing,
        )
    } else {
        BTreeMap::new()
    };
    let fans = fan_positions(edges);

    let mut paths = BTreeMap::new();
    let mut labels = BTreeMap::new();
    let mut pass = PlacementPass::for_nodes(nodes, config.label.obstacle_padding);

    for edge in edges {
        let (Some(source), Some(dest)) = (
            node_map.get(edge.source.as_str()).copied(),
            node_map.get(edge.destination.as_str()).copied(),
        ) else {
            continue;
        };
        let fan = fans.get(&edge.id).copied().unwrap_or_default();
        let Some(path) = generate_path(
            edge,
            source,
            dest,
            config.routing.mode,
            ports.get(&edge.id),
            fan,
            &config.routing,
        ) else {
            continue;
        };

        if let Some(text) = edge.label.as_deref().filter(|t| !t.is_empty()) {
            let candidate = pass.place(&edge.id, &path.points, text, config.label.font_size, &config.label);
            let stabilized = label_cache.apply(candidate, frame, &config.cache);
            pass.commit(&stabilized, &path.points);
            labels.insert(edge.id.clone(), stabilized);
        }
        paths.insert(edge.id.clone(), path);
    }

    let live: HashSet<&str> = edges.iter().map(|e| e.id.as_str()).collect();
    label_cache.retain_edges(|id| live.contains(id));

    FrameOutput {
        ports,
        paths,
        labels,
    }
}

/// Process-wide cache backing the free-function API below, for hosts that
/// route one canvas and do not want to thread a [`LabelCache`] through.
static AMBIENT_LABEL_CACHE: Lazy<Mutex<LabelCache>> = Lazy::new(|| Mutex::new(LabelCache::new()));

fn ambient_cache() -> std::sync::MutexGuard<'static, LabelCache> {
    AMBIENT_LABEL_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Place a single label against a fixed obstacle set, stabilized by the
/// process-wide cache.
pub fn place_label(
    edge_id: &str,
    path: &[Point],
    text: &str,
    font_size: f32,
    obstacles: &[ObstacleRect],
    frame: &FrameInput,
    config: &EngineConfig,
) -> LabelPlacement {
    let pass = PlacementPass::new(obstacles.to_vec());
    let candidate = pass.place(edge_id, path, text, font_size, &config.label);
    let mut cache = ambient_cache();
    cache.begin_frame(frame, &config.cache);
    cache.apply(candidate, frame, &config.cache)
}

/// Clear the process-wide label cache, e.g. when the host switches
/// documents.
pub fn reset_label_cache() {
    ambient_cache().reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f32, y: f32) -> NodeRect {
        NodeRect::new(id, x, y, 100.0, 50.0)
    }

    #[test]
    fn frame_routes_paths_and_places_labels() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 300.0, 0.0)];
        let edges = vec![EdgeRef::new("e1", "a", "b").with_label("link")];
        let config = EngineConfig::default();
        let mut cache = LabelCache::new();
        let out = route_frame(&nodes, &edges, &config, &FrameInput::at(0.0, 1.0), &mut cache);
        assert_eq!(out.paths.len(), 1);
        assert_eq!(out.labels.len(), 1);
        assert!(out.ports.is_empty(), "ports are only resolved in clean mode");
    }

    #[test]
    fn clean_mode_emits_port_assignments() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 300.0, 0.0)];
        let edges = vec![EdgeRef::new("e1", "a", "b")];
        let mut config = EngineConfig::default();
        config.routing.mode = RoutingMode::Clean;
        let mut cache = LabelCache::new();
        let out = route_frame(&nodes, &edges, &config, &FrameInput::at(0.0, 1.0), &mut cache);
        assert_eq!(out.ports.len(), 1);
        assert_eq!(out.paths.len(), 1);
    }

    #[test]
    fn unroutable_edges_are_omitted_not_errors() {
        let nodes = vec![node("a", 0.0, 0.0)];
        let edges = vec![
            EdgeRef::new("dangling", "a", "missing"),
            EdgeRef::new("selfloop", "a", "a"),
        ];
        let config = EngineConfig::default();
        let mut cache = LabelCache::new();
        let out = route_frame(&nodes, &edges, &config, &FrameInput::at(0.0, 1.0), &mut cache);
        assert!(out.paths.is_empty());
    }

    #[test]
    fn cache_prunes_deleted_edges() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 300.0, 0.0)];
        let edges = vec![
            EdgeRef::new("e1", "a", "b").with_label("one"),
            EdgeRef::new("e2", "a", "b").with_label("two"),
        ];
        let config = EngineConfig::default();
        let mut cache = LabelCache::new();
        route_frame(&nodes, &edges, &config, &FrameInput::at(0.0, 1.0), &mut cache);
        assert_eq!(cache.len(), 2);
        route_frame(&nodes, &edges[..1], &config, &FrameInput::at(16.0, 1.0), &mut cache);
        assert_eq!(cache.len(), 1);
    }
}
