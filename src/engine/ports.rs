//! Port resolution for ported ("clean") routing: picks an exit side per edge
//! endpoint and staggers edges sharing a node side so their lines never
//! coincide.

use std::collections::{BTreeMap, HashMap};

use crate::geometry::Point;

use super::types::{EdgeRef, NodeRect, PortAssignment, Side};

/// A connection is "mainly vertical" only when |dy| exceeds |dx| by this
/// factor. Labels read left-to-right and nodes are wider than tall, so the
/// classification is biased toward horizontal routing.
const VERTICAL_BIAS: f32 = 1.5;

/// Keeps port points off the rounded-corner region of a side.
const PORT_CORNER_MARGIN: f32 = 1.0;

/// Resolve side and attachment point for every edge endpoint. Edges whose
/// endpoint nodes are missing, unmeasured, or identical (self-edges) are
/// left out of the map and fall back to straight-line defaults downstream.
pub fn resolve_ports(
    nodes: &[NodeRect],
    edges: &[EdgeRef],
    corner_radius: f32,
    lane_spacing: f32,
) -> BTreeMap<String, PortAssignment> {
    let node_map: HashMap<&str, &NodeRect> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    struct Pending<'a> {
        edge: &'a EdgeRef,
        source: &'a NodeRect,
        dest: &'a NodeRect,
        source_side: Side,
        dest_side: Side,
    }

    let mut pending: Vec<Pending<'_>> = Vec::new();
    // (node id, side slot) -> endpoints assigned to that side, in edge order.
    let mut side_lists: HashMap<(&str, usize), Vec<(usize, bool)>> = HashMap::new();

    for edge in edges {
        if edge.source == edge.destination {
            continue;
        }
        let (Some(source), Some(dest)) = (
            node_map.get(edge.source.as_str()).copied(),
            node_map.get(edge.destination.as_str()).copied(),
        ) else {
            continue;
        };
        if !source.has_geometry() || !dest.has_geometry() {
            continue;
        }

        let (source_side, dest_side) = facing_sides(source, dest);
        let idx = pending.len();
        side_lists
            .entry((source.id.as_str(), source_side.slot()))
            .or_default()
            .push((idx, true));
        side_lists
            .entry((dest.id.as_str(), dest_side.slot()))
            .or_default()
            .push((idx, false));
        pending.push(Pending {
            edge,
            source,
            dest,
            source_side,
            dest_side,
        });
    }

    // Second pass: the group of ports on a side is centered on the side's
    // midpoint, one lane apart.
    let mut lane_offsets: HashMap<(usize, bool), f32> = HashMap::new();
    for list in side_lists.values() {
        let n = list.len();
        for (i, &(idx, is_source)) in list.iter().enumerate() {
            let offset = (i as f32 - (n as f32 - 1.0) / 2.0) * lane_spacing;
            lane_offsets.insert((idx, is_source), offset);
        }
    }

    let mut assignments = BTreeMap::new();
    for (idx, item) in pending.iter().enumerate() {
        let source_offset = lane_offsets.get(&(idx, true)).copied().unwrap_or(0.0);
        let dest_offset = lane_offsets.get(&(idx, false)).copied().unwrap_or(0.0);
        assignments.insert(
            item.edge.id.clone(),
            PortAssignment {
                edge_id: item.edge.id.clone(),
                source_side: item.source_side,
                source_point: port_point(item.source, item.source_side, source_offset, corner_radius),
                dest_side: item.dest_side,
                dest_point: port_point(item.dest, item.dest_side, dest_offset, corner_radius),
            },
        );
    }
    assignments
}

/// Facing side pair: source exits toward the destination, destination
/// receives on the opposite side.
pub(super) fn facing_sides(source: &NodeRect, dest: &NodeRect) -> (Side, Side) {
    let sc = source.center();
    let dc = dest.center();
    let dx = dc.x - sc.x;
    let dy = dc.y - sc.y;
    let mainly_vertical = dy.abs() > VERTICAL_BIAS * dx.abs();
    let source_side = if mainly_vertical {
        if dy >= 0.0 { Side::Bottom } else { Side::Top }
    } else if dx >= 0.0 {
        Side::Right
    } else {
        Side::Left
    };
    (source_side, source_side.opposite())
}

/// Point on the node boundary for `side`, shifted along the side by
/// `offset` and clamped so it stays on the flat span of the side, clear of
/// the corner rounding region.
pub(super) fn port_point(node: &NodeRect, side: Side, offset: f32, corner_radius: f32) -> Point {
    let rect = node.rect();
    let center = rect.center();
    let half_span = if side.axis_horizontal() {
        rect.height / 2.0
    } else {
        rect.width / 2.0
    };
    let reach = (half_span - corner_radius - PORT_CORNER_MARGIN).max(0.0);
    let offset = offset.clamp(-reach, reach);
    match side {
        Side::Left => Point::new(rect.x, center.y + offset),
        Side::Right => Point::new(rect.right(), center.y + offset),
        Side::Top => Point::new(center.x + offset, rect.y),
        Side::Bottom => Point::new(center.x + offset, rect.bottom()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_rect_distance;

    fn node(id: &str, x: f32, y: f32) -> NodeRect {
        NodeRect::new(id, x, y, 100.0, 50.0)
    }

    #[test]
    fn horizontal_pair_exits_right_into_left() {
        let a = node("a", 0.0, 0.0);
        let b = node("b", 300.0, 0.0);
        let edges = vec![EdgeRef::new("e1", "a", "b")];
        let ports = resolve_ports(&[a, b], &edges, 8.0, 14.0);
        let p = &ports["e1"];
        assert_eq!(p.source_side, Side::Right);
        assert_eq!(p.dest_side, Side::Left);
        assert!((p.source_point.x - 100.0).abs() < 1e-4);
        assert!((p.dest_point.x - 300.0).abs() < 1e-4);
    }

    #[test]
    fn vertical_bias_requires_one_and_a_half_ratio() {
        // dy = 140, dx = 100: 140 < 1.5 * 100, still mainly horizontal.
        let a = node("a", 0.0, 0.0);
        let b = node("b", 100.0, 140.0);
        let (side, _) = facing_sides(&a, &b);
        assert_eq!(side, Side::Right);

        // dy = 160 > 1.5 * 100: mainly vertical.
        let c = node("c", 100.0, 160.0);
        let (side, opposite) = facing_sides(&a, &c);
        assert_eq!(side, Side::Bottom);
        assert_eq!(opposite, Side::Top);
    }

    #[test]
    fn shared_side_ports_are_staggered_and_centered() {
        let hub = node("hub", 0.0, 0.0);
        let t1 = node("t1", 300.0, -100.0);
        let t2 = node("t2", 300.0, 0.0);
        let t3 = node("t3", 300.0, 100.0);
        let edges = vec![
            EdgeRef::new("e1", "hub", "t1"),
            EdgeRef::new("e2", "hub", "t2"),
            EdgeRef::new("e3", "hub", "t3"),
        ];
        let ports = resolve_ports(&[hub, t1, t2, t3], &edges, 4.0, 10.0);
        let ys: Vec<f32> = ["e1", "e2", "e3"]
            .iter()
            .map(|id| ports[*id].source_point.y)
            .collect();
        assert!((ys[0] - 15.0).abs() < 1e-4, "first lane at -10 from midpoint 25, got {}", ys[0]);
        assert!((ys[1] - 25.0).abs() < 1e-4);
        assert!((ys[2] - 35.0).abs() < 1e-4);
        // Group centered on the side midpoint.
        let sum: f32 = ys.iter().map(|y| y - 25.0).sum();
        assert!(sum.abs() < 1e-4);
    }

    #[test]
    fn port_points_lie_on_node_boundary() {
        let a = node("a", 0.0, 0.0);
        let b = node("b", 300.0, 20.0);
        let edges = vec![EdgeRef::new("e1", "a", "b")];
        let ports = resolve_ports(&[a.clone(), b.clone()], &edges, 8.0, 14.0);
        let p = &ports["e1"];
        assert!(point_rect_distance(p.source_point, &a.rect()) < 1e-4);
        assert!(point_rect_distance(p.dest_point, &b.rect()) < 1e-4);
    }

    #[test]
    fn lane_offset_clamped_away_from_corners() {
        let hub = node("hub", 0.0, 0.0);
        let mut nodes = vec![hub];
        let mut edges = Vec::new();
        for i in 0..9 {
            let id = format!("t{i}");
            nodes.push(node(&id, 300.0, i as f32 * 10.0));
            edges.push(EdgeRef::new(format!("e{i}"), "hub", id));
        }
        let ports = resolve_ports(&nodes, &edges, 6.0, 20.0);
        // Side is 50 tall, corner radius 6, margin 1: ports stay in
        // [midpoint - 18, midpoint + 18].
        for i in 0..9 {
            let y = ports[&format!("e{i}")].source_point.y;
            assert!((7.0..=43.0).contains(&y), "port y {y} escaped the flat span");
        }
    }

    #[test]
    fn missing_or_degenerate_nodes_skip_the_edge() {
        let a = node("a", 0.0, 0.0);
        let ghost = NodeRect::new("ghost", 10.0, 10.0, 0.0, 0.0);
        let edges = vec![
            EdgeRef::new("dangling", "a", "nowhere"),
            EdgeRef::new("unmeasured", "a", "ghost"),
            EdgeRef::new("selfloop", "a", "a"),
        ];
        let ports = resolve_ports(&[a, ghost], &edges, 8.0, 14.0);
        assert!(ports.is_empty());
    }
}
