use dungeon_rules::graph::{DungeonGraph, Position, VertexId};
use dungeon_rules::mechanics::TunnelKind;
use dungeon_rules::pathfinding::{a_star, bfs, dijkstra, find_critical_edges, path_cost, reconstruct_path};
use proptest::prelude::*;

const KINDS: [TunnelKind; 4] = [
    TunnelKind::Normal,
    TunnelKind::Unstable,
    TunnelKind::Reinforced,
    TunnelKind::Narrow,
];

/// Vertices on a small grid; every tunnel weighs at least the distance between
/// its chambers, so straight-line distance never overestimates.
fn embedded_graph(points: &[(u8, u8)], tunnels: &[(usize, usize, u32)]) -> (DungeonGraph, Vec<VertexId>) {
    let mut graph = DungeonGraph::new();
    let ids: Vec<_> = points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| graph.add_vertex(format!("C{i}"), Position::new(*x as f32, *y as f32)))
        .collect();
    for (a, b, extra) in tunnels {
        let (a, b) = (ids[a % ids.len()], ids[b % ids.len()]);
        // one tunnel per pair keeps path_cost unambiguous
        if a == b || graph.edge_between(a, b).is_some() {
            continue;
        }
        let pa = graph.vertex(a).unwrap().position;
        let pb = graph.vertex(b).unwrap().position;
        let weight = pa.distance(&pb).ceil() as u32 + extra;
        graph.add_edge(a, b, weight, TunnelKind::Normal);
    }
    (graph, ids)
}

fn ring(graph: &mut DungeonGraph, size: usize, offset: f32) -> Vec<VertexId> {
    let ids: Vec<_> = (0..size)
        .map(|i| graph.add_vertex(format!("R{i}"), Position::new(offset + i as f32, 0.0)))
        .collect();
    for i in 0..size {
        graph.add_edge(ids[i], ids[(i + 1) % size], 1, TunnelKind::Normal);
    }
    ids
}

#[test]
fn dijkstra_matches_the_diamond_scenario() {
    let mut g = DungeonGraph::new();
    let v: Vec<_> = (0..4).map(|i| g.add_vertex(format!("v{i}"), Position::default())).collect();
    g.add_edge(v[0], v[1], 1, TunnelKind::Normal);
    g.add_edge(v[0], v[2], 5, TunnelKind::Normal);
    g.add_edge(v[1], v[3], 2, TunnelKind::Normal);
    g.add_edge(v[2], v[3], 1, TunnelKind::Normal);

    let (distances, _) = dijkstra(&g, v[0], None);
    let mut pairs: Vec<_> = distances.into_iter().collect();
    pairs.sort();
    assert_eq!(pairs, vec![(v[0], 0), (v[1], 1), (v[2], 4), (v[3], 3)]);
}

proptest! {
    #[test]
    fn unit_weight_dijkstra_equals_bfs(
        points in prop::collection::vec((0_u8..1, 0_u8..1), 2..10),
        tunnels in prop::collection::vec((0_usize..10, 0_usize..10, 0_u32..1), 0..25),
    ) {
        // all chambers share one position, so every tunnel weighs exactly 1
        let (graph, ids) = embedded_graph(&points, &tunnels);
        let hops = bfs(&graph, ids[0], None);
        let (weighted, _) = dijkstra(&graph, ids[0], None);
        prop_assert_eq!(hops, weighted);
    }

    #[test]
    fn a_star_cost_equals_dijkstra_cost(
        points in prop::collection::vec((0_u8..6, 0_u8..6), 2..10),
        tunnels in prop::collection::vec((0_usize..10, 0_usize..10, 0_u32..4), 0..25),
        goal in 0_usize..10,
    ) {
        let (graph, ids) = embedded_graph(&points, &tunnels);
        let (start, goal) = (ids[0], ids[goal % ids.len()]);
        let (distances, predecessors) = dijkstra(&graph, start, None);
        let route = a_star(&graph, start, goal);

        match distances.get(&goal) {
            Some(cost) => {
                prop_assert_eq!(route.cost, *cost as f64);
                prop_assert_eq!(path_cost(&graph, &route.path), Some(*cost));
                let path = reconstruct_path(&predecessors, start, goal);
                prop_assert_eq!(path_cost(&graph, &path), Some(*cost));
            }
            None => {
                prop_assert!(!route.is_reachable());
                prop_assert!(route.cost.is_infinite());
            }
        }
    }

    #[test]
    fn collapse_chance_stays_a_probability(
        kind in 0_usize..KINDS.len(),
        ops in prop::collection::vec((0_u8..3, 0_u8..=255), 0..30),
    ) {
        let mut graph = DungeonGraph::new();
        let a = graph.add_vertex("A", Position::default());
        let b = graph.add_vertex("B", Position::default());
        let id = graph.add_edge(a, b, 1, KINDS[kind]).unwrap();
        for (op, amount) in ops {
            match op {
                0 => graph.damage_stability(id, amount),
                1 => graph.reinforce(id),
                _ => graph.add_fissures(id),
            };
            let edge = graph.edge(id).unwrap();
            prop_assert!((0.0..=1.0).contains(&edge.collapse_chance()));
            prop_assert!(edge.stability() <= 100);
        }
    }

    #[test]
    fn single_bridge_is_the_critical_edge(
        left in 3_usize..7,
        right in 3_usize..7,
        from in 0_usize..7,
        to in 0_usize..7,
    ) {
        let mut graph = DungeonGraph::new();
        let west = ring(&mut graph, left, 0.0);
        let east = ring(&mut graph, right, 100.0);
        let bridge = graph.add_edge(west[0], east[0], 3, TunnelKind::Normal).unwrap();

        let critical = find_critical_edges(&graph, west[from % left], east[to % right]);
        prop_assert_eq!(critical, vec![bridge]);
        prop_assert!(!graph.edge(bridge).unwrap().blocked);
    }
}
