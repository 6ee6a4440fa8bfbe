//! Graph analysis built on the core searches.

use std::collections::HashSet;

use super::search::{bfs, dijkstra_without};
use crate::graph::{DungeonGraph, EdgeId, VertexId};

/// Every chamber reachable from `start` over open tunnels, `start` included.
pub fn reachable_vertices(graph: &DungeonGraph, start: VertexId) -> HashSet<VertexId> {
    bfs(graph, start, None).into_keys().collect()
}

/// Chambers that cannot be reached from `start`, sorted by id.
pub fn unreachable_vertices(graph: &DungeonGraph, start: VertexId) -> Vec<VertexId> {
    let reachable = reachable_vertices(graph, start);
    graph
        .vertex_ids()
        .into_iter()
        .filter(|v| !reachable.contains(v))
        .collect()
}

/// Whether no open route joins `start` and `end`.
pub fn is_path_blocked(graph: &DungeonGraph, start: VertexId, end: VertexId) -> bool {
    blocked_without(graph, start, end, None)
}

fn blocked_without(graph: &DungeonGraph, start: VertexId, end: VertexId, excluded: Option<EdgeId>) -> bool {
    let (distances, _) = dijkstra_without(graph, start, Some(end), excluded);
    !distances.contains_key(&end)
}

/// Open tunnels whose loss would disconnect `start` from `end`, sorted by id.
///
/// Runs one search per open tunnel, so it is meant for dungeon-sized graphs
/// (tens of chambers), not large maps. Empty when the pair is already
/// disconnected.
pub fn find_critical_edges(graph: &DungeonGraph, start: VertexId, end: VertexId) -> Vec<EdgeId> {
    if is_path_blocked(graph, start, end) {
        return Vec::new();
    }
    graph
        .edge_ids()
        .into_iter()
        .filter(|id| graph.edge(*id).is_some_and(|edge| !edge.blocked))
        .filter(|id| blocked_without(graph, start, end, Some(*id)))
        .collect()
}

/// Every simple path from `start` to `end` with at most `max_length` vertices.
pub fn find_all_paths(graph: &DungeonGraph, start: VertexId, end: VertexId, max_length: usize) -> Vec<Vec<VertexId>> {
    let mut paths = Vec::new();
    if !graph.contains_vertex(start) || !graph.contains_vertex(end) {
        return paths;
    }
    let mut path = vec![start];
    let mut on_path = HashSet::from([start]);
    walk(graph, end, max_length, &mut path, &mut on_path, &mut paths);
    paths
}

fn walk(
    graph: &DungeonGraph,
    end: VertexId,
    max_length: usize,
    path: &mut Vec<VertexId>,
    on_path: &mut HashSet<VertexId>,
    paths: &mut Vec<Vec<VertexId>>,
) {
    if path.len() > max_length {
        return;
    }
    let Some(&current) = path.last() else {
        return;
    };
    if current == end {
        paths.push(path.clone());
        return;
    }
    for (next, _) in graph.neighbors(current, false) {
        if on_path.insert(next) {
            path.push(next);
            walk(graph, end, max_length, path, on_path, paths);
            path.pop();
            on_path.remove(&next);
        }
    }
}

/// Total weight of a vertex sequence, or `None` if two consecutive vertices
/// have no open tunnel between them.
pub fn path_cost(graph: &DungeonGraph, path: &[VertexId]) -> Option<u32> {
    path.windows(2).try_fold(0u32, |total, pair| {
        let edge = graph.edge_between(pair[0], pair[1])?;
        if edge.blocked {
            return None;
        }
        Some(total.saturating_add(edge.weight()))
    })
}
