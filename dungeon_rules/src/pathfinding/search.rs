//! Core searches: BFS, Dijkstra and A*.

use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use super::{DistanceMap, PredecessorMap, Route};
use crate::graph::{DungeonGraph, EdgeId, VertexId};

/// Hop counts from `start` over open tunnels.
///
/// With `max_depth`, vertices at that depth are recorded but not expanded.
pub fn bfs(graph: &DungeonGraph, start: VertexId, max_depth: Option<u32>) -> DistanceMap {
    let mut distances = DistanceMap::new();
    if !graph.contains_vertex(start) {
        return distances;
    }
    distances.insert(start, 0);

    let mut queue = VecDeque::from([(start, 0u32)]);
    while let Some((current, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for (next, _) in graph.neighbors(current, false) {
            if let Entry::Vacant(slot) = distances.entry(next) {
                slot.insert(depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }
    distances
}

/// Weighted shortest distances and predecessors from `start`.
///
/// With `end`, the search stops as soon as `end` is popped from the queue;
/// its distance is final, entries for vertices still on the frontier are
/// tentative. Tunnel weights are unsigned, so the non-negative weight
/// precondition always holds.
pub fn dijkstra(graph: &DungeonGraph, start: VertexId, end: Option<VertexId>) -> (DistanceMap, PredecessorMap) {
    dijkstra_without(graph, start, end, None)
}

/// Dijkstra that treats `excluded` as if it were blocked.
pub(crate) fn dijkstra_without(
    graph: &DungeonGraph,
    start: VertexId,
    end: Option<VertexId>,
    excluded: Option<EdgeId>,
) -> (DistanceMap, PredecessorMap) {
    let mut distances = DistanceMap::new();
    let mut predecessors = PredecessorMap::new();
    if !graph.contains_vertex(start) {
        return (distances, predecessors);
    }
    distances.insert(start, 0);

    // (cost, insertion sequence, vertex): ties pop in insertion order
    let mut seq = 0u64;
    let mut frontier = BinaryHeap::new();
    frontier.push(Reverse((0u32, seq, start)));

    while let Some(Reverse((cost, _, current))) = frontier.pop() {
        // Stale entry: a cheaper route was found after this one was queued.
        if distances.get(&current).is_some_and(|best| cost > *best) {
            continue;
        }
        if end == Some(current) {
            break;
        }
        for (next, edge) in graph.neighbors(current, false) {
            if excluded == Some(edge.id) {
                continue;
            }
            let candidate = cost.saturating_add(edge.weight());
            let improves = distances.get(&next).map_or(true, |known| candidate < *known);
            if improves {
                distances.insert(next, candidate);
                predecessors.insert(next, current);
                seq += 1;
                frontier.push(Reverse((candidate, seq, next)));
            }
        }
    }
    (distances, predecessors)
}

/// Walk a predecessor map back from `end` to `start`.
///
/// Returns the vertices in start -> end order, `[start]` when they are equal,
/// and an empty list when the chain breaks before reaching `start`.
pub fn reconstruct_path(predecessors: &PredecessorMap, start: VertexId, end: VertexId) -> Vec<VertexId> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let Some(previous) = predecessors.get(&current) else {
            return Vec::new();
        };
        current = *previous;
        path.push(current);
        // A well-formed map can't produce a chain longer than itself.
        if path.len() > predecessors.len() + 1 {
            return Vec::new();
        }
    }
    path.reverse();
    path
}

/// Straight-line distance between two chambers; infinite if either is unknown.
pub fn heuristic_distance(graph: &DungeonGraph, a: VertexId, b: VertexId) -> f64 {
    match (graph.vertex(a), graph.vertex(b)) {
        (Some(va), Some(vb)) => va.position.distance(&vb.position),
        _ => f64::INFINITY,
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    estimate: f64,
    seq: u64,
    vertex: VertexId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Reversed so the max-heap pops the lowest estimate, then the oldest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cheapest route from `start` to `goal`, guided by straight-line distance.
///
/// The heuristic is admissible when tunnel weights are at least the distance
/// between their chambers' positions; under that embedding the cost matches
/// [`dijkstra`].
pub fn a_star(graph: &DungeonGraph, start: VertexId, goal: VertexId) -> Route {
    let Some(goal_position) = graph.vertex(goal).map(|v| v.position) else {
        return Route::unreachable();
    };
    if !graph.contains_vertex(start) {
        return Route::unreachable();
    }
    let estimate = |v: VertexId| {
        graph
            .vertex(v)
            .map_or(f64::INFINITY, |vertex| vertex.position.distance(&goal_position))
    };

    let mut came_from = PredecessorMap::new();
    let mut g_score: HashMap<VertexId, u32> = HashMap::from([(start, 0)]);
    let mut closed = HashSet::new();

    let mut seq = 0u64;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        estimate: estimate(start),
        seq,
        vertex: start,
    });

    while let Some(OpenEntry { vertex: current, .. }) = open.pop() {
        if closed.contains(&current) {
            continue;
        }
        if current == goal {
            let cost = g_score.get(&goal).copied().unwrap_or(0);
            return Route {
                path: reconstruct_path(&came_from, start, goal),
                cost: cost as f64,
            };
        }
        closed.insert(current);

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);
        for (next, edge) in graph.neighbors(current, false) {
            let tentative = current_g.saturating_add(edge.weight());
            if g_score.get(&next).map_or(true, |known| tentative < *known) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                seq += 1;
                open.push(OpenEntry {
                    estimate: tentative as f64 + estimate(next),
                    seq,
                    vertex: next,
                });
            }
        }
    }
    Route::unreachable()
}
