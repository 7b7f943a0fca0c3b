//! Layered (Sugiyama-style) placement of a directed acyclic graph, top to bottom.
//!
//! 1. Ranks: longest path from the sources (Kahn order, ties by node index)
//! 2. Order within ranks: barycenter sweeps, down then up, ties by current position
//! 3. Coordinates: nodes packed left to right with `node_sep`, every rank centered on
//!    the widest one, ranks stacked with `rank_sep` and tops aligned within a rank
//!
//! The caller must pass an acyclic edge set. All output is deterministic.

use crate::config::GraphSpacing;
use crate::geometry::Vec2f;

/// Adjacency of the ranking graph, sorted and deduplicated.
#[derive(Debug, Clone)]
pub struct RankGraph {
    pub n: usize,
    pub succ: Vec<Vec<usize>>,
    pub pred: Vec<Vec<usize>>,
}

impl RankGraph {
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut succ = vec![Vec::new(); n];
        let mut pred = vec![Vec::new(); n];
        for &(u, v) in edges {
            if u < n && v < n && u != v {
                succ[u].push(v);
                pred[v].push(u);
            }
        }
        for list in succ.iter_mut().chain(pred.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        Self { n, succ, pred }
    }

    pub fn is_source(&self, v: usize) -> bool {
        self.pred[v].is_empty()
    }

    pub fn is_sink(&self, v: usize) -> bool {
        self.succ[v].is_empty()
    }
}

/// Result of a layered layout. `centers[v]` is relative to the top-left of the drawing.
#[derive(Debug, Clone, Default)]
pub struct Layered {
    pub ranks: Vec<usize>,
    pub order: Vec<Vec<usize>>,
    pub centers: Vec<Vec2f>,
}

/// Run all three passes over `graph` with node `sizes` given as `(width, height)`.
pub fn layout_layered(graph: &RankGraph, sizes: &[(f32, f32)], spacing: &GraphSpacing) -> Layered {
    let ranks = assign_ranks(graph);
    let mut order = rank_buckets(&ranks);
    for _ in 0..spacing.order_sweeps {
        for r in 1..order.len() {
            reorder_rank(&mut order, r, r - 1, &graph.pred, graph.n);
        }
        for r in (0..order.len().saturating_sub(1)).rev() {
            reorder_rank(&mut order, r, r + 1, &graph.succ, graph.n);
        }
    }
    let centers = assign_coordinates(&order, sizes, spacing, graph.n);
    Layered {
        ranks,
        order,
        centers,
    }
}

/// Longest-path ranks: every edge goes from a lower rank to a strictly higher one.
pub fn assign_ranks(graph: &RankGraph) -> Vec<usize> {
    let mut in_degree: Vec<usize> = graph.pred.iter().map(|p| p.len()).collect();
    let mut queue: Vec<usize> = (0..graph.n).filter(|&v| in_degree[v] == 0).collect();
    let mut ranks = vec![0usize; graph.n];

    let mut head = 0;
    while head < queue.len() {
        let u = queue[head];
        head += 1;
        for &v in &graph.succ[u] {
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push(v);
            }
        }
    }

    // Only reachable with a cyclic input: park the leftovers below everything else.
    if queue.len() < graph.n {
        tracing::warn!(
            unranked = graph.n - queue.len(),
            "layered layout received a cyclic graph"
        );
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        let mut ranked = vec![false; graph.n];
        for &v in &queue {
            ranked[v] = true;
        }
        for (v, rank) in ranks.iter_mut().enumerate() {
            if !ranked[v] {
                *rank = max_rank + 1;
            }
        }
    }
    ranks
}

fn rank_buckets(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(max_rank) = ranks.iter().copied().max() else {
        return Vec::new();
    };
    let mut buckets = vec![Vec::new(); max_rank + 1];
    for (v, &r) in ranks.iter().enumerate() {
        buckets[r].push(v);
    }
    buckets
}

/// Sort rank `r` by the mean position of each node's neighbours in rank `fixed`.
/// Nodes without neighbours there keep their current position as their key.
fn reorder_rank(order: &mut [Vec<usize>], r: usize, fixed: usize, neighbours: &[Vec<usize>], n: usize) {
    let mut fixed_pos = vec![usize::MAX; n];
    for (pos, &v) in order[fixed].iter().enumerate() {
        fixed_pos[v] = pos;
    }

    let mut scored: Vec<(usize, f32, usize)> = order[r]
        .iter()
        .enumerate()
        .map(|(pos, &v)| {
            let (sum, count) = neighbours[v]
                .iter()
                .filter_map(|&nb| (fixed_pos[nb] != usize::MAX).then_some(fixed_pos[nb]))
                .fold((0.0f32, 0usize), |(s, c), p| (s + p as f32, c + 1));
            let key = if count == 0 {
                pos as f32
            } else {
                sum / count as f32
            };
            (v, key, pos)
        })
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
    order[r] = scored.into_iter().map(|(v, _, _)| v).collect();
}

fn assign_coordinates(
    order: &[Vec<usize>],
    sizes: &[(f32, f32)],
    spacing: &GraphSpacing,
    n: usize,
) -> Vec<Vec2f> {
    let mut centers = vec![Vec2f::ZERO; n];

    let rank_widths: Vec<f32> = order
        .iter()
        .map(|nodes| {
            let spans: f32 = nodes.iter().map(|&v| sizes[v].0).sum();
            spans + nodes.len().saturating_sub(1) as f32 * spacing.node_sep
        })
        .collect();
    let max_width = rank_widths.iter().copied().fold(0.0f32, f32::max);

    let mut top = 0.0f32;
    for (r, nodes) in order.iter().enumerate() {
        let rank_height = nodes.iter().map(|&v| sizes[v].1).fold(0.0f32, f32::max);
        let mut left = (max_width - rank_widths[r]) * 0.5;
        for &v in nodes {
            let (w, h) = sizes[v];
            centers[v] = Vec2f::new(left + w * 0.5, top + h * 0.5);
            left += w + spacing.node_sep;
        }
        top += rank_height + spacing.rank_sep;
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_longest_path() {
        // 0 -> 1 -> 2 and a shortcut 0 -> 2
        let g = RankGraph::new(3, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(assign_ranks(&g), vec![0, 1, 2]);
    }

    #[test]
    fn barycenter_uncrosses_edges() {
        // Rank 0: 0, 1. Rank 1: 2, 3 with crossing edges 0->3, 1->2.
        let g = RankGraph::new(4, &[(0, 3), (1, 2)]);
        let sizes = vec![(10.0, 10.0); 4];
        let out = layout_layered(&g, &sizes, &GraphSpacing::default());
        assert_eq!(out.order[1], vec![3, 2]);
        assert!(out.centers[3].x < out.centers[2].x);
    }
}
