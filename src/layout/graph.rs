//! Heap layout.
//!
//! Heap variables become the nodes of a directed graph whose edges are the pointers
//! found inside their values. The graph is handed to the layered layout, after two
//! adjustments made on a separate ranking copy:
//!
//! - cycles are broken by reversing DFS back-edges and dropping self-loops; the
//!   original edges are still reported for arrow drawing
//! - weakly-connected components are chained with phantom edges so that independent
//!   structures stack top to bottom in discovery order instead of sharing ranks
//!
//! Phantom edges run from the deepest sink of one component to every source of the
//! next. Every node of the later component then ranks below every node of the earlier
//! one, while the number of phantom edges stays linear in the number of sources.

use super::layered::{RankGraph, assign_ranks, layout_layered};
use super::{LaidOutNode, SizedNode};
use crate::config::{GraphSpacing, Sizing};
use crate::geometry::Vec2f;
use crate::model::{Address, Variable};
use crate::registry::RenderRegistry;
use std::collections::{BTreeSet, HashMap};

/// A heap-resident variable together with its computed size.
#[derive(Debug, Clone)]
pub struct HeapNode<'a> {
    pub variable: &'a Variable,
    pub sized: SizedNode,
}

impl<'a> HeapNode<'a> {
    pub fn new(variable: &'a Variable, sizing: &Sizing) -> Self {
        Self {
            variable,
            sized: SizedNode::variable(variable, sizing),
        }
    }
}

/// Output of [`layout_graph`]. Indices refer to the input slice.
#[derive(Debug, Clone, Default)]
pub struct GraphLayout {
    /// Placed nodes in input order.
    pub nodes: Vec<LaidOutNode>,
    /// Pointer edges, deduplicated, including self-loops and cycle edges.
    pub edges: Vec<(usize, usize)>,
    /// Layout-only edges between consecutive components.
    pub phantom_edges: Vec<(usize, usize)>,
    /// Weakly-connected components in discovery order, members ascending.
    pub components: Vec<Vec<usize>>,
    pub ranks: Vec<usize>,
}

/// Lay out the heap below `origin` and register every node.
pub fn layout_graph(
    heap: &[HeapNode<'_>],
    origin: Vec2f,
    spacing: &GraphSpacing,
    registry: &mut RenderRegistry,
) -> GraphLayout {
    if heap.is_empty() {
        return GraphLayout::default();
    }
    let n = heap.len();
    let edges = pointer_edges(heap);
    let components = weak_components(n, &edges);
    let acyclic = break_cycles(n, &edges);

    let internal = RankGraph::new(n, &acyclic);
    let phantom_edges = phantom_edges(&internal, &components);

    let mut ranking_edges = acyclic;
    ranking_edges.extend_from_slice(&phantom_edges);
    let graph = RankGraph::new(n, &ranking_edges);

    let sizes: Vec<(f32, f32)> = heap
        .iter()
        .map(|h| (h.sized.width(), h.sized.height()))
        .collect();
    let layered = layout_layered(&graph, &sizes, spacing);

    let nodes: Vec<LaidOutNode> = heap
        .iter()
        .zip(&layered.centers)
        .map(|(h, c)| {
            h.sized.place(
                origin.x + c.x - h.sized.width() * 0.5,
                origin.y + c.y - h.sized.height() * 0.5,
            )
        })
        .collect();

    tracing::debug!(
        nodes = n,
        edges = edges.len(),
        components = components.len(),
        phantom = phantom_edges.len(),
        ranks = layered.order.len(),
        "heap graph laid out"
    );

    registry.register(&nodes);
    GraphLayout {
        nodes,
        edges,
        phantom_edges,
        components,
        ranks: layered.ranks,
    }
}

/// One edge per (source, target) pair whose target address belongs to a heap node.
/// When two nodes claim the same address, the first one wins.
fn pointer_edges(heap: &[HeapNode<'_>]) -> Vec<(usize, usize)> {
    let mut by_address: HashMap<Address, usize> = HashMap::new();
    for (idx, h) in heap.iter().enumerate() {
        if let Some(addr) = h.variable.address {
            by_address.entry(addr).or_insert(idx);
        }
    }
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();
    for (src, h) in heap.iter().enumerate() {
        for target in h.variable.pointer_targets() {
            if let Some(&dst) = by_address.get(&target) {
                if seen.insert((src, dst)) {
                    edges.push((src, dst));
                }
            }
        }
    }
    edges
}

/// Weakly-connected components, ordered by their smallest member.
fn weak_components(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut neighbours = vec![Vec::new(); n];
    for &(u, v) in edges {
        neighbours[u].push(v);
        neighbours[v].push(u);
    }
    let mut component_of = vec![usize::MAX; n];
    let mut components = Vec::new();
    for start in 0..n {
        if component_of[start] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = vec![start];
        component_of[start] = id;
        let mut head = 0;
        while head < members.len() {
            let u = members[head];
            head += 1;
            for &v in &neighbours[u] {
                if component_of[v] == usize::MAX {
                    component_of[v] = id;
                    members.push(v);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Acyclic copy of `edges`: DFS back-edges are reversed and self-loops dropped.
fn break_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    const UNSEEN: u8 = 0;
    const ACTIVE: u8 = 1;
    const DONE: u8 = 2;

    let mut succ = vec![Vec::new(); n];
    for &(u, v) in edges {
        succ[u].push(v);
    }
    for list in &mut succ {
        list.sort_unstable();
    }

    let mut state = vec![UNSEEN; n];
    let mut kept = BTreeSet::new();
    for root in 0..n {
        if state[root] != UNSEEN {
            continue;
        }
        state[root] = ACTIVE;
        let mut stack = vec![(root, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (u, next) = *top;
            if next == succ[u].len() {
                state[u] = DONE;
                stack.pop();
                continue;
            }
            top.1 += 1;
            let v = succ[u][next];
            if u == v {
                continue;
            }
            match state[v] {
                UNSEEN => {
                    kept.insert((u, v));
                    state[v] = ACTIVE;
                    stack.push((v, 0));
                }
                ACTIVE => {
                    kept.insert((v, u));
                }
                _ => {
                    kept.insert((u, v));
                }
            }
        }
    }
    kept.into_iter().collect()
}

/// Chain consecutive components: deepest sink of each to every source of the next.
fn phantom_edges(graph: &RankGraph, components: &[Vec<usize>]) -> Vec<(usize, usize)> {
    let ranks = assign_ranks(graph);
    let mut out = Vec::new();
    for pair in components.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        let deepest_sink = earlier
            .iter()
            .copied()
            .filter(|&v| graph.is_sink(v))
            .fold(None, |best: Option<usize>, v| match best {
                Some(b) if ranks[b] >= ranks[v] => Some(b),
                _ => Some(v),
            });
        let Some(sink) = deepest_sink else {
            continue;
        };
        out.extend(
            later
                .iter()
                .copied()
                .filter(|&v| graph.is_source(v))
                .map(|v| (sink, v)),
        );
    }
    out
}
