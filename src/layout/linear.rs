use super::{LaidOutNode, SizedNode};
use crate::geometry::{Axis, Vec2f};
use crate::registry::RenderRegistry;

/// Place `nodes` one after another along `axis`, starting at `origin`.
///
/// A row advances x by each node's width plus `offset.x`; a column advances y by
/// each node's height plus `offset.y`. With `component_width`, a column centers every
/// node horizontally within that width, and a row centers the row as a whole.
pub fn layout_linear(
    nodes: &[SizedNode],
    origin: Vec2f,
    offset: Vec2f,
    axis: Axis,
    component_width: Option<f32>,
    registry: &mut RenderRegistry,
) -> Vec<LaidOutNode> {
    let mut x = origin.x;
    let mut y = origin.y;
    if let (Axis::Row, Some(cw)) = (axis, component_width) {
        x += (cw - row_extent(nodes, offset.x)) * 0.5;
    }

    let mut placed = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node_x = match (axis, component_width) {
            (Axis::Column, Some(cw)) => origin.x + (cw - node.width()) * 0.5,
            _ => x,
        };
        placed.push(node.place(node_x, y));
        match axis {
            Axis::Row => x += node.width() + offset.x,
            Axis::Column => y += node.height() + offset.y,
        }
    }

    registry.register(&placed);
    placed
}

/// Width of a row including the gaps between neighbours.
pub(crate) fn row_extent(nodes: &[SizedNode], gap: f32) -> f32 {
    let widths: f32 = nodes.iter().map(|n| n.width()).sum();
    widths + gap * nodes.len().saturating_sub(1) as f32
}
