use super::{LaidOutNode, SizedNode};
use crate::geometry::Vec2f;
use crate::registry::RenderRegistry;

/// Place a matrix of nodes on a uniform grid.
///
/// Every cell takes the size of the largest cell, and each placed node is resized
/// to it, keeping its title band so incoming arrows aim at the new body center. Cell `(i, j)` lands at
/// `origin + (j * (cell_w + offset.x) + correction, i * (cell_h + offset.y))`, where
/// `correction` centers the grid within `component_width` when one is given.
///
/// Returns `None` when the grid has no cells. Output is row-major.
pub fn layout_grid(
    rows: &[Vec<SizedNode>],
    origin: Vec2f,
    offset: Vec2f,
    component_width: Option<f32>,
    registry: &mut RenderRegistry,
) -> Option<Vec<LaidOutNode>> {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if cols == 0 {
        return None;
    }
    let (cell_w, cell_h) = rows
        .iter()
        .flatten()
        .fold((0.0f32, 0.0f32), |(w, h), n| (w.max(n.width()), h.max(n.height())));
    let grid_w = cols as f32 * cell_w + (cols - 1) as f32 * offset.x;
    let correction = component_width
        .map(|cw| (cw - grid_w) * 0.5)
        .unwrap_or(0.0);

    let mut placed = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
        let y = origin.y + i as f32 * (cell_h + offset.y);
        for (j, node) in row.iter().enumerate() {
            let x = origin.x + j as f32 * (cell_w + offset.x) + correction;
            let cell = SizedNode::new(node.dims.resized(cell_w, cell_h), node.source.clone());
            placed.push(cell.place(x, y));
        }
    }

    registry.register(&placed);
    Some(placed)
}
