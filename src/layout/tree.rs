use super::{LaidOutNode, SizedNode, layout_linear};
use crate::geometry::{Axis, Vec2f};
use crate::registry::RenderRegistry;

/// Lay out the fields of a linked node.
///
/// Plain fields are stacked in a column, each centered within `component_width`.
/// Pointer fields follow `offset.y` below the last plain field as a single centered
/// row with `offset.x` between neighbours, so their arrows all leave from the bottom
/// band of the card.
///
/// Returns the plain fields first, then the pointer fields, each in input order.
pub fn layout_tree(
    plain: &[SizedNode],
    pointers: &[SizedNode],
    origin: Vec2f,
    offset: Vec2f,
    component_width: f32,
    registry: &mut RenderRegistry,
) -> Vec<LaidOutNode> {
    let mut placed = layout_linear(
        plain,
        origin,
        offset,
        Axis::Column,
        Some(component_width),
        registry,
    );
    let row_y = placed
        .last()
        .map(|n| n.bottom() + offset.y)
        .unwrap_or(origin.y);
    placed.extend(layout_linear(
        pointers,
        Vec2f::new(origin.x, row_y),
        offset,
        Axis::Row,
        Some(component_width),
        registry,
    ));
    placed
}
