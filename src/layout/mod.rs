//! Layout strategies.
//!
//! Every strategy takes nodes whose sizes are already final, assigns top-left
//! coordinates, registers the placed nodes in the
//! [`RenderRegistry`](crate::registry::RenderRegistry) and returns them
//! in input order. Sub-modules:
//!
//! - [`linear`] – row or column with uniform offsets
//! - [`tree`] – stacked plain fields with a row of pointer fields below
//! - [`grid`] – uniform-cell matrix
//! - [`graph`] – heap layout over pointer edges
//! - [`layered`] – the rank/order/coordinate passes used by [`graph`]

pub mod graph;
pub mod grid;
pub mod layered;
pub mod linear;
pub mod tree;

pub use graph::{GraphLayout, HeapNode, layout_graph};
pub use grid::layout_grid;
pub use linear::layout_linear;
pub use tree::layout_tree;

use crate::config::Sizing;
use crate::dimensions::{dimensions_of, frame_dimensions};
use crate::frame_label::frame_title;
use crate::geometry::{Dimensions, RectF, Vec2f};
use crate::model::{Address, StackFrame, Variable};
use serde::{Deserialize, Serialize};

/// Opaque reference from a placement back to what the renderer should draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeRef {
    Variable {
        identity: String,
        name: String,
        type_name: String,
        address: Option<Address>,
    },
    Frame {
        unique_hash: String,
        frame_id: u64,
        label: String,
    },
}

impl NodeRef {
    pub fn variable(var: &Variable) -> Self {
        NodeRef::Variable {
            identity: var.identity.clone(),
            name: var.name.clone(),
            type_name: var.type_name.clone(),
            address: var.address,
        }
    }

    pub fn frame(frame: &StackFrame) -> Self {
        NodeRef::Frame {
            unique_hash: frame.unique_hash.clone(),
            frame_id: frame.frame_id,
            label: frame_title(frame),
        }
    }

    /// Variable identity or frame hash.
    pub fn key(&self) -> &str {
        match self {
            NodeRef::Variable { identity, .. } => identity,
            NodeRef::Frame { unique_hash, .. } => unique_hash,
        }
    }
}

/// A node with final dimensions, waiting for coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedNode {
    pub dims: Dimensions,
    pub source: NodeRef,
}

impl SizedNode {
    pub fn new(dims: Dimensions, source: NodeRef) -> Self {
        Self { dims, source }
    }

    pub fn variable(var: &Variable, sizing: &Sizing) -> Self {
        Self::new(dimensions_of(var, sizing), NodeRef::variable(var))
    }

    pub fn frame(frame: &StackFrame, expanded: bool, sizing: &Sizing) -> Self {
        Self::new(frame_dimensions(frame, expanded, sizing), NodeRef::frame(frame))
    }

    pub fn width(&self) -> f32 {
        self.dims.width
    }

    pub fn height(&self) -> f32 {
        self.dims.height
    }

    pub fn place(&self, x: f32, y: f32) -> LaidOutNode {
        LaidOutNode {
            x,
            y,
            width: self.dims.width,
            height: self.dims.height,
            center_offset: self.dims.center_offset,
            source: self.source.clone(),
        }
    }
}

/// A positioned node produced by one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaidOutNode {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub center_offset: f32,
    pub source: NodeRef,
}

impl LaidOutNode {
    pub fn rect(&self) -> RectF {
        RectF::from_origin_size(Vec2f::new(self.x, self.y), self.width, self.height)
    }

    /// Where incoming arrows end: the left edge, level with the body center.
    pub fn anchor_in(&self) -> Vec2f {
        Vec2f::new(self.x, self.y + self.center_offset)
    }

    /// Where outgoing arrows start: the right edge, level with the body center.
    pub fn anchor_out(&self) -> Vec2f {
        Vec2f::new(self.x + self.width, self.y + self.center_offset)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}
