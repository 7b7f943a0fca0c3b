//! Full rendering passes over a trace step.
//!
//! A [`Visualizer`] owns the render registry and the per-frame expansion state and
//! turns a [`TraceStep`] into a [`Scene`]: every visible card with its position, plus
//! the pointer arrows between them.
//!
//! The stack column (globals first, then frames outermost first) sits at the
//! configured origin. The heap graph starts to its right. Nested values are laid out
//! inside their parent card:
//!
//! - struct fields in a centered column
//! - struct-array elements in a centered row
//! - linked-node fields with the tree layout
//! - matrix cells on the grid

use crate::config::LayoutConfig;
use crate::geometry::{Axis, RectF, Vec2f};
use crate::layout::{
    HeapNode, LaidOutNode, SizedNode, layout_graph, layout_grid, layout_linear, layout_tree,
};
use crate::model::{Address, StackFrame, TraceStep, VarValue, Variable, frame_changed};
use crate::registry::{Arrow, ArrowOwner, RenderRegistry};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the renderer needs for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Outer cards before their contents, stack before heap.
    pub nodes: Vec<LaidOutNode>,
    pub arrows: Vec<Arrow>,
    /// Bounding box of all nodes; `None` for an empty step.
    pub bounds: Option<RectF>,
}

/// Expansion state of frames, keyed by `unique_hash` so it survives stepping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    expanded: BTreeMap<String, bool>,
}

impl ViewState {
    /// Explicit user choice, otherwise expanded iff the frame is highlighted.
    /// [`ViewState::expansion`] also opens frames that hold a pointer target.
    pub fn is_expanded(&self, frame: &StackFrame) -> bool {
        self.expanded
            .get(&frame.unique_hash)
            .copied()
            .unwrap_or(frame.is_highlighted)
    }

    pub fn set_expanded(&mut self, unique_hash: impl Into<String>, expanded: bool) {
        self.expanded.insert(unique_hash.into(), expanded);
    }

    /// Expansion of every frame of `step`, in stack order.
    ///
    /// Frames without an explicit choice are also opened when one of their locals is
    /// the target of a pointer in a global, a heap value or an open frame, so the
    /// arrow has somewhere to land. A frame the user collapsed stays collapsed.
    pub fn expansion(&self, step: &TraceStep) -> Vec<bool> {
        let mut open: Vec<bool> = step.stack.iter().map(|f| self.is_expanded(f)).collect();
        loop {
            let targets: BTreeSet<Address> = step
                .globals
                .iter()
                .chain(&step.heap)
                .chain(
                    step.stack
                        .iter()
                        .zip(&open)
                        .filter(|(_, o)| **o)
                        .flat_map(|(f, _)| f.local_variables()),
                )
                .flat_map(|v| v.pointer_targets())
                .collect();
            let mut changed = false;
            for (frame, o) in step.stack.iter().zip(open.iter_mut()) {
                if *o || self.expanded.contains_key(&frame.unique_hash) {
                    continue;
                }
                if holds_target(frame, &targets) {
                    tracing::debug!(frame = %frame.unique_hash, "opening pointee frame");
                    *o = true;
                    changed = true;
                }
            }
            if !changed {
                return open;
            }
        }
    }
}

fn holds_target(frame: &StackFrame, targets: &BTreeSet<Address>) -> bool {
    frame.local_variables().into_iter().any(|local| {
        let mut hit = false;
        local.walk(&mut |v: &Variable| {
            hit |= v.address.is_some_and(|a| targets.contains(&a));
        });
        hit
    })
}

/// Layout driver that keeps registry and view state across steps.
#[derive(Debug, Default)]
pub struct Visualizer {
    pub config: LayoutConfig,
    pub view: ViewState,
    registry: RenderRegistry,
    last_step: Option<TraceStep>,
}

impl Visualizer {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn registry(&self) -> &RenderRegistry {
        &self.registry
    }

    /// Toggle a frame's body. Every position below it moves, so the registry is
    /// cleared.
    pub fn toggle_frame(&mut self, frame: &StackFrame) -> bool {
        let current = self
            .last_step
            .as_ref()
            .and_then(|step| {
                let idx = step
                    .stack
                    .iter()
                    .position(|f| f.unique_hash == frame.unique_hash)?;
                self.view.expansion(step).get(idx).copied()
            })
            .unwrap_or_else(|| self.view.is_expanded(frame));
        let expanded = !current;
        self.view.set_expanded(frame.unique_hash.clone(), expanded);
        tracing::debug!(frame = %frame.unique_hash, expanded, "frame toggled");
        self.registry.clear();
        expanded
    }

    /// Prepare the registry for moving from `prev` to `cur`.
    ///
    /// Without `incremental` (or without a previous step) the registry is cleared.
    /// Otherwise only collapsed, non-highlighted frames whose locals changed since
    /// `prev` are forgotten, so they are registered afresh.
    pub fn change_step(&mut self, prev: Option<&TraceStep>, cur: &TraceStep, incremental: bool) {
        let Some(prev) = prev.filter(|_| incremental) else {
            self.registry.clear();
            return;
        };
        let open = self.view.expansion(cur);
        for (frame, open) in cur.stack.iter().zip(open) {
            if frame.is_highlighted || open {
                continue;
            }
            if let Some(before) = prev.frame_by_hash(&frame.unique_hash) {
                if frame_changed(before, frame) {
                    tracing::debug!(frame = %frame.unique_hash, "collapsed frame changed");
                    self.registry.clear_frame(&frame.unique_hash);
                }
            }
        }
    }

    /// Move to `step` (see [`Visualizer::change_step`]) and render it.
    pub fn show(&mut self, step: &TraceStep, incremental: bool) -> Scene {
        let prev = self.last_step.take();
        self.change_step(prev.as_ref(), step, incremental);
        let scene = self.render(step);
        self.last_step = Some(step.clone());
        scene
    }

    /// One full layout pass over `step`.
    pub fn render(&mut self, step: &TraceStep) -> Scene {
        let pass = self.registry.begin_pass();
        let cfg = self.config;
        let sizing = &cfg.sizing;
        let origin = Vec2f::new(cfg.scene.origin_x, cfg.scene.origin_y);
        let column_offset = Vec2f::new(0.0, cfg.scene.column_gap);
        let mut nodes = Vec::new();

        // Stack column: globals, then frames.
        let globals: Vec<SizedNode> = step
            .globals
            .iter()
            .map(|v| SizedNode::variable(v, sizing))
            .collect();
        let placed_globals = layout_linear(
            &globals,
            origin,
            column_offset,
            Axis::Column,
            None,
            &mut self.registry,
        );
        let frames_y = placed_globals
            .last()
            .map(|n| n.bottom() + cfg.scene.column_gap)
            .unwrap_or(origin.y);

        let expanded = self.view.expansion(step);
        let frames: Vec<SizedNode> = step
            .stack
            .iter()
            .zip(&expanded)
            .map(|(f, &open)| SizedNode::frame(f, open, sizing))
            .collect();
        let placed_frames = layout_linear(
            &frames,
            Vec2f::new(origin.x, frames_y),
            column_offset,
            Axis::Column,
            None,
            &mut self.registry,
        );

        let stack_right = placed_globals
            .iter()
            .chain(&placed_frames)
            .map(|n| n.right())
            .fold(origin.x, f32::max);

        for (var, node) in step.globals.iter().zip(&placed_globals) {
            nodes.push(node.clone());
            let owner = ArrowOwner::Heap(var.identity.clone());
            self.place_contents(var, node, &owner, &mut nodes);
        }

        for ((frame, node), &open) in step.stack.iter().zip(&placed_frames).zip(&expanded) {
            nodes.push(node.clone());
            if open {
                self.place_locals(frame, node, &mut nodes);
            }
        }

        // Heap graph to the right of the stack column.
        let heap: Vec<HeapNode<'_>> = step
            .heap
            .iter()
            .map(|v| HeapNode::new(v, sizing))
            .collect();
        let graph = layout_graph(
            &heap,
            Vec2f::new(stack_right + cfg.scene.heap_gap, origin.y),
            &cfg.graph,
            &mut self.registry,
        );
        for (var, node) in step.heap.iter().zip(&graph.nodes) {
            nodes.push(node.clone());
            let owner = ArrowOwner::Heap(var.identity.clone());
            self.place_contents(var, node, &owner, &mut nodes);
        }

        let stale = self.registry.prune_stale();
        if stale > 0 {
            tracing::debug!(pass, stale, "dropped positions from earlier passes");
        }
        let arrows = self.registry.resolve_arrows();
        let bounds = nodes
            .iter()
            .map(|n| n.rect())
            .reduce(|acc, r| acc.union(r));

        tracing::info!(
            pass,
            nodes = nodes.len(),
            arrows = arrows.len(),
            heap_components = graph.components.len(),
            "layout pass complete"
        );

        Scene {
            nodes,
            arrows,
            bounds,
        }
    }

    fn place_locals(&mut self, frame: &StackFrame, node: &LaidOutNode, out: &mut Vec<LaidOutNode>) {
        let sizing = self.config.sizing;
        let locals = frame.local_variables();
        let sized: Vec<SizedNode> = locals
            .iter()
            .map(|v| SizedNode::variable(v, &sizing))
            .collect();
        let placed = layout_linear(
            &sized,
            Vec2f::new(node.x + sizing.inset, node.y + sizing.frame_body_offset),
            Vec2f::new(0.0, sizing.space_between),
            Axis::Column,
            Some(node.width - 2.0 * sizing.inset),
            &mut self.registry,
        );
        let owner = ArrowOwner::Frame(frame.unique_hash.clone());
        for (var, local) in locals.into_iter().zip(&placed) {
            out.push(local.clone());
            self.place_contents(var, local, &owner, out);
        }
    }

    /// Register `var`'s outgoing arrow, then lay out and recurse into its children.
    fn place_contents(
        &mut self,
        var: &Variable,
        node: &LaidOutNode,
        owner: &ArrowOwner,
        out: &mut Vec<LaidOutNode>,
    ) {
        let sizing = self.config.sizing;
        let inner_width = node.width - 2.0 * sizing.inset;
        let body = Vec2f::new(node.x + sizing.inset, node.y + sizing.title_height);

        let (children, placed): (Vec<&Variable>, Vec<LaidOutNode>) = match &var.value {
            VarValue::Scalar(_) => return,
            VarValue::Pointer(target) => {
                if let Some(addr) = target {
                    self.registry.register_arrow(owner, node.anchor_out(), *addr);
                }
                return;
            }
            VarValue::Struct(fields) => {
                let children: Vec<&Variable> = fields.values().collect();
                let placed = layout_linear(
                    &self.sized(&children),
                    body,
                    Vec2f::new(0.0, sizing.space_between),
                    Axis::Column,
                    Some(inner_width),
                    &mut self.registry,
                );
                (children, placed)
            }
            VarValue::StructArray(items) => {
                let children: Vec<&Variable> = items.iter().collect();
                let placed = layout_linear(
                    &self.sized(&children),
                    Vec2f::new(body.x, body.y + sizing.space_between * 0.5),
                    Vec2f::new(sizing.array_space_between, 0.0),
                    Axis::Row,
                    Some(inner_width),
                    &mut self.registry,
                );
                (children, placed)
            }
            VarValue::Tree(fields) => {
                let (plain, pointers): (Vec<&Variable>, Vec<&Variable>) =
                    fields.values().partition(|f| !f.is_pointer());
                let placed = layout_tree(
                    &self.sized(&plain),
                    &self.sized(&pointers),
                    body,
                    Vec2f::new(sizing.array_space_between, sizing.space_between),
                    inner_width,
                    &mut self.registry,
                );
                let mut children = plain;
                children.extend(pointers);
                (children, placed)
            }
            VarValue::Matrix(rows) => {
                let sized_rows: Vec<Vec<SizedNode>> = rows
                    .iter()
                    .map(|row| row.iter().map(|c| SizedNode::variable(c, &sizing)).collect())
                    .collect();
                let Some(placed) = layout_grid(
                    &sized_rows,
                    Vec2f::new(node.x, body.y + sizing.space_between * 0.5),
                    Vec2f::ZERO,
                    Some(node.width),
                    &mut self.registry,
                ) else {
                    return;
                };
                (rows.iter().flatten().collect(), placed)
            }
        };

        for (child, child_node) in children.into_iter().zip(&placed) {
            out.push(child_node.clone());
            self.place_contents(child, child_node, owner, out);
        }
    }

    fn sized(&self, vars: &[&Variable]) -> Vec<SizedNode> {
        vars.iter()
            .map(|v| SizedNode::variable(v, &self.config.sizing))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutDoc – binary serialization wrapper
// ────────────────────────────────────────────────────────────────────────────

const MAGIC: &[u8; 9] = b"HEAPSCOPE";
const VERSION: u32 = 1;

/// A rendered scene tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDoc {
    pub step: usize,
    pub scene: Scene,
}

impl LayoutDoc {
    /// Save the LayoutDoc to a binary file with magic bytes and versioning.
    pub fn save_to_binary<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        std::io::Write::write_all(&mut writer, MAGIC)?;
        std::io::Write::write_all(&mut writer, &VERSION.to_le_bytes())?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .context("Failed to encode layout document")?;
        Ok(())
    }

    /// Load a LayoutDoc from a binary file, checking magic bytes and version.
    pub fn load_from_binary<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = std::io::BufReader::new(file);
        let mut magic = [0u8; 9];
        std::io::Read::read_exact(&mut reader, &mut magic)
            .with_context(|| format!("Failed to read header of {}", path.display()))?;
        if &magic != MAGIC {
            anyhow::bail!("Invalid magic bytes: expected 'HEAPSCOPE'");
        }
        let mut version_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut version_bytes)
            .with_context(|| format!("Failed to read header of {}", path.display()))?;
        let version = u32::from_le_bytes(version_bytes);
        if version != VERSION {
            anyhow::bail!("Unsupported version: {}", version);
        }
        let doc: LayoutDoc =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .context("Failed to decode layout document")?;
        Ok(doc)
    }
}
