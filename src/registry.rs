//! Positions of the most recent layout pass, for arrow drawing and frame diffing.
//!
//! The registry is an explicit store owned by the caller and handed to every layout
//! strategy by `&mut`, so only the pass currently running can write to it.
//!
//! Variables are keyed by heap address and frames by their `unique_hash`.
//! Addresses may be reused after a free, so within one pass the first
//! identity to claim an address keeps it. A later pass, or [`RenderRegistry::clear`],
//! lets a different identity take the address over.
//!
//! Arrows are registered separately from positions:
//!
//! - arrows leaving frame locals belong to their frame and disappear with
//!   [`RenderRegistry::clear_frame`]
//! - arrows leaving heap (or global) values belong to the owning identity and only
//!   disappear with [`RenderRegistry::clear`]

use crate::geometry::Vec2f;
use crate::layout::{LaidOutNode, NodeRef};
use crate::model::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last known placement of a variable or frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub node: LaidOutNode,
    /// Pass that wrote this entry.
    pub pass: u64,
}

impl RegistryEntry {
    pub fn identity(&self) -> &str {
        self.node.source.key()
    }
}

/// Who registered an arrow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArrowOwner {
    /// A local of the frame with this `unique_hash`.
    Frame(String),
    /// A heap or global value with this identity.
    Heap(String),
}

#[derive(Debug, Clone, PartialEq)]
struct ArrowSpec {
    from: Vec2f,
    target: Address,
    pass: u64,
}

/// A pointer arrow whose target resolved to a registered position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub owner: ArrowOwner,
    pub from: Vec2f,
    pub to: Vec2f,
    pub target: Address,
}

#[derive(Debug, Default)]
pub struct RenderRegistry {
    pass: u64,
    by_address: BTreeMap<Address, RegistryEntry>,
    by_frame: BTreeMap<String, RegistryEntry>,
    frame_arrows: BTreeMap<String, Vec<ArrowSpec>>,
    heap_arrows: BTreeMap<String, Vec<ArrowSpec>>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new layout pass. Entries written before are no longer current.
    pub fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.pass
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Record placed nodes. Variables without an address are not tracked.
    pub fn register(&mut self, nodes: &[LaidOutNode]) {
        for node in nodes {
            match &node.source {
                NodeRef::Variable {
                    address: Some(addr),
                    identity,
                    ..
                } => {
                    if let Some(existing) = self.by_address.get(addr) {
                        if existing.pass == self.pass && existing.identity() != identity.as_str() {
                            tracing::debug!(
                                address = *addr,
                                kept = existing.identity(),
                                rejected = identity.as_str(),
                                "address already claimed in this pass"
                            );
                            continue;
                        }
                    }
                    self.by_address.insert(
                        *addr,
                        RegistryEntry {
                            node: node.clone(),
                            pass: self.pass,
                        },
                    );
                }
                NodeRef::Variable { address: None, .. } => {}
                NodeRef::Frame { unique_hash, .. } => {
                    self.by_frame.insert(
                        unique_hash.clone(),
                        RegistryEntry {
                            node: node.clone(),
                            pass: self.pass,
                        },
                    );
                }
            }
        }
    }

    pub fn lookup_by_address(&self, address: Address) -> Option<&RegistryEntry> {
        self.by_address.get(&address)
    }

    pub fn lookup_by_frame(&self, unique_hash: &str) -> Option<&RegistryEntry> {
        self.by_frame.get(unique_hash)
    }

    /// Record an arrow starting at `from` and pointing at `target`. Arrows left over
    /// from an earlier pass for the same owner are replaced.
    pub fn register_arrow(&mut self, owner: &ArrowOwner, from: Vec2f, target: Address) {
        let pass = self.pass;
        let list = match owner {
            ArrowOwner::Frame(hash) => self.frame_arrows.entry(hash.clone()).or_default(),
            ArrowOwner::Heap(identity) => self.heap_arrows.entry(identity.clone()).or_default(),
        };
        list.retain(|a| a.pass == pass);
        list.push(ArrowSpec { from, target, pass });
    }

    /// Arrows registered during the current pass whose target was placed during the
    /// current pass. Unresolved targets are skipped.
    pub fn resolve_arrows(&self) -> Vec<Arrow> {
        let frames = self
            .frame_arrows
            .iter()
            .map(|(k, v)| (ArrowOwner::Frame(k.clone()), v));
        let heap = self
            .heap_arrows
            .iter()
            .map(|(k, v)| (ArrowOwner::Heap(k.clone()), v));

        let mut out = Vec::new();
        for (owner, specs) in frames.chain(heap) {
            for spec in specs.iter().filter(|s| s.pass == self.pass) {
                match self
                    .lookup_by_address(spec.target)
                    .filter(|e| e.pass == self.pass)
                {
                    Some(entry) => out.push(Arrow {
                        owner: owner.clone(),
                        from: spec.from,
                        to: entry.node.anchor_in(),
                        target: spec.target,
                    }),
                    None => tracing::debug!(
                        target_address = spec.target,
                        ?owner,
                        "skipping arrow to unregistered address"
                    ),
                }
            }
        }
        out
    }

    /// Number of arrows held for `owner`, current or not.
    pub fn arrow_count(&self, owner: &ArrowOwner) -> usize {
        match owner {
            ArrowOwner::Frame(hash) => self.frame_arrows.get(hash).map_or(0, |v| v.len()),
            ArrowOwner::Heap(identity) => self.heap_arrows.get(identity).map_or(0, |v| v.len()),
        }
    }

    /// Drop positions and arrows not written during the current pass: freed heap
    /// blocks, popped frames and values that are no longer visible. Returns the number
    /// of positions removed.
    pub fn prune_stale(&mut self) -> usize {
        let pass = self.pass;
        let before = self.by_address.len() + self.by_frame.len();
        self.by_address.retain(|_, e| e.pass == pass);
        self.by_frame.retain(|_, e| e.pass == pass);
        for arrows in self.frame_arrows.values_mut().chain(self.heap_arrows.values_mut()) {
            arrows.retain(|a| a.pass == pass);
        }
        self.frame_arrows.retain(|_, v| !v.is_empty());
        self.heap_arrows.retain(|_, v| !v.is_empty());
        before - self.by_address.len() - self.by_frame.len()
    }

    /// Forget one frame's position and the arrows leaving its locals.
    pub fn clear_frame(&mut self, unique_hash: &str) {
        self.by_frame.remove(unique_hash);
        self.frame_arrows.remove(unique_hash);
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.by_address.clear();
        self.by_frame.clear();
        self.frame_arrows.clear();
        self.heap_arrows.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
            && self.by_frame.is_empty()
            && self.frame_arrows.is_empty()
            && self.heap_arrows.is_empty()
    }
}
