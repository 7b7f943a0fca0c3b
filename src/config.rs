//! Sizing and spacing constants.
//!
//! All values are in the same abstract screen units the renderer draws in.
//! Every field has a default, so a partial JSON config only overrides what it names.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Constants used by the dimension calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sizing {
    /// Floor on the character count used for card widths.
    pub min_width: f32,
    /// Screen units per character.
    pub char_width: f32,
    /// Added to every character-derived width.
    pub pad: f32,
    /// Multiplier applied to value text length.
    pub value_char_scale: f32,
    /// Height of a scalar or pointer card.
    pub base_height: f32,
    /// Header band reserved at the top of composite cards.
    pub title_height: f32,
    /// Vertical spacing between stacked fields.
    pub space_between: f32,
    /// Horizontal spacing between side-by-side fields.
    pub array_space_between: f32,
    /// Horizontal inset of fields inside their container.
    pub inset: f32,
    pub frame_char_width: f32,
    pub frame_min_width: f32,
    pub frame_min_height: f32,
    pub frame_title_height: f32,
    /// Distance from a frame's top edge to its first local.
    pub frame_body_offset: f32,
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            min_width: 5.0,
            char_width: 10.0,
            pad: 7.0,
            value_char_scale: 1.25,
            base_height: 50.0,
            title_height: 20.0,
            space_between: 15.0,
            array_space_between: 10.0,
            inset: 7.0,
            frame_char_width: 12.0,
            frame_min_width: 120.0,
            frame_min_height: 40.0,
            frame_title_height: 30.0,
            frame_body_offset: 40.0,
        }
    }
}

/// Separation parameters of the layered heap layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSpacing {
    /// Vertical gap between consecutive ranks.
    pub rank_sep: f32,
    /// Horizontal gap between nodes sharing a rank.
    pub node_sep: f32,
    /// Barycenter ordering sweeps (each sweep is one down and one up pass).
    pub order_sweeps: usize,
}

impl Default for GraphSpacing {
    fn default() -> Self {
        Self {
            rank_sep: 30.0,
            node_sep: 20.0,
            order_sweeps: 4,
        }
    }
}

/// Placement of the top-level columns of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSpacing {
    pub origin_x: f32,
    pub origin_y: f32,
    /// Vertical gap between globals and frames in the stack column.
    pub column_gap: f32,
    /// Horizontal gap between the stack column and the heap.
    pub heap_gap: f32,
}

impl Default for SceneSpacing {
    fn default() -> Self {
        Self {
            origin_x: 10.0,
            origin_y: 40.0,
            column_gap: 15.0,
            heap_gap: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub sizing: Sizing,
    pub graph: GraphSpacing,
    pub scene: SceneSpacing,
}

impl LayoutConfig {
    /// Read a (possibly partial) JSON config file.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path))
    }
}
