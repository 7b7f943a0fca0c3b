//! Card sizing.
//!
//! [`dimensions_of`] maps a variable to the size of the card that draws it,
//! recursing through nested values. Pointer targets are sized on their own and
//! never followed, so the recursion always terminates.
//!
//! Widths of leaf cards are derived from text length in characters:
//!
//! ```text
//! title_w = len(type) + len(name) + 2
//! value_w = len(value) * value_char_scale + 2
//! width   = max(title_w, value_w, min_width) * char_width + pad
//! ```
//!
//! Composite cards add a title band of `title_height` above their fields.

use crate::config::Sizing;
use crate::frame_label::frame_title;
use crate::geometry::Dimensions;
use crate::model::{StackFrame, VarValue, Variable};

/// Size of the card that draws `var`.
pub fn dimensions_of(var: &Variable, sizing: &Sizing) -> Dimensions {
    let (width, height) = match &var.value {
        VarValue::Scalar(_) => {
            let chars = title_chars(var)
                .max(value_chars(var, sizing))
                .max(sizing.min_width);
            (char_px(chars, sizing), sizing.base_height)
        }
        VarValue::Pointer(_) => (title_px(var, sizing), sizing.base_height),
        VarValue::Struct(fields) => {
            let dims: Vec<Dimensions> = fields.values().map(|f| dimensions_of(f, sizing)).collect();
            let widest = widest(&dims);
            let height = sizing.title_height
                + dims
                    .iter()
                    .map(|d| d.height + sizing.space_between)
                    .sum::<f32>();
            (
                title_px(var, sizing).max(widest + 2.0 * sizing.inset),
                height,
            )
        }
        VarValue::StructArray(items) => {
            let dims: Vec<Dimensions> = items.iter().map(|f| dimensions_of(f, sizing)).collect();
            let width = row_width(&dims, sizing.array_space_between) + 2.0 * sizing.inset;
            let height = sizing.title_height + sizing.space_between + tallest(&dims);
            (width, height)
        }
        VarValue::Tree(fields) => {
            let (plain, pointers): (Vec<&Variable>, Vec<&Variable>) =
                fields.values().partition(|f| !f.is_pointer());
            let plain: Vec<Dimensions> = plain.iter().map(|f| dimensions_of(f, sizing)).collect();
            let pointers: Vec<Dimensions> =
                pointers.iter().map(|f| dimensions_of(f, sizing)).collect();
            let stacked = plain
                .iter()
                .map(|d| d.height + sizing.space_between)
                .sum::<f32>();
            let height =
                sizing.title_height + stacked + tallest(&pointers) + sizing.space_between;
            let body = widest(&plain).max(row_width(&pointers, sizing.array_space_between));
            (title_px(var, sizing).max(body + 2.0 * sizing.inset), height)
        }
        VarValue::Matrix(rows) => {
            let (cell_w, cell_h) = matrix_cell_size(rows, sizing);
            let cols = rows.first().map(|r| r.len()).unwrap_or(0);
            let width = cols as f32 * cell_w;
            let height = rows.len() as f32 * cell_h + sizing.title_height + sizing.space_between;
            (width, height)
        }
    };
    Dimensions::new(width, height, sizing.title_height)
}

/// Largest cell width and height over the whole matrix; every cell is drawn at this size.
pub fn matrix_cell_size(rows: &[Vec<Variable>], sizing: &Sizing) -> (f32, f32) {
    rows.iter()
        .flatten()
        .map(|cell| dimensions_of(cell, sizing))
        .fold((0.0f32, 0.0f32), |(w, h), d| (w.max(d.width), h.max(d.height)))
}

/// Size of a frame card. Collapsed frames show only their title.
pub fn frame_dimensions(frame: &StackFrame, expanded: bool, sizing: &Sizing) -> Dimensions {
    let locals: Vec<Dimensions> = frame
        .local_variables()
        .into_iter()
        .map(|v| dimensions_of(v, sizing))
        .collect();
    let label_w = frame_title(frame).chars().count() as f32 * sizing.frame_char_width;
    let width = label_w
        .max(sizing.frame_min_width)
        .max(widest(&locals) + 2.0 * sizing.inset);
    let height = if expanded {
        let body = locals
            .iter()
            .map(|d| d.height + sizing.space_between)
            .sum::<f32>();
        (sizing.frame_title_height + body + sizing.space_between + 5.0).max(sizing.frame_min_height)
    } else {
        sizing.frame_min_height
    };
    Dimensions::new(width, height, sizing.frame_title_height.min(height))
}

fn title_chars(var: &Variable) -> f32 {
    (var.type_name.chars().count() + var.name.chars().count() + 2) as f32
}

fn value_chars(var: &Variable, sizing: &Sizing) -> f32 {
    var.value_string().chars().count() as f32 * sizing.value_char_scale + 2.0
}

fn char_px(chars: f32, sizing: &Sizing) -> f32 {
    chars * sizing.char_width + sizing.pad
}

fn title_px(var: &Variable, sizing: &Sizing) -> f32 {
    char_px(title_chars(var).max(sizing.min_width), sizing)
}

fn widest(dims: &[Dimensions]) -> f32 {
    dims.iter().fold(0.0, |acc, d| acc.max(d.width))
}

fn tallest(dims: &[Dimensions]) -> f32 {
    dims.iter().fold(0.0, |acc, d| acc.max(d.height))
}

/// Total width of nodes placed side by side with `gap` between neighbours.
fn row_width(dims: &[Dimensions], gap: f32) -> f32 {
    let sum = dims.iter().map(|d| d.width).sum::<f32>();
    sum + gap * dims.len().saturating_sub(1) as f32
}
