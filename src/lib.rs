//! Layout and geometry engine for program memory visualizations.
//!
//! Given one step of an execution trace (globals, stack frames with their locals,
//! heap values connected by pointers) this crate computes the size and position of
//! every card to draw and the pointer arrows between them. It never draws anything
//! itself.
//!
//! - [`model`] – decoded variables, frames and trace steps
//! - [`trace`] – loading and validating JSON trace documents
//! - [`dimensions`] – card sizing
//! - [`layout`] – linear, tree, grid and heap graph strategies
//! - [`registry`] – last rendered positions, for arrows and incremental re-rendering
//! - [`frame_label`] – display names of raw function signatures
//! - [`scene`] – full rendering passes over a trace step
//!
//! The binary `heapscope` lays out a trace file and prints the scene as JSON.

pub mod config;
pub mod dimensions;
pub mod frame_label;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod registry;
pub mod scene;
pub mod trace;
