//! Trace loading.
//!
//! A trace is a JSON document `{"steps": [{"globals": [...], "stack": [...], "heap": [...]}]}`
//! produced by the debugger collaborator. Loading happens in three stages:
//!
//! - deserialize with serde (a `kind`/`value` mismatch fails here)
//! - normalize: fill missing names from map keys and derive missing identities
//!   from the owning path
//! - validate: reject descriptors the layout engine cannot size correctly
//!
//! Only malformed input produces an error; empty collections are legal.

use crate::model::{StackFrame, Trace, TraceStep, VarValue, Variable};
use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use std::collections::{BTreeMap, BTreeSet};

impl Trace {
    /// Parse, normalize and validate a trace document.
    pub fn from_json_str(text: &str) -> Result<Trace> {
        let mut trace: Trace =
            serde_json::from_str(text).context("Failed to deserialize trace document")?;
        for (idx, step) in trace.steps.iter_mut().enumerate() {
            normalize_step(step);
            validate_step(step).with_context(|| format!("Invalid trace step {}", idx))?;
        }
        Ok(trace)
    }

    /// Read a trace document from disk.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Trace> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load trace {}", path))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Fill names from map keys and derive identities for variables that lack one.
pub fn normalize_step(step: &mut TraceStep) {
    for var in &mut step.globals {
        let id = format!("global/{}", var.name);
        normalize_variable(var, id);
    }
    for frame in &mut step.stack {
        normalize_frame(frame);
    }
    for (idx, var) in step.heap.iter_mut().enumerate() {
        let id = match var.address {
            Some(addr) => format!("heap@0x{:x}", addr),
            None => format!("heap#{}", idx),
        };
        normalize_variable(var, id);
    }
}

fn normalize_frame(frame: &mut StackFrame) {
    if frame.ordered_varnames.is_empty() {
        frame.ordered_varnames = frame.locals.keys().cloned().collect();
    }
    for (name, var) in frame.locals.iter_mut() {
        if var.name.is_empty() {
            var.name = name.clone();
        }
        let id = format!("{}/{}", frame.unique_hash, name);
        normalize_variable(var, id);
    }
}

fn normalize_variable(var: &mut Variable, fallback_identity: String) {
    if var.identity.is_empty() {
        var.identity = fallback_identity;
    }
    let parent = var.identity.clone();
    match &mut var.value {
        VarValue::Scalar(_) | VarValue::Pointer(_) => {}
        VarValue::Struct(fields) | VarValue::Tree(fields) => {
            for (key, field) in fields.iter_mut() {
                if field.name.is_empty() {
                    field.name = key.clone();
                }
                normalize_variable(field, format!("{}.{}", parent, key));
            }
        }
        VarValue::StructArray(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                normalize_variable(item, format!("{}[{}]", parent, i));
            }
        }
        VarValue::Matrix(rows) => {
            for (i, row) in rows.iter_mut().enumerate() {
                for (j, cell) in row.iter_mut().enumerate() {
                    normalize_variable(cell, format!("{}[{}][{}]", parent, i, j));
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Check the structural invariants the layout engine relies on.
pub fn validate_step(step: &TraceStep) -> Result<()> {
    for var in &step.globals {
        validate_variable(var).with_context(|| format!("global '{}'", var.name))?;
    }

    let mut hashes = BTreeSet::new();
    for frame in &step.stack {
        if !hashes.insert(frame.unique_hash.as_str()) {
            bail!("duplicate frame hash '{}'", frame.unique_hash);
        }
        for name in &frame.ordered_varnames {
            let Some(var) = frame.locals.get(name) else {
                bail!(
                    "frame '{}' lists local '{}' which has no value",
                    frame.func_name,
                    name
                );
            };
            validate_variable(var)
                .with_context(|| format!("local '{}' of frame '{}'", name, frame.func_name))?;
        }
    }

    let mut seen: BTreeMap<u64, &str> = BTreeMap::new();
    for var in &step.heap {
        let Some(addr) = var.address else {
            bail!("heap variable '{}' has no address", var.identity);
        };
        if let Some(prev) = seen.insert(addr, var.identity.as_str()) {
            bail!(
                "heap address 0x{:x} claimed by both '{}' and '{}'",
                addr,
                prev,
                var.identity
            );
        }
        validate_variable(var).with_context(|| format!("heap variable '{}'", var.identity))?;
    }
    Ok(())
}

fn validate_variable(var: &Variable) -> Result<()> {
    match &var.value {
        VarValue::Scalar(_) | VarValue::Pointer(_) => Ok(()),
        VarValue::Struct(fields) | VarValue::Tree(fields) => {
            for (key, field) in fields {
                validate_variable(field).with_context(|| format!("field '{}'", key))?;
            }
            Ok(())
        }
        VarValue::StructArray(items) => {
            for (i, item) in items.iter().enumerate() {
                validate_variable(item).with_context(|| format!("element {}", i))?;
            }
            Ok(())
        }
        VarValue::Matrix(rows) => {
            let cols = rows.first().map(|r| r.len()).unwrap_or(0);
            for (i, row) in rows.iter().enumerate() {
                if row.len() != cols {
                    bail!(
                        "ragged matrix '{}': row {} has {} cells, expected {}",
                        var.name,
                        i,
                        row.len(),
                        cols
                    );
                }
                for (j, cell) in row.iter().enumerate() {
                    validate_variable(cell).with_context(|| format!("cell [{}][{}]", i, j))?;
                }
            }
            Ok(())
        }
    }
}
