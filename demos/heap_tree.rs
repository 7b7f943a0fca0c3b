//! Print what each stack local points at, as an ASCII tree.
//!
//! Usage:
//!   cargo run --example heap_tree -- <trace.json> [--step N]

use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use heapscope::model::{Address, Trace, TraceStep, Variable};
use std::collections::{BTreeSet, HashMap};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Print the heap reachable from each stack frame of a trace step"
)]
struct Cli {
    /// Trace document (JSON)
    #[arg(value_name = "TRACE_FILE")]
    trace_file: String,

    /// Step to print (defaults to the last one)
    #[arg(long)]
    step: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = Utf8PathBuf::from(&cli.trace_file);
    let trace = Trace::load(&path)?;
    let idx = cli.step.unwrap_or(trace.steps.len().saturating_sub(1));
    let Some(step) = trace.steps.get(idx) else {
        bail!("step {} out of range (trace has {})", idx, trace.steps.len());
    };

    let heap: HashMap<Address, &Variable> = step
        .heap
        .iter()
        .filter_map(|v| v.address.map(|a| (a, v)))
        .collect();

    for frame in &step.stack {
        println!("{}", heapscope::frame_label::frame_title(frame));
        let locals = frame.local_variables();
        for (i, local) in locals.iter().enumerate() {
            let last = i + 1 == locals.len();
            let mut seen = BTreeSet::new();
            print_var(local, &heap, "", last, &mut seen);
        }
    }
    print_unreachable(step, &heap);
    Ok(())
}

fn print_var(
    var: &Variable,
    heap: &HashMap<Address, &Variable>,
    prefix: &str,
    last: bool,
    seen: &mut BTreeSet<Address>,
) {
    let branch = if last { "└─" } else { "├─" };
    println!("{}{} {} {} = {}", prefix, branch, var.type_name, var.name, var.value_string());
    let new_prefix = format!("{}{}", prefix, if last { "   " } else { "│  " });

    let targets: Vec<Address> = var
        .pointer_targets()
        .into_iter()
        .filter(|a| seen.insert(*a))
        .collect();
    for (i, addr) in targets.iter().enumerate() {
        let last = i + 1 == targets.len();
        match heap.get(addr) {
            Some(target) => print_var(target, heap, &new_prefix, last, seen),
            None => println!(
                "{}{} <dangling 0x{:x}>",
                new_prefix,
                if last { "└─" } else { "├─" },
                addr
            ),
        }
    }
}

fn print_unreachable(step: &TraceStep, heap: &HashMap<Address, &Variable>) {
    let mut reachable = BTreeSet::new();
    let mut queue: Vec<Address> = step
        .stack
        .iter()
        .flat_map(|f| f.local_variables())
        .chain(&step.globals)
        .flat_map(|v| v.pointer_targets())
        .collect();
    while let Some(addr) = queue.pop() {
        if reachable.insert(addr) {
            if let Some(v) = heap.get(&addr) {
                queue.extend(v.pointer_targets());
            }
        }
    }
    let leaked: Vec<&Variable> = step
        .heap
        .iter()
        .filter(|v| v.address.is_some_and(|a| !reachable.contains(&a)))
        .collect();
    if !leaked.is_empty() {
        println!("unreachable");
        for (i, v) in leaked.iter().enumerate() {
            let branch = if i + 1 == leaked.len() { "└─" } else { "├─" };
            println!("{} {}", branch, v.identity);
        }
    }
}
