//! Print the computed card size of every variable in a trace step.
//!
//! Usage:
//!   cargo run --example dump_dimensions -- <trace.json> [--step N] [--config sizing.json]

use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use heapscope::config::LayoutConfig;
use heapscope::dimensions::{dimensions_of, frame_dimensions};
use heapscope::model::{Trace, Variable};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print card dimensions for a trace step", long_about = None)]
struct Args {
    /// Trace document (JSON)
    #[arg(value_name = "TRACE_FILE")]
    file: String,

    /// Step to inspect (defaults to the last one)
    #[arg(long)]
    step: Option<usize>,

    /// JSON file overriding sizing constants
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let trace = Trace::load(Utf8PathBuf::from(&args.file))?;
    let config = match &args.config {
        Some(p) => LayoutConfig::load(Utf8PathBuf::from(p))?,
        None => LayoutConfig::default(),
    };
    let idx = args.step.unwrap_or(trace.steps.len().saturating_sub(1));
    let Some(step) = trace.steps.get(idx) else {
        bail!("step {} out of range (trace has {})", idx, trace.steps.len());
    };
    let sizing = &config.sizing;

    println!("{:<40} {:>8} {:>8} {:>8}", "identity", "width", "height", "center");
    for frame in &step.stack {
        let d = frame_dimensions(frame, true, sizing);
        println!(
            "{:<40} {:>8.1} {:>8.1} {:>8.1}",
            frame.unique_hash, d.width, d.height, d.center_offset
        );
    }
    let roots = step
        .globals
        .iter()
        .chain(step.stack.iter().flat_map(|f| f.local_variables()))
        .chain(&step.heap);
    for root in roots {
        root.walk(&mut |v: &Variable| {
            let d = dimensions_of(v, sizing);
            println!(
                "{:<40} {:>8.1} {:>8.1} {:>8.1}",
                v.identity, d.width, d.height, d.center_offset
            );
        });
    }
    Ok(())
}
