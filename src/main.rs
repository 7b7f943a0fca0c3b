use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use heapscope::config::LayoutConfig;
use heapscope::model::Trace;
use heapscope::scene::{LayoutDoc, ViewState, Visualizer};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out a memory trace and print the scene as JSON", long_about = None)]
struct Cli {
    /// Trace document (JSON)
    #[arg(value_name = "TRACE_FILE")]
    trace_file: String,

    /// Step to lay out (defaults to the last one)
    #[arg(long, conflicts_with = "all_steps")]
    step: Option<usize>,

    /// Lay out every step independently
    #[arg(long)]
    all_steps: bool,

    /// JSON file overriding sizing/spacing constants
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<String>,

    /// Show the body of the frame with this hash (repeatable)
    #[arg(long = "expand", value_name = "FRAME_HASH")]
    expand: Vec<String>,

    /// Hide the body of the frame with this hash (repeatable)
    #[arg(long = "collapse", value_name = "FRAME_HASH")]
    collapse: Vec<String>,

    /// Step through the trace from the start, diffing frames instead of clearing
    #[arg(long, conflicts_with = "all_steps")]
    incremental: bool,

    /// Also write the scene as a binary layout document
    #[arg(long, value_name = "OUT_FILE", conflicts_with = "all_steps")]
    binary: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = Utf8PathBuf::from(&cli.trace_file);
    let trace = Trace::load(&path)?;
    let config = match &cli.config {
        Some(p) => LayoutConfig::load(Utf8PathBuf::from(p))?,
        None => LayoutConfig::default(),
    };
    let mut view = ViewState::default();
    for hash in &cli.expand {
        view.set_expanded(hash.clone(), true);
    }
    for hash in &cli.collapse {
        view.set_expanded(hash.clone(), false);
    }
    tracing::info!(steps = trace.steps.len(), file = %path, "trace loaded");

    if cli.all_steps {
        let docs: Vec<LayoutDoc> = trace
            .steps
            .par_iter()
            .enumerate()
            .map(|(step, s)| {
                let mut vis = Visualizer::new(config);
                vis.view = view.clone();
                LayoutDoc {
                    step,
                    scene: vis.show(s, false),
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }

    if trace.steps.is_empty() {
        bail!("{} contains no steps", path);
    }
    let step = cli.step.unwrap_or(trace.steps.len() - 1);
    let Some(target) = trace.steps.get(step) else {
        bail!("step {} out of range (trace has {})", step, trace.steps.len());
    };

    let mut vis = Visualizer::new(config);
    vis.view = view;
    let scene = if cli.incremental {
        let mut scene = Default::default();
        for s in &trace.steps[..=step] {
            scene = vis.show(s, true);
        }
        scene
    } else {
        vis.show(target, false)
    };

    let doc = LayoutDoc { step, scene };
    if let Some(out) = &cli.binary {
        doc.save_to_binary(out)
            .with_context(|| format!("Failed to write {}", out))?;
    }
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
