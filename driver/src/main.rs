use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use spillcore::processing::{Adjacency, Comparator, WindowShape};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{Overrides, WorkflowConfig};
use workflow::runner::Runner;

mod export;
mod generator;
mod gui_bridge;
mod source;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Oil spill screening over radar backscatter grids")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Smoothing radius in metres
    #[arg(long)]
    radius: Option<f64>,
    /// Smoothing window shape (square or circle)
    #[arg(long)]
    window: Option<WindowShape>,
    /// Backscatter cutoff in dB
    #[arg(long, allow_hyphen_values = true)]
    cutoff: Option<f32>,
    /// Comparator applied against the cutoff (lt, le, gt, ge)
    #[arg(long)]
    comparator: Option<Comparator>,
    /// Pixel connectivity for polygon extraction (four or eight)
    #[arg(long)]
    adjacency: Option<Adjacency>,
    /// Write polygons to this path (.geojson or .wkt)
    #[arg(long)]
    export: Option<PathBuf>,
    /// Append a one-line JSON report per run to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the HTTP bridge alive after the run
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let overrides = Overrides {
        radius: args.radius,
        window: args.window,
        cutoff: args.cutoff,
        comparator: args.comparator,
        adjacency: args.adjacency,
        export: args.export.clone(),
    };
    let workflow_config = if let Some(path) = args.workflow.as_ref() {
        let mut config = WorkflowConfig::load(path)?;
        config.apply(&overrides);
        config
    } else {
        WorkflowConfig::from_args(&overrides)
    };

    let runner = Runner::new(workflow_config);
    let result = runner.execute().context("running spill detection")?;
    let report = result.report();

    println!("Estimated Oil Spill Area (m²): {:.2}", report.area_m2);
    println!("Estimated Oil Spill Area (km²): {:.4}", report.area_km2);
    println!(
        "Polygons: {}, flagged cells: {}",
        report.polygon_count, report.flagged_cells
    );

    if let Some(path) = runner.export(&result)? {
        println!("Polygons written to {}", path.display());
    }

    if let Some(report_path) = args.report.as_ref() {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(&report).context("serialising run report")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)
            .with_context(|| format!("opening report log {}", report_path.display()))?;
        file.write_all(line.as_bytes())?;
    }

    if args.serve {
        let gui_bridge = GuiBridge::new(Arc::new(runner.clone()));
        gui_bridge.publish(&result.visualization());
        let _handle = gui_bridge.serve(args.bind)?;
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
