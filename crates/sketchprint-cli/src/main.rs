//! sketchprint command-line tool.

mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sketchprint_core::{CanvasService, DocumentSnapshot, ShapeRegistry};
use sketchprint_render::{RenderConfig, RenderReport, render_document_to, render_snapshot_to};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Build vector shape scenes and print them to PDF
#[derive(Parser, Debug)]
#[command(name = "sketchprint")]
#[command(version, about, long_about = None)]
struct Args {
    /// Render settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Document title, overrides the config file
    #[arg(long, global = true)]
    title: Option<String>,

    /// Pull shapes onto the page before drawing
    #[arg(long, global = true)]
    optimize: bool,

    /// Write uncompressed content streams
    #[arg(long, global = true)]
    no_compress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document snapshot to PDF
    Render {
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
        #[arg(short, long, value_name = "PDF")]
        output: PathBuf,
    },
    /// Run a script of document operations, then render the result
    Run {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(short, long, value_name = "PDF")]
        output: Option<PathBuf>,
        /// Also save the resulting document snapshot
        #[arg(long, value_name = "JSON")]
        snapshot: Option<PathBuf>,
        /// Log failing steps and continue
        #[arg(long)]
        keep_going: bool,
    },
    /// List supported shape types
    Types,
    /// Print the field schema of a shape type
    Schema {
        #[arg(value_name = "TYPE")]
        shape_type: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::Render { snapshot, output } => {
            let json = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("reading {}", snapshot.display()))?;
            let snap = DocumentSnapshot::from_json(&json).context("parsing snapshot")?;
            let config = with_image_root(config, &snapshot);
            let sink = create(&output)?;
            let report = render_snapshot_to(&snap, sink, &config)?;
            print_report(&report)?;
        }
        Command::Run {
            script,
            output,
            snapshot,
            keep_going,
        } => {
            let json = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let steps = script::parse(&json)?;
            let mut service = CanvasService::default();
            let outcomes = script::run(&mut service, &steps, keep_going)?;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            log::info!("Ran {} steps ({} failed)", outcomes.len(), failed);
            for outcome in &outcomes {
                log::debug!("{}: {:?}", outcome.op, outcome.result);
            }

            let document = service.into_document();
            if let Some(path) = &snapshot {
                std::fs::write(path, document.to_json()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            match &output {
                Some(path) => {
                    let config = with_image_root(config, &script);
                    let report = render_document_to(&document, create(path)?, &config)?;
                    print_report(&report)?;
                }
                None if snapshot.is_none() => println!("{}", document.to_json()?),
                None => {}
            }
        }
        Command::Types => {
            for tag in ShapeRegistry::new().supported_types() {
                println!("{tag}");
            }
        }
        Command::Schema { shape_type } => {
            let schema = ShapeRegistry::new()
                .schema(&shape_type)
                .with_context(|| format!("unknown shape type: {shape_type}"))?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(title) = &args.title {
        config.title = Some(title.clone());
    }
    if args.optimize {
        config.optimize_for_print = true;
    }
    if args.no_compress {
        config.compress = false;
    }
    Ok(config)
}

/// Relative image paths resolve next to the input file unless configured.
fn with_image_root(mut config: RenderConfig, input: &Path) -> RenderConfig {
    if config.image_root.is_none() {
        config.image_root = input.parent().map(Path::to_path_buf);
    }
    config
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn print_report(report: &RenderReport) -> Result<()> {
    for skipped in &report.skipped {
        eprintln!("skipped element {}: {}", skipped.index, skipped.reason);
    }
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
