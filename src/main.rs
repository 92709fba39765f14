use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use timestream::io::{DirectorySink, DirectorySource};
use timestream::steps::{FileStatsStep, WriteFileStep};
use timestream::{Frame, Pipeline};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Process timestreams of images in parallel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a TSV audit (file name and size) of every image in a timestream
    Audit(AuditArgs),
    /// Copy a timestream to a new directory, optionally auditing it on the way
    Ingest(IngestArgs),
    /// Run a pipeline described by a JSON file
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input timestream directory
    input: PathBuf,

    /// Only read files with this extension
    #[arg(long, short = 'F')]
    informat: Option<String>,

    /// Number of parallel workers
    #[arg(long, short = 't', default_value_t = 1)]
    threads: usize,
}

#[derive(Args, Debug)]
struct AuditArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output TSV file name
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Save the report every N files
    #[arg(long, default_value_t = 1000)]
    checkpoint: u64,
}

#[derive(Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Also write an audit TSV here
    #[arg(long, short = 'a')]
    audit_output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Pipeline description (JSON)
    #[arg(long, short = 'p')]
    pipeline: PathBuf,

    /// Output TSV of the collected frame reports
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Save the report every N files
    #[arg(long, default_value_t = 1000)]
    checkpoint: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let interrupted = install_interrupt_handler();

    match cli.command {
        Command::Audit(args) => audit(args, &interrupted),
        Command::Ingest(args) => ingest(args, &interrupted),
        Command::Run(args) => run(args, &interrupted),
    }
}

/// First Ctrl-C asks the current run to wind down and save; a second one exits.
fn install_interrupt_handler() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("cannot listen for Ctrl-C: {err}");
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if handler_flag.swap(true, Ordering::SeqCst) {
                    warn!("interrupted again, exiting without saving");
                    std::process::exit(130);
                }
                warn!("interrupted, stopping after the current file (Ctrl-C again to abort)");
            }
        });
    });
    flag
}

fn load_frames(input: &InputArgs) -> Result<impl Iterator<Item = Frame>> {
    let mut source = DirectorySource::new(&input.input);
    if let Some(extension) = &input.informat {
        source = source.with_extension(extension);
    }
    let frames = source.frames()?.filter_map(|frame| match frame {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!("skipping file: {err}");
            None
        }
    });
    Ok(frames)
}

/// Pull every frame through `pipe`, checkpointing the report as it goes.
fn drive(
    pipe: &mut Pipeline,
    frames: impl Iterator<Item = Frame>,
    threads: usize,
    checkpoint: Option<(&Path, u64)>,
    interrupted: &AtomicBool,
) -> Result<()> {
    let mut run = pipe.process(frames, threads)?;
    while run.next().is_some() {
        if interrupted.load(Ordering::SeqCst) {
            warn!(processed = run.processed(), "stopping early");
            break;
        }
        if let Some((path, every)) = checkpoint {
            if every > 0 && run.processed() % every == 0 {
                run.report()
                    .save(path)
                    .with_context(|| format!("saving checkpoint to {}", path.display()))?;
                info!(processed = run.processed(), path = %path.display(), "checkpoint saved");
            }
        }
    }
    Ok(())
}

fn audit(args: AuditArgs, interrupted: &AtomicBool) -> Result<()> {
    let mut pipe = Pipeline::new().with_step(FileStatsStep);
    let frames = load_frames(&args.input)?;

    let outcome = drive(
        &mut pipe,
        frames,
        args.input.threads,
        Some((args.output.as_path(), args.checkpoint)),
        interrupted,
    );
    pipe.report()
        .save(&args.output)
        .with_context(|| format!("saving report to {}", args.output.display()))?;
    debug!("\n{}", pipe.monitor().generate_report());
    println!("Audited {}, found {} files", args.input.input.display(), pipe.processed());
    outcome
}

fn ingest(args: IngestArgs, interrupted: &AtomicBool) -> Result<()> {
    let mut pipe = Pipeline::new();
    pipe.add_step(WriteFileStep::new(DirectorySink::new(&args.output)));
    if args.audit_output.is_some() {
        pipe.add_step(Pipeline::new().with_step(FileStatsStep));
    }
    let frames = load_frames(&args.input)?;

    let outcome = drive(&mut pipe, frames, args.input.threads, None, interrupted);
    pipe.finish()?;
    if let Some(audit_output) = &args.audit_output {
        pipe.report()
            .save(audit_output)
            .with_context(|| format!("saving audit to {}", audit_output.display()))?;
    }
    debug!("\n{}", pipe.monitor().generate_report());
    println!(
        "Ingested {} to {}, found {} files",
        args.input.input.display(),
        args.output.display(),
        pipe.processed()
    );
    outcome
}

fn run(args: RunArgs, interrupted: &AtomicBool) -> Result<()> {
    let text = fs::read_to_string(&args.pipeline)
        .with_context(|| format!("reading pipeline {}", args.pipeline.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing pipeline {}", args.pipeline.display()))?;
    let mut pipe = Pipeline::from_json(config)?;
    let frames = load_frames(&args.input)?;

    let checkpoint = args.output.as_deref().map(|path| (path, args.checkpoint));
    let outcome = drive(&mut pipe, frames, args.input.threads, checkpoint, interrupted);
    pipe.finish()?;
    if let Some(output) = &args.output {
        pipe.report()
            .save(output)
            .with_context(|| format!("saving report to {}", output.display()))?;
    }
    debug!("\n{}", pipe.monitor().generate_report());
    println!("Processed {} files from {}", pipe.processed(), args.input.input.display());
    outcome
}
