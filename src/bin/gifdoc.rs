use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gifdoc::{
    AnimationDocument, ConversionInput, ConversionQueue, ConvertOptions, Converter,
    ConverterConfig, OutputEncoding, StillFormat,
};

#[derive(Parser, Debug)]
#[command(name = "gifdoc", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a GIF into a JSON animation document.
    Convert(ConvertArgs),
    /// Convert a GIF and write a manifest plus one image file per frame.
    Export(ExportArgs),
    /// Convert several GIFs through the single-flight queue.
    Batch(BatchArgs),
    /// Print a summary of an existing animation document.
    Inspect(InspectArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatArg> for StillFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => StillFormat::Png,
            FormatArg::Jpeg => StillFormat::Jpeg,
            FormatArg::Webp => StillFormat::WebpLossless,
        }
    }
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Converter config JSON (limits, default delay, pool sizing).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Still-image format for frames (overrides the config).
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Encoder quality in 0.0..=1.0 (lossy formats only).
    #[arg(long, default_value_t = 0.92)]
    quality: f32,

    /// Embed frames as `{ mime, data }` blobs instead of data URLs.
    #[arg(long, default_value_t = false)]
    blob: bool,

    /// Reject inputs with more frames than this.
    #[arg(long)]
    max_frames: Option<u32>,

    /// Leave source metadata out of the document.
    #[arg(long, default_value_t = false)]
    no_metadata: bool,
}

impl PipelineArgs {
    fn converter(&self) -> anyhow::Result<Converter> {
        let mut cfg = match &self.config {
            Some(path) => ConverterConfig::from_path(path)?,
            None => ConverterConfig::default(),
        };
        if let Some(format) = self.format {
            cfg.still_format = format.into();
        }
        Ok(Converter::new(cfg)?)
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            output: if self.blob {
                OutputEncoding::Blob
            } else {
                OutputEncoding::DataUrl
            },
            quality: self.quality,
            max_frames: self.max_frames,
            include_metadata: !self.no_metadata,
        }
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input GIF.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Input GIF.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `manifest.json` and the frame images.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Input GIFs, converted in the order given.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving one `<name>.json` per input.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Animation document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::Export(args) => cmd_export(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let mut converter = args.pipeline.converter()?;
    let input = ConversionInput::from_path(&args.in_path)?;
    let doc = converter
        .convert(&input, &args.pipeline.options())
        .with_context(|| format!("convert '{}'", args.in_path.display()))?;
    gifdoc::write_json(&doc, &args.out)?;

    eprintln!(
        "wrote {} ({} frames, {} ms)",
        args.out.display(),
        doc.frame_count(),
        doc.duration()
    );
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut converter = args.pipeline.converter()?;
    let input = ConversionInput::from_path(&args.in_path)?;
    let doc = converter
        .convert(&input, &args.pipeline.options())
        .with_context(|| format!("convert '{}'", args.in_path.display()))?;
    let manifest = gifdoc::export_archive(&doc, &args.out_dir)?;

    eprintln!(
        "wrote {} frames to {}",
        manifest.frames.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "animation".to_string());
    format!("{stem}.json")
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let queue = ConversionQueue::spawn(args.pipeline.converter()?)?;
    let opts = args.pipeline.options();

    let mut handles = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let input = ConversionInput::from_path(path)?;
        handles.push((path, queue.enqueue(input, opts)));
    }
    tracing::debug!(status = ?queue.status(), "batch enqueued");

    let mut failures = 0usize;
    for (path, handle) in handles {
        match handle.wait() {
            Ok(doc) => {
                let out = args.out_dir.join(output_name(path));
                gifdoc::write_json(&doc, &out)?;
                eprintln!("wrote {}", out.display());
            }
            Err(e) => {
                failures += 1;
                eprintln!("failed {}: {e}", path.display());
            }
        }
    }

    anyhow::ensure!(
        failures == 0,
        "{failures} of {} conversions failed",
        args.inputs.len()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let f = std::fs::File::open(&args.in_path)
        .with_context(|| format!("open '{}'", args.in_path.display()))?;
    let doc = AnimationDocument::from_reader(std::io::BufReader::new(f))?;

    println!(
        "{}x{}, {} frames, {} ms, loop count {}",
        doc.width(),
        doc.height(),
        doc.frame_count(),
        doc.duration(),
        doc.loop_count()
    );
    if let Some(meta) = doc.metadata() {
        println!(
            "source: {} ({} bytes, {}), created {}",
            meta.filename, meta.size, meta.format, meta.created
        );
    }
    for frame in doc.frames() {
        println!(
            "  #{:<4} {:>5} ms  {}x{} at ({}, {})  disposal {}",
            frame.index,
            frame.delay,
            frame.width,
            frame.height,
            frame.x,
            frame.y,
            frame.disposal.code()
        );
    }
    Ok(())
}
