use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flipbook", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a sequence source and print the frame list as JSON.
    Resolve(ResolveArgs),
    /// Paint the frame for a scroll position into a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Sequence source JSON (`{"kind": "manual" | "pattern" | "manifest", ...}`).
    #[arg(long)]
    source: PathBuf,

    /// Frame cap override; falls back to `FLIPBOOK_MAX_FRAMES`, then the default.
    #[arg(long)]
    max_frames: Option<String>,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Playback progress in `[0, 1]`.
    #[arg(long, conflicts_with = "scroll_top")]
    progress: Option<f64>,

    /// Tracked region top relative to the viewport top, in pixels.
    #[arg(long, allow_hyphen_values = true, requires_all = ["track_height", "viewport_height"])]
    scroll_top: Option<f64>,

    /// Tracked region height, in pixels.
    #[arg(long)]
    track_height: Option<f64>,

    /// Viewport height, in pixels.
    #[arg(long)]
    viewport_height: Option<f64>,

    /// Surface width.
    #[arg(long)]
    width: u32,

    /// Surface height.
    #[arg(long)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory relative frames are read from (defaults to the source file's directory).
    #[arg(long, conflicts_with = "base")]
    root: Option<PathBuf>,

    /// Base URL relative frames are fetched from.
    #[arg(long)]
    base: Option<String>,

    /// Lazy window radius.
    #[arg(long, default_value_t = flipbook::DEFAULT_BUFFER_RADIUS)]
    buffer_radius: usize,

    /// How long to wait for the frame to load, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    wait_ms: u64,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Resolve(args) => cmd_resolve(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flipbook=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source_json(path: &Path) -> anyhow::Result<flipbook::SequenceSource> {
    let f = File::open(path).with_context(|| format!("open source '{}'", path.display()))?;
    let r = BufReader::new(f);
    let source: flipbook::SequenceSource =
        serde_json::from_reader(r).with_context(|| "parse sequence source JSON")?;
    Ok(source)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")
}

fn resolve(
    rt: &tokio::runtime::Runtime,
    args: &SourceArgs,
) -> anyhow::Result<flipbook::ResolvedSequence> {
    let source = read_source_json(&args.source)?;
    let mut opts = flipbook::ResolverOpts::from_env();
    if let Some(raw) = args.max_frames.as_deref() {
        opts.frame_cap = flipbook::FrameCap::from_override(Some(raw));
    }
    let resolver = flipbook::SequenceResolver::with_http(opts)?;
    let seq = rt
        .block_on(resolver.resolve(&source))
        .with_context(|| format!("resolve '{}'", args.source.display()))?;
    Ok(seq)
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let rt = runtime()?;
    let seq = resolve(&rt, &args.source)?;
    println!("{}", serde_json::to_string_pretty(&seq)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let rt = runtime()?;
    let seq = resolve(&rt, &args.source)?;
    let progress = frame_progress(&args)?;

    let loader: Arc<dyn flipbook::FrameLoader> = match (&args.root, &args.base) {
        (_, Some(base)) => {
            let base =
                reqwest::Url::parse(base).with_context(|| format!("parse base '{base}'"))?;
            Arc::new(flipbook::HttpFrameLoader::new(Some(base), rt.handle().clone())?)
        }
        (Some(root), None) => Arc::new(flipbook::FileFrameLoader::new(root)),
        (None, None) if seq.frames().iter().any(|f| reqwest::Url::parse(f).is_ok()) => {
            Arc::new(flipbook::HttpFrameLoader::new(None, rt.handle().clone())?)
        }
        (None, None) => {
            let root = args.source.source.parent().unwrap_or_else(|| Path::new("."));
            Arc::new(flipbook::FileFrameLoader::new(root))
        }
    };

    let opts = flipbook::FrameControllerOpts {
        strategy: flipbook::LoadStrategy::Lazy,
        buffer_radius: args.buffer_radius,
    };
    let mut canvas = flipbook::RasterCanvas::new(args.width, args.height);
    let mut controller =
        flipbook::FrameController::new(seq.into_frames(), opts, loader, &mut canvas)?;
    controller.update(progress);

    let deadline = Instant::now() + Duration::from_millis(args.wait_ms);
    while controller.last_painted() != controller.target_index()
        && controller.in_flight_len() > 0
    {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }
        controller.pump_wait(left);
    }

    let Some(index) = controller.target_index() else {
        anyhow::bail!("sequence has no frames");
    };
    if controller.last_painted() != Some(index) {
        anyhow::bail!("frame {index} did not load (see log for the load error)");
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    controller.surface().save_png(&args.out)?;

    eprintln!("wrote {} (frame {index}, progress {progress})", args.out.display());
    Ok(())
}

fn frame_progress(args: &FrameArgs) -> anyhow::Result<f64> {
    if let Some(p) = args.progress {
        return Ok(p);
    }
    match (args.scroll_top, args.track_height, args.viewport_height) {
        (Some(top), Some(track), Some(viewport)) => {
            let geometry = flipbook::ScrollGeometry {
                tracked_height: track,
                viewport_height: viewport,
                viewport_offset: 0.0,
            };
            Ok(geometry.progress_at(top))
        }
        _ => anyhow::bail!(
            "pass --progress, or --scroll-top with --track-height and --viewport-height"
        ),
    }
}
