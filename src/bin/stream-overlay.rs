use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "stream-overlay", version)]
struct Cli {
    /// Log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scene and write the last presented frame as a PNG.
    Render(RenderArgs),
    /// Print the stream URI the viewer would open.
    Uri(UriArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override the scene's tick count.
    #[arg(long)]
    ticks: Option<u64>,

    /// Pace ticks at the viewer's tick period instead of running them back to back.
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct UriArgs {
    /// Viewer options JSON. Defaults apply when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Stream id. Falls back to the options' initial stream.
    #[arg(long)]
    stream: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Uri(args) => cmd_uri(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut scene = stream_overlay::Scene::from_path(&args.scene)?;
    if let Some(ticks) = args.ticks {
        scene.ticks = ticks;
    }
    let assets_root = args.scene.parent().unwrap_or_else(|| Path::new("."));

    let mut viewer = scene.build_viewer(assets_root)?;
    viewer.on_event(|e| match e {
        stream_overlay::ViewerEvent::Changed { stream_id } => {
            tracing::info!(stream_id = %stream_id, "stream changed");
        }
        stream_overlay::ViewerEvent::Warning { reason } => {
            tracing::warn!(reason = %reason, "viewer warning");
        }
    });
    let report = scene
        .run(&mut viewer, args.realtime)
        .context("viewer produced no frame")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let frame = viewer.composited();
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (tick {}, {:?}, {} labels)",
        args.out.display(),
        report.tick,
        report.primary,
        report.labels
    );
    Ok(())
}

fn cmd_uri(args: UriArgs) -> anyhow::Result<()> {
    let options = match &args.options {
        Some(path) => stream_overlay::ViewerOptions::from_path(path)?,
        None => stream_overlay::ViewerOptions::default(),
    };
    options.validate()?;
    let stream = args
        .stream
        .as_deref()
        .or_else(|| options.initial_stream())
        .context("no stream given and none configured")?;
    println!("{}", stream_overlay::StreamUri::new(&options, stream));
    Ok(())
}
