use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "karaoke", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single caption frame as a PNG.
    Frame(FrameArgs),
    /// Render a karaoke video (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Caption line.
    #[arg(long)]
    text: String,

    /// Next line, shown as a preview.
    #[arg(long, default_value = "")]
    next: String,

    /// Highlight progress in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Job config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    style: StyleArgs,
}

/// Overrides applied on top of the config file.
#[derive(clap::Args, Debug)]
struct StyleArgs {
    /// Font file to try before the built-in list (repeatable).
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Caption color (`#rrggbb` or a name such as `white`).
    #[arg(long)]
    font_color: Option<karaoke::Rgb8>,

    /// Highlight color.
    #[arg(long)]
    highlight_color: Option<karaoke::Rgb8>,

    /// Background color.
    #[arg(long)]
    bg_color: Option<karaoke::Rgb8>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Backing track.
    #[arg(long)]
    audio: PathBuf,

    /// Lyrics JSON (`{"segments": [{"start", "end", "text"}]}`).
    #[arg(long)]
    lyrics: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Job config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    style: StyleArgs,

    /// Build per-line clips in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Stream frames to ffmpeg over a pipe instead of writing PNG files.
    #[arg(long, default_value_t = false)]
    pipe: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(path: Option<&PathBuf>, style: StyleArgs) -> anyhow::Result<karaoke::JobConfig> {
    let mut cfg = match path {
        Some(p) => karaoke::JobConfig::from_json_path(p)?,
        None => karaoke::JobConfig::default(),
    };
    if !style.fonts.is_empty() {
        cfg.render.fonts = style.fonts.into_iter().chain(cfg.render.fonts).collect();
    }
    if let Some(c) = style.font_color {
        cfg.render.font_color = c;
    }
    if let Some(c) = style.highlight_color {
        cfg.render.highlight_color = c;
    }
    if let Some(c) = style.bg_color {
        cfg.render.bg_color = c;
    }
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    use karaoke::CaptionRenderer as _;

    let cfg = load_config(args.config.as_ref(), args.style)?;
    let font = karaoke::resolve_font(&cfg.render.fonts)?;
    let mut renderer = karaoke::CpuCaptionRenderer::new(Arc::new(cfg.render), &font)?;
    let frame = renderer.render(&args.text, args.progress, &args.next)?;

    karaoke::ensure_parent_dir(&args.out)?;
    frame
        .save_png(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref(), args.style)?;
    if args.pipe {
        config.encode.intermediate = karaoke::IntermediateMode::Pipe;
    }
    let lyrics = karaoke::LyricSet::from_json_path(&args.lyrics)?;

    let job = karaoke::Job::new(&args.audio, lyrics, &args.out)
        .with_config(config)
        .with_opts(karaoke::PipelineOpts {
            parallel: args.parallel,
            threads: args.threads,
            work_root: None,
        });

    let handle = karaoke::spawn_job(job)?;
    let mut last_phase = None;
    for status in handle.status().iter() {
        if last_phase != Some(status.phase) {
            eprintln!("[{:>3}%] {}", status.percent, status.message);
            last_phase = Some(status.phase);
        }
    }
    let out = handle.join()?;

    eprintln!(
        "wrote {} ({:.2}s, {} lines)",
        out.output.display(),
        out.duration_secs,
        out.segments
    );
    Ok(())
}
