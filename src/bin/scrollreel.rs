use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "scrollreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the frame shown at one scroll position as a PNG.
    Frame(FrameArgs),
    /// Render evenly spaced scroll positions across the whole range.
    Sweep(SweepArgs),
    /// Print overlay styles at a scroll position as JSON.
    Overlay(OverlayArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Player config JSON. Frame paths resolve relative to its directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding `frame_###.<ext>` files directly (overrides the config location).
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Number of frames.
    #[arg(long)]
    count: Option<u32>,

    /// Frame file extension.
    #[arg(long)]
    ext: Option<String>,

    /// Scroll mapping policy.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Viewport heights spanned by the global policy.
    #[arg(long)]
    multiple: Option<f64>,

    /// Give up waiting for frames after this many seconds.
    #[arg(long, default_value_t = 60)]
    wait_secs: u64,
}

#[derive(Args, Debug)]
struct ViewportArgs {
    /// Logical viewport width.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Logical viewport height.
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    viewport: ViewportArgs,

    /// Scroll sample: page offset in pixels (global) or progress 0..1 (local).
    #[arg(long)]
    scroll: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SweepArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    viewport: ViewportArgs,

    /// Number of scroll positions to render.
    #[arg(long, default_value_t = 10)]
    samples: u32,

    /// Output directory for `sweep_###.png`.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Scroll sample: page offset in pixels, or container progress with `--local`.
    #[arg(long)]
    scroll: f64,

    /// Viewport height for the page-offset layers (0 uses the fallback).
    #[arg(long, default_value_t = 0.0)]
    height: f64,

    /// Use the container-scoped section layers.
    #[arg(long)]
    local: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Global,
    Local,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sweep(args) => cmd_sweep(args),
        Command::Overlay(args) => cmd_overlay(args),
    }
}

fn load_config(args: &SourceArgs) -> anyhow::Result<(scrollreel::PlayerConfig, PathBuf)> {
    let (mut cfg, mut root) = match &args.config {
        Some(path) => {
            let cfg = scrollreel::PlayerConfig::from_json_path(path)?;
            let root = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (cfg, root)
        }
        None => (scrollreel::PlayerConfig::default(), PathBuf::from(".")),
    };

    if let Some(dir) = &args.frames {
        root = dir.clone();
        cfg.frames.base_path = String::new();
    }
    if let Some(n) = args.count {
        cfg.frames.count = n;
    }
    if let Some(ext) = &args.ext {
        cfg.frames.extension = ext.clone();
    }
    match (args.policy, args.multiple) {
        (Some(PolicyChoice::Local), _) => cfg.policy = scrollreel::MappingPolicy::LocalProgress,
        (Some(PolicyChoice::Global), k) => {
            cfg.policy = scrollreel::MappingPolicy::GlobalOffset {
                viewport_multiple: k.unwrap_or(4.0),
            };
        }
        (None, Some(k)) => {
            if let scrollreel::MappingPolicy::GlobalOffset { viewport_multiple } = &mut cfg.policy
            {
                *viewport_multiple = k;
            }
        }
        (None, None) => {}
    }

    cfg.apply_env_overrides();
    cfg.validate()?;
    Ok((cfg, root))
}

fn start_player(
    source: &SourceArgs,
    viewport: &ViewportArgs,
) -> anyhow::Result<(scrollreel::ScrollPlayer, scrollreel::PlayerConfig)> {
    let (cfg, root) = load_config(source)?;
    let frames: Arc<dyn scrollreel::FrameSource> =
        Arc::new(scrollreel::DirFrameSource::new(root, cfg.frames.clone()));
    let vp = scrollreel::Viewport::new(viewport.width, viewport.height, viewport.dpr);

    let mut player = scrollreel::ScrollPlayer::new(&cfg, frames, vp)?;
    let state = player.wait_ready(Duration::from_secs(source.wait_secs));
    if !state.ready {
        anyhow::bail!(
            "frames not ready after {}s ({}% settled)",
            source.wait_secs,
            state.progress_percent()
        );
    }
    if state.loaded == 0 {
        anyhow::bail!("none of the {} frames could be loaded", state.total);
    }
    if state.failed > 0 {
        tracing::warn!(failed = state.failed, total = state.total, "some frames are missing");
    }

    // Initial render of frame 0.
    let _ = player.tick();
    Ok((player, cfg))
}

fn write_png(player: &scrollreel::ScrollPlayer, out: &Path) -> anyhow::Result<()> {
    let frame = player
        .readback()
        .context("nothing has been drawn yet (first frame missing?)")?;

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut player, _) = start_player(&args.source, &args.viewport)?;

    let outcome = player.on_scroll(args.scroll);
    tracing::debug!(?outcome, scroll = args.scroll, "scroll sample");
    if let Some(scrollreel::TickReport::Skipped { frame }) = player.tick() {
        tracing::warn!(frame = frame.0, "target frame missing, showing previous frame");
    }

    write_png(&player, &args.out)?;
    eprintln!(
        "wrote {} (frame {})",
        args.out.display(),
        player.playback().current.0
    );
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    if args.samples == 0 {
        anyhow::bail!("--samples must be >= 1");
    }
    let (mut player, cfg) = start_player(&args.source, &args.viewport)?;

    let range = cfg
        .policy
        .range(player.viewport().height)
        .context("viewport height must be > 0")?;

    for i in 0..args.samples {
        let t = if args.samples == 1 {
            0.0
        } else {
            f64::from(i) / f64::from(args.samples - 1)
        };
        let scroll = range.start + (range.end - range.start) * t;
        let _ = player.on_scroll(scroll);
        let _ = player.tick();

        let out = args.out_dir.join(format!("sweep_{i:03}.png"));
        write_png(&player, &out)?;
        tracing::info!(
            sample = i,
            scroll,
            frame = player.playback().current.0,
            "wrote {}",
            out.display()
        );
    }

    eprintln!(
        "wrote {} frames to {}",
        args.samples,
        args.out_dir.display()
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct OverlayRow<'a> {
    name: &'a str,
    #[serde(flatten)]
    style: scrollreel::OverlayStyle,
}

fn cmd_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let layers = if args.local {
        scrollreel::section_layers()
    } else {
        scrollreel::hero_layers(args.height)
    };

    let rows: Vec<OverlayRow<'_>> = layers
        .iter()
        .map(|l| OverlayRow {
            name: &l.name,
            style: l.sample(args.scroll),
        })
        .collect();

    let json = serde_json::to_string_pretty(&rows).context("serialize overlay styles")?;
    println!("{json}");
    Ok(())
}
