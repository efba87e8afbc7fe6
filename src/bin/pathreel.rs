use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathreel::{
    AppConfig, BackgroundImage, BackgroundSource, Capabilities, ExportOrchestrator,
    ExportRequest, FrameRasterizer, JobStatus, RenderOptions, Scene, VideoSettings,
};

#[derive(Parser, Debug)]
#[command(name = "pathreel", version, about = "Animate routes over a background image")]
struct Cli {
    /// Configuration TOML; defaults are used when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print detected capabilities and the export tier they select.
    Probe,
    /// Render a single preview frame as a PNG.
    Frame(FrameArgs),
    /// Export the animation and wait for the artifact.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Project JSON (scene plus optional video settings).
    #[arg(long)]
    project: PathBuf,

    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Timeline position; omit to render the finished animation.
    #[arg(long)]
    time_ms: Option<f64>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render like an export frame, without waypoint markers.
    #[arg(long)]
    hide_markers: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project JSON (scene plus optional video settings).
    #[arg(long)]
    project: PathBuf,

    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Artifact directory; overrides `export.output_dir`.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

/// On-disk project: a scene with the video settings to export it with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Project {
    #[serde(flatten)]
    scene: Scene,
    #[serde(default)]
    settings: VideoSettings,
}

impl Project {
    fn read(path: &Path) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
        let mut project: Project = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse project JSON '{}'", path.display()))?;
        if project.scene.total_duration_ms == 0 {
            project.scene.total_duration_ms = project.scene.natural_duration_ms();
        }
        project.scene.validate()?;
        Ok(project)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.cmd {
        Command::Probe => cmd_probe(&config),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(config, args).await,
    }
}

fn cmd_probe(config: &AppConfig) -> anyhow::Result<()> {
    let caps = Capabilities::probe(&config.export);
    println!("encoder:    {}", caps.encoder.as_deref().unwrap_or("unavailable"));
    println!(
        "rasterizer: {}",
        if caps.rasterizer { "available" } else { "unavailable" }
    );
    println!("tier:       {}", caps.best_tier());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let project = Project::read(&args.project)?;
    project.settings.validate()?;
    let background = BackgroundImage::open(&args.background)?;

    let rasterizer = FrameRasterizer::new(
        &project.scene,
        project.settings.canvas()?,
        project.settings.background_color.rgba8(),
        Some(&background),
    )?;
    let opts = if args.hide_markers {
        RenderOptions::export()
    } else {
        RenderOptions::preview()
    };
    let png = rasterizer.render_preview_png(args.time_ms, opts)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_export(mut config: AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    let project = Project::read(&args.project)?;
    if let Some(dir) = args.out_dir {
        config.export.output_dir = dir;
    }

    let export_config = config.export.clone();
    let caps = tokio::task::spawn_blocking(move || Capabilities::probe(&export_config)).await?;
    let orch = ExportOrchestrator::new(config.export, caps)?;

    let request = ExportRequest::from_scene(
        &project.scene,
        project.settings,
        Some(BackgroundSource::from(args.background)),
    );
    let id = orch.submit(request)?;
    eprintln!("job {id} submitted (tier {})", orch.tier());

    let mut last_progress = None;
    let job = loop {
        let job = orch.status(id)?;
        if last_progress != Some(job.progress_percent) {
            eprintln!("{:>3}% {}", job.progress_percent, job.status);
            last_progress = Some(job.progress_percent);
        }
        if job.status.is_terminal() {
            break job;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted, cancelling");
                orch.shutdown();
            }
        }
    };

    match (job.status, job.output) {
        (JobStatus::Completed, Some(artifact)) => {
            println!("{}", artifact.path.display());
            Ok(())
        }
        _ => anyhow::bail!(
            "export failed: {}",
            job.error_message.as_deref().unwrap_or("unknown error")
        ),
    }
}
