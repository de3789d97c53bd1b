use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use livecam_engine::{spawn_engine, AnalysisResult, EngineConfig, EngineStats, FrameAnalyzer};
use livecam_frame::{
    profiles, rotate, summarize, BgrFrame, BgrImage, FrameSummary, OwnedYuvFrame, RawLayout,
    Rotation, YuvToBgrConverter,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod synth;

#[derive(Parser)]
#[command(name = "livecam", about = "livecam camera frame tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one raw YUV frame to a PNG
    Convert {
        #[command(flatten)]
        frame: FrameArgs,
        /// Raw frame file
        #[arg(short, long)]
        input: PathBuf,
        /// Output image (format from extension)
        #[arg(short, long)]
        output: PathBuf,
        /// Clockwise rotation in degrees (multiple of 90)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        rotate: i32,
    },
    /// Stream every frame of a raw file through the analysis engine
    Replay {
        #[command(flatten)]
        frame: FrameArgs,
        /// Raw file holding one or more back-to-back frames
        #[arg(short, long)]
        input: PathBuf,
        /// Engine config TOML (default: LIVECAM_* environment variables)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Submission rate in frames per second
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// Fraction of dark pixels above which a frame is reported dark
        #[arg(long, default_value_t = 0.95)]
        dark_threshold: f32,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Write synthetic color-bar frames
    Synth {
        #[command(flatten)]
        frame: FrameArgs,
        /// Output raw file
        #[arg(short, long)]
        output: PathBuf,
        /// Number of frames
        #[arg(long, default_value_t = 1)]
        frames: usize,
    },
    /// List built-in camera profiles
    Profiles,
}

#[derive(Args)]
struct FrameArgs {
    /// Frame width in pixels
    #[arg(long)]
    width: usize,
    /// Frame height in pixels
    #[arg(long)]
    height: usize,
    /// Raw layout: i420, yv12, nv12 or nv21
    #[arg(long, default_value = "i420")]
    layout: RawLayout,
    /// Row alignment in bytes
    #[arg(long, default_value_t = 1)]
    row_align: usize,
    /// Camera profile; overrides --layout and --row-align
    #[arg(long)]
    profile: Option<String>,
}

impl FrameArgs {
    fn resolve(&self) -> Result<(RawLayout, usize)> {
        match &self.profile {
            Some(name) => {
                let profile = profiles::lookup_profile(name)
                    .with_context(|| format!("unknown profile: {name} (see `livecam profiles`)"))?;
                Ok((profile.layout.format, profile.layout.row_alignment))
            }
            None => Ok((self.layout, self.row_align)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            frame,
            input,
            output,
            rotate,
        } => run_convert(&frame, &input, &output, rotate),
        Commands::Replay {
            frame,
            input,
            config,
            fps,
            dark_threshold,
            json,
        } => {
            let config = match config {
                Some(path) => EngineConfig::from_file(&path)?,
                None => EngineConfig::from_env(),
            };
            run_replay(&frame, &input, &config, fps, dark_threshold, json).await
        }
        Commands::Synth {
            frame,
            output,
            frames,
        } => run_synth(&frame, &output, frames),
        Commands::Profiles => {
            for p in profiles::list_profiles() {
                println!(
                    "{:<16} {:<5} align {:<3} {}",
                    p.name(),
                    p.layout.format,
                    p.layout.row_alignment,
                    p.profile.description
                );
            }
            Ok(())
        }
    }
}

fn run_convert(args: &FrameArgs, input: &Path, output: &Path, degrees: i32) -> Result<()> {
    let (layout, alignment) = args.resolve()?;
    let rotation = Rotation::from_degrees(degrees)?;
    let raw = std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let frame = layout
        .split_planes(&raw, args.width, args.height, alignment)
        .with_context(|| format!("{} is not a {layout} frame", input.display()))?;

    let started = Instant::now();
    let mut converter = YuvToBgrConverter::new();
    let bgr = converter.convert(&frame)?;
    let image = rotate(&bgr, rotation)?;
    tracing::info!(
        width = image.width,
        height = image.height,
        layout = %layout,
        rotation = rotation.degrees(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "frame converted"
    );

    save_image(&image, output)?;
    println!("{} → {} ({}x{})", input.display(), output.display(), image.width, image.height);
    Ok(())
}

fn save_image(image: &BgrImage, path: &Path) -> Result<()> {
    let rgb = image::RgbImage::from_raw(image.width as u32, image.height as u32, image.to_rgb_bytes())
        .context("image buffer does not match its dimensions")?;
    rgb.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Stand-in for the face detector: brightness statistics per frame.
struct BrightnessProbe {
    dark_threshold: f32,
}

impl FrameAnalyzer for BrightnessProbe {
    type Output = FrameSummary;

    fn analyze(&mut self, frame: BgrFrame<'_>, _sequence: u64) -> FrameSummary {
        summarize(&frame, self.dark_threshold)
    }
}

#[derive(Serialize)]
struct ReplayLine<'a> {
    sequence: u64,
    elapsed_us: u64,
    #[serde(flatten)]
    summary: &'a FrameSummary,
}

fn report(result: &AnalysisResult<FrameSummary>, json: bool) -> Result<()> {
    let elapsed_us = result.elapsed.as_micros() as u64;
    if json {
        let line = ReplayLine {
            sequence: result.sequence,
            elapsed_us,
            summary: &result.output,
        };
        println!("{}", serde_json::to_string(&line)?);
    } else {
        let s = &result.output;
        println!(
            "frame {:>5}  {:>6}us  brightness {:>6.1}  bgr ({:.0}, {:.0}, {:.0}){}",
            result.sequence,
            elapsed_us,
            s.brightness,
            s.mean_b,
            s.mean_g,
            s.mean_r,
            if s.is_dark { "  dark" } else { "" }
        );
    }
    Ok(())
}

async fn run_replay(
    args: &FrameArgs,
    input: &Path,
    config: &EngineConfig,
    fps: u32,
    dark_threshold: f32,
    json: bool,
) -> Result<()> {
    let (layout, alignment) = args.resolve()?;
    let raw = std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let frame_len = layout.frame_len(args.width, args.height, alignment)?;
    if raw.len() < frame_len {
        bail!(
            "{} holds {} bytes, less than one {layout} frame ({frame_len} bytes)",
            input.display(),
            raw.len()
        );
    }
    if raw.len() % frame_len != 0 {
        tracing::warn!(
            trailing = raw.len() % frame_len,
            "input ends with a partial frame; ignoring it"
        );
    }

    let mut engine = spawn_engine(config, BrightnessProbe { dark_threshold })?;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps.max(1))));

    for (sequence, chunk) in raw.chunks_exact(frame_len).enumerate() {
        ticker.tick().await;
        let frame = layout.split_planes(chunk, args.width, args.height, alignment)?;
        engine.submit(OwnedYuvFrame::from_frame(&frame, sequence as u64))?;

        while let Some(result) = engine.try_recv() {
            report(&result?, json)?;
        }
    }

    engine.close();
    while let Some(result) = engine.recv().await {
        report(&result?, json)?;
    }

    let stats = tokio::task::spawn_blocking(move || engine.shutdown()).await??;
    print_stats(&stats, json)?;
    Ok(())
}

fn print_stats(stats: &EngineStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(stats)?);
    } else {
        println!(
            "submitted {}  processed {}  failed {}  dropped {}",
            stats.submitted, stats.processed, stats.failed, stats.dropped
        );
    }
    Ok(())
}

fn run_synth(args: &FrameArgs, output: &Path, frames: usize) -> Result<()> {
    let (layout, alignment) = args.resolve()?;
    layout.frame_len(args.width, args.height, alignment)?;
    let file = std::fs::File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = std::io::BufWriter::new(file);

    for i in 0..frames {
        let (y, u, v) = synth::color_bars(args.width, args.height, i);
        let raw = layout.pack_planes(&y, &u, &v, args.width, args.height, alignment)?;
        writer.write_all(&raw)?;
    }
    writer.flush()?;

    tracing::info!(frames, layout = %layout, alignment, "synthetic frames written");
    println!(
        "wrote {frames} {layout} frame(s) of {}x{} to {}",
        args.width,
        args.height,
        output.display()
    );
    Ok(())
}
