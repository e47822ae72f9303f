//! Archimedes CLI: inspect whiteboard frames and run configured commands.

use archimedes::commands::{detect_command_boxes, filter_to_color, BoxDetectParams, ColorBand};
use archimedes::markers::{FixedMarkers, MarkerDetections};
use archimedes::region::{crop_to_markers, PerspectiveNormalizer, RedetectPolicy};
use archimedes::{CommandReport, FrameOutcome, WhiteboardConfig};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::json;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "archimedes")]
#[command(about = "Detect colored command boxes on a marker-framed whiteboard")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BandArgs {
    /// Target hue on the 0..180 scale.
    #[arg(long)]
    hue: u8,

    /// Accepted circular distance from the target hue.
    #[arg(long, default_value_t = 35)]
    tol_hue: u8,

    #[arg(long, default_value_t = 10)]
    min_saturation: u8,

    #[arg(long, default_value_t = 50)]
    min_value: u8,
}

impl BandArgs {
    fn band(&self) -> CliResult<ColorBand> {
        let band = ColorBand::new(self.hue)
            .with_tolerance(self.tol_hue)
            .with_floors(self.min_saturation, self.min_value);
        band.validate()?;
        Ok(band)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the mask of pixels inside a color band.
    Filter {
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        band: BandArgs,

        /// Output mask (PNG).
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the command boxes of one color found in an image, as JSON.
    Boxes {
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        band: BandArgs,

        #[arg(long, default_value_t = 1000.0)]
        min_area: f64,

        #[arg(long, default_value_t = 21)]
        blur_size: u32,
    },
    /// Straighten a camera frame using its marker detections.
    Normalize {
        #[arg(long)]
        image: PathBuf,

        /// Marker detections (JSON) for the image.
        #[arg(long)]
        markers: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Also erase the markers and crop to the marked region.
        #[arg(long)]
        crop: bool,
    },
    /// Feed frames in order through a configured pipeline.
    Run {
        /// Pipeline configuration (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Marker detections shared by every frame. Without it, frames are
        /// taken as already normalized and cropped.
        #[arg(long)]
        markers: Option<PathBuf>,

        /// Frame images, in capture order.
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // the tracing subscriber takes its level from RUST_LOG
    #[cfg(feature = "tracing")]
    {
        let _ = cli.log_level;
        archimedes::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    archimedes::core::init_with_level(cli.log_level)?;

    match cli.command {
        Commands::Filter { image, band, out } => run_filter(&image, &band, &out),
        Commands::Boxes {
            image,
            band,
            min_area,
            blur_size,
        } => run_boxes(&image, &band, min_area, blur_size),
        Commands::Normalize {
            image,
            markers,
            out,
            crop,
        } => run_normalize(&image, &markers, &out, crop),
        Commands::Run {
            config,
            markers,
            frames,
        } => run_frames(&config, markers.as_deref(), &frames),
    }
}

fn load_rgb(path: &Path) -> CliResult<image::RgbImage> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(img.to_rgb8())
}

fn run_filter(image_path: &Path, band: &BandArgs, out: &Path) -> CliResult<()> {
    let img = load_rgb(image_path)?;
    let mask = filter_to_color(&img, &band.band()?);
    mask.save(out)?;
    log::info!("mask written to {}", out.display());
    Ok(())
}

fn run_boxes(image_path: &Path, band: &BandArgs, min_area: f64, blur_size: u32) -> CliResult<()> {
    let img = load_rgb(image_path)?;
    let params = BoxDetectParams {
        min_area,
        blur_size,
        ..BoxDetectParams::default()
    };
    let boxes: Vec<_> = detect_command_boxes(&img, &band.band()?, &params)
        .into_iter()
        .map(|b| {
            json!({
                "corners": b.corners.map(|p| [p.x, p.y]),
                "bounds": b.bounds,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&boxes)?);
    Ok(())
}

fn run_normalize(image_path: &Path, markers_path: &Path, out: &Path, crop: bool) -> CliResult<()> {
    let img = load_rgb(image_path)?;
    let markers = MarkerDetections::load_json(markers_path)?.markers;

    let board = PerspectiveNormalizer::default().normalize(&img, &markers)?;
    let result = if crop {
        let projected = markers.transformed(&board.transform);
        crop_to_markers(&board.image, &projected)?.image
    } else {
        board.image
    };

    result.save(out)?;
    log::info!(
        "{}x{} board written to {}",
        result.width(),
        result.height(),
        out.display()
    );
    Ok(())
}

fn run_frames(config_path: &Path, markers: Option<&Path>, frames: &[PathBuf]) -> CliResult<()> {
    let mut config = WhiteboardConfig::load_json(config_path)?;

    let detector = match markers {
        Some(path) => {
            // sidecar markers are in camera coordinates only
            config.region.redetect = RedetectPolicy::ProjectOriginal;
            FixedMarkers::new(MarkerDetections::load_json(path)?)
        }
        None => FixedMarkers::default(),
    };
    let mut pipeline = config.into_pipeline(detector)?;

    for frame in frames {
        let img = load_rgb(frame)?;
        let line = if markers.is_some() {
            outcome_json(frame, &pipeline.process_frame(&img))
        } else {
            let reports = pipeline.process_normalized(&img);
            processed_json(frame, img.dimensions(), &reports)
        };
        println!("{line}");
    }
    Ok(())
}

fn outcome_json(frame: &Path, outcome: &FrameOutcome) -> serde_json::Value {
    match outcome {
        FrameOutcome::Skipped { reason } => json!({
            "frame": frame.display().to_string(),
            "status": "skipped",
            "reason": reason.to_string(),
        }),
        FrameOutcome::Processed {
            board_size,
            reports,
        } => processed_json(frame, *board_size, reports),
    }
}

fn processed_json(frame: &Path, board_size: (u32, u32), reports: &[CommandReport]) -> serde_json::Value {
    let commands: Vec<_> = reports
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "released": r.report.released,
                "detected": r.report.detected,
                "dispatched": r.report.dispatched,
                "failed": r.report.failures.len(),
            })
        })
        .collect();
    json!({
        "frame": frame.display().to_string(),
        "status": "processed",
        "board": [board_size.0, board_size.1],
        "commands": commands,
    })
}
