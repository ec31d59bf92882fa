//! measure_replay - run a recorded detection script through a measurement session
//!
//! Prints one JSON object per frame to stdout.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use dimension_kernel::detect::{load_script, ScriptedFrame};
use dimension_kernel::{
    CameraFrameContext, Detection, MeasureConfig, MeasurementSession, ScriptedBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Detection script: JSON array of {image_width, image_height, fov_degrees?, detections}.
    #[arg(long)]
    script: PathBuf,
    /// Config file (JSON or TOML). Defaults to MEASURE_CONFIG and MEASURE_* variables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Select the object under this pixel (requires --select-y).
    #[arg(long, requires = "select_y")]
    select_x: Option<f64>,
    #[arg(long, requires = "select_x")]
    select_y: Option<f64>,
    /// Select the first detection of this class instead of a point.
    #[arg(long, conflicts_with = "select_x")]
    select_class: Option<String>,
    /// Calibrate before replay: KNOWN_WIDTH_CM KNOWN_DISTANCE_CM OBSERVED_PIXEL_WIDTH.
    #[arg(long, num_args = 3, value_names = ["WIDTH_CM", "DISTANCE_CM", "PIXELS"])]
    calibrate: Option<Vec<f64>>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => MeasureConfig::from_path(path)?,
        None => MeasureConfig::load()?,
    };
    let frames = load_script(&args.script)?;
    log::info!(
        "replaying {} frames from {}",
        frames.len(),
        args.script.display()
    );

    let backend = ScriptedBackend::new(frames.iter().map(|f| f.detections.clone()));
    let mut session = MeasurementSession::new(
        Box::new(backend),
        cfg.distance_estimator()?,
        cfg.tracker(),
        cfg.session_settings(),
    );
    session.warm_up()?;

    if let Some(values) = args.calibrate.as_deref() {
        let [width, distance, pixels] = values else {
            return Err(anyhow!("--calibrate takes exactly three values"));
        };
        session
            .calibrate(*width, *distance, *pixels)
            .context("calibration failed")?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut measured = 0usize;

    for (index, frame) in frames.iter().enumerate() {
        if !session.is_tracking() {
            try_select(&mut session, &args, frame);
        }

        let ctx = CameraFrameContext {
            horizontal_fov_degrees: frame.fov_degrees,
            ..CameraFrameContext::new(frame.image_width, frame.image_height)
        };
        // pixels are not needed by the scripted backend
        let outcome = session.process_frame(&[], &ctx)?;
        if outcome.measurement().is_some() {
            measured += 1;
        }

        let line = serde_json::json!({ "frame": index, "outcome": outcome });
        writeln!(out, "{}", line)?;
    }

    log::info!("{} of {} frames measured", measured, frames.len());
    Ok(())
}

fn try_select(session: &mut MeasurementSession, args: &Args, frame: &ScriptedFrame) {
    if let (Some(x), Some(y)) = (args.select_x, args.select_y) {
        session.select_at(x, y, &frame.detections);
        return;
    }
    let candidate: Option<&Detection> = match &args.select_class {
        Some(class) => frame
            .detections
            .iter()
            .find(|d| d.class_label.eq_ignore_ascii_case(class)),
        None => frame.detections.first(),
    };
    if let Some(detection) = candidate {
        session.select(detection.clone());
    }
}
