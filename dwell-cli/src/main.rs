// Dwell command line host
// Runs a session headlessly against a synthetic camera and a scripted classifier

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dwell_eye::camera::SyntheticCamera;
use dwell_eye::models::{BoundingBox, Detection, ScriptStep, ScriptedClassifier};
use dwell_eye::overlay::DisplayList;
use dwell_eye::{Session, SessionEvent, VisionConfig};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dwell")]
#[command(about = "Live detection overlay with dwell timers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless session and write its captures
    Run {
        /// Configuration file path (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Classifier script (JSON array of steps)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Detection cycles to run before stopping
        #[arg(long, default_value = "20")]
        cycles: u64,

        /// Press the capture button every K cycles (0 disables)
        #[arg(long, default_value = "5")]
        capture_every: u64,

        /// Simulated inference time per cycle, in milliseconds
        #[arg(long, default_value = "50")]
        latency_ms: u64,

        /// Output directory
        #[arg(long, default_value = "./captures")]
        out: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file path (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

struct RunOptions {
    cycles: u64,
    capture_every: u64,
    latency: Duration,
    out: PathBuf,
}

#[derive(Debug, Default, PartialEq)]
struct RunSummary {
    cycles: u64,
    failures: u64,
    captured: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Run {
            config,
            script,
            cycles,
            capture_every,
            latency_ms,
            out,
        } => {
            let config = load_config(config.as_deref())?;
            let classifier = match script {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read script {}", path.display()))?;
                    ScriptedClassifier::from_json(&json)?
                }
                None => ScriptedClassifier::new(demo_script()),
            };
            let options = RunOptions {
                cycles,
                capture_every,
                latency: Duration::from_millis(latency_ms),
                out,
            };

            let summary = run_session(config, classifier, &options).await?;
            println!(
                "✅ {} cycles ({} failed), {} object(s) captured to {}",
                summary.cycles,
                summary.failures,
                summary.captured,
                options.out.display()
            );
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VisionConfig> {
    let config = match path {
        Some(path) => VisionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => VisionConfig::default(),
    };
    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }
    Ok(config)
}

/// A cup that stays in view, a bottle that comes and goes, and one dropped
/// inference
fn demo_script() -> Vec<ScriptStep> {
    let cup = Detection::new("cup", 0.95, BoundingBox::new(10.0, 10.0, 50.0, 50.0));
    let bottle = Detection::new("bottle", 0.3, BoundingBox::new(120.0, 40.0, 30.0, 80.0));
    let plant = Detection::new("plant", 0.15, BoundingBox::new(200.0, 100.0, 60.0, 60.0));

    vec![
        ScriptStep::Detections(vec![cup.clone(), bottle.clone()]),
        ScriptStep::Detections(vec![cup.clone(), bottle, plant.clone()]),
        ScriptStep::Detections(vec![cup.clone(), plant]),
        ScriptStep::Fail("inference dropped".to_string()),
        ScriptStep::Detections(vec![cup]),
    ]
}

async fn run_session(
    config: VisionConfig,
    classifier: ScriptedClassifier,
    options: &RunOptions,
) -> anyhow::Result<RunSummary> {
    let camera = SyntheticCamera::new(Arc::new(config.clone()));
    let session = Arc::new(Session::new(config, DisplayList::default())?);
    let mut events = session.subscribe_events();

    let _pump = session.attach_camera(camera.start_stream()?);
    let detection_loop = session.start_detection(Arc::new(classifier.with_latency(options.latency)));

    let mut summary = RunSummary::default();
    while summary.cycles < options.cycles {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {} session events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            SessionEvent::CycleCompleted { .. } => summary.cycles += 1,
            SessionEvent::ClassifierFailed { .. } => {
                summary.cycles += 1;
                summary.failures += 1;
            }
            SessionEvent::ModelFailed { message } | SessionEvent::CameraFailed { message } => {
                detection_loop.stop().await;
                camera.stop();
                bail!("Session ended: {}", message);
            }
            _ => continue,
        }

        if options.capture_every > 0 && summary.cycles % options.capture_every == 0 {
            summary.captured += session.capture_button().len();
        }
    }

    detection_loop.stop().await;
    camera.stop();

    write_outputs(&session, &options.out)?;
    Ok(summary)
}

/// Write every captured object as PNG, plus a manifest and the last overlay
fn write_outputs(session: &Session<DisplayList>, out: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let captures = session.with_board(|board| {
        board
            .iter()
            .map(|object| {
                let png = object.encode_png()?;
                let entry = json!({
                    "id": object.id().to_string(),
                    "label": object.caption(),
                    "confidence": object.confidence(),
                    "width": object.image().width(),
                    "height": object.image().height(),
                    "captured_at": object.captured_at().to_rfc3339(),
                });
                Ok((format!("{}-{}.png", object.label(), object.id()), png, entry))
            })
            .collect::<Result<Vec<_>, dwell_eye::VisionError>>()
    })?;

    let mut manifest = Vec::with_capacity(captures.len());
    for (file_name, png, entry) in captures {
        std::fs::write(out.join(&file_name), png)?;
        manifest.push(entry);
    }
    std::fs::write(out.join("captures.json"), serde_json::to_string_pretty(&manifest)?)?;

    let overlay = session.with_surface(|surface| serde_json::to_string_pretty(surface))?;
    std::fs::write(out.join("overlay.json"), overlay)?;

    info!("Wrote {} capture(s) to {}", manifest.len(), out.display());
    Ok(())
}
