use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use holter_lib::{
    config::ReviewConfig,
    io::events::read_event_queue,
    plot::{BitmapPlotBackend, PlotBackend},
    report::{PdfRenderer, ReportBuilder},
    ReviewSession, SignalStore,
};
use serde::Serialize;
use serde_json::json;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

const VIEW_MAX_POINTS: usize = 4096;

#[derive(Parser)]
#[command(
    name = "holter",
    version,
    about = "Hour-by-hour ECG review with abnormality reports"
)]
struct Cli {
    /// TOML review settings; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a recording's length and window layout as JSON
    Info {
        #[arg(long)]
        input: PathBuf,
    },
    /// Render the review plot of one window to PNG
    Window {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 0)]
        hour: usize,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1600)]
        width: u32,
        #[arg(long, default_value_t = 400)]
        height: u32,
    },
    /// Replay a newline-delimited JSON event queue and write the PDF report
    Review {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        events: PathBuf,
        #[arg(long, default_value = "ECG_Report.pdf")]
        out: PathBuf,
        /// Also export the saved abnormalities as CSV
        #[arg(long)]
        annotations_csv: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct RecordingInfo {
    total_samples: usize,
    duration_s: f64,
    samples_per_window: usize,
    total_windows: usize,
    window_count: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = match cli.config.as_deref() {
        Some(path) => ReviewConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReviewConfig::default(),
    };
    match cli.command {
        Commands::Info { input } => cmd_info(&cfg, &input)?,
        Commands::Window {
            input,
            hour,
            out,
            width,
            height,
        } => cmd_window(&cfg, &input, hour, &out, (width, height))?,
        Commands::Review {
            input,
            events,
            out,
            annotations_csv,
        } => cmd_review(&cfg, &input, &events, &out, annotations_csv.as_deref())?,
    }
    Ok(())
}

fn load_store(input: &Path) -> Result<SignalStore> {
    SignalStore::from_path(input).with_context(|| format!("loading {}", input.display()))
}

fn cmd_info(cfg: &ReviewConfig, input: &Path) -> Result<()> {
    let store = load_store(input)?;
    let total = store.total_samples();
    let info = RecordingInfo {
        total_samples: total,
        duration_s: store.duration_seconds(),
        samples_per_window: cfg.window.samples_per_window(),
        total_windows: cfg.window.total_windows(total),
        window_count: cfg.window.window_count(total),
    };
    println!("{}", serde_json::to_string(&info)?);
    Ok(())
}

fn cmd_window(
    cfg: &ReviewConfig,
    input: &Path,
    hour: usize,
    out: &Path,
    size: (u32, u32),
) -> Result<()> {
    let mut session = ReviewSession::from_config(cfg)?;
    session.load_recording(load_store(input)?)?;
    session.set_window(hour)?;
    let fig = session.current_view(VIEW_MAX_POINTS)?;
    BitmapPlotBackend::labeled()
        .draw(&fig, out, size)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

fn cmd_review(
    cfg: &ReviewConfig,
    input: &Path,
    events: &Path,
    out: &Path,
    annotations_csv: Option<&Path>,
) -> Result<()> {
    let queue = read_event_queue(events)?;
    let mut session = ReviewSession::from_config(cfg)?;
    session.load_recording(load_store(input)?)?;
    // a failed event is reported and skipped; the session and its findings stay
    for (idx, event) in queue.into_iter().enumerate() {
        match session.apply(event) {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(err) => {
                log::warn!("event {} failed: {}", idx + 1, err);
                let failure = json!({
                    "outcome": "error",
                    "event": idx + 1,
                    "message": err.to_string(),
                });
                println!("{}", failure);
            }
        }
    }
    if session.store().is_none() {
        anyhow::bail!("event queue reset the session; nothing to report");
    }

    let builder = ReportBuilder::new(cfg.report.clone());
    let document = session.build_report(&builder, &mut BitmapPlotBackend::default())?;
    for anomaly in &document.anomalies {
        eprintln!("warning: {}", serde_json::to_string(anomaly)?);
    }
    let bytes = document.render(&mut PdfRenderer::default())?;
    fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;

    if let Some(path) = annotations_csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        session.annotation_log().to_csv(file)?;
    }
    Ok(())
}
