// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod gui;
mod visualizer;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use eframe::egui;
use log::info;

use meaview::mea::{
    render_frame_png, CsvRecordingSource, PlotStyle, Recording, RecordingSource, SyntheticSource,
    ViewerConfig, Visualization,
};
use meaview::types::ViewMode;

#[derive(Default)]
struct Args {
    recording: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    trace: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--snapshot" => {
                let out = it.next().context("--snapshot needs an output path")?;
                args.snapshot = Some(PathBuf::from(out));
            }
            "--trace" => args.trace = true,
            _ if arg.starts_with("--") => return Err(anyhow!("unknown flag {arg}")),
            _ => args.recording = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn load_config() -> anyhow::Result<ViewerConfig> {
    match std::env::var_os("MEAVIEW_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            info!("config: {}", path.display());
            ViewerConfig::load(&path).with_context(|| format!("reading {}", path.display()))
        }
        None => Ok(ViewerConfig::default()),
    }
}

fn load_recording(path: Option<&Path>) -> anyhow::Result<Recording> {
    match path {
        Some(path) => CsvRecordingSource::from_path(path)
            .and_then(|mut source| source.load())
            .with_context(|| format!("loading recording {}", path.display())),
        None => {
            info!("no recording given, generating synthetic data");
            SyntheticSource::default()
                .load()
                .context("generating synthetic recording")
        }
    }
}

fn write_snapshot(vis: &Visualization, out: &Path) -> anyhow::Result<()> {
    let (width, height) = vis.viewport().canvas_size();
    let style = PlotStyle {
        width: width as u32,
        height: height as u32,
        ..Default::default()
    };
    let png = render_frame_png(vis.frame(), &style)?;
    std::fs::write(out, png).with_context(|| format!("writing {}", out.display()))?;
    info!("snapshot written to {}", out.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = parse_args()?;
    let config = load_config()?;
    let recording = load_recording(args.recording.as_deref())?;
    let mut vis = Visualization::new(Arc::new(recording), config)?;
    if args.trace {
        vis.set_mode(ViewMode::Trace)?;
    }

    if let Some(out) = args.snapshot.as_deref() {
        return write_snapshot(&vis, out);
    }

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 800.0])
        .with_min_inner_size([800.0, 500.0])
        .with_title("MEA viewer");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let app = gui::MeaViewerApp::new(vis);
    eframe::run_native("meaview", options, Box::new(|_cc| Box::new(app)))
        .map_err(|err| anyhow!("window closed with error: {err}"))
}
