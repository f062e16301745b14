#![allow(dead_code)]

mod annotation;
mod app;
mod data;
mod gui;
mod view;

use std::path::PathBuf;

use app::ViewerApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("Starting DICOM Annotator v{}", env!("CARGO_PKG_VERSION"));

    // Optional image to open at start-up
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("DICOM Annotator")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "DICOM Annotator",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, initial)))),
    )
}
