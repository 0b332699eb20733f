//! Calib Capture - Main Entry Point

use anyhow::Context;
use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use calib_capture::camera::CameraSource;
use calib_capture::cli::Args;
use calib_capture::store::PngDirectory;
use calib_capture::{CaptureApp, CaptureConfig};

fn run(args: Args) -> anyhow::Result<u32> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let config = CaptureConfig::new(args.images, &working_dir);

    let store = PngDirectory::create(&config.output_dir).context("Failed to prepare output directory")?;

    let cameras = CameraSource::list_cameras();
    log::debug!("Found {} camera(s)", cameras.len());
    for camera in &cameras {
        log::debug!("  [{}] {}", camera.index, camera.name);
    }

    let camera = CameraSource::open(&config).context("Failed to initialize camera")?;

    log::info!("Collecting {} images for camera calibration.", config.target_images);
    log::info!("Press ENTER to capture image.");

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = CaptureApp::new(config, Box::new(camera), store);
    event_loop.run_app(&mut app).context("Event loop error")?;

    Ok(app.into_result()?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(collected) => log::debug!("Exiting after {} capture(s)", collected),
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
