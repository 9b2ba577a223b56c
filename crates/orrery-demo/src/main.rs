//! Orrery: a two-sprite 2D animation demo.
//!
//! A spinning earth at double size and a hero quad that drifts right while
//! revolving around the origin, rendered through a reflected WGSL program.

mod app;
mod config;
mod scene;

use orrery_engine::logging::init_logging;
use orrery_engine::window::Runtime;

use crate::app::DemoApp;
use crate::config::DemoConfig;

fn main() -> anyhow::Result<()> {
    let config = DemoConfig::default();
    init_logging(config.logging.clone());

    log::info!(
        "orrery starting: {} ({}x{})",
        config.runtime.title,
        config.runtime.initial_size.width,
        config.runtime.initial_size.height,
    );

    let runtime = config.runtime.clone();
    let gpu = config.gpu.clone();

    if let Err(err) = Runtime::run(runtime, gpu, DemoApp::new(config)) {
        log::error!("fatal: {err:#}");
        return Err(err);
    }

    Ok(())
}
