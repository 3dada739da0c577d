use std::env;

use anyhow::bail;
use app::App;
use camera::Webcam;
use config::Config;

mod app;
mod camera;
mod cmd;
mod config;
mod detector;
mod gesture;
mod math;
mod palette;
mod render;
mod session;
mod stroke;
mod ui;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let config = match &*env::args_os().skip(1).collect::<Vec<_>>() {
        [] => Config::default(),
        [path] => Config::load(path)?,
        _ => {
            bail!("usage: {} [config.toml]", env!("CARGO_PKG_NAME"));
        }
    };

    let camera = Webcam::open(&config.camera)?;
    let detector = detector::from_config(&config.detector);

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config, Box::new(camera), detector);
    event_loop.run_app(&mut app)?;
    app.finish()
}
