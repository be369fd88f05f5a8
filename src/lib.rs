use anyhow::Result;

use crate::app::App;
use crate::args::Args;
use crate::error::{Error, ErrorKind};

mod app;
pub mod args;
mod camera;
mod data;
pub mod error;
mod overlay;
mod render;
mod resource;
mod settings;
mod view;

pub fn run(args: Args) -> Result<()> {
    env_logger::init();

    let event_loop = App::create_event_loop().map_err(|error| {
        Error::new(
            ErrorKind::InitializationFailure,
            format!("Failed to create event loop: {error}"),
        )
    })?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new(&event_loop, args);

    event_loop.run_app(&mut app)?;

    match app.take_initialization_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
