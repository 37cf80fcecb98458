use anyhow::Result;

use crate::app::App;
use crate::args::Args;
use crate::resource::texture::file::FileSystemTextureLoader;
use crate::resource::texture::TextureLoader;

mod app;
pub mod args;
pub mod data;
mod error;
pub mod mipmap;
mod render;
mod resource;
mod view;

pub use crate::error::LoadError;

pub fn run(args: Args) -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,ktx_viewer=info"),
    )
    .init();

    let texture_loader = FileSystemTextureLoader::from_path(&args.texture)?;

    let (width, height) = texture_loader.dimensions();
    log::info!(
        "Loaded {} texture {}: {width}x{height}, {} mip levels, {:?}",
        texture_loader.container_name(),
        args.texture.display(),
        texture_loader.mip_level_count(),
        texture_loader.format(),
    );

    let event_loop = App::create_event_loop()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new(&event_loop, args, texture_loader);
    event_loop.run_app(&mut app)?;

    match app.take_fatal_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
