use clap::Parser;

/// A mipmap-level viewer for KTX textures
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the .ktx, .zktx or .ktx2 file that will be displayed by the viewer
    pub texture: std::path::PathBuf,
}

impl From<Cli> for ktx_viewer::args::Args {
    fn from(value: Cli) -> Self {
        ktx_viewer::args::Args {
            texture: value.texture,
        }
    }
}
