use crate::error::LoadError;

pub mod file;
pub mod format;
pub mod ktx1;
pub mod ktx2;

/// A decoded 2D texture whose levels are tightly packed in `format`.
pub trait TextureLoader {
    fn dimensions(&self) -> (u32, u32);
    fn mip_level_count(&self) -> u32;
    fn format(&self) -> wgpu::TextureFormat;
    fn load_level(&self, mip_level: u32) -> Result<&[u8], LoadError>;
}
