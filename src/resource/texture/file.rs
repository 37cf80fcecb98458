use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::resource::texture::ktx1::{Ktx1TextureLoader, KTX1_IDENTIFIER};
use crate::resource::texture::ktx2::{Ktx2TextureLoader, KTX2_IDENTIFIER};
use crate::resource::texture::TextureLoader;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

pub enum FileSystemTextureLoader {
    Ktx1(Ktx1TextureLoader),
    Ktx2(Ktx2TextureLoader<Vec<u8>>),
}

impl FileSystemTextureLoader {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let data = match data.starts_with(&GZIP_MAGIC) {
            true => {
                log::debug!("Inflating compressed texture {}", path.display());
                FileSystemTextureLoader::inflate_zktx(&data)?
            }
            false => data,
        };

        FileSystemTextureLoader::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        if data.starts_with(&KTX1_IDENTIFIER) {
            return Ok(Self::Ktx1(Ktx1TextureLoader::from_bytes(&data)?));
        }

        if data.starts_with(&KTX2_IDENTIFIER) {
            let reader = ktx2::Reader::new(data)
                .map_err(|error| LoadError::invalid(format!("malformed KTX2 file: {error}")))?;

            return Ok(Self::Ktx2(Ktx2TextureLoader::from_reader(reader)?));
        }

        Err(LoadError::invalid(
            "the file is neither a KTX 1.1 nor a KTX2 container",
        ))
    }

    pub fn container_name(&self) -> &'static str {
        match self {
            FileSystemTextureLoader::Ktx1(_) => "KTX 1.1",
            FileSystemTextureLoader::Ktx2(_) => "KTX2",
        }
    }

    /// A `.zktx` file is gzip wrapping a big-endian byte count followed by a KTX 1.1 file.
    fn inflate_zktx(data: &[u8]) -> Result<Vec<u8>, LoadError> {
        let mut inflated = Vec::new();
        flate2::read::GzDecoder::new(data)
            .read_to_end(&mut inflated)
            .map_err(|error| LoadError::invalid(format!("corrupt gzip stream: {error}")))?;

        if inflated.len() < 4 {
            return Err(LoadError::invalid("compressed texture is missing its size prefix"));
        }

        let size = u32::from_be_bytes([inflated[0], inflated[1], inflated[2], inflated[3]]) as usize;
        if inflated.len() - 4 < size {
            return Err(LoadError::invalid(format!(
                "compressed texture declares {size} bytes but holds {}",
                inflated.len() - 4
            )));
        }

        inflated.truncate(4 + size);
        inflated.drain(..4);

        Ok(inflated)
    }
}

impl TextureLoader for FileSystemTextureLoader {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            FileSystemTextureLoader::Ktx1(loader) => loader.dimensions(),
            FileSystemTextureLoader::Ktx2(loader) => loader.dimensions(),
        }
    }

    fn mip_level_count(&self) -> u32 {
        match self {
            FileSystemTextureLoader::Ktx1(loader) => loader.mip_level_count(),
            FileSystemTextureLoader::Ktx2(loader) => loader.mip_level_count(),
        }
    }

    fn format(&self) -> wgpu::TextureFormat {
        match self {
            FileSystemTextureLoader::Ktx1(loader) => loader.format(),
            FileSystemTextureLoader::Ktx2(loader) => loader.format(),
        }
    }

    fn load_level(&self, mip_level: u32) -> Result<&[u8], LoadError> {
        match self {
            FileSystemTextureLoader::Ktx1(loader) => loader.load_level(mip_level),
            FileSystemTextureLoader::Ktx2(loader) => loader.load_level(mip_level),
        }
    }
}
