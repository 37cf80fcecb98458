use crate::error::LoadError;
use crate::resource::texture::format::{level_byte_length, map_vk_format, mip_level_dimensions};
use crate::resource::texture::TextureLoader;

pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

pub struct Ktx2TextureLoader<T: AsRef<[u8]>> {
    reader: ktx2::Reader<T>,
    format: wgpu::TextureFormat,
}

impl<T: AsRef<[u8]>> Ktx2TextureLoader<T> {
    pub fn from_reader(reader: ktx2::Reader<T>) -> Result<Self, LoadError> {
        let header = reader.header();

        if header.supercompression_scheme.is_some() {
            return Err(LoadError::unsupported(format!(
                "supercompressed KTX2 files are not supported: {:?}",
                header.supercompression_scheme
            )));
        }

        if header.face_count != 1 {
            return Err(LoadError::unsupported(format!(
                "only single-face textures are supported (faces={})",
                header.face_count
            )));
        }

        if header.layer_count > 1 {
            return Err(LoadError::unsupported(format!(
                "array textures are not supported (layers={})",
                header.layer_count
            )));
        }

        if header.pixel_depth > 1 {
            return Err(LoadError::unsupported(format!(
                "3D textures are not supported (depth={})",
                header.pixel_depth
            )));
        }

        let largest_side = header.pixel_width.max(header.pixel_height);
        let max_level_count = u32::BITS - largest_side.leading_zeros();
        if header.level_count > max_level_count {
            return Err(LoadError::invalid(format!(
                "{} mip levels declared for a {}x{} texture, at most {max_level_count} fit",
                header.level_count, header.pixel_width, header.pixel_height
            )));
        }

        let format = match header.format {
            Some(vk_format) => map_vk_format(vk_format).ok_or_else(|| {
                LoadError::unsupported(format!("KTX2 format {vk_format:?}"))
            })?,
            None => {
                return Err(LoadError::unsupported(
                    "KTX2 file does not specify a format",
                ))
            }
        };

        Ok(Self { reader, format })
    }
}

impl<T: AsRef<[u8]>> TextureLoader for Ktx2TextureLoader<T> {
    fn dimensions(&self) -> (u32, u32) {
        (
            self.reader.header().pixel_width,
            self.reader.header().pixel_height.max(1),
        )
    }

    fn mip_level_count(&self) -> u32 {
        self.reader.header().level_count.max(1)
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn load_level(&self, mip_level: u32) -> Result<&[u8], LoadError> {
        let level_data = match self.reader.levels().nth(mip_level as usize) {
            Some(level_data) => level_data,
            None => {
                return Err(LoadError::invalid(format!(
                    "the texture does not have a mip level that matches the specified index: {mip_level}"
                )))
            }
        };

        let (width, height) = self.dimensions();
        let (width, height) = mip_level_dimensions(width, height, mip_level);

        let expected = level_byte_length(self.format, width, height)?;

        if level_data.len() < expected {
            return Err(LoadError::invalid(format!(
                "mip level {mip_level}: expected {expected} bytes, found {}",
                level_data.len()
            )));
        }

        Ok(&level_data[..expected])
    }
}
