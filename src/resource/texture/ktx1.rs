use std::io::{Cursor, Read};

use crate::error::LoadError;
use crate::resource::texture::format::{
    level_byte_length, map_gl_format, mip_level_dimensions, GlFormatMapping, PixelLayout,
    RgbComponent,
};
use crate::resource::texture::TextureLoader;

pub const KTX1_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

const ENDIANNESS_REFERENCE: u32 = 0x0403_0201;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Endian {
    Little,
    Big,
}

#[derive(Clone, Debug)]
pub struct Ktx1Header {
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub number_of_array_elements: u32,
    pub number_of_faces: u32,
    pub number_of_mipmap_levels: u32,
    pub bytes_of_key_value_data: u32,
}

impl Ktx1Header {
    fn read(reader: &mut Cursor<&[u8]>, endian: Endian) -> Result<Self, LoadError> {
        let gl_type = read_u32(reader, endian)?;
        let gl_type_size = read_u32(reader, endian)?;
        let gl_format = read_u32(reader, endian)?;
        let gl_internal_format = read_u32(reader, endian)?;
        // glBaseInternalFormat follows from glInternalFormat.
        let _ = read_u32(reader, endian)?;

        Ok(Self {
            gl_type,
            gl_type_size,
            gl_format,
            gl_internal_format,
            pixel_width: read_u32(reader, endian)?,
            pixel_height: read_u32(reader, endian)?,
            pixel_depth: read_u32(reader, endian)?,
            number_of_array_elements: read_u32(reader, endian)?,
            number_of_faces: read_u32(reader, endian)?,
            number_of_mipmap_levels: read_u32(reader, endian)?,
            bytes_of_key_value_data: read_u32(reader, endian)?,
        })
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.pixel_width == 0 {
            return Err(LoadError::invalid("KTX header has a pixel width of zero"));
        }

        if self.pixel_depth > 1 {
            return Err(LoadError::unsupported(format!(
                "3D textures are not supported (depth={})",
                self.pixel_depth
            )));
        }

        if self.number_of_array_elements != 0 {
            return Err(LoadError::unsupported(format!(
                "array textures are not supported (elements={})",
                self.number_of_array_elements
            )));
        }

        if self.number_of_faces != 1 {
            return Err(LoadError::unsupported(format!(
                "only single-face textures are supported (faces={})",
                self.number_of_faces
            )));
        }

        let largest_side = self.pixel_width.max(self.pixel_height);
        let max_level_count = u32::BITS - largest_side.leading_zeros();
        if self.number_of_mipmap_levels > max_level_count {
            return Err(LoadError::invalid(format!(
                "{} mip levels declared for a {}x{} texture, at most {max_level_count} fit",
                self.number_of_mipmap_levels, self.pixel_width, self.pixel_height
            )));
        }

        Ok(())
    }
}

/// A KTX 1.1 texture decoded into tightly packed levels ready for upload.
pub struct Ktx1TextureLoader {
    header: Ktx1Header,
    format: wgpu::TextureFormat,
    levels: Vec<Vec<u8>>,
}

impl Ktx1TextureLoader {
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let mut reader = Cursor::new(data);

        let identifier = read_slice(&mut reader, KTX1_IDENTIFIER.len())?;
        if identifier != KTX1_IDENTIFIER {
            return Err(LoadError::invalid("missing KTX 1.1 identifier"));
        }

        let endianness = read_u32(&mut reader, Endian::Little)?;
        let endian = if endianness == ENDIANNESS_REFERENCE {
            Endian::Little
        } else if endianness.swap_bytes() == ENDIANNESS_REFERENCE {
            Endian::Big
        } else {
            return Err(LoadError::invalid(format!(
                "unknown endianness marker 0x{endianness:08X}"
            )));
        };

        let header = Ktx1Header::read(&mut reader, endian)?;
        header.validate()?;

        let mapping = map_gl_format(header.gl_internal_format, header.gl_format, header.gl_type)
            .ok_or_else(|| {
                LoadError::unsupported(format!(
                    "GL internal format 0x{:04X} (format=0x{:04X}, type=0x{:04X})",
                    header.gl_internal_format, header.gl_format, header.gl_type
                ))
            })?;

        read_slice(&mut reader, header.bytes_of_key_value_data as usize)?;

        let width = header.pixel_width;
        let height = header.pixel_height.max(1);
        let level_count = header.number_of_mipmap_levels.max(1);

        let mut levels = Vec::new();
        for mip_level in 0..level_count {
            let image_size = read_u32(&mut reader, endian)? as usize;
            let image = read_slice(&mut reader, image_size)?;

            let (level_width, level_height) = mip_level_dimensions(width, height, mip_level);
            let level = decode_level(
                image,
                level_width,
                level_height,
                mapping,
                endian,
                header.gl_type_size,
            )
            .map_err(|error| match error {
                LoadError::InvalidContainer(message) => {
                    LoadError::invalid(format!("mip level {mip_level}: {message}"))
                }
                error => error,
            })?;
            levels.push(level);

            // Levels are padded to four bytes; the padding after the last one may be missing.
            let padding = (4 - image_size % 4) % 4;
            let remaining = data.len().saturating_sub(reader.position() as usize);
            reader.set_position(reader.position() + padding.min(remaining) as u64);
        }

        Ok(Self {
            header,
            format: mapping.format,
            levels,
        })
    }
}

impl TextureLoader for Ktx1TextureLoader {
    fn dimensions(&self) -> (u32, u32) {
        (self.header.pixel_width, self.header.pixel_height.max(1))
    }

    fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn load_level(&self, mip_level: u32) -> Result<&[u8], LoadError> {
        match self.levels.get(mip_level as usize) {
            Some(level) => Ok(level),
            None => Err(LoadError::invalid(format!(
                "the texture does not have a mip level that matches the specified index: {mip_level}"
            ))),
        }
    }
}

fn decode_level(
    image: &[u8],
    width: u32,
    height: u32,
    mapping: GlFormatMapping,
    endian: Endian,
    gl_type_size: u32,
) -> Result<Vec<u8>, LoadError> {
    let bytes_per_pixel = match mapping.layout {
        PixelLayout::Compressed => {
            let expected = level_byte_length(mapping.format, width, height)?;

            if image.len() < expected {
                return Err(LoadError::invalid(format!(
                    "expected {expected} bytes of compressed data, found {}",
                    image.len()
                )));
            }

            return Ok(image[..expected].to_vec());
        }
        PixelLayout::Uncompressed { bytes_per_pixel } => bytes_per_pixel,
        PixelLayout::Rgb { component } => 3 * component.size(),
    };

    let mut pixels = repack_rows(image, width, height, bytes_per_pixel)?;

    if endian == Endian::Big && matches!(gl_type_size, 2 | 4) {
        for word in pixels.chunks_exact_mut(gl_type_size as usize) {
            word.reverse();
        }
    }

    match mapping.layout {
        PixelLayout::Rgb { component } => expand_rgb(pixels, width, height, component),
        _ => Ok(pixels),
    }
}

/// Drops the four-byte row alignment KTX 1.1 applies to uncompressed data.
fn repack_rows(
    image: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> Result<Vec<u8>, LoadError> {
    let too_large = || LoadError::invalid(format!("a {width}x{height} level is too large"));

    let row_length = (width as usize)
        .checked_mul(bytes_per_pixel as usize)
        .ok_or_else(too_large)?;
    let row_stride = row_length.checked_next_multiple_of(4).ok_or_else(too_large)?;
    let required = row_stride
        .checked_mul(height as usize - 1)
        .and_then(|padded_rows| padded_rows.checked_add(row_length))
        .ok_or_else(too_large)?;

    if image.len() < required {
        return Err(LoadError::invalid(format!(
            "expected at least {required} bytes of pixel data, found {}",
            image.len()
        )));
    }

    if row_stride == row_length {
        return Ok(image[..row_length * height as usize].to_vec());
    }

    let mut pixels = Vec::with_capacity(row_length * height as usize);
    for row in image.chunks(row_stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_length]);
    }

    Ok(pixels)
}

fn expand_rgb(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    component: RgbComponent,
) -> Result<Vec<u8>, LoadError> {
    match component {
        RgbComponent::U8 => {
            let rgb = image::RgbImage::from_raw(width, height, pixels)
                .ok_or_else(|| LoadError::invalid("RGB level is smaller than its dimensions"))?;

            Ok(image::DynamicImage::ImageRgb8(rgb).to_rgba8().into_raw())
        }
        RgbComponent::F16 => {
            let alpha = half::f16::ONE.to_le_bytes();

            let mut rgba = Vec::with_capacity(pixels.len() / 3 * 4);
            for texel in pixels.chunks_exact(6) {
                rgba.extend_from_slice(texel);
                rgba.extend_from_slice(&alpha);
            }

            Ok(rgba)
        }
        RgbComponent::F32 => {
            let components = pixels
                .chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<f32>)
                .collect::<Vec<f32>>();

            let rgb = image::Rgb32FImage::from_raw(width, height, components)
                .ok_or_else(|| LoadError::invalid("RGB level is smaller than its dimensions"))?;
            let rgba = image::DynamicImage::ImageRgb32F(rgb).to_rgba32f().into_raw();

            Ok(bytemuck::cast_slice(&rgba).to_vec())
        }
    }
}

fn read_u32(reader: &mut Cursor<&[u8]>, endian: Endian) -> Result<u32, LoadError> {
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| LoadError::invalid("unexpected end of data"))?;

    Ok(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

fn read_slice<'a>(reader: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], LoadError> {
    let data: &'a [u8] = reader.get_ref();
    let begin = reader.position() as usize;

    let end = match begin.checked_add(length) {
        Some(end) if end <= data.len() => end,
        _ => {
            return Err(LoadError::invalid(format!(
                "unexpected end of data: needed {length} bytes at offset {begin}, file is {} bytes",
                data.len()
            )))
        }
    };

    reader.set_position(end as u64);
    Ok(&data[begin..end])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub struct Ktx1Fixture {
        pub big_endian: bool,
        pub gl_type: u32,
        pub gl_type_size: u32,
        pub gl_format: u32,
        pub gl_internal_format: u32,
        pub width: u32,
        pub height: u32,
        pub faces: u32,
        pub key_value_data: Vec<u8>,
        pub levels: Vec<Vec<u8>>,
        pub declared_level_count: Option<u32>,
    }

    impl Ktx1Fixture {
        pub fn rgba8(width: u32, height: u32, levels: Vec<Vec<u8>>) -> Self {
            Self {
                big_endian: false,
                gl_type: 0x1401,
                gl_type_size: 1,
                gl_format: 0x1908,
                gl_internal_format: 0x8058,
                width,
                height,
                faces: 1,
                key_value_data: vec![],
                levels,
                declared_level_count: None,
            }
        }

        pub fn to_bytes(&self) -> Vec<u8> {
            let word = |value: u32| match self.big_endian {
                true => value.to_be_bytes(),
                false => value.to_le_bytes(),
            };

            let mut bytes = KTX1_IDENTIFIER.to_vec();
            for value in [
                ENDIANNESS_REFERENCE,
                self.gl_type,
                self.gl_type_size,
                self.gl_format,
                self.gl_internal_format,
                self.gl_format,
                self.width,
                self.height,
                0,
                0,
                self.faces,
                self.declared_level_count.unwrap_or(self.levels.len() as u32),
                self.key_value_data.len() as u32,
            ] {
                bytes.extend_from_slice(&word(value));
            }

            bytes.extend_from_slice(&self.key_value_data);

            for level in self.levels.iter() {
                bytes.extend_from_slice(&word(level.len() as u32));
                bytes.extend_from_slice(level);
                bytes.resize(bytes.len().next_multiple_of(4), 0);
            }

            bytes
        }
    }

    #[test]
    fn reads_every_rgba8_level() {
        let levels = vec![vec![1u8; 64], vec![2u8; 16], vec![3u8; 4]];
        let fixture = Ktx1Fixture::rgba8(4, 4, levels.clone());

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.dimensions(), (4, 4));
        assert_eq!(loader.mip_level_count(), 3);
        assert_eq!(loader.format(), wgpu::TextureFormat::Rgba8Unorm);
        for (index, level) in levels.iter().enumerate() {
            assert_eq!(loader.load_level(index as u32).unwrap(), level.as_slice());
        }
        assert!(loader.load_level(3).is_err());
    }

    #[test]
    fn skips_key_value_data() {
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![vec![9, 8, 7, 6]]);
        fixture.key_value_data = vec![12, 0, 0, 0, b'K', b'T', b'X', b'o', b'r', b'i', b'e', 0];

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.load_level(0).unwrap(), &[9, 8, 7, 6]);
    }

    #[test]
    fn ignores_the_base_internal_format() {
        let mut bytes = Ktx1Fixture::rgba8(1, 1, vec![vec![9, 8, 7, 6]]).to_bytes();
        bytes[32..36].copy_from_slice(&u32::MAX.to_le_bytes());

        let loader = Ktx1TextureLoader::from_bytes(&bytes).unwrap();

        assert_eq!(loader.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(loader.load_level(0).unwrap(), &[9, 8, 7, 6]);
    }

    #[test]
    fn zero_declared_levels_means_one() {
        let mut fixture = Ktx1Fixture::rgba8(2, 2, vec![vec![0u8; 16]]);
        fixture.declared_level_count = Some(0);

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.mip_level_count(), 1);
    }

    #[test]
    fn one_dimensional_textures_have_height_one() {
        let fixture = Ktx1Fixture::rgba8(2, 0, vec![vec![0u8; 8]]);

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.dimensions(), (2, 1));
    }

    #[test]
    fn rgb8_rows_are_repacked_and_widened() {
        let mut fixture = Ktx1Fixture::rgba8(
            2,
            2,
            vec![vec![1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0]],
        );
        fixture.gl_format = 0x1907;
        fixture.gl_internal_format = 0x8051;

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(
            loader.load_level(0).unwrap(),
            &[1, 2, 3, 255, 4, 5, 6, 255, 7, 8, 9, 255, 10, 11, 12, 255]
        );
    }

    #[test]
    fn rgb32f_texels_get_opaque_alpha() {
        let texel = [0.25f32, 0.5, 0.75];
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![bytemuck::cast_slice(&texel).to_vec()]);
        fixture.gl_type = 0x1406;
        fixture.gl_type_size = 4;
        fixture.gl_format = 0x1907;
        fixture.gl_internal_format = 0x8815;

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();
        let level = loader.load_level(0).unwrap();

        assert_eq!(loader.format(), wgpu::TextureFormat::Rgba32Float);
        assert_eq!(
            bytemuck::pod_collect_to_vec::<u8, f32>(level),
            vec![0.25, 0.5, 0.75, 1.0]
        );
    }

    #[test]
    fn big_endian_half_floats_are_swapped() {
        let one = half::f16::ONE.to_be_bytes();
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![[one, one, one, one].concat()]);
        fixture.big_endian = true;
        fixture.gl_type = 0x140B;
        fixture.gl_type_size = 2;
        fixture.gl_internal_format = 0x881A;

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();
        let expected = half::f16::ONE.to_le_bytes();

        assert_eq!(loader.format(), wgpu::TextureFormat::Rgba16Float);
        assert_eq!(loader.load_level(0).unwrap(), [expected; 4].concat().as_slice());
    }

    #[test]
    fn big_endian_header_matches_little_endian() {
        let levels = vec![vec![5u8; 16], vec![6u8; 4]];
        let little = Ktx1Fixture::rgba8(2, 2, levels.clone());
        let mut big = Ktx1Fixture::rgba8(2, 2, levels);
        big.big_endian = true;

        let little = Ktx1TextureLoader::from_bytes(&little.to_bytes()).unwrap();
        let big = Ktx1TextureLoader::from_bytes(&big.to_bytes()).unwrap();

        assert_eq!(little.dimensions(), big.dimensions());
        assert_eq!(little.mip_level_count(), big.mip_level_count());
        assert_eq!(little.load_level(1).unwrap(), big.load_level(1).unwrap());
    }

    #[test]
    fn compressed_levels_keep_whole_blocks() {
        let mut fixture = Ktx1Fixture::rgba8(
            8,
            8,
            vec![vec![1u8; 32], vec![2u8; 8], vec![3u8; 8], vec![4u8; 8]],
        );
        fixture.gl_type = 0;
        fixture.gl_format = 0;
        fixture.gl_internal_format = 0x83F1;

        let loader = Ktx1TextureLoader::from_bytes(&fixture.to_bytes()).unwrap();

        assert_eq!(loader.format(), wgpu::TextureFormat::Bc1RgbaUnorm);
        assert_eq!(loader.mip_level_count(), 4);
        assert_eq!(loader.load_level(3).unwrap(), &[4u8; 8]);
    }

    #[test]
    fn rejects_a_foreign_identifier() {
        let mut bytes = Ktx1Fixture::rgba8(1, 1, vec![vec![0u8; 4]]).to_bytes();
        bytes[5] = b'2';

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&bytes),
            Err(LoadError::InvalidContainer(_))
        ));
    }

    #[test]
    fn rejects_cube_maps() {
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![vec![0u8; 4]]);
        fixture.faces = 6;

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::UnsupportedTexture(_))
        ));
    }

    #[test]
    fn rejects_unknown_formats() {
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![vec![0u8; 4]]);
        fixture.gl_internal_format = 0x1234;

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::UnsupportedTexture(_))
        ));
    }

    #[test]
    fn rejects_short_levels() {
        let fixture = Ktx1Fixture::rgba8(4, 4, vec![vec![0u8; 32]]);

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::InvalidContainer(_))
        ));
    }

    #[test]
    fn rejects_more_levels_than_the_dimensions_allow() {
        let mut fixture = Ktx1Fixture::rgba8(1, 1, vec![vec![0u8; 4]]);
        fixture.declared_level_count = Some(u32::MAX);

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::InvalidContainer(_))
        ));

        let mut fixture = Ktx1Fixture::rgba8(4, 2, vec![vec![0u8; 32], vec![0u8; 8], vec![0u8; 4]]);
        fixture.declared_level_count = Some(4);

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::InvalidContainer(_))
        ));
    }

    #[test]
    fn rejects_dimensions_that_overflow_the_level_size() {
        for (width, height) in [(0x4000_0000, 1), (u32::MAX, u32::MAX)] {
            let fixture = Ktx1Fixture::rgba8(width, height, vec![vec![0u8; 4]]);

            assert!(matches!(
                Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
                Err(LoadError::InvalidContainer(_))
            ));
        }

        let mut fixture = Ktx1Fixture::rgba8(u32::MAX, u32::MAX, vec![vec![0u8; 8]]);
        fixture.gl_type = 0;
        fixture.gl_format = 0;
        fixture.gl_internal_format = 0x83F1;

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&fixture.to_bytes()),
            Err(LoadError::InvalidContainer(_))
        ));
    }

    #[test]
    fn rejects_truncated_files() {
        let bytes = Ktx1Fixture::rgba8(4, 4, vec![vec![0u8; 64]]).to_bytes();

        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&bytes[..bytes.len() - 10]),
            Err(LoadError::InvalidContainer(_))
        ));
        assert!(matches!(
            Ktx1TextureLoader::from_bytes(&bytes[..30]),
            Err(LoadError::InvalidContainer(_))
        ));
    }
}
