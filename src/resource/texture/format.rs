use wgpu::{AstcBlock, AstcChannel, TextureFormat};

use crate::error::LoadError;

/// How the texels of a KTX 1.1 level are laid out in the file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelLayout {
    Compressed,
    /// Stored as-is; rows are padded to four bytes in the file.
    Uncompressed { bytes_per_pixel: u32 },
    /// Three-channel data the GPU cannot sample directly, widened to RGBA.
    Rgb { component: RgbComponent },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RgbComponent {
    U8,
    F16,
    F32,
}

impl RgbComponent {
    pub fn size(&self) -> u32 {
        match self {
            RgbComponent::U8 => 1,
            RgbComponent::F16 => 2,
            RgbComponent::F32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GlFormatMapping {
    pub format: TextureFormat,
    pub layout: PixelLayout,
}

impl GlFormatMapping {
    fn compressed(format: TextureFormat) -> Option<Self> {
        Some(Self {
            format,
            layout: PixelLayout::Compressed,
        })
    }

    fn uncompressed(format: TextureFormat, bytes_per_pixel: u32) -> Option<Self> {
        Some(Self {
            format,
            layout: PixelLayout::Uncompressed { bytes_per_pixel },
        })
    }

    fn rgb(format: TextureFormat, component: RgbComponent) -> Option<Self> {
        Some(Self {
            format,
            layout: PixelLayout::Rgb { component },
        })
    }
}

const GL_UNSIGNED_BYTE: u32 = 0x1401;
const GL_HALF_FLOAT: u32 = 0x140B;
const GL_FLOAT: u32 = 0x1406;
const GL_RED: u32 = 0x1903;
const GL_RGB: u32 = 0x1907;
const GL_RGBA: u32 = 0x1908;
const GL_RG: u32 = 0x8227;

const GL_COMPRESSED_RGBA_ASTC_4X4: u32 = 0x93B0;
const GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4: u32 = 0x93D0;

const ASTC_BLOCKS: [AstcBlock; 14] = [
    AstcBlock::B4x4,
    AstcBlock::B5x4,
    AstcBlock::B5x5,
    AstcBlock::B6x5,
    AstcBlock::B6x6,
    AstcBlock::B8x5,
    AstcBlock::B8x6,
    AstcBlock::B8x8,
    AstcBlock::B10x5,
    AstcBlock::B10x6,
    AstcBlock::B10x8,
    AstcBlock::B10x10,
    AstcBlock::B12x10,
    AstcBlock::B12x12,
];

/// Maps the GL format triple of a KTX 1.1 header to a GPU format. Unsized internal
/// formats fall back to the `gl_format`/`gl_type` pair.
pub fn map_gl_format(gl_internal_format: u32, gl_format: u32, gl_type: u32) -> Option<GlFormatMapping> {
    use TextureFormat::*;

    match gl_internal_format {
        // Uncompressed, sized
        0x8058 => GlFormatMapping::uncompressed(Rgba8Unorm, 4),
        0x8C43 => GlFormatMapping::uncompressed(Rgba8UnormSrgb, 4),
        0x8229 => GlFormatMapping::uncompressed(R8Unorm, 1),
        0x822B => GlFormatMapping::uncompressed(Rg8Unorm, 2),
        0x881A => GlFormatMapping::uncompressed(Rgba16Float, 8),
        0x8814 => GlFormatMapping::uncompressed(Rgba32Float, 16),
        0x8051 => GlFormatMapping::rgb(Rgba8Unorm, RgbComponent::U8),
        0x8C41 => GlFormatMapping::rgb(Rgba8UnormSrgb, RgbComponent::U8),
        0x881B => GlFormatMapping::rgb(Rgba16Float, RgbComponent::F16),
        0x8815 => GlFormatMapping::rgb(Rgba32Float, RgbComponent::F32),

        // S3TC
        0x83F0 | 0x83F1 => GlFormatMapping::compressed(Bc1RgbaUnorm),
        0x8C4C | 0x8C4D => GlFormatMapping::compressed(Bc1RgbaUnormSrgb),
        0x83F2 => GlFormatMapping::compressed(Bc2RgbaUnorm),
        0x8C4E => GlFormatMapping::compressed(Bc2RgbaUnormSrgb),
        0x83F3 => GlFormatMapping::compressed(Bc3RgbaUnorm),
        0x8C4F => GlFormatMapping::compressed(Bc3RgbaUnormSrgb),

        // RGTC
        0x8DBB => GlFormatMapping::compressed(Bc4RUnorm),
        0x8DBC => GlFormatMapping::compressed(Bc4RSnorm),
        0x8DBD => GlFormatMapping::compressed(Bc5RgUnorm),
        0x8DBE => GlFormatMapping::compressed(Bc5RgSnorm),

        // BPTC
        0x8E8C => GlFormatMapping::compressed(Bc7RgbaUnorm),
        0x8E8D => GlFormatMapping::compressed(Bc7RgbaUnormSrgb),
        0x8E8E => GlFormatMapping::compressed(Bc6hRgbFloat),
        0x8E8F => GlFormatMapping::compressed(Bc6hRgbUfloat),

        // ETC1 is a subset of ETC2 RGB
        0x8D64 | 0x9274 => GlFormatMapping::compressed(Etc2Rgb8Unorm),
        0x9275 => GlFormatMapping::compressed(Etc2Rgb8UnormSrgb),
        0x9276 => GlFormatMapping::compressed(Etc2Rgb8A1Unorm),
        0x9277 => GlFormatMapping::compressed(Etc2Rgb8A1UnormSrgb),
        0x9278 => GlFormatMapping::compressed(Etc2Rgba8Unorm),
        0x9279 => GlFormatMapping::compressed(Etc2Rgba8UnormSrgb),
        0x9270 => GlFormatMapping::compressed(EacR11Unorm),
        0x9271 => GlFormatMapping::compressed(EacR11Snorm),
        0x9272 => GlFormatMapping::compressed(EacRg11Unorm),
        0x9273 => GlFormatMapping::compressed(EacRg11Snorm),

        format
            if (GL_COMPRESSED_RGBA_ASTC_4X4..GL_COMPRESSED_RGBA_ASTC_4X4 + 14)
                .contains(&format) =>
        {
            GlFormatMapping::compressed(Astc {
                block: ASTC_BLOCKS[(format - GL_COMPRESSED_RGBA_ASTC_4X4) as usize],
                channel: AstcChannel::Unorm,
            })
        }
        format
            if (GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4..GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4 + 14)
                .contains(&format) =>
        {
            GlFormatMapping::compressed(Astc {
                block: ASTC_BLOCKS[(format - GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4) as usize],
                channel: AstcChannel::UnormSrgb,
            })
        }

        GL_RGBA | GL_RGB | GL_RG | GL_RED => map_unsized_gl_format(gl_format, gl_type),
        _ => None,
    }
}

fn map_unsized_gl_format(gl_format: u32, gl_type: u32) -> Option<GlFormatMapping> {
    use TextureFormat::*;

    match (gl_format, gl_type) {
        (GL_RGBA, GL_UNSIGNED_BYTE) => GlFormatMapping::uncompressed(Rgba8Unorm, 4),
        (GL_RGBA, GL_HALF_FLOAT) => GlFormatMapping::uncompressed(Rgba16Float, 8),
        (GL_RGBA, GL_FLOAT) => GlFormatMapping::uncompressed(Rgba32Float, 16),
        (GL_RGB, GL_UNSIGNED_BYTE) => GlFormatMapping::rgb(Rgba8Unorm, RgbComponent::U8),
        (GL_RGB, GL_HALF_FLOAT) => GlFormatMapping::rgb(Rgba16Float, RgbComponent::F16),
        (GL_RGB, GL_FLOAT) => GlFormatMapping::rgb(Rgba32Float, RgbComponent::F32),
        (GL_RG, GL_UNSIGNED_BYTE) => GlFormatMapping::uncompressed(Rg8Unorm, 2),
        (GL_RED, GL_UNSIGNED_BYTE) => GlFormatMapping::uncompressed(R8Unorm, 1),
        _ => None,
    }
}

pub fn map_vk_format(format: ktx2::Format) -> Option<TextureFormat> {
    use ktx2::Format as Vk;
    use TextureFormat::*;

    let astc = |block, channel| Some(Astc { block, channel });

    match format {
        Vk::R8_UNORM => Some(R8Unorm),
        Vk::R8G8_UNORM => Some(Rg8Unorm),
        Vk::R8G8B8A8_UNORM => Some(Rgba8Unorm),
        Vk::R8G8B8A8_SRGB => Some(Rgba8UnormSrgb),
        Vk::B8G8R8A8_UNORM => Some(Bgra8Unorm),
        Vk::B8G8R8A8_SRGB => Some(Bgra8UnormSrgb),
        Vk::R16G16B16A16_SFLOAT => Some(Rgba16Float),
        Vk::R32G32B32A32_SFLOAT => Some(Rgba32Float),

        Vk::BC1_RGB_UNORM_BLOCK | Vk::BC1_RGBA_UNORM_BLOCK => Some(Bc1RgbaUnorm),
        Vk::BC1_RGB_SRGB_BLOCK | Vk::BC1_RGBA_SRGB_BLOCK => Some(Bc1RgbaUnormSrgb),
        Vk::BC2_UNORM_BLOCK => Some(Bc2RgbaUnorm),
        Vk::BC2_SRGB_BLOCK => Some(Bc2RgbaUnormSrgb),
        Vk::BC3_UNORM_BLOCK => Some(Bc3RgbaUnorm),
        Vk::BC3_SRGB_BLOCK => Some(Bc3RgbaUnormSrgb),
        Vk::BC4_UNORM_BLOCK => Some(Bc4RUnorm),
        Vk::BC4_SNORM_BLOCK => Some(Bc4RSnorm),
        Vk::BC5_UNORM_BLOCK => Some(Bc5RgUnorm),
        Vk::BC5_SNORM_BLOCK => Some(Bc5RgSnorm),
        Vk::BC6H_UFLOAT_BLOCK => Some(Bc6hRgbUfloat),
        Vk::BC6H_SFLOAT_BLOCK => Some(Bc6hRgbFloat),
        Vk::BC7_UNORM_BLOCK => Some(Bc7RgbaUnorm),
        Vk::BC7_SRGB_BLOCK => Some(Bc7RgbaUnormSrgb),

        Vk::ETC2_R8G8B8_UNORM_BLOCK => Some(Etc2Rgb8Unorm),
        Vk::ETC2_R8G8B8_SRGB_BLOCK => Some(Etc2Rgb8UnormSrgb),
        Vk::ETC2_R8G8B8A1_UNORM_BLOCK => Some(Etc2Rgb8A1Unorm),
        Vk::ETC2_R8G8B8A1_SRGB_BLOCK => Some(Etc2Rgb8A1UnormSrgb),
        Vk::ETC2_R8G8B8A8_UNORM_BLOCK => Some(Etc2Rgba8Unorm),
        Vk::ETC2_R8G8B8A8_SRGB_BLOCK => Some(Etc2Rgba8UnormSrgb),
        Vk::EAC_R11_UNORM_BLOCK => Some(EacR11Unorm),
        Vk::EAC_R11_SNORM_BLOCK => Some(EacR11Snorm),
        Vk::EAC_R11G11_UNORM_BLOCK => Some(EacRg11Unorm),
        Vk::EAC_R11G11_SNORM_BLOCK => Some(EacRg11Snorm),

        Vk::ASTC_4x4_UNORM_BLOCK => astc(AstcBlock::B4x4, AstcChannel::Unorm),
        Vk::ASTC_4x4_SRGB_BLOCK => astc(AstcBlock::B4x4, AstcChannel::UnormSrgb),
        Vk::ASTC_5x4_UNORM_BLOCK => astc(AstcBlock::B5x4, AstcChannel::Unorm),
        Vk::ASTC_5x4_SRGB_BLOCK => astc(AstcBlock::B5x4, AstcChannel::UnormSrgb),
        Vk::ASTC_5x5_UNORM_BLOCK => astc(AstcBlock::B5x5, AstcChannel::Unorm),
        Vk::ASTC_5x5_SRGB_BLOCK => astc(AstcBlock::B5x5, AstcChannel::UnormSrgb),
        Vk::ASTC_6x5_UNORM_BLOCK => astc(AstcBlock::B6x5, AstcChannel::Unorm),
        Vk::ASTC_6x5_SRGB_BLOCK => astc(AstcBlock::B6x5, AstcChannel::UnormSrgb),
        Vk::ASTC_6x6_UNORM_BLOCK => astc(AstcBlock::B6x6, AstcChannel::Unorm),
        Vk::ASTC_6x6_SRGB_BLOCK => astc(AstcBlock::B6x6, AstcChannel::UnormSrgb),
        Vk::ASTC_8x5_UNORM_BLOCK => astc(AstcBlock::B8x5, AstcChannel::Unorm),
        Vk::ASTC_8x5_SRGB_BLOCK => astc(AstcBlock::B8x5, AstcChannel::UnormSrgb),
        Vk::ASTC_8x6_UNORM_BLOCK => astc(AstcBlock::B8x6, AstcChannel::Unorm),
        Vk::ASTC_8x6_SRGB_BLOCK => astc(AstcBlock::B8x6, AstcChannel::UnormSrgb),
        Vk::ASTC_8x8_UNORM_BLOCK => astc(AstcBlock::B8x8, AstcChannel::Unorm),
        Vk::ASTC_8x8_SRGB_BLOCK => astc(AstcBlock::B8x8, AstcChannel::UnormSrgb),
        Vk::ASTC_10x5_UNORM_BLOCK => astc(AstcBlock::B10x5, AstcChannel::Unorm),
        Vk::ASTC_10x5_SRGB_BLOCK => astc(AstcBlock::B10x5, AstcChannel::UnormSrgb),
        Vk::ASTC_10x6_UNORM_BLOCK => astc(AstcBlock::B10x6, AstcChannel::Unorm),
        Vk::ASTC_10x6_SRGB_BLOCK => astc(AstcBlock::B10x6, AstcChannel::UnormSrgb),
        Vk::ASTC_10x8_UNORM_BLOCK => astc(AstcBlock::B10x8, AstcChannel::Unorm),
        Vk::ASTC_10x8_SRGB_BLOCK => astc(AstcBlock::B10x8, AstcChannel::UnormSrgb),
        Vk::ASTC_10x10_UNORM_BLOCK => astc(AstcBlock::B10x10, AstcChannel::Unorm),
        Vk::ASTC_10x10_SRGB_BLOCK => astc(AstcBlock::B10x10, AstcChannel::UnormSrgb),
        Vk::ASTC_12x10_UNORM_BLOCK => astc(AstcBlock::B12x10, AstcChannel::Unorm),
        Vk::ASTC_12x10_SRGB_BLOCK => astc(AstcBlock::B12x10, AstcChannel::UnormSrgb),
        Vk::ASTC_12x12_UNORM_BLOCK => astc(AstcBlock::B12x12, AstcChannel::Unorm),
        Vk::ASTC_12x12_SRGB_BLOCK => astc(AstcBlock::B12x12, AstcChannel::UnormSrgb),

        _ => None,
    }
}

/// Size in bytes of one tightly packed level of the given dimensions.
pub fn level_byte_length(
    format: TextureFormat,
    width: u32,
    height: u32,
) -> Result<usize, LoadError> {
    let (block_width, block_height) = format.block_dimensions();
    let block_size = format
        .block_copy_size(None)
        .ok_or_else(|| LoadError::unsupported(format!("{format:?} has no copyable size")))?;

    let blocks_across = width.div_ceil(block_width) as usize;
    let blocks_down = height.div_ceil(block_height) as usize;

    blocks_across
        .checked_mul(blocks_down)
        .and_then(|blocks| blocks.checked_mul(block_size as usize))
        .ok_or_else(|| LoadError::invalid(format!("a {width}x{height} level is too large")))
}

/// Row pitch in bytes of a tightly packed level, used for texture uploads.
pub fn bytes_per_row(format: TextureFormat, width: u32) -> Option<u32> {
    let (block_width, _) = format.block_dimensions();
    let block_size = format.block_copy_size(None)?;

    width.div_ceil(block_width).checked_mul(block_size)
}

pub fn mip_level_dimensions(width: u32, height: u32, mip_level: u32) -> (u32, u32) {
    (
        width.checked_shr(mip_level).unwrap_or(0).max(1),
        height.checked_shr(mip_level).unwrap_or(0).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_gl_formats_map_directly() {
        assert_eq!(
            map_gl_format(0x8058, GL_RGBA, GL_UNSIGNED_BYTE),
            Some(GlFormatMapping {
                format: TextureFormat::Rgba8Unorm,
                layout: PixelLayout::Uncompressed { bytes_per_pixel: 4 },
            })
        );
        assert_eq!(
            map_gl_format(0x83F3, 0, 0).map(|mapping| mapping.format),
            Some(TextureFormat::Bc3RgbaUnorm)
        );
        assert_eq!(
            map_gl_format(0x8D64, 0, 0).map(|mapping| mapping.format),
            Some(TextureFormat::Etc2Rgb8Unorm)
        );
    }

    #[test]
    fn unsized_gl_formats_use_format_and_type() {
        assert_eq!(
            map_gl_format(GL_RGB, GL_RGB, GL_UNSIGNED_BYTE),
            Some(GlFormatMapping {
                format: TextureFormat::Rgba8Unorm,
                layout: PixelLayout::Rgb {
                    component: RgbComponent::U8
                },
            })
        );
        assert_eq!(map_gl_format(GL_RGBA, GL_RGBA, 0x1403), None);
    }

    #[test]
    fn astc_ranges_cover_every_block_size() {
        assert_eq!(
            map_gl_format(0x93B0, 0, 0).map(|mapping| mapping.format),
            Some(TextureFormat::Astc {
                block: AstcBlock::B4x4,
                channel: AstcChannel::Unorm,
            })
        );
        assert_eq!(
            map_gl_format(0x93DD, 0, 0).map(|mapping| mapping.format),
            Some(TextureFormat::Astc {
                block: AstcBlock::B12x12,
                channel: AstcChannel::UnormSrgb,
            })
        );
        assert_eq!(map_gl_format(0x93BE, 0, 0), None);
    }

    #[test]
    fn vk_formats_map_to_gpu_formats() {
        assert_eq!(
            map_vk_format(ktx2::Format::R8G8B8A8_SRGB),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(
            map_vk_format(ktx2::Format::BC7_UNORM_BLOCK),
            Some(TextureFormat::Bc7RgbaUnorm)
        );
        assert_eq!(map_vk_format(ktx2::Format::R8G8B8_UNORM), None);
    }

    #[test]
    fn level_sizes_round_up_to_whole_blocks() {
        assert_eq!(level_byte_length(TextureFormat::Rgba8Unorm, 3, 2).unwrap(), 24);
        assert_eq!(level_byte_length(TextureFormat::Bc1RgbaUnorm, 1, 1).unwrap(), 8);
        assert_eq!(level_byte_length(TextureFormat::Bc3RgbaUnorm, 8, 5).unwrap(), 64);
        assert_eq!(bytes_per_row(TextureFormat::Bc1RgbaUnorm, 6), Some(16));
    }

    #[test]
    fn oversized_levels_are_invalid() {
        assert!(matches!(
            level_byte_length(TextureFormat::Rgba32Float, u32::MAX, u32::MAX),
            Err(LoadError::InvalidContainer(_))
        ));
        assert!(matches!(
            level_byte_length(TextureFormat::Depth24Plus, 4, 4),
            Err(LoadError::UnsupportedTexture(_))
        ));
        assert_eq!(bytes_per_row(TextureFormat::Rgba32Float, u32::MAX), None);
    }

    #[test]
    fn mip_dimensions_never_reach_zero() {
        assert_eq!(mip_level_dimensions(256, 64, 0), (256, 64));
        assert_eq!(mip_level_dimensions(256, 64, 3), (32, 8));
        assert_eq!(mip_level_dimensions(256, 64, 8), (1, 1));
        assert_eq!(mip_level_dimensions(256, 64, 40), (1, 1));
    }
}
