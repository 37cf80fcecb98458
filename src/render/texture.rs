use crate::error::LoadError;
use crate::mipmap::SamplingBounds;
use crate::resource::texture::format::{bytes_per_row, mip_level_dimensions};
use crate::resource::texture::TextureLoader;

/// GPU copy of a loaded texture with its full mip chain.
pub struct TextureAsset {
    pub gpu_texture: wgpu::Texture,
    pub gpu_sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    mip_level_count: u32,
}

impl TextureAsset {
    pub fn from_loader(
        loader: &impl TextureLoader,
        name: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Self, LoadError> {
        let (width, height) = loader.dimensions();
        let format = loader.format();
        let mip_level_count = loader.mip_level_count();

        TextureAsset::check_format_support(format, device)?;

        let (block_width, block_height) = format.block_dimensions();
        if width % block_width != 0 || height % block_height != 0 {
            return Err(LoadError::unsupported(format!(
                "{width}x{height} is not a multiple of the {block_width}x{block_height} block size of {format:?}"
            )));
        }

        let max_mip_level_count = 32 - width.max(height).leading_zeros();
        if mip_level_count > max_mip_level_count {
            return Err(LoadError::invalid(format!(
                "{mip_level_count} mip levels declared but a {width}x{height} texture has at most {max_mip_level_count}"
            )));
        }

        let levels = (0..mip_level_count)
            .map(|mip_level| loader.load_level(mip_level))
            .collect::<Result<Vec<_>, _>>()?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_TEXTURE")),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, data) in levels.into_iter().enumerate() {
            let mip_level = mip_level as u32;
            let (level_width, level_height) = mip_level_dimensions(width, height, mip_level);

            TextureAsset::write_level(
                &gpu_texture,
                mip_level,
                level_width,
                level_height,
                data,
                queue,
            );
        }

        queue.submit([]);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(LoadError::Gpu(error.to_string()));
        }

        let gpu_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{name}_SAMPLER")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            gpu_texture,
            gpu_sampler,
            width,
            height,
            mip_level_count,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// View that only exposes the levels inside `bounds` to the sampler.
    pub fn create_view(&self, bounds: SamplingBounds, name: &str) -> wgpu::TextureView {
        let (base_mip_level, mip_level_count) = bounds.view_range(self.mip_level_count);

        self.gpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!(
                "{name}_TEXTURE_VIEW_{}_{}",
                bounds.base_level, bounds.max_level
            )),
            format: Some(self.gpu_texture.format()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level,
            mip_level_count: Some(mip_level_count),
            base_array_layer: 0,
            array_layer_count: Some(1),
        })
    }

    fn check_format_support(
        format: wgpu::TextureFormat,
        device: &wgpu::Device,
    ) -> Result<(), LoadError> {
        let required_features = format.required_features();
        if !device.features().contains(required_features) {
            return Err(LoadError::unsupported(format!(
                "{format:?} needs {required_features:?}, which the graphics adapter does not provide"
            )));
        }

        let format_features = format.guaranteed_format_features(device.features());
        if !format_features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(LoadError::unsupported(format!(
                "{format:?} cannot be sampled with filtering on this graphics adapter"
            )));
        }

        Ok(())
    }

    fn write_level(
        gpu_texture: &wgpu::Texture,
        mip_level: u32,
        width: u32,
        height: u32,
        data: &[u8],
        queue: &wgpu::Queue,
    ) {
        let format = gpu_texture.format();

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: gpu_texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: bytes_per_row(format, width),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            }
            .physical_size(format),
        );
    }
}
