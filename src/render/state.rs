use anyhow::Result;

use crate::error::Error;
use crate::render::quad::QuadRenderer;

const SHADER_TEMPLATE_GLOB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/**/*");

/// Optional device features that widen the set of loadable texture formats.
const TEXTURE_FEATURES: wgpu::Features = wgpu::Features::TEXTURE_COMPRESSION_BC
    .union(wgpu::Features::TEXTURE_COMPRESSION_ETC2)
    .union(wgpu::Features::TEXTURE_COMPRESSION_ASTC)
    .union(wgpu::Features::FLOAT32_FILTERABLE);

pub struct RenderSystemState {
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub device: std::rc::Rc<wgpu::Device>,
    pub queue: std::rc::Rc<wgpu::Queue>,
    pub quad_renderer: QuadRenderer,
    pub view_dimensions: winit::dpi::PhysicalSize<u32>,
}

impl RenderSystemState {
    pub async fn from_window(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let view_dimensions = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Some(adapter) => adapter,
            None => return Err(Error::new(String::from("Failed to retrieve adapter.")).into()),
        };

        let required_features = adapter.features() & TEXTURE_FEATURES;

        log::info!(
            "Using adapter {:?} with texture features {:?}",
            adapter.get_info().name,
            required_features
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("VIEWER_DEVICE"),
                    required_features,
                    ..Default::default()
                },
                None,
            )
            .await?;

        let device = std::rc::Rc::new(device);
        let queue = std::rc::Rc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = match select_surface_format(&surface_caps.formats) {
            Some(surface_format) => surface_format,
            None => return Err(Error::new(String::from("Surface has no usable format.")).into()),
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: view_dimensions.width.max(1),
            height: view_dimensions.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let tera = tera::Tera::new(SHADER_TEMPLATE_GLOB)?;
        let quad_renderer = QuadRenderer::from_device(device.clone(), &queue, surface_format, &tera)?;

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            quad_renderer,
            view_dimensions,
        })
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        self.view_dimensions = view_dimensions;
        self.surface_config.width = view_dimensions.width;
        self.surface_config.height = view_dimensions.height;
        self.surface.configure(&self.device, &self.surface_config);
    }
}

/// Texels are shown as stored, so a surface without sRGB encoding wins when one exists.
fn select_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first())
        .copied()
}
