use std::collections::HashMap;

use anyhow::Result;

use crate::data::viewport::Viewport;
use crate::error::{Error, LoadError};
use crate::mipmap::{SamplingBounds, ViewState};
use crate::render::state::RenderSystemState;
use crate::render::texture::TextureAsset;
use crate::resource::texture::TextureLoader;

mod quad;
mod shader;
mod state;
mod texture;

const TEXTURE_NAME: &str = "VIEWER";

pub struct RenderSystem {
    state: RenderSystemState,
    texture: Option<TextureAsset>,
    bind_group_registry: HashMap<SamplingBounds, wgpu::BindGroup>,
}

impl RenderSystem {
    pub async fn from_window(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let state = RenderSystemState::from_window(window).await?;

        Ok(Self {
            state,
            texture: None,
            bind_group_registry: Default::default(),
        })
    }

    pub fn sync_view_dimensions(&mut self) {
        self.set_view_dimensions(self.state.view_dimensions);
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        if view_dimensions.width == 0 || view_dimensions.height == 0 {
            return;
        }

        self.state.set_view_dimensions(view_dimensions);
    }

    /// Uploads the texture and returns its mip level count.
    pub fn load_texture(&mut self, loader: &impl TextureLoader) -> Result<u32, LoadError> {
        let texture =
            TextureAsset::from_loader(loader, TEXTURE_NAME, &self.state.device, &self.state.queue)?;

        self.bind_group_registry.clear();
        let mip_level_count = texture.mip_level_count();
        self.texture = Some(texture);

        Ok(mip_level_count)
    }

    pub fn render(&mut self, view_state: &ViewState) -> Result<()> {
        let texture = match &self.texture {
            Some(texture) => texture,
            None => return Err(Error::new(String::from("No texture has been loaded")).into()),
        };

        if self.state.view_dimensions.width == 0 || self.state.view_dimensions.height == 0 {
            return Ok(());
        }

        let output = self.state.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.state
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("RENDER_SYSTEM_COMMAND_ENCODER"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("RENDER_SYSTEM_RENDER_PASS"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let viewport = Viewport::letterbox(
                (
                    self.state.surface_config.width,
                    self.state.surface_config.height,
                ),
                texture.dimensions(),
            );

            log::info!("Level: {}", view_state.selection());

            let bounds = view_state.sampling_bounds();
            let quad_renderer = &self.state.quad_renderer;
            let bind_group = self.bind_group_registry.entry(bounds).or_insert_with(|| {
                quad_renderer.create_bind_group(
                    &texture.create_view(bounds, TEXTURE_NAME),
                    &texture.gpu_sampler,
                    TEXTURE_NAME,
                )
            });

            if !viewport.is_empty() {
                quad_renderer.render_quad(bind_group, viewport, &mut render_pass);
            }
        }

        self.state.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
