use anyhow::Result;

use crate::mipmap::ViewState;
use crate::render::RenderSystem;
use crate::resource::texture::TextureLoader;

pub struct ViewSystem {
    pub window: std::sync::Arc<winit::window::Window>,
    pub render_system: RenderSystem,
    pub view_state: ViewState,
}

impl ViewSystem {
    pub async fn from_window(
        window: winit::window::Window,
        texture_loader: &impl TextureLoader,
    ) -> Result<Self> {
        let window = std::sync::Arc::new(window);

        let mut render_system = RenderSystem::from_window(window.clone()).await?;

        let mip_level_count = render_system.load_texture(texture_loader)?;
        let view_state = ViewState::new(mip_level_count);

        Ok(Self {
            window,
            render_system,
            view_state,
        })
    }

    pub fn update_view(&mut self) -> Result<()> {
        self.render_system.render(&self.view_state)
    }
}
