use anyhow::Result;

pub struct ShaderModulePackage {
    pub vertex_shader_module: wgpu::ShaderModule,
    pub fragment_shader_module: wgpu::ShaderModule,
}

impl ShaderModulePackage {
    pub fn from_templates(
        vertex_template_name: &str,
        fragment_template_name: &str,
        name: &str,
        device: &wgpu::Device,
        tera: &tera::Tera,
    ) -> Result<Self> {
        let template_context = tera::Context::new();

        let vertex_shader_source =
            ShaderModulePackage::render_shader(vertex_template_name, tera, &template_context)?;
        let fragment_shader_source =
            ShaderModulePackage::render_shader(fragment_template_name, tera, &template_context)?;

        log::debug!("Creating shader module package {name}");

        Ok(ShaderModulePackage {
            vertex_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_VERTEX_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(vertex_shader_source.into()),
            }),
            fragment_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_FRAGMENT_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(fragment_shader_source.into()),
            }),
        })
    }

    fn render_shader(
        template_name: &str,
        tera: &tera::Tera,
        template_context: &tera::Context,
    ) -> Result<String> {
        match tera.render(template_name, template_context) {
            Ok(shader_source) => Ok(shader_source),
            Err(error) => Err(error.into()),
        }
    }
}
