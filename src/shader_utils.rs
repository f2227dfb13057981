use std::borrow::Cow;

// Include shader sources rendered by build.rs by specifying a path relative to
// the shader source directory.
#[macro_export]
macro_rules! include_shader {
    ($path:literal) => {
        include_str!(concat!(env!("OUT_DIR"), "/shaders/", $path))
    };
}

/// WGSL programs driving the particle pipelines.
///
/// The compute program must declare a `workgroup_size(128)` entry point
/// with these group 0 bindings:
///
/// | binding | contents | access |
/// |---|---|---|
/// | 0 | active count + six domain bounds, 7 x f32 | storage, read |
/// | 1 | per-particle velocity, `vec4<f32>` | storage, read |
/// | 2 | per-particle model matrix, `mat4x4<f32>` | storage, read_write |
/// | 3 | view-projection matrix | uniform |
/// | 4 | per-particle mvp matrix, `mat4x4<f32>` | storage, read_write |
///
/// and must skip invocations whose index is at or past the active count.
///
/// The render program reads the mvp array at group 0 binding 0 indexed by
/// instance, takes position/normal/uv at locations 0/1/2 and writes a
/// single color target.
pub trait ParticleShaders {
    fn compute_source(&self) -> Cow<'static, str>;
    fn render_source(&self) -> Cow<'static, str>;

    fn compute_entry_point(&self) -> &'static str {
        "main"
    }
    fn vertex_entry_point(&self) -> &'static str {
        "vs_main"
    }
    fn fragment_entry_point(&self) -> &'static str {
        "fs_main"
    }
}

/// The wind drift kernel and the instanced box renderer shipped with the
/// crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinShaders;

impl ParticleShaders for BuiltinShaders {
    fn compute_source(&self) -> Cow<'static, str> {
        Cow::Borrowed(crate::include_shader!("particles.comp.wgsl"))
    }

    fn render_source(&self) -> Cow<'static, str> {
        Cow::Borrowed(crate::include_shader!("particles.render.wgsl"))
    }
}

pub fn create_module(
    device: &wgpu::Device,
    label: &str,
    source: Cow<'static, str>,
) -> wgpu::ShaderModule {
    device.create_shader_module(&wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source),
    })
}
