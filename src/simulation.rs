use crate::camera::ProjectionState;
use crate::error::DriftError;
use crate::frame::{self, FrameLoop, FramePlan};
use crate::particle_state::ParticleState;
use crate::pipeline::{BufferSizes, ParticleBuffers, ParticlePipelines};
use crate::shader_utils::ParticleShaders;
use crate::sim_config::{RuntimeState, SimulationConfig, CAPACITY};

/// Drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        PixelSize { width, height }
    }

    /// Scales a logical size by the display's pixel ratio.
    pub fn from_logical(width: f64, height: f64, pixel_ratio: f64) -> Self {
        PixelSize {
            width: (width * pixel_ratio).round().max(0.0) as u32,
            height: (height * pixel_ratio).round().max(0.0) as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Owns the GPU pipelines and the host state that drives them.
pub struct ParticleSimulation {
    config: SimulationConfig,
    state: RuntimeState,
    projection: ProjectionState,
    pipelines: ParticlePipelines,
    frame_loop: FrameLoop,
}

impl ParticleSimulation {
    /// Builds the pipelines at `CAPACITY`, uploads the initial particle state
    /// and the domain input. The frame loop starts out idle.
    pub fn init(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &dyn ParticleShaders,
        color_format: wgpu::TextureFormat,
        size: PixelSize,
        config: SimulationConfig,
    ) -> Result<Self, DriftError> {
        log::info!(
            "Wind class {:?} (speed bound {}), direction {}, {} of {} particles active",
            config.wind_class,
            config.wind_class.speed_bound(),
            config.direction,
            config.initial_count,
            CAPACITY
        );
        let state = RuntimeState::new(&config, size.width, size.height);
        let pipelines = ParticlePipelines::init(
            device,
            shaders,
            color_format,
            size.width.max(1),
            size.height.max(1),
            CAPACITY,
        )?;

        ParticleState::from_config(&config, CAPACITY).upload(queue, &pipelines.buffers);
        pipelines
            .buffers
            .write_domain_input(queue, &config.domain_input(state.active_count()));

        Ok(ParticleSimulation {
            config,
            projection: ProjectionState::with_aspect(state.aspect()),
            state,
            pipelines,
            frame_loop: FrameLoop::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn active_count(&self) -> u32 {
        self.state.active_count()
    }

    pub fn aspect(&self) -> f32 {
        self.state.aspect()
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.pipelines.buffers
    }

    pub fn buffer_sizes(&self) -> BufferSizes {
        self.pipelines.buffers.sizes()
    }

    pub fn depth_size(&self) -> PixelSize {
        PixelSize::new(self.pipelines.depth.width, self.pipelines.depth.height)
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn start(&mut self) {
        self.frame_loop.start();
    }

    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    /// One scheduled tick. Returns false without touching the GPU while the
    /// loop is idle.
    pub fn tick(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
    ) -> bool {
        if !self.frame_loop.begin_tick() {
            return false;
        }
        self.projection.aspect = self.state.aspect();
        self.pipelines
            .buffers
            .write_projection(queue, &self.projection.to_uniform_data());
        self.submit(device, queue, view);
        true
    }

    /// Draws once outside the schedule with the current state. Returns false
    /// without touching the GPU while the loop is idle.
    pub fn redraw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
    ) -> bool {
        if !self.frame_loop.allows_redraw() {
            log::debug!("Skipping redraw, frame loop is idle");
            return false;
        }
        self.submit(device, queue, view);
        true
    }

    /// What the next tick or redraw dispatches and draws.
    pub fn frame_plan(&self) -> FramePlan {
        FramePlan::for_active_count(self.state.active_count())
    }

    fn submit(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle frame"),
        });
        frame::encode_frame(&mut encoder, &self.pipelines, view, self.frame_plan());
        queue.submit(Some(encoder.finish()));
    }

    /// Reallocates the depth target at `size` and updates the aspect ratio.
    /// Empty sizes are ignored. Returns whether anything changed.
    pub fn resize(&mut self, device: &wgpu::Device, size: PixelSize) -> bool {
        if size.is_empty() {
            log::debug!("Ignoring resize to {:?}", size);
            return false;
        }
        log::info!("Resizing to {}x{}", size.width, size.height);
        self.pipelines
            .recreate_depth_target(device, size.width, size.height);
        self.state.set_surface_size(size.width, size.height);
        self.projection.aspect = self.state.aspect();
        true
    }

    /// Changes how many particles are simulated and drawn. Only the count
    /// field of the domain input is rewritten; particle data is kept. The
    /// caller follows up with `redraw`.
    pub fn set_active_count(&mut self, queue: &wgpu::Queue, count: u32) -> u32 {
        let active = self.state.set_active_count(count);
        self.pipelines.buffers.write_active_count(queue, active);
        log::info!("Active particles: {}", active);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_to_pixels() {
        assert_eq!(
            PixelSize::from_logical(800.0, 600.0, 1.0),
            PixelSize::new(800, 600)
        );
        assert_eq!(
            PixelSize::from_logical(800.0, 600.0, 2.0),
            PixelSize::new(1600, 1200)
        );
        assert_eq!(
            PixelSize::from_logical(1280.0, 720.0, 1.5),
            PixelSize::new(1920, 1080)
        );
        assert!(PixelSize::from_logical(0.0, 720.0, 2.0).is_empty());
        assert!(!PixelSize::new(1, 1).is_empty());
    }
}
