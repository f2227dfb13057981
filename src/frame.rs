use crate::fps_estimator::FpsEstimator;
use crate::geometry;
use crate::pipeline::ParticlePipelines;

// This needs to match the workgroup size templated into the particle compute
// shader by build.rs.
pub const WORKGROUP_SIZE: u32 = 128;

pub fn workgroup_count(active_count: u32) -> u32 {
    active_count / WORKGROUP_SIZE + (active_count % WORKGROUP_SIZE != 0) as u32
}

/// What a single tick dispatches and draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub workgroups: u32,
    pub instances: u32,
}

impl FramePlan {
    pub fn for_active_count(active_count: u32) -> Self {
        FramePlan {
            workgroups: workgroup_count(active_count),
            instances: active_count,
        }
    }
}

/// Records the compute pass followed by the render pass into `encoder`.
///
/// Sequencing contract: both passes must land in the same command buffer and
/// be submitted together, which makes the compute writes to the mvp buffer
/// visible to the render pass. Splitting them across submissions needs an
/// explicit dependency between the two.
pub fn encode_frame(
    encoder: &mut wgpu::CommandEncoder,
    pipelines: &ParticlePipelines,
    color_view: &wgpu::TextureView,
    plan: FramePlan,
) {
    {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Particle update"),
        });
        cpass.set_pipeline(&pipelines.compute_pipeline);
        cpass.set_bind_group(0, &pipelines.compute_bind_group, &[]);
        log::trace!("Dispatching {} work groups", plan.workgroups);
        if plan.workgroups > 0 {
            cpass.dispatch(plan.workgroups, 1, 1);
        }
    }
    {
        let buffers = &pipelines.buffers;
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle draw"),
            color_attachments: &[wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            }],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &pipelines.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        });
        rpass.set_pipeline(&pipelines.render_pipeline);
        rpass.set_bind_group(0, &pipelines.render_bind_group, &[]);
        rpass.set_vertex_buffer(0, buffers.vertex.buffer.slice(..));
        rpass.set_index_buffer(buffers.index.buffer.slice(..), geometry::INDEX_FORMAT);
        rpass.draw_indexed(0..buffers.index_count, 0, 0..plan.instances);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Ticking,
}

/// Run/stop flag for the steady-state loop plus frame timing.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    frames: u64,
    fps: FpsEstimator,
}

impl Default for FrameLoop {
    fn default() -> Self {
        FrameLoop::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        FrameLoop {
            state: LoopState::Idle,
            frames: 0,
            fps: FpsEstimator::new(60.0),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_ticking(&self) -> bool {
        self.state == LoopState::Ticking
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            log::info!("Entering frame loop");
            self.fps.reset();
            self.state = LoopState::Ticking;
        }
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Ticking {
            log::info!("Leaving frame loop after {} frames", self.frames);
            self.state = LoopState::Idle;
        }
    }

    /// Extra draws outside the schedule are only allowed while ticking.
    pub fn allows_redraw(&self) -> bool {
        self.is_ticking()
    }

    /// Counts a scheduled tick. Returns false when the loop is idle and the
    /// tick should be skipped.
    pub fn begin_tick(&mut self) -> bool {
        if !self.is_ticking() {
            return false;
        }
        self.frames += 1;
        self.fps.tick();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_config::CAPACITY;

    #[test]
    fn workgroups_round_up() {
        assert_eq!(workgroup_count(0), 0);
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(128), 1);
        assert_eq!(workgroup_count(129), 2);
        assert_eq!(workgroup_count(20_000), 157);
        assert_eq!(workgroup_count(CAPACITY), 391);
        assert_eq!(workgroup_count(u32::MAX - 127), 33_554_431);
        assert_eq!(workgroup_count(u32::MAX), 33_554_432);
        for count in (0..=CAPACITY).step_by(97) {
            let groups = workgroup_count(count);
            assert_eq!(groups, (count as f64 / 128.0).ceil() as u32);
            assert!(groups * WORKGROUP_SIZE >= count);
        }
    }

    #[test]
    fn plan_draws_every_active_particle() {
        let plan = FramePlan::for_active_count(30_000);
        assert_eq!(plan.instances, 30_000);
        assert_eq!(plan.workgroups, 235);
    }

    #[test]
    fn loop_transitions() {
        let mut frame_loop = FrameLoop::new();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!frame_loop.begin_tick());
        assert!(!frame_loop.allows_redraw());

        frame_loop.start();
        assert!(frame_loop.allows_redraw());
        assert!(frame_loop.begin_tick());
        assert!(frame_loop.begin_tick());
        assert_eq!(frame_loop.frames(), 2);

        frame_loop.stop();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!frame_loop.begin_tick());
        assert!(!frame_loop.allows_redraw());
        assert_eq!(frame_loop.frames(), 2);
    }
}
