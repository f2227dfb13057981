use std::f32::consts::PI;

use cgmath::{Matrix4, Vector3};
use rand::{Rng, SeedableRng};

use crate::pipeline::{Matrix, ParticleBuffers};
use crate::sim_config::SimulationConfig;
use crate::wind::Velocity;

/// Particles enter on the x = SPAWN_X plane within SPAWN_RADIUS of the x axis.
pub const SPAWN_X: f32 = 500.0;
pub const SPAWN_RADIUS: f32 = 1000.0;
pub const PARTICLE_SCALE: f32 = 2.0;

/// Initial per-particle transforms and velocities for the whole capacity.
pub struct ParticleState {
    pub models: Vec<Matrix>,
    pub velocities: Vec<Velocity>,
}

fn model_matrix(x: f32, y: f32, z: f32) -> Matrix {
    let model = Matrix4::from_translation(Vector3::new(x, y, z))
        * Matrix4::from_scale(PARTICLE_SCALE);
    *AsRef::<[f32; 16]>::as_ref(&model)
}

impl ParticleState {
    pub fn generate<R: Rng + ?Sized>(
        config: &SimulationConfig,
        capacity: u32,
        rng: &mut R,
    ) -> Self {
        let mut models = Vec::with_capacity(capacity as usize);
        let mut velocities = Vec::with_capacity(capacity as usize);
        for _ in 0..capacity {
            let theta = rng.gen::<f32>() * PI * 2.0;
            let phi = rng.gen::<f32>() * PI;
            let radius = rng.gen::<f32>() * SPAWN_RADIUS;

            let y = radius * theta.sin() * phi.sin();
            let z = radius * theta.cos();
            models.push(model_matrix(SPAWN_X, y, z));

            let speed = config.wind_class.sample_speed(rng);
            let scalar = theta.sin() * phi.cos() * speed;
            velocities.push(config.direction.velocity(speed, scalar));
        }
        ParticleState { models, velocities }
    }

    /// Seeded from the config when it carries a seed, from entropy otherwise.
    pub fn from_config(config: &SimulationConfig, capacity: u32) -> Self {
        let mut rng = match config.seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        ParticleState::generate(config, capacity, &mut rng)
    }

    /// The single host write of model and velocity data.
    pub fn upload(&self, queue: &wgpu::Queue, buffers: &ParticleBuffers) {
        debug_assert_eq!(self.models.len(), buffers.capacity as usize);
        queue.write_buffer(
            &buffers.velocity.buffer,
            0,
            bytemuck::cast_slice(&self.velocities),
        );
        queue.write_buffer(&buffers.model.buffer, 0, bytemuck::cast_slice(&self.models));
        log::info!("Uploaded initial state for {} particles", self.models.len());
    }
}
