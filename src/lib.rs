pub mod buffer_util;
pub mod camera;
pub mod error;
pub mod fps_estimator;
pub mod frame;
pub mod geometry;
pub mod particle_state;
pub mod pipeline;
pub mod shader_utils;
pub mod sim_config;
pub mod sim_params;
pub mod simulation;
pub mod wind;

pub use error::{ConfigError, DriftError};
pub use simulation::{ParticleSimulation, PixelSize};
