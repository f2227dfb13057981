use thiserror::Error;

/// Fatal conditions raised while bringing up the device, the surface, or the
/// pipelines. None of them are retried.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("no compute/graphics capable adapter found")]
    NoAdapter,

    #[error("failed to acquire a device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("no drawable surface: {0}")]
    NoSurface(String),

    #[error("failed to build the particle pipelines: {0}")]
    Pipeline(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Raised when a configuration input is missing a usable numeric value.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{name}` is not a number: {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("`{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("domain bound `{name}` is empty: min {min} >= max {max}")]
    EmptyDomain {
        name: &'static str,
        min: f32,
        max: f32,
    },
}
