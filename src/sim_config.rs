use crate::error::ConfigError;
use crate::sim_params::SimParams;
use crate::wind::{DirectionBucket, WindClass};

/// Maximum number of particles. Every particle buffer is sized for this many
/// particles, independent of how many are active.
pub const CAPACITY: u32 = 50_000;

/// Initial particle count for a particulate matter index.
pub fn initial_active_count(pm10: f64) -> u32 {
    if pm10 <= 30.0 {
        20_000
    } else if pm10 <= 80.0 {
        30_000
    } else if pm10 <= 150.0 {
        40_000
    } else {
        CAPACITY
    }
}

/// Axis aligned bounds the particles move within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationDomain {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

// This should match `DomainInput` in the particle compute shader: the active
// count followed by the six bounds, all as f32.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DomainInput {
    pub count: f32,
    pub bounds: [f32; 6],
}

impl DomainInput {
    pub fn new(active_count: u32, domain: &SimulationDomain) -> Self {
        DomainInput {
            count: bytemuck::cast(DomainInput::count_bytes(active_count)),
            bounds: [
                domain.x_min,
                domain.x_max,
                domain.y_min,
                domain.y_max,
                domain.z_min,
                domain.z_max,
            ],
        }
    }

    /// Encoded count field, the leading 4 bytes of the packed input. The
    /// kernel reads it as an f32.
    pub fn count_bytes(active_count: u32) -> [u8; 4] {
        (active_count as f32).to_ne_bytes()
    }
}

/// Everything derived once from the inputs. Immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub wind_class: WindClass,
    pub direction: DirectionBucket,
    pub initial_count: u32,
    pub domain: SimulationDomain,
    pub seed: Option<u64>,
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn bounds(name: &'static str, range: [f32; 2]) -> Result<(f32, f32), ConfigError> {
    let [min, max] = range;
    finite(name, min as f64)?;
    finite(name, max as f64)?;
    if min >= max {
        return Err(ConfigError::EmptyDomain { name, min, max });
    }
    Ok((min, max))
}

impl SimulationConfig {
    pub fn from_params(params: &SimParams) -> Result<Self, ConfigError> {
        let wind_speed = finite("wind_speed", params.wind_speed)?;
        let wind_direction = finite("wind_direction", params.wind_direction)?;
        let pm10 = finite("pm10", params.pm10)?;
        let (x_min, x_max) = bounds("x", params.domain.x)?;
        let (y_min, y_max) = bounds("y", params.domain.y)?;
        let (z_min, z_max) = bounds("z", params.domain.z)?;
        Ok(SimulationConfig {
            wind_class: WindClass::from_speed(wind_speed),
            direction: DirectionBucket::from_degrees(wind_direction),
            initial_count: initial_active_count(pm10),
            domain: SimulationDomain {
                x_min,
                x_max,
                y_min,
                y_max,
                z_min,
                z_max,
            },
            seed: params.seed,
        })
    }

    pub fn domain_input(&self, active_count: u32) -> DomainInput {
        DomainInput::new(active_count, &self.domain)
    }
}

/// Host side state mutated by events between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeState {
    active_count: u32,
    aspect: f32,
}

impl RuntimeState {
    pub fn new(config: &SimulationConfig, width: u32, height: u32) -> Self {
        let mut state = RuntimeState {
            active_count: 0,
            aspect: 1.0,
        };
        state.set_active_count(config.initial_count);
        state.set_surface_size(width, height);
        state
    }

    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// The only place the active count changes. Values above `CAPACITY` are
    /// clamped; returns the stored count.
    pub fn set_active_count(&mut self, count: u32) -> u32 {
        if count > CAPACITY {
            log::warn!(
                "Requested {} particles, clamping to capacity {}",
                count,
                CAPACITY
            );
        }
        self.active_count = count.min(CAPACITY);
        self.active_count
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig::from_params(&SimParams::default()).unwrap()
    }

    #[test]
    fn particulate_bands() {
        assert_eq!(initial_active_count(-5.0), 20_000);
        assert_eq!(initial_active_count(30.0), 20_000);
        assert_eq!(initial_active_count(30.5), 30_000);
        assert_eq!(initial_active_count(80.0), 30_000);
        assert_eq!(initial_active_count(81.0), 40_000);
        assert_eq!(initial_active_count(150.0), 40_000);
        assert_eq!(initial_active_count(151.0), 50_000);
        for pm10 in (0..2000).step_by(7) {
            assert!(initial_active_count(pm10 as f64) <= CAPACITY);
        }
    }

    #[test]
    fn derived_config() {
        let params = SimParams {
            wind_speed: 9.0,
            wind_direction: 100.0,
            pm10: 200.0,
            ..SimParams::default()
        };
        let config = SimulationConfig::from_params(&params).unwrap();
        assert_eq!(config.wind_class, WindClass::Moderate);
        assert_eq!(config.direction, DirectionBucket::EastSouthEast);
        assert_eq!(config.initial_count, CAPACITY);
        assert_eq!(config.domain.y_min, -200.0);
    }

    #[test]
    fn rejects_non_finite_inputs() {
        let params = SimParams {
            wind_speed: f64::NAN,
            ..SimParams::default()
        };
        assert!(matches!(
            SimulationConfig::from_params(&params),
            Err(ConfigError::NonFinite {
                name: "wind_speed",
                ..
            })
        ));
        let params = SimParams {
            pm10: f64::INFINITY,
            ..SimParams::default()
        };
        assert!(SimulationConfig::from_params(&params).is_err());
    }

    #[test]
    fn rejects_empty_domain() {
        let mut params = SimParams::default();
        params.domain.y = [10.0, 10.0];
        assert_eq!(
            SimulationConfig::from_params(&params),
            Err(ConfigError::EmptyDomain {
                name: "y",
                min: 10.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn domain_input_layout() {
        let input = config().domain_input(1234);
        assert_eq!(std::mem::size_of::<DomainInput>(), 7 * 4);
        let floats: [f32; 7] = bytemuck::cast(input);
        assert_eq!(floats, [1234.0, -500.0, 500.0, -200.0, 200.0, -500.0, 500.0]);
    }

    #[test]
    fn count_bytes_are_the_leading_field() {
        let config = config();
        for &count in [0, 1, 12_345, 30_000, CAPACITY].iter() {
            let bytes = DomainInput::count_bytes(count);
            assert_eq!(bytes.len(), 4);
            let input = config.domain_input(count);
            assert_eq!(&bytes[..], &bytemuck::bytes_of(&input)[..4]);
            assert_eq!(f32::from_ne_bytes(bytes), count as f32);
            if count != 0 {
                // Integer bits would decode to a denormal count.
                assert_ne!(bytes, count.to_ne_bytes());
            }
        }
    }

    #[test]
    fn active_count_never_exceeds_capacity() {
        let mut state = RuntimeState::new(&config(), 800, 600);
        assert_eq!(state.active_count(), 30_000);
        assert_eq!(state.set_active_count(0), 0);
        assert_eq!(state.set_active_count(CAPACITY), CAPACITY);
        assert_eq!(state.set_active_count(CAPACITY + 1), CAPACITY);
        assert_eq!(state.set_active_count(u32::MAX), CAPACITY);
    }

    #[test]
    fn aspect_follows_surface() {
        let mut state = RuntimeState::new(&config(), 800, 600);
        assert!((state.aspect() - 800.0 / 600.0).abs() < 1e-6);
        state.set_surface_size(1920, 1080);
        assert!((state.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        // Minimized windows report zero sizes; the previous aspect is kept.
        state.set_surface_size(0, 1080);
        assert!((state.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
