mod framework;

use drift::shader_utils::BuiltinShaders;
use drift::sim_config::{SimulationConfig, CAPACITY};
use drift::sim_params::SimParams;
use drift::{ParticleSimulation, PixelSize};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

gflags::define! {
    --config: &str = "drift_config.toml"
}
gflags::define! {
    /// Overrides `wind_speed` from the config file.
    --wind_speed: &str = ""
}
gflags::define! {
    /// Overrides `wind_direction` (degrees) from the config file.
    --wind_direction: &str = ""
}
gflags::define! {
    /// Overrides `pm10` from the config file.
    --pm10: &str = ""
}

const SMALL_STEP: u32 = 1_000;
const LARGE_STEP: u32 = 10_000;

/// Maps a key press to a new particle count, clamped to `[0, CAPACITY]`.
fn requested_count(key: VirtualKeyCode, current: u32) -> Option<u32> {
    let count = match key {
        VirtualKeyCode::Up => current.saturating_add(SMALL_STEP),
        VirtualKeyCode::Down => current.saturating_sub(SMALL_STEP),
        VirtualKeyCode::PageUp => current.saturating_add(LARGE_STEP),
        VirtualKeyCode::PageDown => current.saturating_sub(LARGE_STEP),
        VirtualKeyCode::Home => 0,
        VirtualKeyCode::End => CAPACITY,
        _ => return None,
    };
    Some(count.min(CAPACITY))
}

fn flag_value(present: bool, value: &'static str) -> Option<&'static str> {
    if present {
        Some(value)
    } else {
        None
    }
}

fn load_config() -> anyhow::Result<SimulationConfig> {
    let mut params = SimParams::from_file_or_default(CONFIG.flag);
    params.apply_overrides(
        flag_value(WIND_SPEED.is_present(), WIND_SPEED.flag),
        flag_value(WIND_DIRECTION.is_present(), WIND_DIRECTION.flag),
        flag_value(PM10.is_present(), PM10.flag),
    )?;
    Ok(SimulationConfig::from_params(&params)?)
}

fn pixel_size(logical_size: LogicalSize<f64>, scale_factor: f64) -> PixelSize {
    PixelSize::from_logical(logical_size.width, logical_size.height, scale_factor)
}

struct DriftApp {
    simulation: ParticleSimulation,
}

impl framework::Application for DriftApp {
    fn init(
        surface_config: &wgpu::SurfaceConfiguration,
        logical_size: LogicalSize<f64>,
        scale_factor: f64,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<Self> {
        let config = load_config()?;
        let mut simulation = ParticleSimulation::init(
            device,
            queue,
            &BuiltinShaders,
            surface_config.format,
            pixel_size(logical_size, scale_factor),
            config,
        )?;
        simulation.start();
        Ok(DriftApp { simulation })
    }

    fn resize(&mut self, logical_size: LogicalSize<f64>, scale_factor: f64, device: &wgpu::Device) {
        self.simulation
            .resize(device, pixel_size(logical_size, scale_factor));
    }

    fn handle_event(&mut self, event: &WindowEvent, queue: &wgpu::Queue) -> bool {
        if let WindowEvent::KeyboardInput {
            input:
                KeyboardInput {
                    virtual_keycode: Some(key),
                    state: ElementState::Pressed,
                    ..
                },
            ..
        } = event
        {
            if let Some(count) = requested_count(*key, self.simulation.active_count()) {
                self.simulation.set_active_count(queue, count);
                return true;
            }
        }
        false
    }

    fn render(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.simulation.tick(device, queue, view);
    }

    fn redraw(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.simulation.redraw(device, queue, view);
    }

    fn stop(&mut self) {
        self.simulation.stop();
    }
}

fn main() -> anyhow::Result<()> {
    framework::run::<DriftApp>("drift")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_keys() {
        assert_eq!(requested_count(VirtualKeyCode::Up, 30_000), Some(31_000));
        assert_eq!(requested_count(VirtualKeyCode::Down, 30_000), Some(29_000));
        assert_eq!(requested_count(VirtualKeyCode::PageUp, 30_000), Some(40_000));
        assert_eq!(requested_count(VirtualKeyCode::PageDown, 30_000), Some(20_000));
        assert_eq!(requested_count(VirtualKeyCode::Home, 30_000), Some(0));
        assert_eq!(requested_count(VirtualKeyCode::End, 0), Some(CAPACITY));
        assert_eq!(requested_count(VirtualKeyCode::Space, 30_000), None);
    }

    #[test]
    fn count_keys_clamp() {
        assert_eq!(requested_count(VirtualKeyCode::Up, CAPACITY), Some(CAPACITY));
        assert_eq!(requested_count(VirtualKeyCode::PageUp, 45_000), Some(CAPACITY));
        assert_eq!(requested_count(VirtualKeyCode::Down, 500), Some(0));
        assert_eq!(requested_count(VirtualKeyCode::PageDown, 0), Some(0));
    }

    #[test]
    fn logical_size_scales_to_pixels() {
        let logical = LogicalSize::new(1280.0, 720.0);
        assert_eq!(pixel_size(logical, 1.0), PixelSize::new(1280, 720));
        assert_eq!(pixel_size(logical, 1.5), PixelSize::new(1920, 1080));
        assert_eq!(pixel_size(logical, 2.0), PixelSize::new(2560, 1440));
    }

    #[test]
    fn window_size_round_trips_through_scale_factor() {
        let physical = winit::dpi::PhysicalSize::new(2560u32, 1440u32);
        for &scale_factor in [1.0, 1.25, 1.5, 2.0].iter() {
            let logical = physical.to_logical(scale_factor);
            assert_eq!(pixel_size(logical, scale_factor), PixelSize::new(2560, 1440));
        }
    }
}
