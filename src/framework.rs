use drift::DriftError;
use winit::dpi::LogicalSize;
use winit::event::{self, WindowEvent};

gflags::define! {
    --log_filter: &str = "warn,drift=info"
}
gflags::define! {
    -h, --help = false
}

// "Framework" for a windowed executable.
pub trait Application: 'static + Sized {
    fn init(
        surface_config: &wgpu::SurfaceConfiguration,
        logical_size: LogicalSize<f64>,
        scale_factor: f64,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<Self>;
    fn resize(&mut self, logical_size: LogicalSize<f64>, scale_factor: f64, device: &wgpu::Device);
    /// Returns true when the event needs a frame drawn right away.
    fn handle_event(&mut self, event: &WindowEvent, queue: &wgpu::Queue) -> bool;
    fn render(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue);
    fn redraw(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue);
    fn stop(&mut self);
}

struct Setup {
    window: winit::window::Window,
    event_loop: winit::event_loop::EventLoop<()>,
    scale_factor: f64,
    surface: wgpu::Surface,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

async fn setup(title: &str) -> Result<Setup, DriftError> {
    let event_loop = winit::event_loop::EventLoop::new();
    log::info!("Initializing the window...");
    let window = winit::window::WindowBuilder::new()
        .with_title(title)
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
        .build(&event_loop)
        .map_err(|e| DriftError::NoSurface(e.to_string()))?;
    let size = window.inner_size();
    let scale_factor = window.scale_factor();

    let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
    let surface = unsafe { instance.create_surface(&window) };
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .ok_or(DriftError::NoAdapter)?;
    log::info!("Using adapter: {:?}", adapter.get_info());

    let limits = wgpu::Limits {
        max_storage_buffer_binding_size: adapter.limits().max_storage_buffer_binding_size,
        ..wgpu::Limits::default()
    };
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: wgpu::Features::empty(),
                limits,
            },
            None,
        )
        .await?;

    let format = surface
        .get_preferred_format(&adapter)
        .ok_or_else(|| DriftError::NoSurface("no supported surface format".to_string()))?;
    log::info!("Surface format: {:?}", format);
    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
    };
    surface.configure(&device, &surface_config);

    Ok(Setup {
        window,
        event_loop,
        scale_factor,
        surface,
        surface_config,
        device,
        queue,
    })
}

// Recoverable acquisition failures skip the frame.
fn acquire_frame(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    surface_config: &wgpu::SurfaceConfiguration,
) -> Result<Option<wgpu::SurfaceTexture>, wgpu::SurfaceError> {
    match surface.get_current_texture() {
        Ok(frame) => Ok(Some(frame)),
        Err(e @ wgpu::SurfaceError::Lost) | Err(e @ wgpu::SurfaceError::Outdated) => {
            log::warn!("Reconfiguring surface: {}", e);
            surface.configure(device, surface_config);
            Ok(None)
        }
        Err(wgpu::SurfaceError::Timeout) => {
            log::warn!("Timeout when acquiring next surface texture");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn is_exit_request(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput {
            input:
                event::KeyboardInput {
                    virtual_keycode: Some(event::VirtualKeyCode::Escape),
                    state: event::ElementState::Pressed,
                    ..
                },
            ..
        }
        | WindowEvent::KeyboardInput {
            input:
                event::KeyboardInput {
                    virtual_keycode: Some(event::VirtualKeyCode::Q),
                    state: event::ElementState::Pressed,
                    ..
                },
            ..
        } => true,
        _ => false,
    }
}

/// Draws one frame: a scheduled tick, or an extra draw when `extra` is set.
/// Exits the process when the surface is out of memory.
fn draw_frame<A: Application>(
    app: &mut A,
    surface: &wgpu::Surface,
    surface_config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    extra: bool,
) {
    match acquire_frame(surface, device, surface_config) {
        Ok(Some(frame)) => {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            if extra {
                app.redraw(&view, device, queue);
            } else {
                app.render(&view, device, queue);
            }
            frame.present();
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Fatal surface error: {}", e);
            app.stop();
            std::process::exit(1);
        }
    }
}

pub fn run<A: Application>(title: &str) -> anyhow::Result<()> {
    use winit::event_loop::ControlFlow;

    gflags::parse();
    if HELP.flag {
        gflags::print_help_and_exit(0);
    }
    scrub_log::init_with_filter_string(LOG_FILTER.flag)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {:?}", e))?;

    let Setup {
        window,
        event_loop,
        mut scale_factor,
        surface,
        mut surface_config,
        device,
        queue,
    } = futures::executor::block_on(setup(title))?;

    log::info!("Initializing the application...");
    let logical_size = window.inner_size().to_logical(scale_factor);
    let mut app = A::init(&surface_config, logical_size, scale_factor, &device, &queue)?;

    log::info!("Entering render loop...");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            event::Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                surface_config.width = size.width;
                surface_config.height = size.height;
                surface.configure(&device, &surface_config);
                app.resize(window.inner_size().to_logical(scale_factor), scale_factor, &device);
            }
            event::Event::WindowEvent {
                event:
                    WindowEvent::ScaleFactorChanged {
                        scale_factor: new_scale_factor,
                        new_inner_size,
                    },
                ..
            } => {
                scale_factor = new_scale_factor;
                if new_inner_size.width == 0 || new_inner_size.height == 0 {
                    return;
                }
                surface_config.width = new_inner_size.width;
                surface_config.height = new_inner_size.height;
                surface.configure(&device, &surface_config);
                // The window reports the new size only after this event.
                app.resize(new_inner_size.to_logical(scale_factor), scale_factor, &device);
            }
            event::Event::WindowEvent { event, .. } => {
                if is_exit_request(&event) {
                    app.stop();
                    *control_flow = ControlFlow::Exit;
                } else if app.handle_event(&event, &queue) {
                    draw_frame(&mut app, &surface, &surface_config, &device, &queue, true);
                }
            }
            event::Event::MainEventsCleared => window.request_redraw(),
            event::Event::RedrawRequested(_) => {
                draw_frame(&mut app, &surface, &surface_config, &device, &queue, false)
            }
            _ => (),
        }
    });
}
