use drift::buffer_util::SizedBuffer;
use drift::geometry;
use drift::particle_state::ParticleState;
use drift::pipeline::BufferSizes;
use drift::shader_utils::BuiltinShaders;
use drift::sim_config::{DomainInput, SimulationConfig, CAPACITY};
use drift::sim_params::SimParams;
use drift::{ParticleSimulation, PixelSize};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

async fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await?;
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("drift.gpu_smoke.device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .ok()
}

fn target(device: &wgpu::Device, size: PixelSize) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

// Copies a storage buffer into a mappable one and returns its bytes.
fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, source: &SizedBuffer) -> Vec<u8> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback buffer"),
        size: source.size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback"),
    });
    encoder.copy_buffer_to_buffer(&source.buffer, 0, &staging, 0, source.size);
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let mapping = slice.map_async(wgpu::MapMode::Read);
    device.poll(wgpu::Maintain::Wait);
    futures::executor::block_on(mapping).unwrap();
    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    bytes
}

#[test]
#[ignore] // Needs a GPU adapter.
fn tick_resize_and_recount() {
    let (device, queue) = futures::executor::block_on(device()).expect("no GPU adapter");
    let params = SimParams {
        pm10: 60.0,
        seed: Some(7),
        ..SimParams::default()
    };
    let config = SimulationConfig::from_params(&params).unwrap();
    let size = PixelSize::new(640, 360);
    let mut simulation =
        ParticleSimulation::init(&device, &queue, &BuiltinShaders, FORMAT, size, config).unwrap();

    let (vertices, indices) = geometry::create_box();
    let expected = BufferSizes::for_capacity(CAPACITY, vertices.len() as u32, indices.len() as u32);
    assert_eq!(simulation.buffer_sizes(), expected);
    assert_eq!(simulation.active_count(), 30_000);

    let view = target(&device, size);
    assert!(!simulation.tick(&device, &queue, &view));
    simulation.start();
    for _ in 0..10 {
        assert!(simulation.tick(&device, &queue, &view));
    }
    assert_eq!(simulation.frame_loop().frames(), 10);

    // Velocities are written once at init and never touched by the kernel.
    let initial = ParticleState::from_config(&config, CAPACITY);
    let velocities = read_back(&device, &queue, &simulation.buffers().velocity);
    assert_eq!(&velocities[..], bytemuck::cast_slice::<_, u8>(&initial.velocities));

    // Resizing swaps the depth target only. A reallocated particle buffer
    // would come back zeroed.
    let resized = PixelSize::from_logical(400.0, 300.0, 2.0);
    assert!(simulation.resize(&device, resized));
    assert_eq!(simulation.depth_size(), PixelSize::new(800, 600));
    assert!((simulation.aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert!(!simulation.resize(&device, PixelSize::new(0, 600)));
    assert_eq!(simulation.depth_size(), PixelSize::new(800, 600));
    assert_eq!(
        read_back(&device, &queue, &simulation.buffers().velocity),
        velocities
    );

    // A count change rewrites only the count field and is drawn right away.
    let view = target(&device, resized);
    let domain = read_back(&device, &queue, &simulation.buffers().domain_input);
    assert_eq!(&domain[..4], &DomainInput::count_bytes(30_000)[..]);
    assert_eq!(simulation.set_active_count(&queue, 12_345), 12_345);
    let plan = simulation.frame_plan();
    assert_eq!(plan.instances, 12_345);
    assert_eq!(plan.workgroups, 97);
    assert!(simulation.redraw(&device, &queue, &view));
    assert_eq!(simulation.frame_loop().frames(), 10);
    let recounted = read_back(&device, &queue, &simulation.buffers().domain_input);
    assert_eq!(&recounted[..4], &DomainInput::count_bytes(12_345)[..]);
    assert_eq!(&recounted[4..], &domain[4..]);
    assert_eq!(
        read_back(&device, &queue, &simulation.buffers().velocity),
        velocities
    );

    assert_eq!(simulation.set_active_count(&queue, CAPACITY + 10), CAPACITY);
    assert_eq!(simulation.frame_plan().instances, CAPACITY);
    assert!(simulation.tick(&device, &queue, &view));
    assert_eq!(simulation.set_active_count(&queue, 0), 0);
    assert_eq!(simulation.frame_plan().workgroups, 0);
    assert!(simulation.tick(&device, &queue, &view));
    device.poll(wgpu::Maintain::Wait);
    assert_eq!(simulation.buffer_sizes(), expected);

    // Once stopped, neither ticks nor extra draws reach the GPU.
    simulation.stop();
    assert!(!simulation.tick(&device, &queue, &view));
    simulation.set_active_count(&queue, 5_000);
    assert!(!simulation.redraw(&device, &queue, &view));
    assert_eq!(simulation.frame_loop().frames(), 12);
}
