use wgpu::util::DeviceExt;

pub struct SizedBuffer {
    pub buffer: wgpu::Buffer,
    pub size: wgpu::BufferAddress,
}

/// Bytes needed for `count` elements of `T`.
pub fn array_size<T>(count: u32) -> wgpu::BufferAddress {
    (std::mem::size_of::<T>() as wgpu::BufferAddress) * count as wgpu::BufferAddress
}

pub fn make_storage_buffer(
    device: &wgpu::Device,
    size: wgpu::BufferAddress,
    label: &str,
) -> SizedBuffer {
    SizedBuffer {
        buffer: device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }),
        size,
    }
}

pub fn make_uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &T,
) -> SizedBuffer {
    let bytes = bytemuck::bytes_of(data);
    SizedBuffer {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }),
        size: bytes.len() as _,
    }
}

/// Immutable buffer initialized from a slice, e.g. vertex or index data.
pub fn make_init_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
    usage: wgpu::BufferUsages,
) -> SizedBuffer {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    SizedBuffer {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage,
        }),
        size: bytes.len() as _,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_sizes() {
        assert_eq!(array_size::<[f32; 16]>(50_000), 50_000 * 64);
        assert_eq!(array_size::<[f32; 4]>(50_000), 50_000 * 16);
        assert_eq!(array_size::<u32>(0), 0);
    }
}
