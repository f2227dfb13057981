use bytemuck::{Pod, Zeroable};

// Interleaved layout consumed by the render pipeline: position at offset 0,
// normal at 12, uv at 24.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

pub const VERTEX_STRIDE: wgpu::BufferAddress = std::mem::size_of::<Vertex>() as _;
pub const NORMAL_OFFSET: wgpu::BufferAddress = 3 * 4;
pub const UV_OFFSET: wgpu::BufferAddress = 6 * 4;

pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

const HALF_EXTENT: f32 = 0.5;

// (normal, u axis, v axis) with u x v == normal, so each face winds
// counter-clockwise when seen from outside.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

fn vertex(normal: [f32; 3], u_axis: [f32; 3], v_axis: [f32; 3], uv: [f32; 2]) -> Vertex {
    // Map uv in [0, 1] to [-1, 1] along the face axes.
    let su = uv[0] * 2.0 - 1.0;
    let sv = uv[1] * 2.0 - 1.0;
    let mut position = [0.0; 3];
    for axis in 0..3 {
        position[axis] = HALF_EXTENT * (normal[axis] + su * u_axis[axis] + sv * v_axis[axis]);
    }
    Vertex {
        position,
        normal,
        uv,
    }
}

/// Unit box centered at the origin, 4 vertices per face so normals and uvs
/// stay per-face.
pub fn create_box() -> (Vec<Vertex>, Vec<u16>) {
    let mut vertex_data = Vec::with_capacity(FACES.len() * 4);
    let mut index_data = Vec::with_capacity(FACES.len() * 6);
    for (normal, u_axis, v_axis) in FACES.iter() {
        let base = vertex_data.len() as u16;
        for uv in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].iter() {
            vertex_data.push(vertex(*normal, *u_axis, *v_axis, *uv));
        }
        index_data.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertex_data, index_data)
}
