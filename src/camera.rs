use cgmath::{Deg, Matrix4, Point3, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Fixed camera looking at the origin with a perspective projection. Only the
/// aspect ratio changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionState {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fov_y: Deg<f32>,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionState {
    fn default() -> Self {
        ProjectionState {
            eye: Point3::new(0.0, 50.0, 1000.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            aspect: 1.0,
            fov_y: Deg(60.0),
            near: 0.1,
            far: 3000.0,
        }
    }
}

impl ProjectionState {
    pub fn with_aspect(aspect: f32) -> Self {
        ProjectionState {
            aspect,
            ..ProjectionState::default()
        }
    }

    /// Combined view-projection matrix in wgpu clip space.
    pub fn matrix(&self) -> Matrix4<f32> {
        let projection = cgmath::perspective(self.fov_y, self.aspect, self.near, self.far);
        let view = Matrix4::look_at_rh(self.eye, self.target, self.up);
        OPENGL_TO_WGPU_MATRIX * projection * view
    }

    /// Column-major floats, ready to upload.
    pub fn to_uniform_data(&self) -> [f32; 16] {
        *AsRef::<[f32; 16]>::as_ref(&self.matrix())
    }
}
