use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Primitive shapes a backend knows how to rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Shape {
    Sphere = 0,
    /// Capped cylinder centered on its midpoint, along local Y; `sy` is the length.
    Cylinder = 1,
    /// Cone along local Y from the center of its base; base radius `radius`,
    /// height `sy`.
    Cone = 2,
    /// Flat disk in the local XZ plane.
    Disk = 3,
    /// Soft ellipse in the XZ plane; `sx`/`sz` are the radii.
    Shadow = 4,
}

impl Shape {
    pub fn from_code(code: f32) -> Option<Shape> {
        match code as u8 {
            0 => Some(Shape::Sphere),
            1 => Some(Shape::Cylinder),
            2 => Some(Shape::Cone),
            3 => Some(Shape::Disk),
            4 => Some(Shape::Shadow),
            _ => None,
        }
    }
}

/// Per-primitive draw data, world space.
/// 16 floats = 64 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PrimitiveInstance {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
    /// Per-axis scale (squash lands in `sy`).
    pub sx: f32,
    pub sy: f32,
    pub sz: f32,
    /// Yaw in radians.
    pub yaw: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    /// `Shape` discriminant.
    pub shape: f32,
    /// Edge blur in pixels (shadows only).
    pub blur: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

impl PrimitiveInstance {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn new(shape: Shape, center: Vec3, radius: f32, color: [f32; 4]) -> Self {
        Self {
            x: center.x,
            y: center.y,
            z: center.z,
            radius,
            sx: 1.0,
            sy: 1.0,
            sz: 1.0,
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
            shape: shape as u8 as f32,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.sx = scale.x;
        self.sy = scale.y;
        self.sz = scale.z;
        self
    }

    pub fn with_yaw(mut self, yaw_rad: f32) -> Self {
        self.yaw = yaw_rad;
        self
    }

    pub fn with_blur(mut self, blur: f32) -> Self {
        self.blur = blur;
        self
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn kind(&self) -> Option<Shape> {
        Shape::from_code(self.shape)
    }
}

/// One frame's worth of primitives, in draw order.
pub struct DrawList {
    instances: Vec<PrimitiveInstance>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(max: usize) -> Self {
        Self {
            instances: Vec::with_capacity(max),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: PrimitiveInstance) {
        self.instances.push(instance);
    }

    pub fn instances(&self) -> &[PrimitiveInstance] {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn count_of(&self, shape: Shape) -> usize {
        self.instances.iter().filter(|i| i.kind() == Some(shape)).count()
    }

    /// Raw bytes for upload to a GPU buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}
