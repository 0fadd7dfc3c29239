pub mod camera;
pub mod character;
pub mod draw;
pub mod instance;
pub mod traits;

// Re-export key types for convenient access
pub use camera::{Camera3D, CameraUniform, FrameTransform};
pub use character::Anchor;
pub use instance::{DrawList, PrimitiveInstance, Shape};
pub use traits::{DrawTiming, FrameData, Renderer};
