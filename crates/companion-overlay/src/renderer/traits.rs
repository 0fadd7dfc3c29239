//! Backend contract for whoever actually rasterizes the overlay.
//!
//! The overlay produces a flat, Pod primitive list plus the frame's camera
//! matrix; a backend (GL, wgpu, a software rasterizer, a test recorder) turns
//! that into pixels on a transparent, always-on-top surface.

use super::camera::CameraUniform;
use super::instance::PrimitiveInstance;

/// Timing information from a draw call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawTiming {
    /// Time spent submitting draw calls (microseconds)
    pub draw_us: u32,
}

/// Complete frame data for rendering.
pub struct FrameData<'a> {
    /// Shadow first, then items, then the character.
    pub primitives: &'a [PrimitiveInstance],
    pub camera: CameraUniform,
    /// Overlay size in pixels.
    pub viewport: [f32; 2],
}

/// Renderer trait for drawing backends.
///
/// # Example Implementation
///
/// ```ignore
/// struct GlRenderer { /* context, buffers */ }
///
/// impl Renderer for GlRenderer {
///     fn backend(&self) -> &'static str { "gl" }
///
///     fn draw(&mut self, frame: &FrameData) -> DrawTiming {
///         // Upload frame.primitives, draw instanced spheres...
///     }
///
///     fn resize(&mut self, width: u32, height: u32) {
///         // Resize the transparent surface...
///     }
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g., "gl", "wgpu", "software")
    fn backend(&self) -> &'static str;

    /// Draw a complete frame. Returns timing information for profiling.
    fn draw(&mut self, frame: &FrameData) -> DrawTiming;

    /// Handle overlay resize.
    fn resize(&mut self, width: u32, height: u32);
}
