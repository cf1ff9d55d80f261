//! Immediate-mode drawing contract shared by widgets and GPU backends.
//!
//! Coordinates are pixels with the origin at the top-left of the widget and y
//! growing downwards. Transforms compose like a classic GL matrix stack: each
//! call post-multiplies the current matrix, so the last transform issued is
//! the first applied to geometry.

use crate::pixbuf::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Framebuffer blending applied to subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Sources overwrite the destination.
    Replace,
    /// `src * min(src_alpha, 1 - dst_alpha) + dst`. Draw front to back over a
    /// fully transparent black clear; overlapping translucent edges then
    /// accumulate without seams.
    Saturate,
}

/// Axis-aligned rectangle given by two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Quad {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// Creates GPU textures from decoded pixels.
///
/// Implementations must be shareable with the loader thread.
pub trait TextureFactory: Send + Sync {
    type Texture: Send;

    fn create_texture(&self, pixels: &PixelBuffer) -> Self::Texture;
}

pub trait Painter {
    type Texture;

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, x: f32, y: f32);
    /// Rotate around the z axis by `degrees`.
    fn rotate(&mut self, degrees: f32);

    /// Tint used by every following draw call.
    fn set_color(&mut self, color: Color);
    fn set_blend(&mut self, mode: BlendMode);
    /// Toggle edge anti-aliasing of polygons.
    fn set_smoothing(&mut self, enabled: bool);

    fn fill_rect(&mut self, quad: Quad);
    fn rounded_rect(&mut self, quad: Quad, radius: f32);
    /// Render `texture` stretched over `quad`, tinted by the current color.
    fn textured_quad(&mut self, texture: &Self::Texture, quad: Quad);
}
