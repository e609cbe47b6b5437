//! Collaborator interfaces.
//!
//! The capture engine never resolves symbols itself. Whatever interposition
//! layer owns the real graphics entry points implements these traits and
//! hands them to [`crate::ScreenCapture`].

use framecap_core::{Backend, BackendFault, Rect, WindowGeometry, WindowPixelFormat};

// MARK: - Handles

/// Offscreen render target (framebuffer + color renderbuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffscreenTarget(pub u32);

/// Software pixel surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// Hardware renderer attached to the application window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub u32);

/// Streaming texture owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

// MARK: - VideoHost

/// Process-wide video descriptor: which window is registered and which
/// backend the application renders with.
pub trait VideoHost {
    /// Geometry of the registered window, `None` when no window exists yet.
    fn window_geometry(&self) -> Option<WindowGeometry>;

    /// Active backend flag, `None` when the application uses none of the
    /// supported backends.
    fn active_backend(&self) -> Option<Backend>;
}

// MARK: - GlPrimitives

/// Accelerated-context entry points.
pub trait GlPrimitives {
    /// Allocates a framebuffer with an RGBA8 color attachment.
    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<OffscreenTarget, BackendFault>;

    /// Full-rectangle nearest-neighbor copy of the default framebuffer into `target`.
    fn blit_from_default(&mut self, target: OffscreenTarget, width: u32, height: u32);

    /// Full-rectangle nearest-neighbor copy of `target` onto the default framebuffer.
    fn blit_to_default(&mut self, target: OffscreenTarget, width: u32, height: u32);

    /// Reads the color attachment of `target` as tightly packed RGBA bytes,
    /// bottom row first.
    fn read_pixels(&mut self, target: OffscreenTarget, width: u32, height: u32, out: &mut [u8]);

    fn delete_offscreen(&mut self, target: OffscreenTarget);
}

// MARK: - SurfacePrimitives

/// Properties of a software surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: usize,
    pub red_mask: u32,
    /// Source alpha blending is enabled for blits from this surface.
    pub src_alpha: bool,
}

/// Software-surface entry points.
pub trait SurfacePrimitives {
    /// The application's current video surface.
    fn video_surface(&mut self) -> Option<SurfaceId>;

    fn surface_info(&self, surface: SurfaceId) -> SurfaceInfo;

    /// Creates a copy of `surface` converted to the display format.
    fn display_format(&mut self, surface: SurfaceId) -> Result<SurfaceId, BackendFault>;

    fn set_alpha(&mut self, surface: SurfaceId, enabled: bool);

    /// Full-surface blit, honoring the destination clip rectangle.
    fn blit(&mut self, src: SurfaceId, dst: SurfaceId) -> Result<(), BackendFault>;

    fn lock(&mut self, surface: SurfaceId) -> Result<(), BackendFault>;

    /// Copies the raw pixels of a locked surface into `out`, up to `out.len()` bytes.
    fn copy_pixels(&self, surface: SurfaceId, out: &mut [u8]);

    fn unlock(&mut self, surface: SurfaceId);

    fn clip_rect(&self, surface: SurfaceId) -> Rect;

    /// `None` resets the clip rectangle to the whole surface.
    fn set_clip_rect(&mut self, surface: SurfaceId, rect: Option<Rect>);

    fn free_surface(&mut self, surface: SurfaceId);
}

// MARK: - RendererPrimitives

/// Hardware-renderer entry points.
pub trait RendererPrimitives {
    /// Renderer attached to the application window.
    fn renderer(&mut self) -> Option<RendererId>;

    fn window_pixel_format(&self) -> WindowPixelFormat;

    fn create_streaming_texture(
        &mut self,
        renderer: RendererId,
        format: WindowPixelFormat,
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendFault>;

    /// Reads the whole render target into `out`, `pitch` bytes per row.
    /// On failure `out` is left untouched.
    fn read_pixels(&mut self, renderer: RendererId, out: &mut [u8], pitch: usize) -> Result<(), BackendFault>;

    /// Full-frame copy of `texture` onto the render target.
    fn copy_texture(&mut self, renderer: RendererId, texture: TextureId) -> Result<(), BackendFault>;

    fn destroy_texture(&mut self, texture: TextureId);
}
