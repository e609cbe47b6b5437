use framecap_core::{Backend, CaptureError, FrameLayout, PixelFormatTag, WindowGeometry};

// MARK: - CaptureStrategy

/// Per-backend capture and replay.
///
/// Implementations:
/// - [`crate::AcceleratedContextStrategy`] — offscreen framebuffer + readback
/// - [`crate::SoftwareSurfaceStrategy`] — shadow surface blits
/// - [`crate::HardwareRendererStrategy`] — renderer readback + streaming texture
///
/// Every strategy owns its backend resources. [`crate::ScreenCapture`] owns
/// the strategies and the canonical buffer, and calls these in order:
/// `pixel_size` → `acquire` → (`capture` | `present` | `pixel_format`)* → `release`.
pub trait CaptureStrategy {
    fn backend(&self) -> Backend;

    /// Bytes per pixel the backend renders with.
    fn pixel_size(&mut self, geometry: &WindowGeometry) -> Result<usize, CaptureError>;

    /// Allocates backend resources for `layout`. Resources that already
    /// exist are kept.
    ///
    /// A non-fatal error (see [`CaptureError::is_fatal`]) leaves the
    /// strategy usable with the failed resource absent.
    fn acquire(&mut self, layout: &FrameLayout) -> Result<(), CaptureError>;

    /// Copies the live frame into backend storage, and into `canonical` when
    /// `want_pixels` is set. On error `canonical` keeps its previous contents.
    fn capture(
        &mut self,
        layout: &FrameLayout,
        canonical: &mut [u8],
        want_pixels: bool,
    ) -> Result<(), CaptureError>;

    /// Re-presents the stored frame on screen. Best-effort, failures are logged.
    fn present(&mut self, layout: &FrameLayout);

    fn pixel_format(&self) -> PixelFormatTag;

    /// Destroys every live resource. Safe to call repeatedly.
    fn release(&mut self);
}
