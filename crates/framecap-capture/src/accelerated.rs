//! Accelerated-context capture.
//!
//! ```text
//! default framebuffer ──blit──► offscreen target ──read_pixels──► staging (bottom row first)
//!          ▲                           │                              │ flip_rows
//!          └────────blit (replay)──────┘                              ▼
//!                                                              canonical (top row first)
//! ```

use framecap_core::{Backend, CaptureError, FrameLayout, PixelFormatTag, WindowGeometry};
use tracing::debug;

use crate::format;
use crate::host::{GlPrimitives, OffscreenTarget};
use crate::strategy::CaptureStrategy;

/// Readback is always requested as 4-byte RGBA.
const GL_PIXEL_SIZE: usize = 4;

pub struct AcceleratedContextStrategy {
    gl: Box<dyn GlPrimitives>,
    target: Option<OffscreenTarget>,
    /// Raw readback, bottom row first.
    staging: Vec<u8>,
}

impl AcceleratedContextStrategy {
    pub fn new(gl: Box<dyn GlPrimitives>) -> Self {
        Self { gl, target: None, staging: Vec::new() }
    }

    pub fn target(&self) -> Option<OffscreenTarget> {
        self.target
    }
}

impl CaptureStrategy for AcceleratedContextStrategy {
    fn backend(&self) -> Backend {
        Backend::AcceleratedContext
    }

    fn pixel_size(&mut self, _geometry: &WindowGeometry) -> Result<usize, CaptureError> {
        Ok(GL_PIXEL_SIZE)
    }

    fn acquire(&mut self, layout: &FrameLayout) -> Result<(), CaptureError> {
        if self.target.is_none() {
            let target = self
                .gl
                .create_offscreen(layout.width(), layout.height())
                .map_err(|e| CaptureError::ResourceCreation {
                    resource: "offscreen target",
                    reason: e.to_string(),
                })?;
            debug!(target: "framecap::window", "Offscreen target {:?} created", target);
            self.target = Some(target);
        }
        self.staging.resize(layout.size(), 0);
        Ok(())
    }

    fn capture(
        &mut self,
        layout: &FrameLayout,
        canonical: &mut [u8],
        want_pixels: bool,
    ) -> Result<(), CaptureError> {
        let Some(target) = self.target else { return Ok(()) };
        let (width, height) = (layout.width(), layout.height());

        self.gl.blit_from_default(target, width, height);

        if want_pixels {
            self.staging.resize(layout.size(), 0);
            self.gl.read_pixels(target, width, height, &mut self.staging);
            flip_rows(&self.staging, canonical, layout.pitch());
        }
        Ok(())
    }

    fn present(&mut self, layout: &FrameLayout) {
        if let Some(target) = self.target {
            self.gl.blit_to_default(target, layout.width(), layout.height());
        }
    }

    fn pixel_format(&self) -> PixelFormatTag {
        format::accelerated_tag()
    }

    fn release(&mut self) {
        if let Some(target) = self.target.take() {
            self.gl.delete_offscreen(target);
        }
        self.staging = Vec::new();
    }
}

/// Copies `src` into `dst` with rows in reverse order.
///
/// Accelerated raster buffers put row 0 at the bottom of the image, the
/// canonical buffer puts it at the top.
pub fn flip_rows(src: &[u8], dst: &mut [u8], pitch: usize) {
    if pitch == 0 {
        return;
    }
    for (dst_row, src_row) in dst.chunks_exact_mut(pitch).zip(src.chunks_exact(pitch).rev()) {
        dst_row.copy_from_slice(src_row);
    }
}
