//! Hardware-renderer capture: direct readback, streaming-texture replay.

use framecap_core::{Backend, CaptureError, FrameLayout, PixelFormatTag, WindowGeometry};
use tracing::{debug, error};

use crate::format;
use crate::host::{RendererId, RendererPrimitives, TextureId};
use crate::strategy::CaptureStrategy;

pub struct HardwareRendererStrategy {
    renderers: Box<dyn RendererPrimitives>,
    renderer: Option<RendererId>,
    texture: Option<TextureId>,
}

impl HardwareRendererStrategy {
    pub fn new(renderers: Box<dyn RendererPrimitives>) -> Self {
        Self { renderers, renderer: None, texture: None }
    }

    /// Streaming texture re-presented by replay, if it could be created.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }
}

impl CaptureStrategy for HardwareRendererStrategy {
    fn backend(&self) -> Backend {
        Backend::HardwareRenderer
    }

    fn pixel_size(&mut self, _geometry: &WindowGeometry) -> Result<usize, CaptureError> {
        Ok(self.renderers.window_pixel_format().bytes_per_pixel())
    }

    fn acquire(&mut self, layout: &FrameLayout) -> Result<(), CaptureError> {
        let renderer = self.renderers.renderer().ok_or_else(|| CaptureError::BackendUnavailable {
            backend: Backend::HardwareRenderer,
            reason: "no renderer attached to window".into(),
        })?;
        self.renderer = Some(renderer);

        if self.texture.is_none() {
            let format = self.renderers.window_pixel_format();
            let texture = self
                .renderers
                .create_streaming_texture(renderer, format, layout.width(), layout.height())
                .map_err(|e| CaptureError::ResourceCreation {
                    resource: "streaming texture",
                    reason: e.to_string(),
                })?;
            debug!(target: "framecap::window", "Streaming texture {:?} ({}) created", texture, format);
            self.texture = Some(texture);
        }
        Ok(())
    }

    fn capture(
        &mut self,
        layout: &FrameLayout,
        canonical: &mut [u8],
        want_pixels: bool,
    ) -> Result<(), CaptureError> {
        if !want_pixels {
            return Ok(());
        }
        let Some(renderer) = self.renderer else { return Ok(()) };
        if let Err(e) = self.renderers.read_pixels(renderer, canonical, layout.pitch()) {
            error!(target: "framecap::sdl", "Renderer pixel read failed: {}", e);
        }
        Ok(())
    }

    fn present(&mut self, _layout: &FrameLayout) {
        let (Some(renderer), Some(texture)) = (self.renderer, self.texture) else { return };
        if let Err(e) = self.renderers.copy_texture(renderer, texture) {
            error!(target: "framecap::sdl", "Renderer texture copy failed: {}", e);
        }
    }

    fn pixel_format(&self) -> PixelFormatTag {
        format::renderer_tag(self.renderers.window_pixel_format())
    }

    fn release(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.renderers.destroy_texture(texture);
        }
        self.renderer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticRenderer;
    use framecap_core::WindowPixelFormat;

    #[test]
    fn pixel_size_from_window_format() {
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::RGB24);
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers));
        assert_eq!(strategy.pixel_size(&WindowGeometry::new(4, 2, 24)).unwrap(), 3);
    }

    #[test]
    fn missing_renderer_is_unavailable() {
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::ARGB8888);
        renderers.detach_renderer();
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers));
        let err = strategy.acquire(&FrameLayout::new(4, 2, 4)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn readback_only_when_pixels_wanted() {
        let layout = FrameLayout::new(4, 2, 4);
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::ARGB8888);
        renderers.set_screen(&[4; 32]);
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers.clone()));
        strategy.acquire(&layout).unwrap();

        let mut canonical = vec![0; layout.size()];
        strategy.capture(&layout, &mut canonical, false).unwrap();
        assert!(canonical.iter().all(|&b| b == 0));

        strategy.capture(&layout, &mut canonical, true).unwrap();
        assert_eq!(canonical, vec![4; 32]);
    }

    #[test]
    fn failed_readback_keeps_previous_pixels() {
        let layout = FrameLayout::new(4, 2, 4);
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::ARGB8888);
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers.clone()));
        strategy.acquire(&layout).unwrap();
        renderers.set_fail_read(true);

        let mut canonical = vec![8; layout.size()];
        assert!(strategy.capture(&layout, &mut canonical, true).is_ok());
        assert!(canonical.iter().all(|&b| b == 8));
    }

    #[test]
    fn texture_failure_is_not_fatal_and_replay_is_skipped() {
        let layout = FrameLayout::new(4, 2, 4);
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::ARGB8888);
        renderers.set_fail_create_texture(true);
        renderers.set_screen(&[1; 32]);
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers.clone()));

        let err = strategy.acquire(&layout).unwrap_err();
        assert!(matches!(err, CaptureError::ResourceCreation { .. }));
        assert!(!err.is_fatal());

        strategy.present(&layout);
        assert_eq!(renderers.screen(), vec![1; 32]);
        assert_eq!(renderers.texture_copies(), 0);
    }

    #[test]
    fn replay_copies_streaming_texture() {
        let layout = FrameLayout::new(4, 2, 4);
        let renderers = SyntheticRenderer::new(4, 2, WindowPixelFormat::ABGR8888);
        let mut strategy = HardwareRendererStrategy::new(Box::new(renderers.clone()));
        strategy.acquire(&layout).unwrap();

        let texture = strategy.texture().unwrap();
        assert!(renderers.update_texture(texture, &[5; 32]));
        strategy.present(&layout);

        assert_eq!(renderers.screen(), vec![5; 32]);
        assert_eq!(strategy.pixel_format(), PixelFormatTag::Argb);

        strategy.release();
        assert_eq!(renderers.live_textures(), 0);
    }
}
