//! Software-surface capture via a display-format shadow surface.

use framecap_core::{Backend, CaptureError, FrameLayout, PixelFormatTag, WindowGeometry};
use tracing::{debug, error, warn};

use crate::format;
use crate::host::{SurfaceId, SurfacePrimitives};
use crate::strategy::CaptureStrategy;

pub struct SoftwareSurfaceStrategy {
    surfaces: Box<dyn SurfacePrimitives>,
    shadow: Option<SurfaceId>,
}

impl SoftwareSurfaceStrategy {
    pub fn new(surfaces: Box<dyn SurfacePrimitives>) -> Self {
        Self { surfaces, shadow: None }
    }

    pub fn shadow(&self) -> Option<SurfaceId> {
        self.shadow
    }

    fn video_surface(&mut self) -> Result<SurfaceId, CaptureError> {
        self.surfaces.video_surface().ok_or_else(|| CaptureError::BackendUnavailable {
            backend: Backend::SoftwareSurface,
            reason: "no video surface".into(),
        })
    }

    /// Blits `src` onto `dst` with source alpha blending disabled.
    fn opaque_blit(&mut self, src: SurfaceId, dst: SurfaceId) {
        let src_alpha = self.surfaces.surface_info(src).src_alpha;
        if src_alpha {
            self.surfaces.set_alpha(src, false);
        }
        if let Err(e) = self.surfaces.blit(src, dst) {
            error!(target: "framecap::dump", "Surface blit failed: {}", e);
        }
        if src_alpha {
            self.surfaces.set_alpha(src, true);
        }
    }
}

impl CaptureStrategy for SoftwareSurfaceStrategy {
    fn backend(&self) -> Backend {
        Backend::SoftwareSurface
    }

    fn pixel_size(&mut self, _geometry: &WindowGeometry) -> Result<usize, CaptureError> {
        let surface = self.video_surface()?;
        Ok(self.surfaces.surface_info(surface).bytes_per_pixel)
    }

    fn acquire(&mut self, _layout: &FrameLayout) -> Result<(), CaptureError> {
        let surface = self.video_surface()?;
        if self.shadow.is_some() {
            return Ok(());
        }

        let shadow = self.surfaces.display_format(surface).map_err(|e| {
            CaptureError::ResourceCreation { resource: "shadow surface", reason: e.to_string() }
        })?;
        if self.surfaces.surface_info(shadow).src_alpha {
            self.surfaces.set_alpha(shadow, false);
        }
        debug!(target: "framecap::window", "Shadow surface {:?} created", shadow);
        self.shadow = Some(shadow);
        Ok(())
    }

    fn capture(
        &mut self,
        layout: &FrameLayout,
        canonical: &mut [u8],
        want_pixels: bool,
    ) -> Result<(), CaptureError> {
        let surface = self.video_surface()?;

        let info = self.surfaces.surface_info(surface);
        if info.width != layout.width() || info.height != layout.height() {
            let err = CaptureError::CaptureMismatch {
                expected_width: layout.width(),
                expected_height: layout.height(),
                actual_width: info.width,
                actual_height: info.height,
            };
            error!(target: "framecap::dump", "{}", err);
            return Err(err);
        }

        let Some(shadow) = self.shadow else {
            warn!(target: "framecap::dump", "No shadow surface, skipping capture");
            return Ok(());
        };

        self.opaque_blit(surface, shadow);

        if want_pixels {
            if let Err(e) = self.surfaces.lock(shadow) {
                error!(target: "framecap::dump", "Could not lock surface: {}", e);
                return Err(CaptureError::Lock(e));
            }
            self.surfaces.copy_pixels(shadow, &mut canonical[..layout.size()]);
            self.surfaces.unlock(shadow);
        }
        Ok(())
    }

    fn present(&mut self, _layout: &FrameLayout) {
        let Some(shadow) = self.shadow else { return };
        let surface = match self.video_surface() {
            Ok(surface) => surface,
            Err(e) => {
                error!(target: "framecap::dump", "{}", e);
                return;
            }
        };

        let clip = self.surfaces.clip_rect(surface);
        self.surfaces.set_clip_rect(surface, None);
        if let Err(e) = self.surfaces.blit(shadow, surface) {
            error!(target: "framecap::dump", "Surface blit failed: {}", e);
        }
        self.surfaces.set_clip_rect(surface, Some(clip));
    }

    fn pixel_format(&self) -> PixelFormatTag {
        match self.shadow {
            Some(shadow) => format::surface_tag(self.surfaces.surface_info(shadow).red_mask),
            None => PixelFormatTag::Rgba,
        }
    }

    fn release(&mut self) {
        if let Some(shadow) = self.shadow.take() {
            self.surfaces.free_surface(shadow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticSurfaces;
    use framecap_core::Rect;

    fn acquired(surfaces: &SyntheticSurfaces, layout: &FrameLayout) -> SoftwareSurfaceStrategy {
        let mut strategy = SoftwareSurfaceStrategy::new(Box::new(surfaces.clone()));
        strategy.acquire(layout).unwrap();
        strategy
    }

    #[test]
    fn pixel_size_comes_from_video_surface() {
        let surfaces = SyntheticSurfaces::new(8, 4, 2, 0xf800);
        let mut strategy = SoftwareSurfaceStrategy::new(Box::new(surfaces));
        let size = strategy.pixel_size(&WindowGeometry::new(8, 4, 16)).unwrap();
        assert_eq!(size, 2);
    }

    #[test]
    fn missing_video_surface_is_unavailable() {
        let surfaces = SyntheticSurfaces::new(8, 4, 4, 0xff);
        surfaces.remove_video_surface();
        let mut strategy = SoftwareSurfaceStrategy::new(Box::new(surfaces));
        let err = strategy.acquire(&FrameLayout::new(8, 4, 4)).unwrap_err();
        assert!(matches!(err, CaptureError::BackendUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn shadow_surface_has_alpha_disabled() {
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0xff);
        surfaces.set_video_src_alpha(true);
        let strategy = acquired(&surfaces, &FrameLayout::new(4, 2, 4));
        let shadow = strategy.shadow().unwrap();
        assert_eq!(surfaces.src_alpha(shadow), Some(false));
    }

    #[test]
    fn capture_blits_without_source_alpha_then_restores_it() {
        let layout = FrameLayout::new(4, 2, 4);
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0xff);
        surfaces.set_video_src_alpha(true);
        surfaces.set_video_pixels(&[9; 32]);
        let mut strategy = acquired(&surfaces, &layout);

        let mut canonical = vec![0; layout.size()];
        strategy.capture(&layout, &mut canonical, true).unwrap();

        assert_eq!(canonical, vec![9; 32]);
        assert_eq!(surfaces.blit_alpha_states(), vec![false]);
        assert!(surfaces.video_src_alpha());
    }

    #[test]
    fn size_change_is_a_mismatch_and_leaves_buffer_untouched() {
        let layout = FrameLayout::new(800, 600, 4);
        let surfaces = SyntheticSurfaces::new(800, 600, 4, 0xff);
        let mut strategy = acquired(&surfaces, &layout);
        surfaces.resize_video(700, 600);

        let mut canonical = vec![0x5A; layout.size()];
        let err = strategy.capture(&layout, &mut canonical, true).unwrap_err();

        assert_eq!(
            err,
            CaptureError::CaptureMismatch {
                expected_width: 800,
                expected_height: 600,
                actual_width: 700,
                actual_height: 600,
            }
        );
        assert!(canonical.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn lock_failure_fails_the_call() {
        let layout = FrameLayout::new(4, 2, 4);
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0xff);
        surfaces.set_video_pixels(&[3; 32]);
        let mut strategy = acquired(&surfaces, &layout);
        surfaces.set_fail_lock(true);

        let mut canonical = vec![1; layout.size()];
        let err = strategy.capture(&layout, &mut canonical, true).unwrap_err();
        assert!(matches!(err, CaptureError::Lock(_)));
        assert!(canonical.iter().all(|&b| b == 1));

        // Without pixel data the lock is never taken.
        assert!(strategy.capture(&layout, &mut canonical, false).is_ok());
    }

    #[test]
    fn replay_restores_clip_rect() {
        let layout = FrameLayout::new(4, 2, 4);
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0xff);
        surfaces.set_video_pixels(&[6; 32]);
        let mut strategy = acquired(&surfaces, &layout);
        let mut canonical = vec![0; layout.size()];
        strategy.capture(&layout, &mut canonical, false).unwrap();

        let narrow = Rect::new(1, 0, 1, 1);
        surfaces.set_video_clip(narrow);
        surfaces.set_video_pixels(&[0; 32]);
        strategy.present(&layout);

        assert_eq!(surfaces.video_pixels(), vec![6; 32]);
        assert_eq!(surfaces.video_clip(), narrow);
    }

    #[test]
    fn pixel_format_follows_shadow_red_mask() {
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0x00ff_0000);
        let strategy = acquired(&surfaces, &FrameLayout::new(4, 2, 4));
        assert_eq!(strategy.pixel_format(), PixelFormatTag::Bgra);
    }

    #[test]
    fn shadow_creation_failure_is_not_fatal() {
        let layout = FrameLayout::new(4, 2, 4);
        let surfaces = SyntheticSurfaces::new(4, 2, 4, 0xff);
        surfaces.set_fail_display_format(true);
        let mut strategy = SoftwareSurfaceStrategy::new(Box::new(surfaces.clone()));

        let err = strategy.acquire(&layout).unwrap_err();
        assert!(!err.is_fatal());

        let mut canonical = vec![2; layout.size()];
        assert!(strategy.capture(&layout, &mut canonical, true).is_ok());
        assert!(canonical.iter().all(|&b| b == 2));
        assert_eq!(strategy.pixel_format(), PixelFormatTag::Rgba);
    }
}
