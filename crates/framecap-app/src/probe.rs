use std::time::Duration;

use anyhow::{bail, Context, Result};
use framecap_capture::synthetic::{SyntheticGl, SyntheticHost, SyntheticRenderer, SyntheticSurfaces};
use framecap_capture::ScreenCapture;
use framecap_core::{Backend, CaptureConfig, WindowGeometry, WindowPixelFormat};
use tracing::{debug, info, warn};

const PROBE_WIDTH: u32 = 320;
const PROBE_HEIGHT: u32 = 240;

/// Drives a synthetic capture session through a short frame loop.
///
/// # Frame schedule
/// Every third frame is a non-draw frame: the application renders nothing,
/// so the stored frame is re-presented instead. Draw frames repaint the
/// screen, refresh the canonical buffer and hand it to a stand-in encoder.
///
/// Config path comes from `FRAMECAP_CONFIG`; defaults apply when unset.
pub async fn run() -> Result<()> {
    let config = match std::env::var("FRAMECAP_CONFIG") {
        Ok(path) => CaptureConfig::load(&path).with_context(|| format!("Loading config {path}"))?,
        Err(_) => CaptureConfig::default(),
    };
    let backend = config.backend.unwrap_or(Backend::AcceleratedContext);
    info!("Probing {} backend at {}x{}, {} frames", backend, PROBE_WIDTH, PROBE_HEIGHT, config.frames);

    let host = SyntheticHost::new(Some(WindowGeometry::new(PROBE_WIDTH, PROBE_HEIGHT, 32)), Some(backend));
    let (mut capture, screen) = wire(backend, host, config.clone());

    capture.init().context("Screen capture init")?;
    let format = capture.pixel_format()?;
    info!("Canonical buffer: {} bytes, format {}", capture.layout().size(), format);

    let mut ticker = tokio::time::interval(Duration::from_micros(config.frame_interval_us().max(1)));
    let mut last_drawn: Option<Vec<u8>> = None;
    let mut mismatches = 0u32;

    for frame in 0..config.frames {
        ticker.tick().await;
        let draw = frame % 3 != 2;

        if draw {
            let pixels = pattern(capture.layout().size(), frame);
            screen.paint(&pixels);
            if config.save_screen_pixels {
                capture.store_pixels()?;
            }

            let grab = capture.get_pixels(true, true)?;
            let captured = grab.pixels.unwrap_or_default();
            debug!("Frame {}: encoded {} bytes, checksum {:08x}", frame, grab.size, checksum(captured));
            if let Screen::Renderer(renderers) = &screen {
                if let Some(texture) = capture.streaming_texture() {
                    renderers.update_texture(texture, &pixels);
                }
            }
            last_drawn = Some(pixels);
        } else if config.save_screen_pixels {
            screen.paint(&vec![0; capture.layout().size()]);
            capture.set_pixels();

            let restored = last_drawn.as_deref().is_some_and(|expected| screen.contents() == expected);
            if restored {
                debug!("Frame {}: non-draw, stored frame re-presented", frame);
            } else {
                warn!("Frame {}: non-draw, screen does not match the stored frame", frame);
                mismatches += 1;
            }
        } else {
            debug!("Frame {}: non-draw, screen pixels not saved", frame);
        }
    }

    capture.fini();
    if mismatches > 0 {
        bail!("{mismatches} non-draw frame(s) were not restored");
    }
    Ok(())
}

// ── Synthetic wiring ──────────────────────────────────────────────────────────

/// The application's side of the synthetic backend.
enum Screen {
    Gl(SyntheticGl),
    Surfaces(SyntheticSurfaces),
    Renderer(SyntheticRenderer),
}

impl Screen {
    fn paint(&self, pixels: &[u8]) {
        match self {
            Self::Gl(gl) => gl.set_default_framebuffer(pixels),
            Self::Surfaces(surfaces) => surfaces.set_video_pixels(pixels),
            Self::Renderer(renderers) => renderers.set_screen(pixels),
        }
    }

    fn contents(&self) -> Vec<u8> {
        match self {
            Self::Gl(gl) => gl.default_framebuffer(),
            Self::Surfaces(surfaces) => surfaces.video_pixels(),
            Self::Renderer(renderers) => renderers.screen(),
        }
    }
}

fn wire(backend: Backend, host: SyntheticHost, config: CaptureConfig) -> (ScreenCapture, Screen) {
    let capture = ScreenCapture::new(Box::new(host), config);
    match backend {
        Backend::AcceleratedContext => {
            let gl = SyntheticGl::new(PROBE_WIDTH, PROBE_HEIGHT);
            (capture.with_accelerated(Box::new(gl.clone())), Screen::Gl(gl))
        }
        Backend::SoftwareSurface => {
            let surfaces = SyntheticSurfaces::new(PROBE_WIDTH, PROBE_HEIGHT, 4, 0x00ff_0000);
            (capture.with_software(Box::new(surfaces.clone())), Screen::Surfaces(surfaces))
        }
        Backend::HardwareRenderer => {
            let renderers = SyntheticRenderer::new(PROBE_WIDTH, PROBE_HEIGHT, WindowPixelFormat::ARGB8888);
            (capture.with_renderer(Box::new(renderers.clone())), Screen::Renderer(renderers))
        }
    }
}

fn pattern(len: usize, frame: u32) -> Vec<u8> {
    (0..len).map(|i| (i as u32).wrapping_add(frame.wrapping_mul(17)) as u8).collect()
}

fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5u32, |h, &b| (h ^ b as u32).wrapping_mul(0x0100_0193))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_backend_restores_a_stored_frame() {
        for backend in [Backend::AcceleratedContext, Backend::SoftwareSurface, Backend::HardwareRenderer] {
            let host = SyntheticHost::new(Some(WindowGeometry::new(PROBE_WIDTH, PROBE_HEIGHT, 32)), Some(backend));
            let (mut capture, screen) = wire(backend, host, CaptureConfig::default());
            capture.init().unwrap();

            let pixels = pattern(capture.layout().size(), 1);
            screen.paint(&pixels);
            capture.store_pixels().unwrap();
            capture.get_pixels(true, true).unwrap();
            if let (Screen::Renderer(renderers), Some(texture)) = (&screen, capture.streaming_texture()) {
                assert!(renderers.update_texture(texture, &pixels));
            }

            screen.paint(&vec![0; pixels.len()]);
            capture.set_pixels();
            assert_eq!(screen.contents(), pixels, "{backend}");
        }
    }
}
