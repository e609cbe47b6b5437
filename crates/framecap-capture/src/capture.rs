use bytes::Bytes;
use framecap_core::{
    Backend, CaptureConfig, CaptureError, CapturedFrame, FrameLayout, PixelFormatTag, WindowGeometry,
};
use tracing::{debug, error, info, warn};

use crate::accelerated::AcceleratedContextStrategy;
use crate::host::{GlPrimitives, RendererPrimitives, SurfacePrimitives, TextureId, VideoHost};
use crate::renderer::HardwareRendererStrategy;
use crate::software::SoftwareSurfaceStrategy;
use crate::strategy::CaptureStrategy;

// MARK: - PixelGrab

/// Result of [`ScreenCapture::get_pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGrab<'a> {
    /// Size of the canonical buffer in bytes, 0 when not initialized.
    pub size: usize,
    /// The canonical buffer, when requested. Valid until the next capture.
    pub pixels: Option<&'a [u8]>,
}

// MARK: - Strategies

#[derive(Default)]
struct Strategies {
    accelerated: Option<AcceleratedContextStrategy>,
    software: Option<SoftwareSurfaceStrategy>,
    renderer: Option<HardwareRendererStrategy>,
}

impl Strategies {
    fn get(&self, backend: Backend) -> Option<&dyn CaptureStrategy> {
        match backend {
            Backend::AcceleratedContext => self.accelerated.as_ref().map(|s| s as &dyn CaptureStrategy),
            Backend::SoftwareSurface => self.software.as_ref().map(|s| s as &dyn CaptureStrategy),
            Backend::HardwareRenderer => self.renderer.as_ref().map(|s| s as &dyn CaptureStrategy),
        }
    }

    fn get_mut(&mut self, backend: Backend) -> Option<&mut dyn CaptureStrategy> {
        match backend {
            Backend::AcceleratedContext => self.accelerated.as_mut().map(|s| s as &mut dyn CaptureStrategy),
            Backend::SoftwareSurface => self.software.as_mut().map(|s| s as &mut dyn CaptureStrategy),
            Backend::HardwareRenderer => self.renderer.as_mut().map(|s| s as &mut dyn CaptureStrategy),
        }
    }

    fn release_all(&mut self) {
        if let Some(s) = self.accelerated.as_mut() {
            s.release();
        }
        if let Some(s) = self.software.as_mut() {
            s.release();
        }
        if let Some(s) = self.renderer.as_mut() {
            s.release();
        }
    }
}

// MARK: - ScreenCapture

/// Frame capture and replay over whichever backend the application uses.
///
/// # Lifecycle
///
/// ```text
/// new ──► init ──► (get_pixels | store_pixels | set_pixels)* ──► fini
///            ▲                                                    │
///            └──────────────────── reinit ────────────────────────┘
/// ```
///
/// `init` is a no-op until the host reports a window. The backend flag and
/// the window geometry are read once per `init`; a resized window is only
/// picked up by `reinit`.
///
/// Not thread-safe: every call must come from the thread owning the
/// application's graphics context, between frame start and present.
pub struct ScreenCapture {
    host: Box<dyn VideoHost>,
    config: CaptureConfig,
    strategies: Strategies,
    inited: bool,
    active: Option<Backend>,
    layout: FrameLayout,
    /// Top row first, `layout.size()` bytes while inited.
    canonical: Vec<u8>,
}

impl ScreenCapture {
    pub fn new(host: Box<dyn VideoHost>, config: CaptureConfig) -> Self {
        Self {
            host,
            config,
            strategies: Strategies::default(),
            inited: false,
            active: None,
            layout: FrameLayout::default(),
            canonical: Vec::new(),
        }
    }

    pub fn with_accelerated(mut self, gl: Box<dyn GlPrimitives>) -> Self {
        self.strategies.accelerated = Some(AcceleratedContextStrategy::new(gl));
        self
    }

    pub fn with_software(mut self, surfaces: Box<dyn SurfacePrimitives>) -> Self {
        self.strategies.software = Some(SoftwareSurfaceStrategy::new(surfaces));
        self
    }

    pub fn with_renderer(mut self, renderers: Box<dyn RendererPrimitives>) -> Self {
        self.strategies.renderer = Some(HardwareRendererStrategy::new(renderers));
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Allocates the canonical buffer and the active backend's resources.
    ///
    /// Either fully succeeds or leaves the session uninitialized with nothing
    /// retained. Missing textures/surfaces are logged and tolerated.
    pub fn init(&mut self) -> Result<(), CaptureError> {
        if self.inited {
            return Ok(());
        }
        let Some(geometry) = self.host.window_geometry() else {
            debug!(target: "framecap::window", "No window registered yet, capture not initialized");
            return Ok(());
        };

        if !self.config.geometry_policy.accepts(&geometry) {
            error!(target: "framecap::window", "Screen dimensions must be a multiple of 2, got {}", geometry);
            return Err(CaptureError::Geometry {
                width: geometry.width,
                height: geometry.height,
                reason: "dimensions must be a multiple of 2".into(),
            });
        }

        let backend = self.host.active_backend();
        if let Err(e) = self.allocate(geometry, backend) {
            error!(target: "framecap::window", "Screen capture init failed: {}", e);
            self.strategies.release_all();
            self.canonical = Vec::new();
            return Err(e);
        }

        info!(
            target: "framecap::window",
            "Inited screen capture with dimensions ({},{}), {} bytes per pixel, backend {}",
            self.layout.width(),
            self.layout.height(),
            self.layout.pixel_size(),
            backend.map_or_else(|| "none".to_string(), |b| b.to_string()),
        );
        Ok(())
    }

    fn allocate(&mut self, geometry: WindowGeometry, backend: Option<Backend>) -> Result<(), CaptureError> {
        let mut strategy = match backend {
            Some(backend) => Some(self.strategies.get_mut(backend).ok_or_else(|| {
                CaptureError::BackendUnavailable { backend, reason: "no primitives registered".into() }
            })?),
            None => None,
        };

        // Without a known backend the display depth decides.
        let pixel_size = match strategy.as_mut() {
            Some(strategy) => {
                debug!(target: "framecap::window", "Using {} strategy", strategy.backend());
                strategy.pixel_size(&geometry)?
            }
            None => (geometry.depth / 8) as usize,
        };
        if !(1..=4).contains(&pixel_size) {
            return Err(CaptureError::InvalidPixelSize { pixel_size });
        }

        let layout = FrameLayout::new(geometry.width, geometry.height, pixel_size);
        if let Some(strategy) = strategy {
            if let Err(e) = strategy.acquire(&layout) {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(target: "framecap::window", "{}", e);
            }
        }

        self.canonical = vec![0; layout.size()];
        self.layout = layout;
        self.active = backend;
        self.inited = true;
        Ok(())
    }

    /// Releases every buffer and backend resource. Safe when never inited.
    pub fn fini(&mut self) {
        self.canonical = Vec::new();
        self.strategies.release_all();
        self.active = None;
        if self.inited {
            debug!(target: "framecap::window", "Screen capture released");
        }
        self.inited = false;
    }

    /// `fini` + `init`, only when currently inited. Picks up a new window geometry.
    pub fn reinit(&mut self) -> Result<(), CaptureError> {
        if !self.inited {
            return Ok(());
        }
        self.fini();
        self.init()
    }

    pub fn is_inited(&self) -> bool {
        self.inited
    }

    /// Window dimensions recorded by the last successful `init`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.layout.width(), self.layout.height())
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn backend(&self) -> Option<Backend> {
        self.active
    }

    // ── Capture / replay ──────────────────────────────────────────────────────

    /// Captures the live frame without handing out the pixels, so a later
    /// `set_pixels` has something to present.
    pub fn store_pixels(&mut self) -> Result<usize, CaptureError> {
        self.get_pixels(false, true).map(|grab| grab.size)
    }

    /// With `draw`, refreshes the canonical buffer from the live frame;
    /// without it, only reports the (possibly stale) buffer.
    ///
    /// On error the canonical buffer keeps its last good contents.
    pub fn get_pixels(&mut self, want_pixels: bool, draw: bool) -> Result<PixelGrab<'_>, CaptureError> {
        if !self.inited {
            return Ok(PixelGrab { size: 0, pixels: None });
        }

        if let (true, Some(backend)) = (draw, self.active) {
            if let Some(strategy) = self.strategies.get_mut(backend) {
                strategy.capture(&self.layout, &mut self.canonical, want_pixels)?;
            }
        }

        Ok(PixelGrab {
            size: self.layout.size(),
            pixels: want_pixels.then_some(self.canonical.as_slice()),
        })
    }

    /// Presents the stored frame. Best-effort: failures are only logged.
    pub fn set_pixels(&mut self) {
        if !self.inited {
            return;
        }
        let Some(backend) = self.active else { return };
        if let Some(strategy) = self.strategies.get_mut(backend) {
            strategy.present(&self.layout);
        }
    }

    /// Byte order of the canonical buffer.
    pub fn pixel_format(&self) -> Result<PixelFormatTag, CaptureError> {
        if !self.inited {
            return Err(CaptureError::NotInitialized);
        }
        Ok(self
            .active
            .and_then(|b| self.strategies.get(b))
            .map(|s| s.pixel_format())
            .unwrap_or_default())
    }

    /// Owned copy of the canonical buffer.
    pub fn snapshot(&self) -> Option<CapturedFrame> {
        let format = self.pixel_format().ok()?;
        Some(CapturedFrame {
            data: Bytes::copy_from_slice(&self.canonical),
            width: self.layout.width(),
            height: self.layout.height(),
            pitch: self.layout.pitch(),
            format,
        })
    }

    /// Hardware-renderer streaming texture that `set_pixels` presents.
    /// Callers update it through their own texture-update path.
    pub fn streaming_texture(&self) -> Option<TextureId> {
        if !self.inited || self.active != Some(Backend::HardwareRenderer) {
            return None;
        }
        self.strategies.renderer.as_ref().and_then(|r| r.texture())
    }
}
