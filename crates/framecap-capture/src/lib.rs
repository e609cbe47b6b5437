//! framecap-capture — frame capture and replay over three rendering backends.
//!
//! # Backends
//!
//! | Backend | Capture | Replay | Format tag |
//! |---------|---------|--------|------------|
//! | Accelerated context | blit → offscreen target, readback, vertical flip | blit offscreen → default | always `RGBA` |
//! | Software surface | blit → shadow surface, lock + copy | blit shadow → screen, clip preserved | from red mask |
//! | Hardware renderer | renderer readback | copy streaming texture | window format, byte order inverted |
//!
//! # Usage
//!
//! ```rust,ignore
//! use framecap_capture::ScreenCapture;
//! let mut capture = ScreenCapture::new(host, config).with_accelerated(gl);
//! capture.init()?;
//! // draw frame: keep the canonical buffer current
//! capture.store_pixels()?;
//! // non-draw frame: put the stored frame back on screen
//! capture.set_pixels();
//! ```
//!
//! The graphics entry points come in through the traits in [`host`]; the
//! `synthetic` feature provides in-memory implementations of all of them.

pub mod accelerated;
pub mod capture;
pub mod format;
pub mod host;
pub mod renderer;
pub mod software;
pub mod strategy;

#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

pub use accelerated::AcceleratedContextStrategy;
pub use capture::{PixelGrab, ScreenCapture};
pub use host::{
    GlPrimitives, OffscreenTarget, RendererId, RendererPrimitives, SurfaceId, SurfaceInfo,
    SurfacePrimitives, TextureId, VideoHost,
};
pub use renderer::HardwareRendererStrategy;
pub use software::SoftwareSurfaceStrategy;
pub use strategy::CaptureStrategy;
