//! Pixel format resolution: backend-reported format → canonical byte-order tag.

use framecap_core::{PixelFormatTag, WindowPixelFormat};
use tracing::{debug, error};

/// Accelerated-context readback is always requested as RGBA bytes.
pub fn accelerated_tag() -> PixelFormatTag {
    PixelFormatTag::Rgba
}

/// Tag for a software surface, keyed on its red channel mask.
pub fn surface_tag(red_mask: u32) -> PixelFormatTag {
    match red_mask {
        0x0000_00ff => PixelFormatTag::Rgba,
        0x0000_ff00 => PixelFormatTag::Argb,
        0x00ff_0000 => PixelFormatTag::Bgra,
        0xff00_0000 => PixelFormatTag::Abgr,
        _ => PixelFormatTag::Rgba,
    }
}

/// Tag for a renderer window format.
///
/// Packed 32-bit format names describe the layout of a native-endian word,
/// so on little-endian hosts the byte order in memory is reversed.
pub fn renderer_tag(format: WindowPixelFormat) -> PixelFormatTag {
    let tag = match format {
        WindowPixelFormat::RGBA8888 => PixelFormatTag::Bgra,
        WindowPixelFormat::BGRA8888 => PixelFormatTag::Rgba,
        WindowPixelFormat::ARGB8888 => PixelFormatTag::Abgr,
        WindowPixelFormat::ABGR8888 => PixelFormatTag::Argb,
        WindowPixelFormat::RGB24 => PixelFormatTag::Bgr24,
        WindowPixelFormat::BGR24 => PixelFormatTag::Raw,
        other => {
            error!(target: "framecap::sdl", "Unsupported pixel format {}", other);
            return PixelFormatTag::Rgba;
        }
    };
    debug!(target: "framecap::dump", "Window format {} -> {}", format, tag);
    tag
}
