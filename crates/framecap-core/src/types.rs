use serde::{Deserialize, Serialize};

// MARK: - Backend

/// Rendering backend the host application draws with.
///
/// Exactly one is active for the lifetime of an `init`/`fini` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Raw accelerated graphics context (OpenGL default framebuffer).
    AcceleratedContext,
    /// Software video surface (SDL 1.2 style).
    SoftwareSurface,
    /// Hardware renderer with streaming textures (SDL 2 style).
    HardwareRenderer,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcceleratedContext => write!(f, "accelerated-context"),
            Self::SoftwareSurface => write!(f, "software-surface"),
            Self::HardwareRenderer => write!(f, "hardware-renderer"),
        }
    }
}

// MARK: - WindowGeometry

/// Geometry of the application window as reported by the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
    /// Display color depth in bits per pixel.
    pub depth: u32,
}

impl WindowGeometry {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    pub fn is_even(&self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }
}

impl std::fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// MARK: - FrameLayout

/// Memory layout of the canonical buffer.
///
/// `pitch` and `size` are always derived from the other fields, so a layout
/// can never be internally inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameLayout {
    width: u32,
    height: u32,
    pixel_size: usize,
    pitch: usize,
    size: usize,
}

impl FrameLayout {
    pub fn new(width: u32, height: u32, pixel_size: usize) -> Self {
        let pitch = width as usize * pixel_size;
        let size = pitch * height as usize;
        Self { width, height, pixel_size, pitch, size }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel, `1..=4`.
    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Bytes per frame.
    pub fn size(&self) -> usize {
        self.size
    }
}

// MARK: - Rect

/// Axis-aligned rectangle, used for clip rectangles and blit regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

// MARK: - PixelFormatTag

/// Byte-order tag telling consumers how to read the canonical buffer.
///
/// The tag describes the sequential byte order in memory, which is what a
/// video encoder expects as its raw input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormatTag {
    #[default]
    Rgba,
    Argb,
    Bgra,
    Abgr,
    /// Packed 24-bit, tagged `"24BG"`.
    Bgr24,
    /// Packed 24-bit, tagged `"RAW "`.
    Raw,
}

impl PixelFormatTag {
    /// The four-byte tag string.
    pub fn fourcc(&self) -> &'static str {
        match self {
            Self::Rgba => "RGBA",
            Self::Argb => "ARGB",
            Self::Bgra => "BGRA",
            Self::Abgr => "ABGR",
            Self::Bgr24 => "24BG",
            Self::Raw => "RAW ",
        }
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(self.fourcc().as_bytes());
        tag
    }
}

impl std::fmt::Display for PixelFormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.fourcc())
    }
}

// MARK: - WindowPixelFormat

/// Packed pixel format code reported by a hardware renderer's window.
///
/// Values are the SDL2 `SDL_PIXELFORMAT_*` codes. The low byte of a code is
/// its bytes-per-pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowPixelFormat(pub u32);

impl WindowPixelFormat {
    pub const RGBA8888: Self = Self(0x1646_2004);
    pub const ARGB8888: Self = Self(0x1636_2004);
    pub const ABGR8888: Self = Self(0x1676_2004);
    pub const BGRA8888: Self = Self(0x1686_2004);
    pub const RGB24: Self = Self(0x1710_1803);
    pub const BGR24: Self = Self(0x1740_1803);

    pub fn bytes_per_pixel(&self) -> usize {
        (self.0 & 0xFF) as usize
    }

    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::RGBA8888 => Some("RGBA8888"),
            Self::ARGB8888 => Some("ARGB8888"),
            Self::ABGR8888 => Some("ABGR8888"),
            Self::BGRA8888 => Some("BGRA8888"),
            Self::RGB24 => Some("RGB24"),
            Self::BGR24 => Some("BGR24"),
            _ => None,
        }
    }
}

impl std::fmt::Display for WindowPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

// MARK: - CapturedFrame

/// Owned copy of the canonical buffer, detached from the capture session.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Top row first, `pitch` bytes per row.
    pub data: bytes::Bytes,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub format: PixelFormatTag,
}
