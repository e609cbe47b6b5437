use thiserror::Error;

use crate::types::Backend;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Invalid window geometry {width}x{height}: {reason}")]
    Geometry { width: u32, height: u32, reason: String },

    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: Backend, reason: String },

    #[error("Bytes per pixel must be within 1..=4, got {pixel_size}")]
    InvalidPixelSize { pixel_size: usize },

    #[error("Failed to create {resource}: {reason}")]
    ResourceCreation { resource: &'static str, reason: String },

    #[error("Window size changed ({expected_width},{expected_height}) -> ({actual_width},{actual_height})")]
    CaptureMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Could not lock surface: {0}")]
    Lock(#[from] BackendFault),

    #[error("Screen capture not initialized")]
    NotInitialized,
}

impl CaptureError {
    /// Whether this error aborts `init` and leaves the session uninitialized.
    ///
    /// Non-fatal errors are logged by `init`; per-frame errors only fail the
    /// call that produced them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Geometry { .. } | Self::BackendUnavailable { .. } | Self::InvalidPixelSize { .. }
        )
    }
}

/// Failure reported by a graphics/windowing primitive.
///
/// Carries the collaborator's own message (what `SDL_GetError` or
/// `glGetError` would say).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendFault(pub String);

impl BackendFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
