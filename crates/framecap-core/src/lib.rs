pub mod config;
pub mod errors;
pub mod types;

pub use config::{CaptureConfig, GeometryPolicy};
pub use errors::{BackendFault, CaptureError};
pub use types::*;
