// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the preview pipeline

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame input rejected before it reached the GPU
    Frame(FrameError),
    /// GPU setup or readback errors
    Render(RenderError),
    /// Frame source errors
    Source(SourceError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Frame input errors
///
/// These never abort the pipeline; callers drop the frame and keep the
/// previous texture contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No pixel data was supplied
    MissingData,
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Buffer length does not match the declared dimensions
    SizeMismatch { expected: usize, actual: usize },
    /// A side exceeds the largest texture the device can hold
    TooLarge { width: u32, height: u32, max: u32 },
}

/// GPU errors
#[derive(Debug, Clone)]
pub enum RenderError {
    /// No suitable adapter was found
    NoAdapter(String),
    /// Device creation failed
    DeviceCreation(String),
    /// Shader compilation or pipeline linking failed
    ProgramInvalid(String),
    /// Reading a render target back to the CPU failed
    Readback(String),
    /// The driver dropped the device; every GPU handle must be recreated
    DeviceLost,
}

/// Frame source errors
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Image could not be opened or decoded
    ImageLoad(String),
    /// Requested source dimensions are unusable
    InvalidFormat(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Render(e) => write!(f, "Render error: {}", e),
            AppError::Source(e) => write!(f, "Source error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::MissingData => write!(f, "No pixel data"),
            FrameError::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions {}x{}", width, height)
            }
            FrameError::SizeMismatch { expected, actual } => {
                write!(f, "Expected {} elements, got {}", expected, actual)
            }
            FrameError::TooLarge { width, height, max } => {
                write!(f, "Frame {}x{} exceeds limit {}", width, height, max)
            }
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoAdapter(msg) => write!(f, "No GPU adapter: {}", msg),
            RenderError::DeviceCreation(msg) => write!(f, "Failed to create GPU device: {}", msg),
            RenderError::ProgramInvalid(msg) => write!(f, "Invalid shader program: {}", msg),
            RenderError::Readback(msg) => write!(f, "Readback failed: {}", msg),
            RenderError::DeviceLost => write!(f, "GPU device lost"),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ImageLoad(msg) => write!(f, "Failed to load image: {}", msg),
            SourceError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}
impl std::error::Error for RenderError {}
impl std::error::Error for SourceError {}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<image::ImageError> for SourceError {
    fn from(err: image::ImageError) -> Self {
        SourceError::ImageLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::InvalidDimensions {
            width: 0,
            height: 480,
        };
        assert_eq!(err.to_string(), "Invalid dimensions 0x480");

        let app: AppError = err.into();
        assert!(app.to_string().starts_with("Frame error:"));
    }

    #[test]
    fn test_too_large_display() {
        let err = FrameError::TooLarge {
            width: 9000,
            height: 10,
            max: 8192,
        };
        assert_eq!(err.to_string(), "Frame 9000x10 exceeds limit 8192");
    }
}
