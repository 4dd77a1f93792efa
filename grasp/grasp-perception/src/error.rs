//! Error types for perception operations.

use thiserror::Error;

/// Errors that can occur while building or fusing reconstruction volumes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PerceptionError {
    /// The volume side length must be positive.
    #[error("volume size must be positive, got {0}")]
    InvalidSize(f64),

    /// The voxel resolution must be at least one.
    #[error("volume resolution must be at least 1, got {0}")]
    InvalidResolution(usize),

    /// A depth buffer does not match its declared dimensions.
    #[error("depth buffer has {actual} values, expected {width}x{height}")]
    DepthSizeMismatch {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Actual number of depth values.
        actual: usize,
    },

    /// A depth image does not match the camera it is integrated with.
    #[error("depth image is {image_width}x{image_height}, camera is {camera_width}x{camera_height}")]
    CameraMismatch {
        /// Depth image width.
        image_width: u32,
        /// Depth image height.
        image_height: u32,
        /// Camera width.
        camera_width: u32,
        /// Camera height.
        camera_height: u32,
    },

    /// Camera intrinsics are unusable.
    #[error("invalid camera intrinsics: {0}")]
    InvalidIntrinsic(String),
}

impl PerceptionError {
    /// Creates an invalid intrinsics error.
    #[must_use]
    pub fn invalid_intrinsic(reason: impl Into<String>) -> Self {
        Self::InvalidIntrinsic(reason.into())
    }
}

/// Result type for perception operations.
pub type Result<T> = std::result::Result<T, PerceptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_depth_size_mismatch() {
        let err = PerceptionError::DepthSizeMismatch {
            width: 4,
            height: 3,
            actual: 11,
        };
        assert!(err.to_string().contains("11"));
        assert!(err.to_string().contains("4x3"));
    }

    #[test]
    fn error_invalid_intrinsic() {
        let err = PerceptionError::invalid_intrinsic("zero focal length");
        assert!(err.to_string().contains("zero focal length"));
    }
}
