//! Pinhole camera model and depth images.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{PerceptionError, Result};

/// Camera intrinsic parameters (pinhole model, no distortion).
///
/// Projects a camera-frame point `[X, Y, Z]` to pixel coordinates:
/// ```text
/// u = fx * X/Z + cx
/// v = fy * Y/Z + cy
/// ```
///
/// # Example
///
/// ```
/// use grasp_perception::CameraIntrinsic;
/// use nalgebra::Point3;
///
/// let camera = CameraIntrinsic::new(640, 480, 540.0, 540.0, 320.0, 240.0);
/// let (u, v) = camera.project(&Point3::new(0.0, 0.0, 1.0)).unwrap();
/// assert_eq!((u, v), (320.0, 240.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Focal length in pixels (x direction).
    pub fx: f64,
    /// Focal length in pixels (y direction).
    pub fy: f64,
    /// Principal point x-coordinate in pixels.
    pub cx: f64,
    /// Principal point y-coordinate in pixels.
    pub cy: f64,
}

impl CameraIntrinsic {
    /// Creates new camera intrinsics.
    #[must_use]
    pub const fn new(width: u32, height: u32, fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
        }
    }

    /// Checks that the image is non-empty and the focal lengths are positive.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptionError::InvalidIntrinsic`] describing the problem.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PerceptionError::invalid_intrinsic(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fx > 0.0 && self.fy > 0.0) {
            return Err(PerceptionError::invalid_intrinsic(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        Ok(())
    }

    /// Projects a camera-frame point to continuous pixel coordinates.
    ///
    /// Returns `None` for points at or behind the image plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<(f64, f64)> {
        if point.z <= 0.0 {
            return None;
        }
        Some((
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ))
    }

    /// Camera-frame ray through pixel `(u, v)`, scaled so that `z == 1`.
    ///
    /// Multiplying the ray by a depth value gives the observed point.
    #[must_use]
    pub fn ray(&self, u: f64, v: f64) -> Vector3<f64> {
        Vector3::new((u - self.cx) / self.fx, (v - self.cy) / self.fy, 1.0)
    }
}

/// A depth image in metres, stored row-major (`depths[v * width + u]`).
///
/// Non-positive or non-finite values mark pixels without a measurement.
///
/// # Example
///
/// ```
/// use grasp_perception::DepthImage;
///
/// let image = DepthImage::new(2, 2, vec![0.5, 0.0, f32::NAN, 0.7]).unwrap();
/// assert_eq!(image.get(0, 0), Some(0.5));
/// assert_eq!(image.get(1, 0), None); // no measurement
/// assert_eq!(image.valid_pixel_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    depths: Vec<f32>,
}

impl DepthImage {
    /// Creates a depth image, checking the buffer length.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptionError::DepthSizeMismatch`] if `depths.len()` is not
    /// `width * height`.
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Result<Self> {
        if depths.len() != width as usize * height as usize {
            return Err(PerceptionError::DepthSizeMismatch {
                width,
                height,
                actual: depths.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    /// Creates an image where no pixel has a measurement.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depths: vec![0.0; width as usize * height as usize],
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw depth buffer.
    #[must_use]
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Valid depth at pixel `(u, v)`.
    ///
    /// Returns `None` if the pixel is out of bounds or has no measurement.
    #[must_use]
    pub fn get(&self, u: u32, v: u32) -> Option<f32> {
        if u >= self.width || v >= self.height {
            return None;
        }
        let idx = v as usize * self.width as usize + u as usize;
        self.depths
            .get(idx)
            .copied()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Number of pixels carrying a measurement.
    #[must_use]
    pub fn valid_pixel_count(&self) -> usize {
        self.depths
            .iter()
            .filter(|d| d.is_finite() && **d > 0.0)
            .count()
    }
}
