//! Oriented point clouds extracted from a reconstruction.

use nalgebra::{Point3, Vector3};

use crate::error::{GraspTypesError, Result};

/// Surface points with outward unit normals.
///
/// Points and normals are stored as parallel buffers of equal length.
///
/// # Example
///
/// ```
/// use grasp_types::PointCloud;
/// use nalgebra::{Point3, Vector3};
///
/// let mut cloud = PointCloud::new();
/// assert!(cloud.is_empty());
///
/// cloud.push(Point3::new(0.1, 0.1, 0.0), Vector3::z());
/// assert_eq!(cloud.len(), 1);
/// assert_eq!(cloud.get(0), Some((Point3::new(0.1, 0.1, 0.0), Vector3::z())));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            normals: Vec::new(),
        }
    }

    /// Creates a point cloud from parallel point and normal buffers.
    ///
    /// # Errors
    ///
    /// Returns [`GraspTypesError::MismatchedCloud`] if the buffers differ in
    /// length.
    pub fn from_parts(points: Vec<Point3<f64>>, normals: Vec<Vector3<f64>>) -> Result<Self> {
        if points.len() != normals.len() {
            return Err(GraspTypesError::MismatchedCloud {
                points: points.len(),
                normals: normals.len(),
            });
        }
        Ok(Self { points, normals })
    }

    /// Appends a point with its normal.
    pub fn push(&mut self, point: Point3<f64>, normal: Vector3<f64>) {
        self.points.push(point);
        self.normals.push(normal);
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point positions.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Outward normals, parallel to [`PointCloud::points`].
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// The point and normal at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(Point3<f64>, Vector3<f64>)> {
        Some((*self.points.get(index)?, *self.normals.get(index)?))
    }

    /// Iterates over `(point, normal)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f64>, &Vector3<f64>)> {
        self.points.iter().zip(&self.normals)
    }
}
