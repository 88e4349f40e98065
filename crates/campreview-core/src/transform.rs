//! Per-frame texture coordinate transform.

use glam::{Mat4, Vec4};

/// Matrix supplied by the surface each frame, mapping unit-square texture
/// coordinates into the producer's native layout (crop, rotation, mirroring).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform(pub Mat4);

impl CoordinateTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Builds a transform from 16 floats in column-major order, the layout
    /// surface platforms report.
    #[must_use]
    pub fn from_cols_array(values: &[f32; 16]) -> Self {
        Self(Mat4::from_cols_array(values))
    }

    /// Returns the matrix as 16 column-major floats.
    #[must_use]
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    /// Returns the underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0 == Mat4::IDENTITY
    }

    /// Transforms a single `(u, v)` coordinate as the point `(u, v, 0, 1)`.
    #[must_use]
    pub fn transform_point(&self, u: f32, v: f32) -> [f32; 2] {
        let out = self.0 * Vec4::new(u, v, 0.0, 1.0);
        [out.x, out.y]
    }

    /// Transforms interleaved `(u, v)` pairs. A trailing odd value is dropped.
    #[must_use]
    pub fn transform_tex_coords(&self, coords: &[f32]) -> Vec<f32> {
        coords
            .chunks_exact(2)
            .flat_map(|uv| self.transform_point(uv[0], uv[1]))
            .collect()
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Mat4> for CoordinateTransform {
    fn from(matrix: Mat4) -> Self {
        Self(matrix)
    }
}
