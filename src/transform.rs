use glam::{Mat3, Mat4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while deriving per-draw transforms.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TransformError {
    #[error("model-view matrix is singular (determinant {0}); no normal matrix exists")]
    Singular(f32),
}

/// Transform matrices supplied by the host for one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transforms {
    pub model_view: Mat4,
    pub mvp: Mat4,
    pub normal_matrix: Mat3,
}

impl Transforms {
    /// Derives `mvp` and the normal matrix from a model-view and a
    /// projection matrix.
    pub fn new(model_view: Mat4, projection: Mat4) -> Result<Self, TransformError> {
        Ok(Self {
            model_view,
            mvp: projection * model_view,
            normal_matrix: normal_matrix(model_view)?,
        })
    }

    /// Wraps matrices the host already computed.
    pub fn from_parts(model_view: Mat4, mvp: Mat4, normal_matrix: Mat3) -> Self {
        Self {
            model_view,
            mvp,
            normal_matrix,
        }
    }
}

impl Default for Transforms {
    fn default() -> Self {
        Self::from_parts(Mat4::IDENTITY, Mat4::IDENTITY, Mat3::IDENTITY)
    }
}

/// Inverse-transpose of the upper 3x3 of `model_view`.
///
/// Singularity is judged against the product of the column lengths, the
/// largest determinant columns of those lengths can have, so uniformly
/// scaled models of any size are accepted.
pub fn normal_matrix(model_view: Mat4) -> Result<Mat3, TransformError> {
    let upper = Mat3::from_mat4(model_view);
    let determinant = upper.determinant();
    let volume =
        upper.x_axis.length() * upper.y_axis.length() * upper.z_axis.length();
    if !determinant.is_finite() || determinant.abs() <= volume * f32::EPSILON {
        return Err(TransformError::Singular(determinant));
    }
    let normal = upper.inverse().transpose();
    if !normal.is_finite() {
        return Err(TransformError::Singular(determinant));
    }
    Ok(normal)
}
