//! Affine matrix to TRS conversion

use glam::{DMat4, DQuat, DVec3, DVec4};

use crate::error::{ExportError, Result};

/// Linear parts with |det| below this are treated as singular
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Tolerance on the bottom row of an affine matrix
const AFFINE_EPSILON: f64 = 1e-9;

/// Decomposed transform: rotation is always a unit quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub translation: DVec3,
    pub rotation: DQuat,
    /// Per-axis scale; a mirrored transform has a negative component
    pub scale: DVec3,
}

impl Trs {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Recompose as `T * R * S`
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn translation_f32(&self) -> [f32; 3] {
        self.translation.as_vec3().to_array()
    }

    /// Rotation as `[x, y, z, w]`
    pub fn rotation_f32(&self) -> [f32; 4] {
        self.rotation.as_quat().to_array()
    }

    pub fn scale_f32(&self) -> [f32; 3] {
        self.scale.as_vec3().to_array()
    }
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Decompose a parent-relative affine matrix into TRS
///
/// `scale_factor` multiplies the translation only. `context` names the node
/// in the error when the matrix cannot be decomposed.
pub fn decompose(matrix: &DMat4, scale_factor: f64, context: &str) -> Result<Trs> {
    if !matrix.is_finite() {
        return Err(ExportError::decomposition(
            context,
            "matrix contains non-finite values",
        ));
    }

    if !matrix.row(3).abs_diff_eq(DVec4::W, AFFINE_EPSILON) {
        return Err(ExportError::decomposition(context, "matrix is not affine"));
    }

    let det = matrix.determinant();
    if det.abs() < SINGULAR_EPSILON {
        return Err(ExportError::decomposition(
            context,
            format!("matrix is singular (determinant {det:e})"),
        ));
    }

    // glam folds a negative determinant into the X scale, so mirrored
    // transforms keep their sign instead of being clamped.
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();

    Ok(Trs {
        translation: translation * scale_factor,
        rotation: rotation.normalize(),
        scale,
    })
}

/// Matrix of `world` expressed in the frame of `parent_world`
pub fn object_space_matrix(
    world: &DMat4,
    parent_world: Option<&DMat4>,
    context: &str,
) -> Result<DMat4> {
    let Some(parent_world) = parent_world else {
        return Ok(*world);
    };

    if !parent_world.is_finite() || parent_world.determinant().abs() < SINGULAR_EPSILON {
        return Err(ExportError::decomposition(
            context,
            "parent transform is singular",
        ));
    }

    Ok(parent_world.inverse() * *world)
}

/// Apply the unit scale to a matrix's translation column
pub fn scale_matrix_translation(matrix: &DMat4, scale_factor: f64) -> DMat4 {
    let mut scaled = *matrix;
    scaled.w_axis = (matrix.w_axis.truncate() * scale_factor).extend(matrix.w_axis.w);
    scaled
}
