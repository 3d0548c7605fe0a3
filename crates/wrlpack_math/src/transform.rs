// Transform utilities for Mat4
//
// Extends glam::Mat4 with the normal transform used when baking meshes into
// world space, and provides the stack used while descending a scene graph.

use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Inverse transpose of the upper 3x3, used to transform normals.
    /// Falls back to the plain 3x3 when the matrix is singular.
    fn normal_matrix(&self) -> Mat3;

    /// Transform a surface normal and renormalize it.
    /// Zero-length results are returned unchanged (zero).
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Rows of the affine 3x4 part, row-major (rotation/scale | translation).
    fn affine_rows(&self) -> [[f32; 4]; 3];
}

impl Mat4Ext for Mat4 {
    fn normal_matrix(&self) -> Mat3 {
        let linear = Mat3::from_mat4(*self);
        if linear.determinant().abs() <= f32::EPSILON {
            linear
        } else {
            linear.inverse().transpose()
        }
    }

    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        (self.normal_matrix() * normal).normalize_or_zero()
    }

    fn affine_rows(&self) -> [[f32; 4]; 3] {
        let row = |i: usize| {
            let r = self.row(i);
            [r.x, r.y, r.z, r.w]
        };
        [row(0), row(1), row(2)]
    }
}

/// Accumulated world transforms while walking a node hierarchy.
///
/// The bottom of the stack is always the identity; `top()` is the
/// composition of every pushed local matrix, outermost first.
#[derive(Clone, Debug)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }

    /// Compose `local` onto the current top and push the result.
    pub fn push(&mut self, local: Mat4) {
        let world = self.top() * local;
        self.stack.push(world);
    }

    /// Pop the most recent push. The identity at the bottom is never removed.
    pub fn pop(&mut self) -> Option<Mat4> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Current accumulated transform.
    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }
}
