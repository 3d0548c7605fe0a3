//! Math types for wrlpack.
//!
//! Re-exports `glam` and adds the few scene-conversion helpers the
//! pipeline needs: bounding boxes and the transform stack used while
//! flattening a scene graph.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use transform::{Mat4Ext, TransformStack};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }
}
