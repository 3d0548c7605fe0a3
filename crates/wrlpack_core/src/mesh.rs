//! Triangle mesh representation for the flattened scene.
//!
//! Meshes are built by the VRML normalizer and consumed by the binary
//! writer. Every attribute array is indexed by the same vertex index.

use thiserror::Error;
use wrlpack_math::{Aabb, Mat4, Mat4Ext, Vec3};

/// Index or attribute invariant violations found while building a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Mesh '{mesh}': {attribute} index {index} is out of range ({len} entries)")]
    IndexOutOfRange {
        mesh: String,
        attribute: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Mesh '{mesh}': {attribute} has {len} entries but the mesh has {expected} vertices")]
    AttributeLength {
        mesh: String,
        attribute: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("Mesh '{mesh}': triangle list has {len} indices, not a multiple of 3")]
    PartialTriangle { mesh: String, len: usize },

    #[error("Mesh '{mesh}' has {count} vertices, more than a u32 index can address")]
    TooManyVertices { mesh: String, count: usize },
}

/// Result type for mesh construction.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// A triangle mesh with optional per-vertex normals, colors and UVs.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Mesh name (DEF name of the geometry, or generated)
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals
    pub normals: Option<Vec<Vec3>>,

    /// Vertex colors (RGB, 0-1)
    pub colors: Option<Vec<Vec3>>,

    /// UV coordinates (one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a counter-clockwise triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box of `positions`
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from positions and triangle indices.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            name: name.into(),
            positions,
            normals: None,
            colors: None,
            uvs: None,
            indices,
            bounds,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Check the mesh invariants: whole triangles, every index below the
    /// vertex count and every attribute array one entry per vertex.
    pub fn validate(&self) -> GeometryResult<()> {
        let vertex_count = self.positions.len();

        if u32::try_from(vertex_count).is_err() {
            return Err(GeometryError::TooManyVertices {
                mesh: self.name.clone(),
                count: vertex_count,
            });
        }

        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle {
                mesh: self.name.clone(),
                len: self.indices.len(),
            });
        }

        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                mesh: self.name.clone(),
                attribute: "triangle",
                index: bad as i64,
                len: vertex_count,
            });
        }

        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("colors", self.colors.as_ref().map(Vec::len)),
            ("uvs", self.uvs.as_ref().map(Vec::len)),
        ];
        for (attribute, len) in lengths {
            if let Some(len) = len.filter(|&len| len != vertex_count) {
                return Err(GeometryError::AttributeLength {
                    mesh: self.name.clone(),
                    attribute,
                    len,
                    expected: vertex_count,
                });
            }
        }

        Ok(())
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals are left unnormalized before accumulation so larger
    /// faces weigh more. Replaces any existing normals.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let edge1 = self.positions[i1] - p0;
            let edge2 = self.positions[i2] - p0;
            let face_normal = edge1.cross(edge2); // CCW winding

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Compute normals only if the mesh has none.
    pub fn ensure_normals(&mut self) {
        if self.normals.is_none() {
            log::debug!("Computing smooth normals for mesh '{}'", self.name);
            self.compute_normals();
        }
    }

    /// Bake `matrix` into a copy of this mesh.
    ///
    /// Normals go through the inverse transpose. A mirroring matrix
    /// reverses triangle winding so the result stays counter-clockwise.
    pub fn transformed(&self, matrix: &Mat4) -> Mesh {
        let positions: Vec<Vec3> = self
            .positions
            .iter()
            .map(|&p| matrix.transform_point3(p))
            .collect();

        let normals = self.normals.as_ref().map(|normals| {
            normals
                .iter()
                .map(|&n| matrix.transform_normal3(n))
                .collect()
        });

        let mut indices = self.indices.clone();
        if matrix.determinant() < 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }

        let bounds = Aabb::from_point_cloud(&positions);
        Mesh {
            name: self.name.clone(),
            positions,
            normals,
            colors: self.colors.clone(),
            uvs: self.uvs.clone(),
            indices,
            bounds,
        }
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            "tri",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compute_normals_ccw() {
        let mut mesh = triangle();
        mesh.compute_normals();

        // Counter-clockwise in the XY plane faces +Z
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::new(
            "box",
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![0, 1, 2],
        );

        assert!((mesh.bounds.min() - Vec3::new(-1.0, -2.0, -3.0)).length() < 0.001);
        assert!((mesh.bounds.max() - Vec3::new(4.0, 5.0, 6.0)).length() < 0.001);
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 3];
        assert_eq!(
            mesh.validate(),
            Err(GeometryError::IndexOutOfRange {
                mesh: "tri".to_string(),
                attribute: "triangle",
                index: 3,
                len: 3,
            })
        );

        mesh.indices = vec![0, 1];
        assert!(matches!(
            mesh.validate(),
            Err(GeometryError::PartialTriangle { len: 2, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_short_attribute() {
        let mesh = triangle().with_colors(vec![Vec3::ONE; 2]);
        assert!(matches!(
            mesh.validate(),
            Err(GeometryError::AttributeLength {
                attribute: "colors",
                len: 2,
                expected: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_transformed_bakes_positions() {
        let mut mesh = triangle();
        mesh.compute_normals();

        let matrix = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        let baked = mesh.transformed(&matrix);

        assert!((baked.positions[1] - Vec3::new(7.0, 0.0, 0.0)).length() < 0.001);
        assert!((baked.normals.as_ref().unwrap()[0] - Vec3::Z).length() < 0.001);
        assert_eq!(baked.indices, vec![0, 1, 2]);
        assert!((baked.bounds.max() - Vec3::new(7.0, 2.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_mirror_flips_winding() {
        let mut mesh = triangle();
        mesh.compute_normals();

        let baked = mesh.transformed(&Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));
        assert_eq!(baked.indices, vec![0, 2, 1]);

        // Winding and normal still agree after the flip
        let mut recomputed = baked.clone();
        recomputed.compute_normals();
        let n = baked.normals.as_ref().unwrap()[0];
        let r = recomputed.normals.as_ref().unwrap()[0];
        assert!((n - r).length() < 0.001);
    }
}
