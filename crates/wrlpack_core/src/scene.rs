//! Flattened scene model handed to the writer.
//!
//! A `Scene` owns deduplicated meshes and materials plus one instance per
//! Shape visit. It has no ties to the parsed node graph.

use std::sync::Arc;

use wrlpack_math::{Aabb, Mat4, Vec3};

use crate::mesh::Mesh;
use crate::warning::Warning;

/// A surface material using VRML97 Material semantics.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Material name (DEF name, or generated)
    pub name: String,

    /// Diffuse color (RGB, 0-1)
    pub diffuse_color: Vec3,

    /// Specular color (RGB, 0-1)
    pub specular_color: Vec3,

    /// Emissive color (RGB, for light-emitting surfaces)
    pub emissive_color: Vec3,

    /// Fraction of the diffuse color reflected as ambient light
    pub ambient_intensity: f32,

    /// Shininess (0-1, scaled by 128 for a Phong exponent)
    pub shininess: f32,

    /// Transparency (0=opaque, 1=clear)
    pub transparency: f32,

    /// ImageTexture url
    pub texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Vec3::splat(0.8),
            specular_color: Vec3::ZERO,
            emissive_color: Vec3::ZERO,
            ambient_intensity: 0.2,
            shininess: 0.2,
            transparency: 0.0,
            texture: None,
        }
    }
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }

    /// Compare every field except the name.
    pub fn same_values(&self, other: &Material) -> bool {
        self.diffuse_color == other.diffuse_color
            && self.specular_color == other.specular_color
            && self.emissive_color == other.emissive_color
            && self.ambient_intensity == other.ambient_intensity
            && self.shininess == other.shininess
            && self.transparency == other.transparency
            && self.texture == other.texture
    }

    pub fn opacity(&self) -> f32 {
        1.0 - self.transparency
    }
}

/// One placement of a mesh in the world.
#[derive(Clone, Debug)]
pub struct MeshInstance {
    /// Name of the Shape (DEF name, or generated)
    pub name: String,

    /// Object-to-world matrix (identity when positions are pre-baked)
    pub transform: Mat4,

    /// Index into `Scene::meshes`
    pub mesh_id: usize,

    /// Index into `Scene::materials`
    pub material_id: usize,
}

/// A complete converted scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    /// Unique meshes, referenced by instances
    pub meshes: Vec<Arc<Mesh>>,

    /// Unique materials, referenced by instances
    pub materials: Vec<Arc<Material>>,

    /// Instances in traversal order
    pub instances: Vec<MeshInstance>,

    /// Recoverable problems found during conversion
    pub warnings: Vec<Warning>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a mesh and return its ID.
    pub fn add_mesh(&mut self, mesh: Arc<Mesh>) -> usize {
        let id = self.meshes.len();
        self.meshes.push(mesh);
        id
    }

    /// Return the ID of a material with the same values, adding it if new.
    ///
    /// The first material added with given values keeps its name.
    pub fn add_material(&mut self, material: Material) -> usize {
        if let Some(id) = self.materials.iter().position(|m| m.same_values(&material)) {
            return id;
        }
        let id = self.materials.len();
        self.materials.push(Arc::new(material));
        id
    }

    pub fn add_instance(&mut self, instance: MeshInstance) {
        self.instances.push(instance);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Get total triangle count across all instances.
    pub fn total_triangle_count(&self) -> usize {
        self.instances
            .iter()
            .filter_map(|instance| self.meshes.get(instance.mesh_id))
            .map(|mesh| mesh.triangle_count())
            .sum()
    }

    /// Compute the world-space bounding box of all instances.
    pub fn world_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;

        for instance in &self.instances {
            let Some(mesh) = self.meshes.get(instance.mesh_id) else {
                continue;
            };
            if mesh.bounds.is_empty() {
                continue;
            }

            // Transform all 8 corners of the mesh bounds
            let (lo, hi) = (mesh.bounds.min(), mesh.bounds.max());
            for i in 0..8 {
                let corner = Vec3::new(
                    if i & 1 == 0 { lo.x } else { hi.x },
                    if i & 2 == 0 { lo.y } else { hi.y },
                    if i & 4 == 0 { lo.z } else { hi.z },
                );
                bounds = bounds.include(instance.transform.transform_point3(corner));
            }
        }

        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Arc<Mesh> {
        Arc::new(Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]))
    }

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test");
        let mesh_id = scene.add_mesh(triangle());
        let material_id = scene.add_material(Material::default());

        for x in [0.0, 1.0] {
            scene.add_instance(MeshInstance {
                name: "shape".to_string(),
                transform: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
                mesh_id,
                material_id,
            });
        }

        assert_eq!(scene.mesh_count(), 1);
        assert_eq!(scene.instance_count(), 2);
        assert_eq!(scene.total_triangle_count(), 2);
    }

    #[test]
    fn test_material_dedup_ignores_name() {
        let mut scene = Scene::new("test");
        let red = scene.add_material(Material::new("Red", Vec3::new(1.0, 0.0, 0.0)));
        let red_again = scene.add_material(Material::new("Other", Vec3::new(1.0, 0.0, 0.0)));
        let blue = scene.add_material(Material::new("Blue", Vec3::new(0.0, 0.0, 1.0)));

        assert_eq!(red, red_again);
        assert_ne!(red, blue);
        assert_eq!(scene.material_count(), 2);
        assert_eq!(scene.materials[red].name, "Red");
    }

    #[test]
    fn test_world_bounds() {
        let mut scene = Scene::new("test");
        let mesh_id = scene.add_mesh(triangle());
        scene.add_instance(MeshInstance {
            name: "a".to_string(),
            transform: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            mesh_id,
            material_id: 0,
        });

        let bounds = scene.world_bounds();
        assert!((bounds.min() - Vec3::new(10.0, 0.0, 0.0)).length() < 0.001);
        assert!((bounds.max() - Vec3::new(11.0, 1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_empty_scene_bounds() {
        assert!(Scene::new("empty").world_bounds().is_empty());
    }
}
