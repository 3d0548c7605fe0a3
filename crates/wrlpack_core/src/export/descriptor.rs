//! Structural descriptor model.
//!
//! One serde model rendered either as JSON or as Embree-style XML
//! (see [`super::xml`]). It references the binary payload by file name and
//! [`BufferSpan`]s.

use serde::{Deserialize, Serialize};
use wrlpack_math::Mat4Ext;

use super::layout::{BinaryLayout, BufferSpan};
use crate::scene::{Material, Scene};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub name: String,
    /// Binary payload file name, relative to the descriptor
    pub binary: String,
    /// Expected binary size in bytes
    pub binary_size: u64,
    pub materials: Vec<MaterialDescriptor>,
    pub meshes: Vec<MeshDescriptor>,
    pub instances: Vec<InstanceDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    pub name: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub ambient_intensity: f32,
    pub shininess: f32,
    pub transparency: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl From<&Material> for MaterialDescriptor {
    fn from(material: &Material) -> Self {
        Self {
            name: material.name.clone(),
            diffuse: material.diffuse_color.to_array(),
            specular: material.specular_color.to_array(),
            emissive: material.emissive_color.to_array(),
            ambient_intensity: material.ambient_intensity,
            shininess: material.shininess,
            transparency: material.transparency,
            texture: material.texture.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    pub name: String,
    pub positions: BufferSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<BufferSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BufferSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texcoords: Option<BufferSpan>,
    pub triangles: BufferSpan,
    /// Object-space `[min, max]`; absent for a mesh without vertices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[[f32; 3]; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub name: String,
    pub mesh: usize,
    pub material: usize,
    /// Row-major 3x4 affine matrix
    pub transform: [[f32; 4]; 3],
}

impl SceneDescriptor {
    /// Describe `scene` with array locations taken from `layout`.
    pub fn build(scene: &Scene, layout: &BinaryLayout, binary: impl Into<String>) -> Self {
        let meshes = scene
            .meshes
            .iter()
            .zip(&layout.meshes)
            .map(|(mesh, spans)| MeshDescriptor {
                name: mesh.name.clone(),
                positions: spans.positions,
                normals: spans.normals,
                colors: spans.colors,
                texcoords: spans.texcoords,
                triangles: spans.triangles,
                bounds: (!mesh.bounds.is_empty())
                    .then(|| [mesh.bounds.min().to_array(), mesh.bounds.max().to_array()]),
            })
            .collect();

        let instances = scene
            .instances
            .iter()
            .map(|instance| InstanceDescriptor {
                name: instance.name.clone(),
                mesh: instance.mesh_id,
                material: instance.material_id,
                transform: instance.transform.affine_rows(),
            })
            .collect();

        Self {
            name: scene.name.clone(),
            binary: binary.into(),
            binary_size: layout.total_size,
            materials: scene.materials.iter().map(|m| MaterialDescriptor::from(m.as_ref())).collect(),
            meshes,
            instances,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
