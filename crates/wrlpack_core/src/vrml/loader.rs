//! High-level VRML scene loading.
//!
//! Walks the parsed node graph depth-first, composing Transforms on a
//! [`TransformStack`], and flattens every Shape visit into a
//! [`MeshInstance`] of the resulting [`Scene`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use wrlpack_math::{Mat4, TransformStack};

use crate::mesh::{GeometryError, Mesh};
use crate::options::{ConvertOptions, FlattenMode};
use crate::scene::{Material, MeshInstance, Scene};
use crate::vrml::faces::build_mesh;
use crate::vrml::parser::{parse_vrml, ParseError, ParsedScene};
use crate::vrml::types::{AppearanceNode, IndexedFaceSet, NodeArena, NodeId, NodeKind, ShapeNode};
use crate::warning::Warning;

/// Errors that can occur during VRML loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a VRML file and return a flattened Scene.
///
/// # Example
///
/// ```ignore
/// use wrlpack_core::{load_vrml, ConvertOptions};
///
/// let scene = load_vrml("scene.wrl", &ConvertOptions::default())?;
/// println!("Loaded {} instances", scene.instance_count());
/// ```
pub fn load_vrml<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> LoadResult<Scene> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    load_vrml_from_string(&content, name, options)
}

/// Load VRML from a string (useful for testing).
pub fn load_vrml_from_string(content: &str, name: &str, options: &ConvertOptions) -> LoadResult<Scene> {
    let parsed = parse_vrml(content)?;
    flatten_scene(parsed, name, options)
}

/// Flatten an already parsed node graph.
pub fn flatten_scene(parsed: ParsedScene, name: &str, options: &ConvertOptions) -> LoadResult<Scene> {
    let ParsedScene {
        arena,
        root,
        warnings,
    } = parsed;

    let mut builder = SceneBuilder::new(name, &arena, options);
    builder.scene.warnings = warnings;
    builder.visit(root)?;
    Ok(builder.finish())
}

/// Internal builder for constructing a Scene from parsed nodes.
struct SceneBuilder<'a> {
    scene: Scene,
    arena: &'a NodeArena,
    options: &'a ConvertOptions,
    stack: TransformStack,
    /// Object-space mesh per geometry node
    object_meshes: HashMap<NodeId, Arc<Mesh>>,
    /// Scene mesh id per geometry node (instanced mode)
    mesh_ids: HashMap<NodeId, usize>,
    shape_count: usize,
}

impl<'a> SceneBuilder<'a> {
    fn new(name: &str, arena: &'a NodeArena, options: &'a ConvertOptions) -> Self {
        Self {
            scene: Scene::new(name),
            arena,
            options,
            stack: TransformStack::new(),
            object_meshes: HashMap::new(),
            mesh_ids: HashMap::new(),
            shape_count: 0,
        }
    }

    fn visit(&mut self, id: NodeId) -> LoadResult<()> {
        let arena = self.arena;
        let Some(node) = arena.get(id) else {
            return Ok(());
        };

        match &node.kind {
            NodeKind::Group(group) => {
                for &child in &group.children {
                    self.visit(child)?;
                }
            }
            NodeKind::Transform(transform) => {
                self.stack.push(transform.local_matrix());
                for &child in &transform.children {
                    self.visit(child)?;
                }
                self.stack.pop();
            }
            NodeKind::Shape(shape) => self.visit_shape(id, shape)?,
            _ => {}
        }
        Ok(())
    }

    fn visit_shape(&mut self, id: NodeId, shape: &ShapeNode) -> LoadResult<()> {
        let arena = self.arena;
        let shape_name = match arena.name(id) {
            Some(name) => name.to_string(),
            None => format!("shape_{}", self.shape_count),
        };
        self.shape_count += 1;

        let geometry = shape
            .geometry
            .and_then(|geometry_id| arena.get(geometry_id).map(|node| (geometry_id, node)));
        let Some((geometry_id, geometry)) = geometry else {
            self.warn(Warning::MissingGeometry { shape: shape_name });
            return Ok(());
        };

        let NodeKind::IndexedFaceSet(ifs) = &geometry.kind else {
            self.warn(Warning::UnsupportedGeometry {
                shape: shape_name,
                type_name: geometry.kind.type_name().to_string(),
            });
            return Ok(());
        };

        let mesh_id = self.mesh_for(geometry_id, ifs)?;
        let material_id = self.material_for(shape.appearance);
        let transform = match self.options.flatten {
            FlattenMode::Instanced => self.stack.top(),
            FlattenMode::WorldSpace => Mat4::IDENTITY,
        };

        self.scene.add_instance(MeshInstance {
            name: shape_name,
            transform,
            mesh_id,
            material_id,
        });
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.scene.warnings.push(warning);
    }

    /// Scene mesh for a geometry node, built once per node in instanced
    /// mode and baked per visit in world-space mode.
    fn mesh_for(&mut self, geometry_id: NodeId, ifs: &IndexedFaceSet) -> LoadResult<usize> {
        match self.options.flatten {
            FlattenMode::Instanced => {
                if let Some(&id) = self.mesh_ids.get(&geometry_id) {
                    return Ok(id);
                }
                let mesh = self.object_mesh(geometry_id, ifs)?;
                let id = self.scene.add_mesh(mesh);
                self.mesh_ids.insert(geometry_id, id);
                Ok(id)
            }
            FlattenMode::WorldSpace => {
                let mesh = self.object_mesh(geometry_id, ifs)?;
                let baked = mesh.transformed(&self.stack.top());
                Ok(self.scene.add_mesh(Arc::new(baked)))
            }
        }
    }

    fn object_mesh(&mut self, geometry_id: NodeId, ifs: &IndexedFaceSet) -> LoadResult<Arc<Mesh>> {
        if let Some(mesh) = self.object_meshes.get(&geometry_id) {
            return Ok(Arc::clone(mesh));
        }

        let name = match self.arena.name(geometry_id) {
            Some(name) => name.to_string(),
            None => format!("mesh_{}", self.object_meshes.len()),
        };
        let mut mesh = build_mesh(&name, ifs, self.arena, &mut self.scene.warnings)?;
        if self.options.generate_normals {
            mesh.ensure_normals();
        }

        let mesh = Arc::new(mesh);
        self.object_meshes.insert(geometry_id, Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Resolve a Shape's appearance to a deduplicated scene material.
    fn material_for(&mut self, appearance: Option<NodeId>) -> usize {
        let arena = self.arena;
        let appearance: Option<&AppearanceNode> =
            appearance.and_then(|id| match &arena.get(id)?.kind {
                NodeKind::Appearance(appearance) => Some(appearance),
                _ => None,
            });

        let texture = appearance
            .and_then(|a| a.texture)
            .and_then(|id| match &arena.get(id)?.kind {
                NodeKind::ImageTexture(texture) => texture.url.first().cloned(),
                _ => None,
            });

        let material_id = appearance.and_then(|a| a.material);
        let name = match material_id.and_then(|id| arena.name(id)) {
            Some(name) => name.to_string(),
            None => format!("material_{}", self.scene.material_count()),
        };

        let material = match material_id.and_then(|id| arena.get(id)).map(|n| &n.kind) {
            Some(NodeKind::Material(m)) => Material {
                name,
                diffuse_color: m.diffuse_color,
                specular_color: m.specular_color,
                emissive_color: m.emissive_color,
                ambient_intensity: m.ambient_intensity,
                shininess: m.shininess,
                transparency: m.transparency,
                texture,
            },
            _ => Material {
                name,
                texture,
                ..Default::default()
            },
        };

        self.scene.add_material(material)
    }

    fn finish(self) -> Scene {
        log::info!(
            "Scene '{}': {} meshes, {} materials, {} instances, {} warnings",
            self.scene.name,
            self.scene.mesh_count(),
            self.scene.material_count(),
            self.scene.instance_count(),
            self.scene.warnings.len()
        );
        self.scene
    }
}
