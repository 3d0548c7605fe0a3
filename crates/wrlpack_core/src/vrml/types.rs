//! Parsed scene-graph nodes.
//!
//! Every node lives in a [`NodeArena`] and is addressed by [`NodeId`].
//! Node-valued fields (children, geometry, coord, ...) store ids, so a
//! `USE` is just a second id pointing at the same node.

use wrlpack_math::{Mat4, Quat, Vec3, Vec4};

use super::lexer::SourcePos;

/// Index of a node in its [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A parsed node with its optional DEF name.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub pos: SourcePos,
    pub kind: NodeKind,
}

/// The closed set of node types the converter understands.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Group, Anchor, Billboard, Collision, Switch and the implicit root
    Group(GroupNode),

    Transform(TransformNode),

    Shape(ShapeNode),

    Appearance(AppearanceNode),

    Material(MaterialNode),

    ImageTexture(ImageTextureNode),

    IndexedFaceSet(IndexedFaceSet),

    Coordinate(Vec<Vec3>),

    Normal(Vec<Vec3>),

    Color(Vec<Vec3>),

    TextureCoordinate(Vec<[f32; 2]>),

    /// A node type outside the supported subset (lights, scripts, primitives)
    Unsupported(String),
}

impl NodeKind {
    /// The source type name, for messages.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Group(_) => "Group",
            NodeKind::Transform(_) => "Transform",
            NodeKind::Shape(_) => "Shape",
            NodeKind::Appearance(_) => "Appearance",
            NodeKind::Material(_) => "Material",
            NodeKind::ImageTexture(_) => "ImageTexture",
            NodeKind::IndexedFaceSet(_) => "IndexedFaceSet",
            NodeKind::Coordinate(_) => "Coordinate",
            NodeKind::Normal(_) => "Normal",
            NodeKind::Color(_) => "Color",
            NodeKind::TextureCoordinate(_) => "TextureCoordinate",
            NodeKind::Unsupported(name) => name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GroupNode {
    pub children: Vec<NodeId>,
}

/// A VRML Transform.
///
/// Rotations are axis-angle with the angle in radians, stored as
/// `(x, y, z, angle)`.
#[derive(Clone, Debug)]
pub struct TransformNode {
    pub translation: Vec3,
    pub rotation: Vec4,
    pub scale: Vec3,
    pub scale_orientation: Vec4,
    pub center: Vec3,
    pub children: Vec<NodeId>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec4::new(0.0, 0.0, 1.0, 0.0),
            scale: Vec3::ONE,
            scale_orientation: Vec4::new(0.0, 0.0, 1.0, 0.0),
            center: Vec3::ZERO,
            children: Vec::new(),
        }
    }
}

impl TransformNode {
    /// Local matrix: `T * C * R * SR * S * SR^-1 * C^-1`.
    pub fn local_matrix(&self) -> Mat4 {
        let scale_orientation = Mat4::from_quat(axis_angle_to_quat(self.scale_orientation));

        Mat4::from_translation(self.translation)
            * Mat4::from_translation(self.center)
            * Mat4::from_quat(axis_angle_to_quat(self.rotation))
            * scale_orientation
            * Mat4::from_scale(self.scale)
            * scale_orientation.inverse()
            * Mat4::from_translation(-self.center)
    }
}

/// Convert a VRML `(x, y, z, angle)` rotation into a quaternion.
/// A zero axis yields the identity.
pub fn axis_angle_to_quat(rotation: Vec4) -> Quat {
    let axis = rotation.truncate();
    if axis.length_squared() <= f32::EPSILON || rotation.w == 0.0 {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis.normalize(), rotation.w)
}

#[derive(Clone, Debug, Default)]
pub struct ShapeNode {
    pub appearance: Option<NodeId>,
    pub geometry: Option<NodeId>,
}

#[derive(Clone, Debug, Default)]
pub struct AppearanceNode {
    pub material: Option<NodeId>,
    pub texture: Option<NodeId>,
}

/// VRML Material fields, with the VRML97 defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialNode {
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub emissive_color: Vec3,
    pub ambient_intensity: f32,
    pub shininess: f32,
    pub transparency: f32,
}

impl Default for MaterialNode {
    fn default() -> Self {
        Self {
            diffuse_color: Vec3::splat(0.8),
            specular_color: Vec3::ZERO,
            emissive_color: Vec3::ZERO,
            ambient_intensity: 0.2,
            shininess: 0.2,
            transparency: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImageTextureNode {
    pub url: Vec<String>,
}

/// An indexed polygon mesh.
///
/// `coord_index` holds polygons as runs of vertex indices terminated by
/// `-1`. The optional index lists follow the binding rules described on
/// [`crate::vrml::faces`].
#[derive(Clone, Debug)]
pub struct IndexedFaceSet {
    pub coord: Option<NodeId>,
    pub normal: Option<NodeId>,
    pub color: Option<NodeId>,
    pub tex_coord: Option<NodeId>,
    pub coord_index: Vec<i32>,
    pub normal_index: Vec<i32>,
    pub color_index: Vec<i32>,
    pub tex_coord_index: Vec<i32>,
    pub normal_per_vertex: bool,
    pub color_per_vertex: bool,
    pub ccw: bool,
}

impl Default for IndexedFaceSet {
    fn default() -> Self {
        Self {
            coord: None,
            normal: None,
            color: None,
            tex_coord: None,
            coord_index: Vec::new(),
            normal_index: Vec::new(),
            color_index: Vec::new(),
            tex_coord_index: Vec::new(),
            normal_per_vertex: true,
            color_per_vertex: true,
            ccw: true,
        }
    }
}

/// Owner of every parsed node.
///
/// Nodes are appended only after their body is parsed, so a child id is
/// always smaller than its parent's and the graph cannot contain cycles.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SceneNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Name of a node, if it was DEF'd.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| n.name.as_deref())
    }

    /// Points of a Coordinate node.
    pub fn points(&self, id: Option<NodeId>) -> Option<&[Vec3]> {
        match &self.get(id?)?.kind {
            NodeKind::Coordinate(points) => Some(points),
            _ => None,
        }
    }

    /// Vectors of a Normal node.
    pub fn normals(&self, id: Option<NodeId>) -> Option<&[Vec3]> {
        match &self.get(id?)?.kind {
            NodeKind::Normal(vectors) => Some(vectors),
            _ => None,
        }
    }

    /// Colors of a Color node.
    pub fn colors(&self, id: Option<NodeId>) -> Option<&[Vec3]> {
        match &self.get(id?)?.kind {
            NodeKind::Color(colors) => Some(colors),
            _ => None,
        }
    }

    /// Points of a TextureCoordinate node.
    pub fn tex_coords(&self, id: Option<NodeId>) -> Option<&[[f32; 2]]> {
        match &self.get(id?)?.kind {
            NodeKind::TextureCoordinate(points) => Some(points),
            _ => None,
        }
    }
}
