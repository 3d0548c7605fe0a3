//! IndexedFaceSet triangulation and attribute binding.
//!
//! # Polygons
//!
//! `coordIndex` holds polygons as runs of coordinate indices terminated by
//! `-1`; the final run may omit the terminator. Each run of `N >= 3`
//! indices becomes a triangle fan `(v0, vi, vi+1)`. With `ccw FALSE` the
//! fan is emitted as `(v0, vi+1, vi)` so output is always counter-clockwise.
//! Shorter runs are dropped with [`Warning::DegeneratePolygon`] but still
//! count as a face for per-face binding.
//!
//! # Binding
//!
//! | `*PerVertex` | `*Index` present | value used by a corner                     |
//! |--------------|------------------|--------------------------------------------|
//! | TRUE         | yes              | `values[index[corner]]`                    |
//! | TRUE         | no               | `values[coordIndex[corner]]`               |
//! | FALSE        | yes              | `values[index[face]]`                      |
//! | FALSE        | no               | `values[face]`                             |
//!
//! Texture coordinates are always per vertex.
//!
//! When every attribute follows `coordIndex` and matches the coordinate
//! count, the coordinate array is used as the vertex array unchanged.
//! Otherwise each distinct (coord, normal, color, uv) combination becomes
//! one output vertex in first-use order.

use std::collections::HashMap;

use wrlpack_math::Vec3;

use super::types::{IndexedFaceSet, NodeArena};
use crate::mesh::{GeometryError, GeometryResult, Mesh};
use crate::warning::Warning;

/// One run of `coordIndex`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Polygon {
    /// Offset of the first corner in `coordIndex`
    pub start: usize,
    /// Number of corners
    pub len: usize,
    /// Face number used for per-face binding
    pub face: usize,
}

impl Polygon {
    /// Positions of this polygon's corners within `coordIndex`.
    pub fn corners(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Split `coordIndex` into polygons. Empty runs are not faces.
pub fn polygons(coord_index: &[i32]) -> Vec<Polygon> {
    let mut result = Vec::new();
    let mut start = 0;

    for (i, &index) in coord_index.iter().enumerate() {
        if index == -1 {
            if i > start {
                result.push(Polygon {
                    start,
                    len: i - start,
                    face: result.len(),
                });
            }
            start = i + 1;
        }
    }
    if coord_index.len() > start {
        result.push(Polygon {
            start,
            len: coord_index.len() - start,
            face: result.len(),
        });
    }

    result
}

/// Fan-triangulate an `n`-gon into corner offsets.
pub fn fan(n: usize, ccw: bool) -> impl Iterator<Item = [usize; 3]> {
    (1..n.saturating_sub(1)).map(move |i| if ccw { [0, i, i + 1] } else { [0, i + 1, i] })
}

/// How an attribute array is addressed.
#[derive(Clone, Copy, Debug)]
enum Binding<'a> {
    /// Per corner, through `coordIndex`
    CoordIndex,
    /// Per corner, through the attribute's own index list
    Corner(&'a [i32]),
    /// Per face, optionally through an index list
    Face(Option<&'a [i32]>),
}

impl<'a> Binding<'a> {
    fn new(per_vertex: bool, index: &'a [i32]) -> Self {
        match (per_vertex, index.is_empty()) {
            (true, true) => Binding::CoordIndex,
            (true, false) => Binding::Corner(index),
            (false, true) => Binding::Face(None),
            (false, false) => Binding::Face(Some(index)),
        }
    }
}

/// One attribute source with its binding.
struct Attribute<'a, T> {
    name: &'static str,
    index_name: &'static str,
    values: &'a [T],
    binding: Binding<'a>,
}

impl<'a, T: Copy> Attribute<'a, T> {
    fn new(
        name: &'static str,
        index_name: &'static str,
        values: Option<&'a [T]>,
        binding: Binding<'a>,
    ) -> Option<Self> {
        values.map(|values| Self {
            name,
            index_name,
            values,
            binding,
        })
    }

    /// True when the attribute can share the coordinate array's indexing.
    fn follows_coords(&self, coord_count: usize) -> bool {
        matches!(self.binding, Binding::CoordIndex) && self.values.len() == coord_count
    }

    /// Resolve the value index for one corner.
    fn resolve(&self, mesh: &str, coord_index: &[i32], corner: usize, face: usize) -> GeometryResult<usize> {
        let raw = match self.binding {
            Binding::CoordIndex => coord_index[corner] as i64,
            Binding::Corner(list) => lookup(mesh, self.index_name, list, corner)?,
            Binding::Face(Some(list)) => lookup(mesh, self.index_name, list, face)?,
            Binding::Face(None) => face as i64,
        };
        check_index(mesh, self.name, raw, self.values.len())
    }
}

fn lookup(mesh: &str, index_name: &'static str, list: &[i32], position: usize) -> GeometryResult<i64> {
    list.get(position)
        .map(|&i| i as i64)
        .ok_or_else(|| GeometryError::IndexOutOfRange {
            mesh: mesh.to_string(),
            attribute: index_name,
            index: position as i64,
            len: list.len(),
        })
}

fn check_index(mesh: &str, attribute: &'static str, index: i64, len: usize) -> GeometryResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| GeometryError::IndexOutOfRange {
            mesh: mesh.to_string(),
            attribute,
            index,
            len,
        })
}

/// Source indices of one output vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CornerKey {
    coord: usize,
    normal: Option<usize>,
    color: Option<usize>,
    uv: Option<usize>,
}

/// Vertex arrays under construction.
struct VertexBuffers<'a> {
    coords: &'a [Vec3],
    normals: Option<Attribute<'a, Vec3>>,
    colors: Option<Attribute<'a, Vec3>>,
    uvs: Option<Attribute<'a, [f32; 2]>>,
    direct: bool,
    lookup: HashMap<CornerKey, u32>,
    out_positions: Vec<Vec3>,
    out_normals: Vec<Vec3>,
    out_colors: Vec<Vec3>,
    out_uvs: Vec<[f32; 2]>,
}

impl<'a> VertexBuffers<'a> {
    fn vertex(&mut self, key: CornerKey) -> u32 {
        if self.direct {
            return key.coord as u32;
        }
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }

        let id = self.out_positions.len() as u32;
        self.out_positions.push(self.coords[key.coord]);
        if let (Some(attr), Some(i)) = (&self.normals, key.normal) {
            self.out_normals.push(attr.values[i]);
        }
        if let (Some(attr), Some(i)) = (&self.colors, key.color) {
            self.out_colors.push(attr.values[i]);
        }
        if let (Some(attr), Some(i)) = (&self.uvs, key.uv) {
            self.out_uvs.push(attr.values[i]);
        }
        self.lookup.insert(key, id);
        id
    }

    fn finish(self, name: &str, indices: Vec<u32>) -> Mesh {
        if self.direct {
            let mut mesh = Mesh::new(name, self.coords.to_vec(), indices);
            mesh.normals = self.normals.map(|a| a.values.to_vec());
            mesh.colors = self.colors.map(|a| a.values.to_vec());
            mesh.uvs = self.uvs.map(|a| a.values.to_vec());
            mesh
        } else {
            let mut mesh = Mesh::new(name, self.out_positions, indices);
            mesh.normals = self.normals.map(|_| self.out_normals);
            mesh.colors = self.colors.map(|_| self.out_colors);
            mesh.uvs = self.uvs.map(|_| self.out_uvs);
            mesh
        }
    }
}

/// Triangulate an IndexedFaceSet into a validated [`Mesh`].
///
/// Degenerate polygons are reported through `warnings`; bad indices fail.
pub fn build_mesh(
    name: &str,
    ifs: &IndexedFaceSet,
    arena: &NodeArena,
    warnings: &mut Vec<Warning>,
) -> GeometryResult<Mesh> {
    let coords = arena.points(ifs.coord).unwrap_or(&[]);
    let coord_index = ifs.coord_index.as_slice();

    let normals = Attribute::new(
        "normal",
        "normalIndex",
        arena.normals(ifs.normal),
        Binding::new(ifs.normal_per_vertex, &ifs.normal_index),
    );
    let colors = Attribute::new(
        "color",
        "colorIndex",
        arena.colors(ifs.color),
        Binding::new(ifs.color_per_vertex, &ifs.color_index),
    );
    let uvs = Attribute::new(
        "texCoord",
        "texCoordIndex",
        arena.tex_coords(ifs.tex_coord),
        Binding::new(true, &ifs.tex_coord_index),
    );

    let direct = normals.as_ref().map_or(true, |a| a.follows_coords(coords.len()))
        && colors.as_ref().map_or(true, |a| a.follows_coords(coords.len()))
        && uvs.as_ref().map_or(true, |a| a.follows_coords(coords.len()));

    let mut buffers = VertexBuffers {
        coords,
        normals,
        colors,
        uvs,
        direct,
        lookup: HashMap::new(),
        out_positions: Vec::new(),
        out_normals: Vec::new(),
        out_colors: Vec::new(),
        out_uvs: Vec::new(),
    };

    let mut indices = Vec::new();
    let mut corner_vertices = Vec::new();

    for polygon in polygons(coord_index) {
        if polygon.len < 3 {
            log::warn!(
                "Mesh '{}': dropping face {} with {} vertices",
                name,
                polygon.face,
                polygon.len
            );
            warnings.push(Warning::DegeneratePolygon {
                mesh: name.to_string(),
                face: polygon.face,
                vertex_count: polygon.len,
            });
            continue;
        }

        corner_vertices.clear();
        for corner in polygon.corners() {
            let key = CornerKey {
                coord: check_index(name, "coord", coord_index[corner] as i64, coords.len())?,
                normal: resolve(&buffers.normals, name, coord_index, corner, polygon.face)?,
                color: resolve(&buffers.colors, name, coord_index, corner, polygon.face)?,
                uv: resolve(&buffers.uvs, name, coord_index, corner, polygon.face)?,
            };
            corner_vertices.push(buffers.vertex(key));
        }

        for tri in fan(polygon.len, ifs.ccw) {
            indices.extend(tri.iter().map(|&c| corner_vertices[c]));
        }
    }

    let mesh = buffers.finish(name, indices);
    mesh.validate()?;

    log::debug!(
        "Mesh '{}': {} vertices, {} triangles{}",
        name,
        mesh.vertex_count(),
        mesh.triangle_count(),
        if direct { "" } else { " (unwelded)" }
    );

    Ok(mesh)
}

fn resolve<T: Copy>(
    attribute: &Option<Attribute<'_, T>>,
    mesh: &str,
    coord_index: &[i32],
    corner: usize,
    face: usize,
) -> GeometryResult<Option<usize>> {
    attribute
        .as_ref()
        .map(|a| a.resolve(mesh, coord_index, corner, face))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vrml::lexer::SourcePos;
    use crate::vrml::types::{NodeId, NodeKind, SceneNode};

    fn node(arena: &mut NodeArena, kind: NodeKind) -> Option<NodeId> {
        Some(arena.push(SceneNode {
            name: None,
            pos: SourcePos::default(),
            kind,
        }))
    }

    fn unit_square(arena: &mut NodeArena) -> IndexedFaceSet {
        let coord = node(
            arena,
            NodeKind::Coordinate(vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ]),
        );
        IndexedFaceSet {
            coord,
            ..Default::default()
        }
    }

    #[test]
    fn test_polygon_split() {
        let runs = polygons(&[0, 1, 2, -1, -1, 3, 4, -1, 5, 6, 7]);
        assert_eq!(
            runs,
            vec![
                Polygon { start: 0, len: 3, face: 0 },
                Polygon { start: 5, len: 2, face: 1 },
                Polygon { start: 8, len: 3, face: 2 },
            ]
        );
        assert!(polygons(&[]).is_empty());
    }

    #[test]
    fn test_fan_triangulation() {
        assert_eq!(fan(4, true).collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(fan(4, false).collect::<Vec<_>>(), vec![[0, 2, 1], [0, 3, 2]]);
        assert_eq!(fan(2, true).count(), 0);
    }

    #[test]
    fn test_quad_triangulation() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.coord_index = vec![0, 1, 2, 3, -1];

        let mut warnings = Vec::new();
        let mesh = build_mesh("quad", &ifs, &arena, &mut warnings).unwrap();

        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unterminated_last_polygon() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.coord_index = vec![0, 1, 2, -1, 0, 2, 3];

        let mesh = build_mesh("quad", &ifs, &arena, &mut Vec::new()).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_degenerate_face_warns() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.coord_index = vec![0, 1, -1];

        let mut warnings = Vec::new();
        let mesh = build_mesh("thin", &ifs, &arena, &mut warnings).unwrap();

        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(
            warnings,
            vec![Warning::DegeneratePolygon {
                mesh: "thin".to_string(),
                face: 0,
                vertex_count: 2,
            }]
        );
    }

    #[test]
    fn test_clockwise_faces_are_flipped() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.coord_index = vec![0, 1, 2, -1];
        ifs.ccw = false;

        let mesh = build_mesh("cw", &ifs, &arena, &mut Vec::new()).unwrap();
        assert_eq!(mesh.indices, vec![0, 2, 1]);
    }

    #[test]
    fn test_per_face_color_replicated() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        let blue = Vec3::new(0.0, 0.0, 1.0);

        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.color = node(&mut arena, NodeKind::Color(vec![red, blue]));
        ifs.color_per_vertex = false;
        ifs.coord_index = vec![0, 1, 2, -1, 0, 2, 3, -1];

        let mesh = build_mesh("faces", &ifs, &arena, &mut Vec::new()).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(
            mesh.colors.as_ref().unwrap(),
            &vec![red, red, red, blue, blue, blue]
        );
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_per_face_binding_counts_degenerate_faces() {
        let colors = vec![Vec3::X, Vec3::Y, Vec3::Z];

        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.color = node(&mut arena, NodeKind::Color(colors));
        ifs.color_per_vertex = false;
        ifs.color_index = vec![2, 1];
        ifs.coord_index = vec![0, 1, -1, 0, 1, 2, -1];

        let mut warnings = Vec::new();
        let mesh = build_mesh("faces", &ifs, &arena, &mut warnings).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(mesh.colors.as_ref().unwrap(), &vec![Vec3::Y; 3]);
    }

    #[test]
    fn test_normal_index_unwelds() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.normal = node(&mut arena, NodeKind::Normal(vec![Vec3::Z, -Vec3::Z]));
        ifs.normal_index = vec![0, 0, 0, -1, 1, 1, 1, -1];
        ifs.coord_index = vec![0, 1, 2, -1, 0, 2, 1, -1];

        let mesh = build_mesh("two_sided", &ifs, &arena, &mut Vec::new()).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals[0], Vec3::Z);
        assert_eq!(normals[3], -Vec3::Z);
        assert_eq!(mesh.positions[4], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_per_vertex_attributes_keep_coords() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.tex_coord = node(
            &mut arena,
            NodeKind::TextureCoordinate(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        );
        ifs.coord_index = vec![0, 1, 2, 3, -1];

        let mesh = build_mesh("uv", &ifs, &arena, &mut Vec::new()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.uvs.as_ref().unwrap()[2], [1.0, 1.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_shared_corners_are_welded() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.tex_coord = node(&mut arena, NodeKind::TextureCoordinate(vec![[0.0, 0.0], [1.0, 1.0]]));
        ifs.tex_coord_index = vec![0, 0, 1, -1, 0, 1, 1, -1];
        ifs.coord_index = vec![0, 1, 2, -1, 0, 2, 3, -1];

        let mesh = build_mesh("uv", &ifs, &arena, &mut Vec::new()).unwrap();

        // (0,uv0) and (2,uv1) are reused by the second face
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_out_of_range_indices_fail() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.coord_index = vec![0, 1, 4, -1];
        assert_eq!(
            build_mesh("bad", &ifs, &arena, &mut Vec::new()).unwrap_err(),
            GeometryError::IndexOutOfRange {
                mesh: "bad".to_string(),
                attribute: "coord",
                index: 4,
                len: 4,
            }
        );

        ifs.coord_index = vec![0, -2, 1, -1];
        assert!(matches!(
            build_mesh("bad", &ifs, &arena, &mut Vec::new()),
            Err(GeometryError::IndexOutOfRange { index: -2, .. })
        ));
    }

    #[test]
    fn test_short_attribute_index_fails() {
        let mut arena = NodeArena::new();
        let mut ifs = unit_square(&mut arena);
        ifs.color = node(&mut arena, NodeKind::Color(vec![Vec3::ONE]));
        ifs.color_index = vec![0, 0];
        ifs.coord_index = vec![0, 1, 2, -1];

        assert!(matches!(
            build_mesh("bad", &ifs, &arena, &mut Vec::new()),
            Err(GeometryError::IndexOutOfRange {
                attribute: "colorIndex",
                index: 2,
                len: 2,
                ..
            })
        ));
    }
}
