//! Byte layout of the binary payload.
//!
//! ```text
//! for each mesh, in scene order:
//!   positions  3 x f32 per vertex
//!   normals    3 x f32 per vertex     (if present)
//!   colors     3 x f32 per vertex     (if present)
//!   texcoords  2 x f32 per vertex     (if present)
//!   triangles  3 x u32 per triangle
//! ```
//!
//! Every value is 4 bytes little-endian, so arrays stay 4-byte aligned
//! and follow each other with no padding. The spans tile the file.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use wrlpack_math::Vec3;

use crate::mesh::Mesh;
use crate::scene::Scene;

/// Location of one array in the binary file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpan {
    /// Byte offset from the start of the file
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Number of elements (vertices or triangles)
    pub count: u64,
}

impl BufferSpan {
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Spans of one mesh's arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshLayout {
    pub positions: BufferSpan,
    pub normals: Option<BufferSpan>,
    pub colors: Option<BufferSpan>,
    pub texcoords: Option<BufferSpan>,
    pub triangles: BufferSpan,
}

impl MeshLayout {
    /// Spans in file order.
    pub fn spans(&self) -> impl Iterator<Item = BufferSpan> + '_ {
        std::iter::once(self.positions)
            .chain(self.normals)
            .chain(self.colors)
            .chain(self.texcoords)
            .chain(std::iter::once(self.triangles))
    }
}

/// Layout of the whole binary file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryLayout {
    pub meshes: Vec<MeshLayout>,
    pub total_size: u64,
}

impl BinaryLayout {
    pub fn compute(scene: &Scene) -> Self {
        let mut cursor = 0u64;
        let mut span = |count: usize, element_size: u64| {
            let span = BufferSpan {
                offset: cursor,
                length: count as u64 * element_size,
                count: count as u64,
            };
            cursor = span.end();
            span
        };

        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| {
                let vertices = mesh.vertex_count();
                MeshLayout {
                    positions: span(vertices, 12),
                    normals: mesh.normals.as_ref().map(|_| span(vertices, 12)),
                    colors: mesh.colors.as_ref().map(|_| span(vertices, 12)),
                    texcoords: mesh.uvs.as_ref().map(|_| span(vertices, 8)),
                    triangles: span(mesh.triangle_count(), 12),
                }
            })
            .collect();

        Self {
            meshes,
            total_size: cursor,
        }
    }

    /// All spans in file order.
    pub fn spans(&self) -> impl Iterator<Item = BufferSpan> + '_ {
        self.meshes.iter().flat_map(MeshLayout::spans)
    }
}

/// Write the arrays of every mesh in layout order. Returns the byte count.
pub fn write_binary<W: Write>(scene: &Scene, writer: &mut W) -> io::Result<u64> {
    let mut written = 0u64;
    for mesh in &scene.meshes {
        written += write_mesh(mesh, writer)?;
    }
    Ok(written)
}

fn write_mesh<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<u64> {
    let mut written = write_f32(writer, vec3_floats(&mesh.positions))?;
    if let Some(normals) = &mesh.normals {
        written += write_f32(writer, vec3_floats(normals))?;
    }
    if let Some(colors) = &mesh.colors {
        written += write_f32(writer, vec3_floats(colors))?;
    }
    if let Some(uvs) = &mesh.uvs {
        written += write_f32(writer, bytemuck::cast_slice(uvs))?;
    }
    // Partial trailing triangles are never written
    let whole = mesh.triangle_count() * 3;
    written += write_u32(writer, &mesh.indices[..whole])?;
    Ok(written)
}

fn vec3_floats(values: &[Vec3]) -> &[f32] {
    bytemuck::cast_slice(values)
}

fn write_f32<W: Write>(writer: &mut W, values: &[f32]) -> io::Result<u64> {
    if cfg!(target_endian = "little") {
        writer.write_all(bytemuck::cast_slice(values))?;
    } else {
        for value in values {
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(values.len() as u64 * 4)
}

fn write_u32<W: Write>(writer: &mut W, values: &[u32]) -> io::Result<u64> {
    if cfg!(target_endian = "little") {
        writer.write_all(bytemuck::cast_slice(values))?;
    } else {
        for value in values {
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(values.len() as u64 * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn scene() -> Scene {
        let mut scene = Scene::new("layout");
        let tri = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2])
            .with_normals(vec![Vec3::Z; 3])
            .with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let quad = Mesh::new(
            "quad",
            vec![Vec3::ZERO, Vec3::X, Vec3::ONE, Vec3::Y],
            vec![0, 1, 2, 0, 2, 3],
        )
        .with_colors(vec![Vec3::ONE; 4]);
        scene.add_mesh(Arc::new(tri));
        scene.add_mesh(Arc::new(quad));
        scene
    }

    #[test]
    fn test_layout_offsets() {
        let layout = BinaryLayout::compute(&scene());

        let tri = &layout.meshes[0];
        assert_eq!(tri.positions, BufferSpan { offset: 0, length: 36, count: 3 });
        assert_eq!(tri.normals, Some(BufferSpan { offset: 36, length: 36, count: 3 }));
        assert_eq!(tri.colors, None);
        assert_eq!(tri.texcoords, Some(BufferSpan { offset: 72, length: 24, count: 3 }));
        assert_eq!(tri.triangles, BufferSpan { offset: 96, length: 12, count: 1 });

        let quad = &layout.meshes[1];
        assert_eq!(quad.positions.offset, 108);
        assert_eq!(quad.colors.map(|s| s.length), Some(48));
        assert_eq!(quad.triangles.count, 2);
        assert_eq!(layout.total_size, 108 + 48 + 48 + 24);
    }

    #[test]
    fn test_spans_tile_file() {
        let scene = scene();
        let layout = BinaryLayout::compute(&scene);

        let mut bytes = Vec::new();
        let written = write_binary(&scene, &mut bytes).unwrap();
        assert_eq!(written, layout.total_size);
        assert_eq!(bytes.len() as u64, layout.total_size);

        let mut expected_offset = 0;
        for span in layout.spans() {
            assert_eq!(span.offset, expected_offset);
            assert_eq!(span.offset % 4, 0);
            expected_offset = span.end();
        }
        assert_eq!(expected_offset, bytes.len() as u64);
    }

    #[test]
    fn test_values_are_little_endian() {
        let scene = scene();
        let layout = BinaryLayout::compute(&scene);
        let mut bytes = Vec::new();
        write_binary(&scene, &mut bytes).unwrap();

        // Second position of the triangle is (1, 0, 0)
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());

        let quad = &layout.meshes[1].triangles;
        let start = quad.offset as usize;
        let indices: Vec<u32> = bytes[start..start + quad.length as usize]
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new("empty");
        let layout = BinaryLayout::compute(&scene);
        assert_eq!(layout.total_size, 0);

        let mut bytes = Vec::new();
        assert_eq!(write_binary(&scene, &mut bytes).unwrap(), 0);
    }
}
