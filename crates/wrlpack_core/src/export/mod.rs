//! Structural descriptor + binary payload output.
//!
//! A [`Scene`] is written as two files: a binary payload holding every
//! numeric array (see [`layout`]) and a descriptor (XML or JSON) that
//! references those arrays by byte offset. After any error both files
//! must be treated as invalid.

pub mod descriptor;
pub mod layout;
pub mod xml;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::options::DescriptorFormat;
use crate::scene::Scene;

pub use descriptor::{InstanceDescriptor, MaterialDescriptor, MeshDescriptor, SceneDescriptor};
pub use layout::{write_binary, BinaryLayout, BufferSpan, MeshLayout};
pub use xml::{render_xml, write_xml};

/// Errors that can occur while writing output files.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary size mismatch: layout expects {expected} bytes, wrote {written}")]
    SizeMismatch { expected: u64, written: u64 },
}

/// Result type for writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Build the descriptor and binary payload in memory.
pub fn encode_scene(scene: &Scene, binary_name: &str) -> WriteResult<(SceneDescriptor, Vec<u8>)> {
    let layout = BinaryLayout::compute(scene);
    let mut bytes = Vec::with_capacity(layout.total_size as usize);
    let written = write_binary(scene, &mut bytes).map_err(io_error(Path::new(binary_name)))?;
    check_size(&layout, written)?;
    Ok((SceneDescriptor::build(scene, &layout, binary_name), bytes))
}

/// Write `scene` to a descriptor file and a binary file.
///
/// The descriptor refers to the binary by its file name.
pub fn write_scene(
    scene: &Scene,
    descriptor_path: &Path,
    binary_path: &Path,
    format: DescriptorFormat,
) -> WriteResult<SceneDescriptor> {
    let layout = BinaryLayout::compute(scene);

    let file = File::create(binary_path).map_err(io_error(binary_path))?;
    let mut writer = BufWriter::new(file);
    let written = write_binary(scene, &mut writer).map_err(io_error(binary_path))?;
    writer.flush().map_err(io_error(binary_path))?;
    drop(writer);
    check_size(&layout, written)?;

    let on_disk = std::fs::metadata(binary_path)
        .map_err(io_error(binary_path))?
        .len();
    check_size(&layout, on_disk)?;

    let binary_name = binary_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary_path.display().to_string());
    let descriptor = SceneDescriptor::build(scene, &layout, binary_name);

    let file = File::create(descriptor_path).map_err(io_error(descriptor_path))?;
    let mut writer = BufWriter::new(file);
    match format {
        DescriptorFormat::Xml => write_xml(&descriptor, &mut writer).map_err(io_error(descriptor_path))?,
        DescriptorFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &descriptor)?;
            writeln!(writer).map_err(io_error(descriptor_path))?;
        }
    }
    writer.flush().map_err(io_error(descriptor_path))?;

    log::info!(
        "Wrote {} ({} bytes) and {}",
        binary_path.display(),
        layout.total_size,
        descriptor_path.display()
    );

    Ok(descriptor)
}

fn check_size(layout: &BinaryLayout, written: u64) -> WriteResult<()> {
    if written != layout.total_size {
        return Err(WriteError::SizeMismatch {
            expected: layout.total_size,
            written,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;
    use crate::vrml::load_vrml_from_string;

    const WRL: &str = r#"#VRML V2.0 utf8
DEF Tri Shape {
    appearance Appearance { material Material { diffuseColor 0 1 0 } }
    geometry IndexedFaceSet {
        coord Coordinate { point [0 0 0, 1 0 0, 1 1 0, 0 1 0] }
        normal Normal { vector [0 0 1, 0 0 1, 0 0 1, 0 0 1] }
        coordIndex [0 1 2 3 -1]
    }
}
Transform { translation 2 0 0 children USE Tri }
"#;

    fn scene() -> Scene {
        load_vrml_from_string(WRL, "quad", &ConvertOptions::default()).unwrap()
    }

    #[test]
    fn test_encode_scene() {
        let (descriptor, bytes) = encode_scene(&scene(), "quad.bin").unwrap();

        assert_eq!(descriptor.meshes.len(), 1);
        assert_eq!(descriptor.instances.len(), 2);
        assert_eq!(descriptor.binary_size, bytes.len() as u64);

        let mesh = &descriptor.meshes[0];
        assert_eq!(mesh.normals.map(|s| s.offset), Some(48));
        assert_eq!(mesh.triangles.end(), bytes.len() as u64);
    }

    #[test]
    fn test_write_scene_xml() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("quad.xml");
        let bin_path = dir.path().join("quad.bin");

        let descriptor = write_scene(&scene(), &xml_path, &bin_path, DescriptorFormat::Xml).unwrap();

        let bin_len = std::fs::metadata(&bin_path).unwrap().len();
        assert_eq!(bin_len, descriptor.binary_size);

        let xml = std::fs::read_to_string(&xml_path).unwrap();
        assert!(xml.contains("binary=\"quad.bin\""));
        assert_eq!(xml.matches("<Instance ").count(), 2);
        assert!(xml.contains("<float3 name=\"Kd\">0 1 0</float3>"));
    }

    #[test]
    fn test_write_scene_json() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("quad.json");
        let bin_path = dir.path().join("quad.bin");

        let written = write_scene(&scene(), &json_path, &bin_path, DescriptorFormat::Json).unwrap();

        let json = std::fs::read_to_string(&json_path).unwrap();
        let parsed = SceneDescriptor::from_json(&json).unwrap();
        assert_eq!(parsed, written);

        let bytes = std::fs::read(&bin_path).unwrap();
        let last = parsed.meshes.last().unwrap().triangles;
        assert_eq!(last.end(), bytes.len() as u64);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");

        let err = write_scene(
            &scene(),
            &missing.join("out.xml"),
            &missing.join("out.bin"),
            DescriptorFormat::Xml,
        )
        .unwrap_err();

        match err {
            WriteError::Io { path, .. } => assert_eq!(path, missing.join("out.bin")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
