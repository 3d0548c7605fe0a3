//! Conversion settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How the transform hierarchy is flattened into meshes and instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenMode {
    /// Object-space meshes shared between instances; instances carry the
    /// world matrix.
    #[default]
    Instanced,
    /// Positions and normals baked into world space, one mesh per Shape
    /// visit, identity instance matrices.
    WorldSpace,
}

/// Rendering of the structural descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorFormat {
    #[default]
    Xml,
    Json,
}

impl DescriptorFormat {
    /// `.json` selects JSON, anything else XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DescriptorFormat::Json,
            _ => DescriptorFormat::Xml,
        }
    }
}

/// Options for a single conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub flatten: FlattenMode,

    /// Fill in smooth normals for meshes that have none.
    pub generate_normals: bool,

    /// Descriptor format; `None` picks one from the descriptor path.
    pub descriptor_format: Option<DescriptorFormat>,
}

impl ConvertOptions {
    /// Format used when writing a descriptor to `path`.
    pub fn format_for(&self, path: &Path) -> DescriptorFormat {
        self.descriptor_format
            .unwrap_or_else(|| DescriptorFormat::from_path(path))
    }
}
