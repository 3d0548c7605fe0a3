//! wrlpack core - VRML97 to descriptor + binary scene conversion.
//!
//! This crate provides:
//!
//! - **VRML support**: tokenizing, parsing (with `DEF`/`USE`) and flattening
//!   of the static-geometry subset
//! - **Scene model**: `Scene`, `Mesh`, `Material`, `MeshInstance`
//! - **Export**: binary payload layout plus an XML or JSON descriptor
//! - **Conversion**: single-file and parallel batch conversion
//!
//! # Example
//!
//! ```ignore
//! use wrlpack_core::{convert_file, ConvertOptions};
//!
//! let report = convert_file(
//!     "scene.wrl".as_ref(),
//!     "scene.xml".as_ref(),
//!     "scene.bin".as_ref(),
//!     &ConvertOptions::default(),
//! )?;
//! println!("Wrote {} meshes, {} instances", report.meshes, report.instances);
//! ```

pub mod convert;
pub mod export;
pub mod mesh;
pub mod options;
pub mod scene;
pub mod vrml;
pub mod warning;

// Re-export commonly used types
pub use convert::{convert_batch, convert_file, ConversionJob, ConversionReport, ConvertError};
pub use export::{encode_scene, write_scene, SceneDescriptor, WriteError};
pub use mesh::{GeometryError, Mesh};
pub use options::{ConvertOptions, DescriptorFormat, FlattenMode};
pub use scene::{Material, MeshInstance, Scene};
pub use vrml::{load_vrml, load_vrml_from_string, LoadError, ParseError};
pub use warning::Warning;
