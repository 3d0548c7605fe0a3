//! Recoverable conversion problems.
//!
//! None of these abort a conversion. They are collected on the scene and
//! logged as they are found so a caller can decide what to do with them.

use std::fmt;

use crate::vrml::SourcePos;

#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    /// A node type outside the static-geometry subset; its body was skipped.
    UnsupportedNode { type_name: String, pos: SourcePos },

    /// A second `DEF` reused an existing name; later `USE`s see the new node.
    DefRedefined { name: String, pos: SourcePos },

    /// A polygon with fewer than three vertices was dropped.
    DegeneratePolygon {
        mesh: String,
        face: usize,
        vertex_count: usize,
    },

    /// A Shape without a geometry node produced no instance.
    MissingGeometry { shape: String },

    /// A Shape whose geometry is not an IndexedFaceSet produced no instance.
    UnsupportedGeometry { shape: String, type_name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedNode { type_name, pos } => {
                write!(f, "Skipped unsupported node '{}' at {}", type_name, pos)
            }
            Warning::DefRedefined { name, pos } => {
                write!(f, "DEF '{}' at {} replaces an earlier definition", name, pos)
            }
            Warning::DegeneratePolygon {
                mesh,
                face,
                vertex_count,
            } => write!(
                f,
                "Mesh '{}': dropped face {} with only {} vertices",
                mesh, face, vertex_count
            ),
            Warning::MissingGeometry { shape } => {
                write!(f, "Shape '{}' has no geometry", shape)
            }
            Warning::UnsupportedGeometry { shape, type_name } => write!(
                f,
                "Shape '{}' uses unsupported geometry '{}'",
                shape, type_name
            ),
        }
    }
}
