//! VRML97 support.
//!
//! This module tokenizes and parses VRML97 (`.wrl`) text into a node
//! arena, then flattens the static-geometry subset into a [`crate::Scene`].
//!
//! ## Supported Nodes
//!
//! - Grouping: `Group`, `Transform`, `Anchor`, `Billboard`, `Collision`, `Switch`
//! - `Shape`, `Appearance`, `Material`, `ImageTexture`
//! - `IndexedFaceSet` with `Coordinate`, `Normal`, `Color`, `TextureCoordinate`
//!
//! ## Not Supported
//!
//! - Primitive geometry (`Box`, `Sphere`, `Cone`, `Cylinder`, `Extrusion`, ...)
//! - Scripts, sensors, interpolators and `ROUTE`s (skipped)
//! - `PROTO` instantiation (declarations are skipped)
//! - `Inline` (external files are not followed)
//!
//! # Example
//!
//! ```ignore
//! use wrlpack_core::vrml::load_vrml;
//! use wrlpack_core::ConvertOptions;
//!
//! let scene = load_vrml("path/to/scene.wrl", &ConvertOptions::default())?;
//! println!("Loaded {} meshes, {} instances",
//!     scene.mesh_count(),
//!     scene.instance_count());
//! ```

pub mod faces;
pub mod lexer;
mod loader;
mod parser;
mod types;

pub use lexer::{tokenize, LexError, Lexer, SourcePos, Token, TokenKind};
pub use loader::*;
pub use parser::*;
pub use types::*;
