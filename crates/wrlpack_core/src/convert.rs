//! End-to-end conversion: load a `.wrl` file and write its descriptor and
//! binary payload.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::export::{write_scene, WriteError};
use crate::options::ConvertOptions;
use crate::vrml::{load_vrml, LoadError};
use crate::warning::Warning;

/// Errors from a full conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// One input file and its two outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub descriptor: PathBuf,
    pub binary: PathBuf,
}

impl ConversionJob {
    pub fn new(
        input: impl Into<PathBuf>,
        descriptor: impl Into<PathBuf>,
        binary: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            descriptor: descriptor.into(),
            binary: binary.into(),
        }
    }
}

/// Summary of a finished conversion.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    pub meshes: usize,
    pub materials: usize,
    pub instances: usize,
    pub triangles: usize,
    pub binary_size: u64,
    pub warnings: Vec<Warning>,
}

/// Convert one VRML file into a descriptor and a binary payload.
pub fn convert_file(
    input: &Path,
    descriptor: &Path,
    binary: &Path,
    options: &ConvertOptions,
) -> ConvertResult<ConversionReport> {
    log::info!("Converting {}", input.display());

    let scene = load_vrml(input, options)?;
    let format = options.format_for(descriptor);
    let written = write_scene(&scene, descriptor, binary, format)?;

    Ok(ConversionReport {
        meshes: scene.mesh_count(),
        materials: scene.material_count(),
        instances: scene.instance_count(),
        triangles: scene.total_triangle_count(),
        binary_size: written.binary_size,
        warnings: scene.warnings,
    })
}

/// Convert independent jobs in parallel. Results are in job order.
pub fn convert_batch(
    jobs: &[ConversionJob],
    options: &ConvertOptions,
) -> Vec<ConvertResult<ConversionReport>> {
    jobs.par_iter()
        .map(|job| convert_file(&job.input, &job.descriptor, &job.binary, options))
        .collect()
}
