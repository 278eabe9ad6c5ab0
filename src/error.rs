use std::path::PathBuf;
use std::process::ExitStatus;

use crate::scatterer::ScattererKind;
use crate::theory::TheoryKind;

/// Failures of a single field or hologram computation.
///
/// None of these are retried; the scratch directory of the failing call is
/// released (or kept, if requested) before the error reaches the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("external dependency `{dep}` could not be found. Is it installed and configured properly?")]
    DependencyMissing { dep: String },
    #[error("{theory} theory cannot compute scattering from a {scatterer} scatterer")]
    TheoryNotCompatible {
        theory: TheoryKind,
        scatterer: ScattererKind,
    },
    #[error("unrecognised axisymmetric shape code {0}, expected -1 (spheroid) or -2 (cylinder)")]
    UnknownShape(i32),
    #[error("{solver} exited with {status}: {stderr}")]
    SolverExecution {
        solver: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{solver} did not finish within {seconds} s")]
    SolverTimeout { solver: String, seconds: f64 },
    #[error("expected exactly one solver result matching `{pattern}`, found {found}")]
    ResultNotFound { pattern: String, found: usize },
    #[error("solver returned {found} rows for {expected} sampling points")]
    ResultShapeMismatch { expected: usize, found: usize },
    #[error("malformed solver output in {path:?}: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
