//! Holograms and scattered fields of small particles from external
//! scattering solvers.
//!
//! A [`theory::ScatteringTheory`] ([`tmatrix::Tmatrix`] or [`dda::Dda`])
//! encodes the scatterer for its solver, runs the solver in a scratch
//! directory, reads back amplitude scattering matrices and turns them into
//! fields or hologram pixels.

pub mod basis;
pub mod dda;
pub mod encode;
pub mod error;
pub mod optics;
pub mod output;
pub mod parse;
pub mod result;
pub mod scatterer;
pub mod settings;
pub mod solver;
pub mod synth;
pub mod theory;
pub mod tmatrix;

pub use error::{Error, Result};
