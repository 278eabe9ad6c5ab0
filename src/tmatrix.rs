//! Mishchenko's extended-precision T-matrix code for axisymmetric particles.
//!
//! The solver is a compiled executable that takes no arguments. It is copied
//! into a fresh scratch directory, reads [`encode::TMATRIX_INPUT`] from there
//! and writes [`TMATRIX_OUTPUT`] next to it.
//!
//! Near fields are not handled; this introduces ~5% error at 10 microns.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::basis::{self, ScatMatrix};
use crate::encode;
use crate::error::Result;
use crate::optics::{Medium, SamplingPoint};
use crate::parse;
use crate::scatterer::Scatterer;
use crate::settings::Settings;
use crate::solver::{self, Scratch};
use crate::theory::{ScatteringTheory, TheoryKind};

/// Result file written by the T-matrix executable.
pub const TMATRIX_OUTPUT: &str = "tmatrix_tmp.out";
/// Name used when reporting problems with the executable.
const DEP_NAME: &str = "tmatrix";

#[derive(Debug, Clone, PartialEq)]
pub struct Tmatrix {
    /// Location of the compiled solver.
    pub executable: PathBuf,
    /// Remove the scratch directory after each run.
    pub delete: bool,
    pub timeout: Option<Duration>,
    /// Parent of the scratch directories; the system temp dir if `None`.
    pub scratch_root: Option<PathBuf>,
}

impl Tmatrix {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            delete: true,
            timeout: None,
            scratch_root: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            executable: settings.tmatrix_executable.clone(),
            delete: settings.delete_scratch,
            timeout: settings.timeout(),
            scratch_root: settings.scratch_root.clone(),
        }
    }
}

impl ScatteringTheory for Tmatrix {
    fn kind(&self) -> TheoryKind {
        TheoryKind::Tmatrix
    }

    fn applies_postfactor(&self) -> bool {
        true
    }

    fn raw_scat_matrs(
        &self,
        scatterer: &Scatterer,
        points: &[SamplingPoint],
        medium: &Medium,
    ) -> Result<Vec<ScatMatrix>> {
        solver::require_file(DEP_NAME, &self.executable)?;
        let input = encode::tmatrix_input(scatterer, medium, points)?;

        let scratch = Scratch::create(self.scratch_root.as_deref(), !self.delete)?;
        scratch.write_input(&input)?;
        let staged = scratch.stage(&self.executable)?;
        solver::run(
            DEP_NAME,
            staged.as_os_str(),
            &input.args,
            scratch.path(),
            self.timeout,
        )?;

        let result_file = parse::find_unique(scratch.path(), TMATRIX_OUTPUT)?;
        debug!("reading {:?}", result_file);
        let table = parse::read_table(&result_file, 0)?;
        let rows = parse::amplitude_rows(table.view(), 0, points.len(), &result_file)?;

        Ok(basis::from_tmatrix(&rows, medium.wavelen()))
    }
}
