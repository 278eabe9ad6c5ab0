//! The discrete dipole approximation, computed with ADDA.
//!
//! ADDA is looked up on the system path (or at a configured location) and
//! checked with `adda -V` before any scratch directory is created. Each run
//! writes a `run*` directory holding `ampl_scatgrid`, whose first line is a
//! header and whose columns are `theta phi s1 s2 s3 s4` with interleaved
//! real and imaginary parts.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::basis::{self, ScatMatrix};
use crate::encode;
use crate::error::Result;
use crate::optics::{Medium, SamplingPoint};
use crate::parse::{self, ANGLE_TOLERANCE_DEG};
use crate::scatterer::Scatterer;
use crate::settings::Settings;
use crate::solver::{self, Scratch};
use crate::theory::{ScatteringTheory, TheoryKind};

const RUN_DIR_PATTERN: &str = "run*";
const RESULT_FILE: &str = "ampl_scatgrid";
const DEP_NAME: &str = "adda";

#[derive(Debug, Clone, PartialEq)]
pub struct Dda {
    /// Program name or path of ADDA.
    pub executable: PathBuf,
    pub delete: bool,
    pub timeout: Option<Duration>,
    pub scratch_root: Option<PathBuf>,
}

impl Dda {
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
            executable: settings.adda_executable.clone(),
            delete: settings.delete_scratch,
            timeout: settings.timeout(),
            scratch_root: settings.scratch_root.clone(),
        }
    }
}

impl Default for Dda {
    fn default() -> Self {
        Self::new(DEP_NAME)
    }
}

impl ScatteringTheory for Dda {
    fn kind(&self) -> TheoryKind {
        TheoryKind::Dda
    }

    fn raw_scat_matrs(
        &self,
        scatterer: &Scatterer,
        points: &[SamplingPoint],
        medium: &Medium,
    ) -> Result<Vec<ScatMatrix>> {
        solver::probe_version(DEP_NAME, self.executable.as_os_str())?;
        let input = encode::dda_input(scatterer, medium, points)?;

        let scratch = Scratch::create(self.scratch_root.as_deref(), !self.delete)?;
        scratch.write_input(&input)?;
        solver::run(
            DEP_NAME,
            self.executable.as_os_str(),
            &input.args,
            scratch.path(),
            self.timeout,
        )?;

        // every invocation gets its own scratch, so there is exactly one run
        let run_dir = parse::find_unique(scratch.path(), RUN_DIR_PATTERN)?;
        let result_file = run_dir.join(RESULT_FILE);
        debug!("reading {:?}", result_file);
        let table = parse::read_table(&result_file, 1)?;
        let rows = parse::amplitude_rows(table.view(), 2, points.len(), &result_file)?;
        parse::check_angles(table.view(), points, ANGLE_TOLERANCE_DEG);

        Ok(basis::from_dda(&rows))
    }
}
