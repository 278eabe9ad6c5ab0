//! The public entry points: fields and holograms from a scattering theory.
//!
//! A theory only has to produce amplitude scattering matrices for a list of
//! sampling points. Compatibility checks, sampling of the detector and field
//! synthesis are shared and live in the provided methods of
//! [`ScatteringTheory`].

use std::fmt;

use clap::ValueEnum;
use log::debug;
use nalgebra::Point3;
use ndarray::Array2;
use serde::Deserialize;

use crate::basis::ScatMatrix;
use crate::error::{Error, Result};
use crate::optics::{Detector, Medium, Optics, SamplingPoint};
use crate::result::{ElectricField, Hologram};
use crate::scatterer::{Scatterer, ScattererKind};
use crate::synth;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TheoryKind {
    Tmatrix,
    Dda,
}

impl fmt::Display for TheoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryKind::Tmatrix => write!(f, "T-matrix"),
            TheoryKind::Dda => write!(f, "DDA"),
        }
    }
}

/// Which theory handles which scatterer geometry.
pub fn supports(theory: TheoryKind, scatterer: ScattererKind) -> bool {
    use ScattererKind::*;
    match theory {
        TheoryKind::Tmatrix => matches!(scatterer, Sphere | Axisymmetric),
        TheoryKind::Dda => matches!(scatterer, Sphere | DipoleSet),
    }
}

pub fn check_compatible(theory: TheoryKind, scatterer: ScattererKind) -> Result<()> {
    if supports(theory, scatterer) {
        Ok(())
    } else {
        Err(Error::TheoryNotCompatible { theory, scatterer })
    }
}

/// A scattering theory backed by an external solver.
pub trait ScatteringTheory {
    fn kind(&self) -> TheoryKind;

    /// Whether the azimuthal postfactor is applied to the amplitude matrices
    /// before the field formula.
    fn applies_postfactor(&self) -> bool {
        false
    }

    /// Amplitude scattering matrices in the Bohren & Huffman basis, one per
    /// sampling point and in the same order.
    fn raw_scat_matrs(
        &self,
        scatterer: &Scatterer,
        points: &[SamplingPoint],
        medium: &Medium,
    ) -> Result<Vec<ScatMatrix>>;

    fn can_handle(&self, scatterer: &Scatterer) -> bool {
        supports(self.kind(), scatterer.kind())
    }

    /// Scattered field at each of `points`, given in the scatterer frame.
    fn calc_field(
        &self,
        scatterer: &Scatterer,
        points: &[SamplingPoint],
        optics: &Optics,
    ) -> Result<ElectricField> {
        check_compatible(self.kind(), scatterer.kind())?;
        let matrices = self.checked_scat_matrs(scatterer, points, &optics.medium())?;
        let values = synth::calc_fields(
            points,
            &matrices,
            &optics.polarization,
            self.applies_postfactor(),
        );
        Ok(ElectricField {
            values,
            med_wavelen: optics.med_wavelen(),
        })
    }

    /// Hologram of `scatterer` recorded on `detector`, with the scattered
    /// field weighted by `alpha`.
    fn calc_holo(
        &self,
        scatterer: &Scatterer,
        detector: &Detector,
        optics: &Optics,
        alpha: f64,
    ) -> Result<Hologram> {
        check_compatible(self.kind(), scatterer.kind())?;
        let center: Point3<f64> = scatterer.center();
        let wavevec = optics.wavevec();
        let points = detector.spherical_grid(center, wavevec)?;
        debug!(
            "{} hologram of a {} on a {:?} grid",
            self.kind(),
            scatterer.kind(),
            detector.shape
        );

        let matrices = self.checked_scat_matrs(scatterer, &points, &optics.medium())?;
        let pixels = synth::calc_pixels(
            &points,
            &matrices,
            center.z * wavevec,
            &optics.polarization,
            alpha,
            self.applies_postfactor(),
        );
        let pixels = Array2::from_shape_vec(detector.shape, pixels).map_err(|err| {
            Error::InvalidInput(format!("cannot shape hologram: {}", err))
        })?;

        Ok(Hologram {
            pixels,
            optics: optics.clone(),
        })
    }

    #[doc(hidden)]
    fn checked_scat_matrs(
        &self,
        scatterer: &Scatterer,
        points: &[SamplingPoint],
        medium: &Medium,
    ) -> Result<Vec<ScatMatrix>> {
        let matrices = self.raw_scat_matrs(scatterer, points, medium)?;
        if matrices.len() != points.len() {
            return Err(Error::ResultShapeMismatch {
                expected: points.len(),
                found: matrices.len(),
            });
        }
        Ok(matrices)
    }
}
