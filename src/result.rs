use nalgebra::{Complex, Vector3};
use ndarray::Array2;

use crate::optics::Optics;

/// Hologram pixel intensities on the detector grid.
#[derive(Debug, PartialEq, Clone)]
pub struct Hologram {
    pub pixels: Array2<f64>,
    pub optics: Optics,
}

impl Hologram {
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }
}

/// Cartesian scattered field, one vector per sampling point.
#[derive(Debug, PartialEq, Clone)]
pub struct ElectricField {
    pub values: Vec<Vector3<Complex<f64>>>,
    pub med_wavelen: f64,
}

impl ElectricField {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scattered intensity `|E|^2` at every point.
    pub fn intensity(&self) -> Vec<f64> {
        self.values.iter().map(|e| e.norm_squared()).collect()
    }
}
