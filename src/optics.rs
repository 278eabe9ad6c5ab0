//! Illumination, medium and sampling geometry.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};


/// The medium surrounding the scatterer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    pub wavevec: f64,
    pub index: f64,
}

impl Medium {
    pub fn new(wavevec: f64, index: f64) -> Self {
        Self { wavevec, index }
    }

    /// Wavelength in the medium.
    pub fn wavelen(&self) -> f64 {
        2.0 * PI / self.wavevec
    }
}

/// The optical train: illumination and imaging parameters.
///
/// `wavelen` is the vacuum wavelength and `index` the real refractive index
/// of the medium. `polarization` is the Cartesian (x, y) incident field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optics {
    pub wavelen: f64,
    pub index: f64,
    pub polarization: Vector2<f64>,
    pub pixel_scale: [f64; 2],
}

impl Optics {
    pub fn new(wavelen: f64, index: f64, polarization: Vector2<f64>, pixel_scale: [f64; 2]) -> Self {
        Self {
            wavelen,
            index,
            polarization,
            pixel_scale,
        }
    }

    pub fn med_wavelen(&self) -> f64 {
        self.wavelen / self.index
    }

    pub fn wavevec(&self) -> f64 {
        2.0 * PI / self.med_wavelen()
    }

    pub fn medium(&self) -> Medium {
        Medium::new(self.wavevec(), self.index)
    }
}

/// A single observation point in the scatterer's spherical frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingPoint {
    /// Radial distance times the medium wavevector.
    pub kr: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SamplingPoint {
    pub fn new(kr: f64, theta: f64, phi: f64) -> Self {
        Self { kr, theta, phi }
    }

    /// Polar and azimuthal angle in degrees, as the solvers expect them.
    pub fn angles_deg(&self) -> (f64, f64) {
        (self.theta.to_degrees(), self.phi.to_degrees())
    }
}

/// A rectangular camera in the z = 0 plane.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Detector {
    pub shape: (usize, usize),
    pub pixel_scale: [f64; 2],
}

impl Detector {
    pub fn new(shape: (usize, usize), pixel_scale: [f64; 2]) -> Self {
        Self { shape, pixel_scale }
    }

    pub fn num_pixels(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Row-major sampling points of every pixel as seen from a scatterer
    /// at `center`. The scatterer must sit above the detector plane.
    pub fn spherical_grid(&self, center: Point3<f64>, wavevec: f64) -> Result<Vec<SamplingPoint>> {
        if center.z <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "scatterer must lie above the detector, got z = {}",
                center.z
            )));
        }

        let (rows, cols) = self.shape;
        let [dx, dy] = self.pixel_scale;
        let z = center.z;

        let mut points = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            let x = i as f64 * dx - center.x;
            for j in 0..cols {
                let y = j as f64 * dy - center.y;
                let rho = x.hypot(y);
                let r = rho.hypot(z);
                points.push(SamplingPoint {
                    kr: wavevec * r,
                    theta: rho.atan2(z),
                    phi: y.atan2(x).rem_euclid(2.0 * PI),
                });
            }
        }
        Ok(points)
    }
}
