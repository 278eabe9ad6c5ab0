//! Scatterer geometries handed to the external solvers.
//!
//! The scatterers here are plain data: each variant carries the geometry
//! parameters one of the solvers needs, and nothing else. Which theory can
//! use which variant is decided in [`crate::theory::supports`].

use std::fmt;

use nalgebra::{Complex, Point3};
use serde::Deserialize;

use crate::error::{Error, Result};


/// The geometry kind of a scatterer, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScattererKind {
    Sphere,
    Axisymmetric,
    DipoleSet,
}

impl fmt::Display for ScattererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScattererKind::Sphere => "sphere",
            ScattererKind::Axisymmetric => "axisymmetric",
            ScattererKind::DipoleSet => "dipole set",
        };
        write!(f, "{}", name)
    }
}

/// A homogeneous sphere.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sphere {
    pub r: f64,
    pub n: Complex<f64>,
    pub center: Point3<f64>,
}

/// An axisymmetric particle in the parameterisation of Mishchenko's T-matrix
/// code.
///
/// `r[0]` is the equatorial radius and `r[1]` the polar half-axis (spheroid)
/// or half-length (cylinder). `rotation` holds the azimuth and elevation of
/// the symmetry axis in radians. `shape` is the raw solver particle code and
/// is only checked when the solver input is encoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Axisymmetric {
    pub r: [f64; 2],
    pub n: Complex<f64>,
    pub center: Point3<f64>,
    #[serde(default)]
    pub rotation: (f64, f64),
    #[serde(default = "default_shape")]
    pub shape: i32,
}

fn default_shape() -> i32 {
    AxisymmetricShape::Spheroid.into()
}

/// A set of dipoles on a cubic lattice with the given spacing.
/// Sites are integer lattice coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DipoleSet {
    pub sites: Vec<[i32; 3]>,
    pub spacing: f64,
    pub n: Complex<f64>,
    pub center: Point3<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scatterer {
    Sphere(Sphere),
    Axisymmetric(Axisymmetric),
    DipoleSet(DipoleSet),
}

impl Scatterer {
    pub fn kind(&self) -> ScattererKind {
        match self {
            Scatterer::Sphere(_) => ScattererKind::Sphere,
            Scatterer::Axisymmetric(_) => ScattererKind::Axisymmetric,
            Scatterer::DipoleSet(_) => ScattererKind::DipoleSet,
        }
    }

    pub fn center(&self) -> Point3<f64> {
        match self {
            Scatterer::Sphere(s) => s.center,
            Scatterer::Axisymmetric(s) => s.center,
            Scatterer::DipoleSet(s) => s.center,
        }
    }

    /// Absolute refractive index of the particle material.
    pub fn index(&self) -> Complex<f64> {
        match self {
            Scatterer::Sphere(s) => s.n,
            Scatterer::Axisymmetric(s) => s.n,
            Scatterer::DipoleSet(s) => s.n,
        }
    }
}

/// Particle shapes understood by the T-matrix code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisymmetricShape {
    /// Code -1.
    Spheroid,
    /// Code -2.
    Cylinder,
}

impl AxisymmetricShape {
    /// Radius of the sphere with the same volume as a particle with radii `r`.
    pub fn equal_volume_radius(self, r: [f64; 2]) -> f64 {
        match self {
            AxisymmetricShape::Spheroid => (r[1] * r[0].powi(2)).cbrt(),
            AxisymmetricShape::Cylinder => (1.5 * r[1] * r[0].powi(2)).cbrt(),
        }
    }
}

impl TryFrom<i32> for AxisymmetricShape {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            -1 => Ok(AxisymmetricShape::Spheroid),
            -2 => Ok(AxisymmetricShape::Cylinder),
            other => Err(Error::UnknownShape(other)),
        }
    }
}

impl From<AxisymmetricShape> for i32 {
    fn from(shape: AxisymmetricShape) -> i32 {
        match shape {
            AxisymmetricShape::Spheroid => -1,
            AxisymmetricShape::Cylinder => -2,
        }
    }
}
