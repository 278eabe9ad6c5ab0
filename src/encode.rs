//! Text encodings of the solver inputs.
//!
//! Everything is rendered into memory first so that an unsupported scatterer
//! or a bad shape code is reported before the scratch directory exists.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::optics::{Medium, SamplingPoint};
use crate::scatterer::{AxisymmetricShape, Scatterer};
use crate::theory::TheoryKind;

/// Input file read by the T-matrix executable from its working directory.
pub const TMATRIX_INPUT: &str = "tmatrix_tmp.inp";
/// Default scattering grid file read by ADDA.
pub const DDA_ANGLES: &str = "scat_params.dat";
/// Dipole geometry file for `-shape read`.
pub const DDA_SHAPE: &str = "shape.dat";


/// Files to stage in the solver's working directory and its arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverInput {
    pub files: Vec<(String, String)>,
    pub args: Vec<String>,
}

/// Appends one `theta phi` line in degrees per sampling point.
fn write_angles(out: &mut String, points: &[SamplingPoint]) {
    for point in points {
        let (theta, phi) = point.angles_deg();
        let _ = writeln!(out, "{:.18e} {:.18e}", theta, phi);
    }
}

/// Fails with `InvalidInput` unless `value` is a finite positive length.
fn check_radius(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}

fn write_lines(out: &mut String, values: &[String]) {
    for value in values {
        out.push_str(value);
        out.push('\n');
    }
}

/// Builds the input file of the axisymmetric T-matrix executable.
pub fn tmatrix_input(
    scatterer: &Scatterer,
    medium: &Medium,
    points: &[SamplingPoint],
) -> Result<SolverInput> {
    let med_wavelen = medium.wavelen();

    let header: Vec<String> = match scatterer {
        Scatterer::Sphere(sphere) => {
            check_radius("sphere radius", sphere.r)?;
            vec![
                sphere.r.to_string(),
                med_wavelen.to_string(),
                (sphere.n.re / medium.index).to_string(),
                (sphere.n.im / medium.index).to_string(),
                // unit aspect ratio, no rotation, spheroid
                "1".to_string(),
                "0".to_string(),
                "0".to_string(),
                i32::from(AxisymmetricShape::Spheroid).to_string(),
                points.len().to_string(),
            ]
        }
        Scatterer::Axisymmetric(particle) => {
            let shape = AxisymmetricShape::try_from(particle.shape)?;
            check_radius("axisymmetric r[0]", particle.r[0])?;
            check_radius("axisymmetric r[1]", particle.r[1])?;
            let (alpha, beta) = particle.rotation;
            vec![
                shape.equal_volume_radius(particle.r).to_string(),
                med_wavelen.to_string(),
                (particle.n.re / medium.index).to_string(),
                (particle.n.im / medium.index).to_string(),
                (particle.r[0] / particle.r[1]).to_string(),
                beta.to_degrees().to_string(),
                alpha.to_degrees().to_string(),
                i32::from(shape).to_string(),
                points.len().to_string(),
            ]
        }
        Scatterer::DipoleSet(_) => {
            return Err(Error::TheoryNotCompatible {
                theory: TheoryKind::Tmatrix,
                scatterer: scatterer.kind(),
            })
        }
    };

    let mut content = String::new();
    write_lines(&mut content, &header);
    write_angles(&mut content, points);

    Ok(SolverInput {
        files: vec![(TMATRIX_INPUT.to_string(), content)],
        args: Vec::new(),
    })
}

/// Builds the scattering grid file and command line for ADDA.
pub fn dda_input(scatterer: &Scatterer, medium: &Medium, points: &[SamplingPoint]) -> Result<SolverInput> {
    let med_wavelen = medium.wavelen();
    let n = scatterer.index();

    let mut angles = format!("global_type=pairs\nN={}\npairs=\n", points.len());
    write_angles(&mut angles, points);
    let mut files = vec![(DDA_ANGLES.to_string(), angles)];

    let mut args: Vec<String> = ["-scat_matr", "ampl", "-store_scat_grid", "-lambda"]
        .iter()
        .map(|a| a.to_string())
        .collect();
    args.push(med_wavelen.to_string());

    match scatterer {
        Scatterer::Sphere(sphere) => {
            check_radius("sphere radius", sphere.r)?;
            args.push("-eq_rad".to_string());
            args.push(sphere.r.to_string());
        }
        Scatterer::DipoleSet(dipoles) => {
            if dipoles.sites.is_empty() || dipoles.spacing <= 0.0 {
                return Err(Error::InvalidInput(
                    "dipole set needs at least one site and a positive spacing".to_string(),
                ));
            }
            let mut shape = String::from("# dipole sites, lattice units\n");
            for [x, y, z] in &dipoles.sites {
                let _ = writeln!(shape, "{} {} {}", x, y, z);
            }
            files.push((DDA_SHAPE.to_string(), shape));

            args.extend(["-shape", "read", DDA_SHAPE].iter().map(|a| a.to_string()));
            args.push("-dpl".to_string());
            args.push((med_wavelen / dipoles.spacing).to_string());
        }
        Scatterer::Axisymmetric(_) => {
            return Err(Error::TheoryNotCompatible {
                theory: TheoryKind::Dda,
                scatterer: scatterer.kind(),
            })
        }
    }

    args.push("-m".to_string());
    args.push((n.re / medium.index).to_string());
    args.push((n.im / medium.index).to_string());

    Ok(SolverInput { files, args })
}
