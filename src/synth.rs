//! Far-field scattered fields and hologram pixels from amplitude matrices.

use nalgebra::{Complex, Matrix2, Vector2, Vector3};
use rayon::prelude::*;

use crate::basis::ScatMatrix;
use crate::optics::SamplingPoint;


/// Azimuthal rotation applied to T-matrix amplitude matrices before the
/// field formula.
pub fn postfactor(phi: f64) -> Matrix2<Complex<f64>> {
    let (s, c) = phi.sin_cos();
    Matrix2::new(c, s, -s, c).map(|v| Complex::new(v, 0.0))
}

/// Incident polarization resolved into (parallel, perpendicular) components
/// of the scattering plane at azimuth `phi`.
pub fn incident_sph(pol: &Vector2<f64>, phi: f64) -> Vector2<f64> {
    let (s, c) = phi.sin_cos();
    Vector2::new(pol[0] * c + pol[1] * s, pol[0] * s - pol[1] * c)
}

/// Scattered far field `(E_theta, E_phi)` at distance `kr`.
pub fn scat_field_sph(
    kr: f64,
    phi: f64,
    ampl: &ScatMatrix,
    pol: &Vector2<f64>,
) -> Vector2<Complex<f64>> {
    let prefactor = Complex::i() / kr * Complex::new(0.0, kr).exp();
    let einc = incident_sph(pol, phi).map(|v| Complex::new(v, 0.0));
    let mut escat = ampl * einc * prefactor;
    // perpendicular component points along -phi-hat
    escat[1] = -escat[1];
    escat
}

/// Converts a spherical far field to Cartesian components.
pub fn fields_to_cart(e_sph: &Vector2<Complex<f64>>, theta: f64, phi: f64) -> Vector3<Complex<f64>> {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let (e_theta, e_phi) = (e_sph[0], e_sph[1]);
    Vector3::new(
        e_theta * (ct * cp) - e_phi * sp,
        e_theta * (ct * sp) + e_phi * cp,
        e_theta * (-st),
    )
}

/// Hologram intensity at one pixel in the paraxial limit.
///
/// The scattered field is referenced to the detector plane by `e^{-i kz}`,
/// where `kz` is the scatterer height times the medium wavevector, and only
/// its transverse components interfere with the unit incident field.
pub fn paraxial_pixel(
    point: &SamplingPoint,
    kz: f64,
    ampl: &ScatMatrix,
    pol: &Vector2<f64>,
    alpha: f64,
) -> f64 {
    let e_sph = scat_field_sph(point.kr, point.phi, ampl, pol);
    let phase = Complex::new(0.0, -kz).exp();
    let scat = fields_to_cart(&e_sph, point.theta, point.phi) * phase;
    let (ex, ey) = (scat[0], scat[1]);

    let interference = (ex * pol[0] + ey * pol[1]).re;
    pol.norm_squared() + 2.0 * alpha * interference + alpha.powi(2) * (ex.norm_sqr() + ey.norm_sqr())
}

fn effective_matrix(ampl: &ScatMatrix, phi: f64, use_postfactor: bool) -> ScatMatrix {
    if use_postfactor {
        ampl * postfactor(phi)
    } else {
        *ampl
    }
}

/// Cartesian scattered field at every sampling point, in input order.
pub fn calc_fields(
    points: &[SamplingPoint],
    matrices: &[ScatMatrix],
    pol: &Vector2<f64>,
    use_postfactor: bool,
) -> Vec<Vector3<Complex<f64>>> {
    points
        .par_iter()
        .zip(matrices.par_iter())
        .map(|(point, ampl)| {
            let ampl = effective_matrix(ampl, point.phi, use_postfactor);
            let e_sph = scat_field_sph(point.kr, point.phi, &ampl, pol);
            fields_to_cart(&e_sph, point.theta, point.phi)
        })
        .collect()
}

/// Hologram intensity at every sampling point, in input order.
pub fn calc_pixels(
    points: &[SamplingPoint],
    matrices: &[ScatMatrix],
    kz: f64,
    pol: &Vector2<f64>,
    alpha: f64,
    use_postfactor: bool,
) -> Vec<f64> {
    points
        .par_iter()
        .zip(matrices.par_iter())
        .map(|(point, ampl)| {
            let ampl = effective_matrix(ampl, point.phi, use_postfactor);
            paraxial_pixel(point, kz, &ampl, pol, alpha)
        })
        .collect()
}
