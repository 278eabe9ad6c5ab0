//! Conversion of solver amplitude matrices into the Bohren & Huffman basis.

use std::f64::consts::PI;

use nalgebra::{Complex, Matrix2};

use crate::parse::RawRow;

/// Amplitude scattering matrix at a single sampling point.
pub type ScatMatrix = Matrix2<Complex<f64>>;


/// Mishchenko's `s11 s12 s21 s22` rows.
///
/// The elements are scaled by `-2 pi i / wavelength` (Mishchenko, Appl. Opt.
/// 2000, eq. 5) and the second row changes sign because his scattered basis
/// vectors differ from Bohren & Huffman's.
pub fn from_tmatrix(rows: &[RawRow], med_wavelen: f64) -> Vec<ScatMatrix> {
    let scale = Complex::new(0.0, -2.0 * PI / med_wavelen);
    rows.iter()
        .map(|row| {
            let [s11, s12, s21, s22] = row.map(|s| s * scale);
            Matrix2::new(s11, s12, -s21, -s22)
        })
        .collect()
}

/// ADDA's `s1 s2 s3 s4` rows, arranged as `[[s2, s3], [s4, s1]]`
/// (Bohren & Huffman eq. 3.12).
pub fn from_dda(rows: &[RawRow]) -> Vec<ScatMatrix> {
    rows.iter()
        .map(|&[s1, s2, s3, s4]| Matrix2::new(s2, s3, s4, s1))
        .collect()
}
