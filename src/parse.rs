//! Reading solver output tables.

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::warn;
use nalgebra::Complex;
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::optics::SamplingPoint;

/// Largest accepted difference, in degrees, between a requested angle and
/// the one a solver reports back. ADDA rounds the angles it is given.
pub const ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// The four raw amplitude elements of one output row, in file order.
pub type RawRow = [Complex<f64>; 4];


/// Returns the single entry of `dir` matching `pattern`.
pub fn find_unique(dir: &Path, pattern: &str) -> Result<PathBuf> {
    let base = dir.to_str().ok_or_else(|| {
        Error::InvalidInput(format!("scratch path {:?} is not valid unicode", dir))
    })?;
    let full = format!("{}/{}", glob::Pattern::escape(base), pattern);
    let matches: Vec<PathBuf> = glob::glob(&full)
        .map_err(|err| Error::InvalidInput(err.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();

    match matches.as_slice() {
        [single] => Ok(single.clone()),
        _ => Err(Error::ResultNotFound {
            pattern: pattern.to_string(),
            found: matches.len(),
        }),
    }
}

/// Reads a whitespace separated numeric table, skipping `skip_rows` header
/// lines. Blank lines are ignored.
pub fn read_table(path: &Path, skip_rows: usize) -> Result<Array2<f64>> {
    let malformed = |reason: String| Error::MalformedOutput {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path)?;
    let mut values = Vec::new();
    let mut ncols = None;
    let mut nrows = 0;

    for (lineno, line) in text.lines().enumerate().skip(skip_rows) {
        let row: Vec<f64> = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("line {}: cannot parse `{}`", lineno + 1, token)))
            })
            .collect::<Result<_>>()?;
        if row.is_empty() {
            continue;
        }
        match ncols {
            None => ncols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(malformed(format!(
                    "line {} has {} columns, expected {}",
                    lineno + 1,
                    row.len(),
                    n
                )))
            }
            _ => {}
        }
        values.extend(row);
        nrows += 1;
    }

    Array2::from_shape_vec((nrows, ncols.unwrap_or(0)), values)
        .map_err(|err| malformed(err.to_string()))
}

/// Combines the interleaved `re im` columns starting at `first_col` into
/// four complex amplitudes per row.
pub fn amplitude_rows(
    table: ArrayView2<f64>,
    first_col: usize,
    expected_rows: usize,
    path: &Path,
) -> Result<Vec<RawRow>> {
    let (nrows, ncols) = table.dim();
    if nrows != expected_rows {
        return Err(Error::ResultShapeMismatch {
            expected: expected_rows,
            found: nrows,
        });
    }
    if nrows == 0 {
        return Ok(Vec::new());
    }
    if ncols < first_col + 8 {
        return Err(Error::MalformedOutput {
            path: path.to_path_buf(),
            reason: format!("{} columns, expected at least {}", ncols, first_col + 8),
        });
    }

    table
        .outer_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut raw = [Complex::new(0.0, 0.0); 4];
            for (k, (re, im)) in row
                .iter()
                .skip(first_col)
                .take(8)
                .tuples()
                .enumerate()
            {
                if !re.is_finite() || !im.is_finite() {
                    return Err(Error::MalformedOutput {
                        path: path.to_path_buf(),
                        reason: format!("non-finite amplitude in row {}", i + 1),
                    });
                }
                raw[k] = Complex::new(*re, *im);
            }
            Ok(raw)
        })
        .collect()
}

/// Compares the `theta phi` columns (degrees) of a solver table with the
/// requested points and warns about rows outside `tolerance_deg`.
/// Returns the number of deviating rows.
pub fn check_angles(table: ArrayView2<f64>, points: &[SamplingPoint], tolerance_deg: f64) -> usize {
    let angle_diff = |a: f64, b: f64| {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    };

    let mut deviating = 0;
    for (i, (row, point)) in table.outer_iter().zip(points).enumerate() {
        let (theta, phi) = point.angles_deg();
        if angle_diff(row[0], theta) > tolerance_deg || angle_diff(row[1], phi) > tolerance_deg {
            deviating += 1;
            warn!(
                "solver row {} computed at ({}, {}) deg, requested ({}, {}) deg",
                i, row[0], row[1], theta, phi
            );
        }
    }
    deviating
}
