#![cfg(unix)]

mod common;

use std::f64::consts::PI;
use std::fs;
use std::time::Duration;

use holoscat::optics::{Detector, Medium, Optics, SamplingPoint};
use holoscat::scatterer::{Axisymmetric, DipoleSet, Scatterer, Sphere};
use holoscat::theory::{ScatteringTheory, TheoryKind};
use holoscat::Error;
use nalgebra::{Complex, Point3, Vector2};

const MED_WAVELEN: f64 = 0.658;
const INDEX: f64 = 1.33;
/// s11 s12 s21 s22, real and imaginary parts interleaved.
const ROW: &str = "1.0 0.5 0.1 -0.2 0.3 0.0 0.8 -0.4";
const TOL: f64 = 1e-12;

fn sphere() -> Scatterer {
    Scatterer::Sphere(Sphere {
        r: 0.5,
        n: Complex::new(1.58, 0.0001),
        center: Point3::new(0.5, 0.5, 10.0),
    })
}

fn medium() -> Medium {
    Medium::new(2.0 * PI / MED_WAVELEN, INDEX)
}

fn optics() -> Optics {
    Optics::new(MED_WAVELEN * INDEX, INDEX, Vector2::x(), [0.1, 0.1])
}

fn point() -> SamplingPoint {
    SamplingPoint::new(100.0, 0.1, 0.2)
}

#[test]
fn sphere_scale_and_sign_flip() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let capture = dir.path().join("input.txt");
    let exe = common::tmatrix_stub(dir.path(), ROW, &capture);
    let theory = common::tmatrix(&exe, scratch.path());

    let matrices = theory
        .raw_scat_matrs(&sphere(), &[point()], &medium())
        .unwrap();
    assert_eq!(matrices.len(), 1);
    let m = matrices[0];

    // -2 pi i / lambda * (a + bi) = 2 pi / lambda * (b - ai)
    let k = 2.0 * PI / MED_WAVELEN;
    let expected: [((usize, usize), Complex<f64>); 4] = [
        ((0, 0), Complex::new(k * 0.5, -k * 1.0)),
        ((0, 1), Complex::new(k * -0.2, -k * 0.1)),
        ((1, 0), -Complex::new(k * 0.0, -k * 0.3)),
        ((1, 1), -Complex::new(k * -0.4, -k * 0.8)),
    ];
    for (index, value) in expected {
        assert!(
            (m[index] - value).norm() < 1e-9,
            "element {:?}: {} != {}",
            index,
            m[index],
            value
        );
    }

    // the encoded sphere has unit aspect ratio and no rotation
    let input = fs::read_to_string(&capture).unwrap();
    let lines: Vec<&str> = input.lines().collect();
    assert_eq!(lines[0], "0.5");
    assert_eq!(lines[4..9], ["1", "0", "0", "-1", "1"]);
    assert_eq!(lines.len(), 10);

    assert!(common::is_empty(scratch.path()));
}

#[test]
fn sphere_field_end_to_end() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = common::tmatrix(&exe, scratch.path());

    let field = theory.calc_field(&sphere(), &[point()], &optics()).unwrap();
    assert_eq!(field.len(), 1);

    // recompute by hand: S' = S * P(phi), E = i/kr e^{ikr} S' (cos phi, sin phi)
    let k = 2.0 * PI / MED_WAVELEN;
    let c = Complex::new(0.0, -k);
    let s = [
        [c * Complex::new(1.0, 0.5), c * Complex::new(0.1, -0.2)],
        [-c * Complex::new(0.3, 0.0), -c * Complex::new(0.8, -0.4)],
    ];
    let SamplingPoint { kr, theta, phi } = point();
    let (sp, cp) = phi.sin_cos();
    let p = [[cp, sp], [-sp, cp]];
    let sp_mat = |i: usize, j: usize| s[i][0] * p[0][j] + s[i][1] * p[1][j];
    let einc = [cp, sp];
    let pre = Complex::i() / kr * Complex::new(0.0, kr).exp();
    let e_theta = pre * (sp_mat(0, 0) * einc[0] + sp_mat(0, 1) * einc[1]);
    let e_phi = -pre * (sp_mat(1, 0) * einc[0] + sp_mat(1, 1) * einc[1]);

    let ct = theta.cos();
    let st = theta.sin();
    let ex = e_theta * ct * cp - e_phi * sp;
    let ey = e_theta * ct * sp + e_phi * cp;
    let ez = -e_theta * st;

    let e = field.values[0];
    assert!((e[0] - ex).norm() < TOL * ex.norm().max(1.0));
    assert!((e[1] - ey).norm() < TOL * ey.norm().max(1.0));
    assert!((e[2] - ez).norm() < TOL * ez.norm().max(1.0));
    assert!((field.med_wavelen - MED_WAVELEN).abs() < 1e-12);
    let intensity = ex.norm_sqr() + ey.norm_sqr() + ez.norm_sqr();
    assert!((field.intensity()[0] - intensity).abs() < 1e-12);
}

#[test]
fn repeated_calls_are_identical() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = common::tmatrix(&exe, scratch.path());
    let detector = Detector::new((4, 5), [0.1, 0.1]);

    let first = theory.calc_holo(&sphere(), &detector, &optics(), 1.0).unwrap();
    let second = theory.calc_holo(&sphere(), &detector, &optics(), 1.0).unwrap();
    assert_eq!(first.shape(), (4, 5));
    assert_eq!(first, second);
    assert!(first.pixels.iter().all(|v| v.is_finite()));
}

#[test]
fn axisymmetric_encoding() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let capture = dir.path().join("input.txt");
    let exe = common::tmatrix_stub(dir.path(), ROW, &capture);
    let theory = common::tmatrix(&exe, scratch.path());

    for (shape, radius) in [(-1, (0.4f64 * 0.8 * 0.8).cbrt()), (-2, (1.5f64 * 0.4 * 0.8 * 0.8).cbrt())] {
        let particle = Scatterer::Axisymmetric(Axisymmetric {
            r: [0.8, 0.4],
            n: Complex::new(1.59, 0.001),
            center: Point3::new(0.0, 0.0, 10.0),
            rotation: (PI / 2.0, PI / 4.0),
            shape,
        });
        theory
            .raw_scat_matrs(&particle, &[point(), point()], &medium())
            .unwrap();

        let input = fs::read_to_string(&capture).unwrap();
        let values: Vec<f64> = input
            .lines()
            .take(9)
            .map(|l| l.trim().parse().unwrap())
            .collect();
        assert!((values[0] - radius).abs() < TOL);
        assert!((values[4] - 2.0).abs() < TOL);
        assert!((values[5] - 45.0).abs() < TOL);
        assert!((values[6] - 90.0).abs() < TOL);
        assert_eq!(values[7], shape as f64);
        assert_eq!(values[8], 2.0);
    }
}

#[test]
fn unknown_shape_fails_before_scratch() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = common::tmatrix(&exe, scratch.path());

    let particle = Scatterer::Axisymmetric(Axisymmetric {
        r: [0.8, 0.4],
        n: Complex::new(1.59, 0.0),
        center: Point3::new(0.0, 0.0, 10.0),
        rotation: (0.0, 0.0),
        shape: -3,
    });
    let err = theory.calc_field(&particle, &[point()], &optics()).unwrap_err();
    assert!(matches!(err, Error::UnknownShape(-3)));
    assert!(common::is_empty(scratch.path()));
    assert!(!dir.path().join("input.txt").exists());
}

#[test]
fn empty_geometry_gives_empty_field() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = common::tmatrix(&exe, scratch.path());

    let field = theory.calc_field(&sphere(), &[], &optics()).unwrap();
    assert!(field.is_empty());
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn zero_radius_fails_before_scratch() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = common::tmatrix(&exe, scratch.path());

    let flat = Scatterer::Axisymmetric(Axisymmetric {
        r: [0.5, 0.0],
        n: Complex::new(1.59, 0.0),
        center: Point3::new(0.0, 0.0, 10.0),
        rotation: (0.0, 0.0),
        shape: -1,
    });
    let err = theory.calc_field(&flat, &[point()], &optics()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(common::is_empty(scratch.path()));
    assert!(!dir.path().join("input.txt").exists());
}

#[test]
fn incompatible_scatterer_creates_no_scratch() {
    let scratch = tempfile::tempdir().unwrap();
    // the executable is never looked at
    let theory = common::tmatrix(std::path::Path::new("/nonexistent/S.exe"), scratch.path());
    let dipoles = Scatterer::DipoleSet(DipoleSet {
        sites: vec![[0, 0, 0]],
        spacing: 0.05,
        n: Complex::new(1.5, 0.0),
        center: Point3::new(0.0, 0.0, 10.0),
    });

    assert!(!theory.can_handle(&dipoles));
    let err = theory.calc_field(&dipoles, &[point()], &optics()).unwrap_err();
    assert!(matches!(
        err,
        Error::TheoryNotCompatible {
            theory: TheoryKind::Tmatrix,
            ..
        }
    ));
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn missing_executable_creates_no_scratch() {
    let scratch = tempfile::tempdir().unwrap();
    let theory = common::tmatrix(std::path::Path::new("/nonexistent/S.exe"), scratch.path());
    let err = theory.calc_field(&sphere(), &[point()], &optics()).unwrap_err();
    assert!(matches!(err, Error::DependencyMissing { ref dep } if dep == "tmatrix"));
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn short_output_is_a_shape_mismatch() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::write_script(
        dir.path(),
        "S.exe",
        &format!("echo \"{}\" > tmatrix_tmp.out\n", ROW),
    );
    let theory = common::tmatrix(&exe, scratch.path());

    let points = [point(), point(), point()];
    let err = theory.raw_scat_matrs(&sphere(), &points, &medium()).unwrap_err();
    assert!(matches!(
        err,
        Error::ResultShapeMismatch {
            expected: 3,
            found: 1
        }
    ));
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn missing_output_is_not_found() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::write_script(dir.path(), "S.exe", "exit 0\n");
    let theory = common::tmatrix(&exe, scratch.path());

    let err = theory.raw_scat_matrs(&sphere(), &[point()], &medium()).unwrap_err();
    assert!(matches!(err, Error::ResultNotFound { found: 0, .. }));
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn solver_failure_reports_stderr() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::write_script(
        dir.path(),
        "S.exe",
        "echo 'convergence failed' >&2\nexit 3\n",
    );
    let theory = common::tmatrix(&exe, scratch.path());

    let err = theory.raw_scat_matrs(&sphere(), &[point()], &medium()).unwrap_err();
    match err {
        Error::SolverExecution { stderr, status, .. } => {
            assert_eq!(stderr, "convergence failed");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(common::is_empty(scratch.path()));
}

#[test]
fn kept_scratch_survives() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::tmatrix_stub(dir.path(), ROW, &dir.path().join("input.txt"));
    let theory = holoscat::tmatrix::Tmatrix {
        delete: false,
        ..common::tmatrix(&exe, scratch.path())
    };

    theory.raw_scat_matrs(&sphere(), &[point()], &medium()).unwrap();
    let kept: Vec<_> = fs::read_dir(scratch.path()).unwrap().collect();
    assert_eq!(kept.len(), 1);
    let kept = kept[0].as_ref().unwrap().path();
    assert!(kept.join("tmatrix_tmp.inp").is_file());
    assert!(kept.join("tmatrix_tmp.out").is_file());
    assert!(kept.join("S.exe").is_file());
}

#[test]
fn slow_solver_times_out() {
    let _guard = common::serial();
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let exe = common::write_script(dir.path(), "S.exe", "exec sleep 5\n");
    let theory = holoscat::tmatrix::Tmatrix {
        timeout: Some(Duration::from_millis(200)),
        ..common::tmatrix(&exe, scratch.path())
    };

    let err = theory.raw_scat_matrs(&sphere(), &[point()], &medium()).unwrap_err();
    assert!(matches!(err, Error::SolverTimeout { .. }));
    assert!(common::is_empty(scratch.path()));
}
