#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use holoscat::dda::Dda;
use holoscat::tmatrix::Tmatrix;

static SERIAL: Mutex<()> = Mutex::new(());

/// Tests that write and run stub solvers hold this lock, so that no other
/// thread forks while a freshly written script is still open.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

/// A T-matrix stand-in that copies its input to `capture` and answers every
/// requested angle with `row` (eight whitespace separated numbers).
pub fn tmatrix_stub(dir: &Path, row: &str, capture: &Path) -> PathBuf {
    let body = format!(
        r#"cp tmatrix_tmp.inp "{capture}"
n=$(sed -n 9p tmatrix_tmp.inp)
: > tmatrix_tmp.out
i=0
while [ "$i" -lt "$n" ]; do
  echo "{row}" >> tmatrix_tmp.out
  i=$((i+1))
done
"#,
        capture = capture.display(),
        row = row
    );
    write_script(dir, "S.exe", &body)
}

/// An ADDA stand-in that records its arguments in `capture` and echoes the
/// requested angles with the amplitudes `s1 .. s4` given in `amplitudes`.
pub fn adda_stub(dir: &Path, amplitudes: &str, capture: &Path) -> PathBuf {
    adda_stub_shifted(dir, amplitudes, capture, 0.0)
}

/// Like `adda_stub`, but reports every theta `theta_offset` degrees away
/// from the requested one.
pub fn adda_stub_shifted(dir: &Path, amplitudes: &str, capture: &Path, theta_offset: f64) -> PathBuf {
    let body = format!(
        r#"if [ "$1" = "-V" ]; then
  echo "ADDA v.stub"
  exit 0
fi
echo "$@" > "{capture}"
run=run000_sphere_g16m1.2
mkdir "$run"
echo "theta phi s1.r s1.i s2.r s2.i s3.r s3.i s4.r s4.i" > "$run/ampl_scatgrid"
tail -n +4 scat_params.dat | awk '{{ print $1 + {offset}, $2, "{amplitudes}" }}' >> "$run/ampl_scatgrid"
"#,
        capture = capture.display(),
        amplitudes = amplitudes,
        offset = theta_offset
    );
    write_script(dir, "adda", &body)
}

pub fn tmatrix(executable: &Path, scratch_root: &Path) -> Tmatrix {
    Tmatrix {
        scratch_root: Some(scratch_root.to_path_buf()),
        ..Tmatrix::new(executable)
    }
}

pub fn dda(executable: &Path, scratch_root: &Path) -> Dda {
    Dda {
        scratch_root: Some(scratch_root.to_path_buf()),
        ..Dda::new(executable)
    }
}
