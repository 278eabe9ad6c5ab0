//! Running the external solvers inside scoped scratch directories.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use tempfile::TempDir;

use crate::encode::SolverInput;
use crate::error::{Error, Result};

const STDOUT_LOG: &str = "solver.stdout";
const STDERR_LOG: &str = "solver.stderr";
/// Interval between exit checks of a solver running under a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const SPAWN_RETRIES: usize = 50;
/// "Text file busy" on Linux and macOS.
const ETXTBSY: i32 = 26;


/// A uniquely named scratch directory for a single solver run.
///
/// The directory is removed when the value is dropped, on success and error
/// paths alike, unless it was created with `keep`.
#[derive(Debug)]
pub struct Scratch {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl Scratch {
    /// Creates the directory under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>, keep: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("holoscat-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!("created scratch directory {:?}", path);
        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Writes every file of a solver input.
    pub fn write_input(&self, input: &SolverInput) -> Result<()> {
        for (name, content) in &input.files {
            self.write_file(name, content)?;
        }
        Ok(())
    }

    /// Copies an executable into the directory, keeping its permissions.
    pub fn stage(&self, executable: &Path) -> Result<PathBuf> {
        let name = executable.file_name().ok_or_else(|| {
            Error::InvalidInput(format!("{:?} does not name a file", executable))
        })?;
        let target = self.path.join(name);
        fs::copy(executable, &target)?;
        Ok(target)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                info!("keeping scratch directory {:?}", path);
            } else if let Err(err) = dir.close() {
                log::warn!("could not remove scratch directory {:?}: {}", self.path, err);
            }
        }
    }
}

/// Fails with `DependencyMissing` unless `path` is an existing file.
pub fn require_file(dep: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        debug!("{} not found at {:?}", dep, path);
        Err(Error::DependencyMissing {
            dep: dep.to_string(),
        })
    }
}

/// Runs `<program> -V` to check that a solver on the path is usable.
/// Returns the version banner.
pub fn probe_version(dep: &str, program: &OsStr) -> Result<String> {
    let missing = || Error::DependencyMissing {
        dep: dep.to_string(),
    };
    let output = Command::new(program)
        .arg("-V")
        .stdin(Stdio::null())
        .output()
        .map_err(|_| missing())?;
    if !output.status.success() {
        return Err(missing());
    }
    let banner = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!("{} version: {}", dep, banner);
    Ok(banner)
}

fn spawn(program: &OsStr, args: &[String], cwd: &Path) -> Result<Child> {
    let mut attempts = 0;
    loop {
        let stdout = File::create(cwd.join(STDOUT_LOG))?;
        let stderr = File::create(cwd.join(STDERR_LOG))?;
        let spawned = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn();
        match spawned {
            // a freshly staged executable may still be open for writing in a
            // child forked by another thread
            Err(err) if err.raw_os_error() == Some(ETXTBSY) && attempts < SPAWN_RETRIES => {
                attempts += 1;
                thread::sleep(POLL_INTERVAL);
            }
            other => return Ok(other?),
        }
    }
}

/// Runs a solver to completion in `cwd`.
///
/// Standard output and error go to log files in `cwd`; the error log is
/// attached to `SolverExecution` on a non-zero exit.
pub fn run(
    solver: &str,
    program: &OsStr,
    args: &[String],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    debug!("running {:?} {} in {:?}", program, args.join(" "), cwd);

    let mut child = spawn(program, args, cwd)?;

    let status = match timeout {
        None => child.wait()?,
        Some(limit) => {
            let start = Instant::now();
            loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if start.elapsed() >= limit {
                    child.kill()?;
                    child.wait()?;
                    return Err(Error::SolverTimeout {
                        solver: solver.to_string(),
                        seconds: limit.as_secs_f64(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    if !status.success() {
        let stderr = fs::read(cwd.join(STDERR_LOG))
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .unwrap_or_default();
        return Err(Error::SolverExecution {
            solver: solver.to_string(),
            status,
            stderr,
        });
    }
    Ok(())
}
