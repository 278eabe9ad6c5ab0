use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use nalgebra::Vector2;
use serde::Deserialize;

use crate::dda::Dda;
use crate::optics::{Detector, Optics};
use crate::scatterer::Scatterer;
use crate::theory::{ScatteringTheory, TheoryKind};
use crate::tmatrix::Tmatrix;


/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub theory: TheoryKind,
    pub tmatrix_executable: PathBuf,
    #[serde(default = "default_adda")]
    pub adda_executable: PathBuf,
    /// Remove scratch directories after each solver run.
    #[serde(default = "default_true")]
    pub delete_scratch: bool,
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Vacuum wavelength.
    pub wavelength: f64,
    pub medium_index: f64,
    pub polarization: [f64; 2],
    pub pixel_scale: [f64; 2],
    /// Detector shape as (rows, columns).
    pub shape: (usize, usize),
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    pub scatterer: Scatterer,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_adda() -> PathBuf {
    PathBuf::from("adda")
}

fn default_true() -> bool {
    true
}

fn default_alpha() -> f64 {
    1.0
}

fn default_output() -> PathBuf {
    PathBuf::from("hologram.dat")
}

impl Settings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs_f64)
    }

    pub fn optics(&self) -> Optics {
        Optics::new(
            self.wavelength,
            self.medium_index,
            Vector2::from(self.polarization),
            self.pixel_scale,
        )
    }

    pub fn detector(&self) -> Detector {
        Detector::new(self.shape, self.pixel_scale)
    }

    /// The configured scattering theory.
    pub fn build_theory(&self) -> Box<dyn ScatteringTheory> {
        match self.theory {
            TheoryKind::Tmatrix => Box::new(Tmatrix::from_settings(self)),
            TheoryKind::Dda => Box::new(Dda::from_settings(self)),
        }
    }
}

/// Loads `config/default.toml` without any overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("loading configuration")?;
    let config: Settings = settings
        .try_deserialize()
        .context("deserializing configuration")?;

    validate_config(&config)?;
    Ok(config)
}

/// Loads the configuration file, environment (`HOLOSCAT_*`) and command line
/// overrides, in increasing order of precedence.
pub fn load_config() -> Result<Settings> {
    let args = CliArgs::parse();
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if let Some(path) = &args.config {
        path.clone()
    } else if local_config.exists() {
        local_config
    } else {
        default_config_file
    };
    info!("using configuration {:?}", config_file);

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("holoscat"))
        .build()
        .context("loading configuration")?;
    let mut config: Settings = settings
        .try_deserialize()
        .context("deserializing configuration")?;

    if let Some(theory) = args.theory {
        config.theory = theory;
    }
    if let Some(path) = args.tmatrix {
        config.tmatrix_executable = path;
    }
    if let Some(path) = args.adda {
        config.adda_executable = path;
    }
    if args.keep {
        config.delete_scratch = false;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(wavelength) = args.w {
        config.wavelength = wavelength;
    }
    if let Some(index) = args.index {
        config.medium_index = index;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    validate_config(&config)?;
    info!("{}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// 1. `CARGO_MANIFEST_DIR`, when running through cargo.
/// 2. `HOLOSCAT_ROOT_DIR`, if set.
/// 3. The nearest ancestor of the executable holding a `config` directory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("HOLOSCAT_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("locating the current executable")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("could not find project root directory"))
}

pub fn validate_config(config: &Settings) -> Result<()> {
    ensure!(config.wavelength > 0.0, "Wavelength must be greater than 0");
    ensure!(
        config.medium_index > 0.0,
        "Medium refractive index must be greater than 0"
    );
    ensure!(
        config.pixel_scale.iter().all(|&s| s > 0.0),
        "Pixel scale must be positive"
    );
    ensure!(
        config.shape.0 > 0 && config.shape.1 > 0,
        "Detector shape must be non-empty"
    );
    ensure!(
        config.polarization.iter().any(|&p| p != 0.0),
        "Polarization must be non-zero"
    );
    if let Some(timeout) = config.timeout_secs {
        ensure!(timeout > 0.0, "Timeout must be greater than 0");
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "holoscat - holograms from external T-matrix and DDA solvers")]
pub struct CliArgs {
    /// Configuration file, overriding config/local.toml and config/default.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scattering theory to use.
    #[arg(long, value_enum)]
    theory: Option<TheoryKind>,

    /// Path to the compiled T-matrix executable.
    #[arg(long)]
    tmatrix: Option<PathBuf>,

    /// Name or path of the ADDA executable.
    #[arg(long)]
    adda: Option<PathBuf>,

    /// Keep the solver scratch directories for debugging.
    #[arg(long)]
    keep: bool,

    /// Kill the solver after this many seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Vacuum wavelength, in the units of the geometry.
    #[arg(short, long)]
    w: Option<f64>,

    /// Refractive index of the surrounding medium.
    #[arg(long)]
    index: Option<f64>,

    /// Scaling of the scattered field in the hologram.
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Output file for the hologram.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Theory: {}
  - Wavelength: {:.6}
  - Medium Refractive Index: {:.6}
  - Polarization: {:?}
  - Detector: {} x {} pixels of {:?}
  - Alpha: {:.4}
  - Scatterer: {:?}
  ",
            self.theory,
            self.wavelength,
            self.medium_index,
            self.polarization,
            self.shape.0,
            self.shape.1,
            self.pixel_scale,
            self.alpha,
            self.scatterer,
        )
    }
}
