use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::optics::Optics;
use crate::result::{ElectricField, Hologram};


#[derive(Serialize)]
struct HologramMetadata<'a> {
    shape: (usize, usize),
    optics: &'a Optics,
}

/// Sidecar file holding the metadata of an output grid.
pub fn metadata_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Write the hologram as a whitespace separated grid, one detector row per
/// line, with the optics in a JSON sidecar.
pub fn write_hologram(path: &Path, holo: &Hologram) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for row in holo.pixels.outer_iter() {
        let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    let meta = HologramMetadata {
        shape: holo.shape(),
        optics: &holo.optics,
    };
    let meta_file = File::create(metadata_path(path))?;
    serde_json::to_writer_pretty(meta_file, &meta)?;

    Ok(())
}

/// Write a scattered field as `ex.re ex.im ey.re ey.im ez.re ez.im` rows.
pub fn write_field(path: &Path, field: &ElectricField) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for e in &field.values {
        let line = e
            .iter()
            .flat_map(|c| [c.re, c.im])
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}
