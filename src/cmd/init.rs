use crate::data::{AutofillConfig, Persistable, Settings};
use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)?;
    run_in_dir(&dir, &mut std::io::stdout())?;
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes the default settings store and autofill config into `dir`.
/// Files that already exist are left alone.
pub(crate) fn run_in_dir<W: std::io::Write>(dir: &Path, out: &mut W) -> Result<()> {
    let settings_path = dir.join(Settings::filename());
    if settings_path.exists() {
        writeln!(out, "  - {} already exists, kept", Settings::filename())?;
    } else {
        Settings::default().save_to(dir)?;
        writeln!(out, "  ✓ {}", Settings::filename())?;
    }

    let config_path = dir.join("config.yaml");
    if config_path.exists() {
        writeln!(out, "  - config.yaml already exists, kept")?;
    } else {
        AutofillConfig::default().save_to(dir)?;
        writeln!(out, "  ✓ config.yaml")?;
    }
    Ok(())
}
