use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

// Subdirectories under the configured data dir
pub const EDGAR_SUBDIR: &str = "edgar";
pub const INDEX_SUBDIR: &str = "edgar/indexes";
pub const ATTRS_SUBDIR: &str = "edgar/attrs";

/// Where quarterly index CSVs land.
pub fn index_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(INDEX_SUBDIR)
}

/// Where extracted attribute-value CSVs land.
pub fn attrs_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(ATTRS_SUBDIR)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}
