//! Chart catalogs: map analysis tables to named chart specifications and
//! write them out.

pub mod multiplayer;
pub mod single_player;

use crate::chart::{ChartSpec, ChartWriter};
use crate::error::Result;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub dir: PathBuf,
    pub charts: Vec<PathBuf>,
    pub index: PathBuf,
}

/// Write a catalog and its index page into `dir`.
pub fn write_catalog(dir: &Path, heading: &str, specs: &[ChartSpec]) -> Result<ReportSummary> {
    let mut writer = ChartWriter::new(dir)?;
    let count = writer.write_all(specs)?;
    let index = writer.write_index(heading)?;
    info!("wrote {count} charts to {}", dir.display());
    Ok(ReportSummary {
        dir: dir.to_path_buf(),
        charts: writer.written().iter().map(|c| c.path.clone()).collect(),
        index,
    })
}
