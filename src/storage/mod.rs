//! Flat-file sink. Each output is written once, in full, from memory;
//! a rerun truncates and rewrites it.

use crate::models::{CompanyRecord, PriceBar};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn write_company_info(path: &Path, rows: &[CompanyRecord]) -> Result<PathBuf> {
    write_rows(path, rows)
}

pub fn write_stock_prices(path: &Path, rows: &[PriceBar]) -> Result<PathBuf> {
    write_rows(path, rows)
}

/// Header comes from the row type's field names; no index column.
fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;

    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(path.to_path_buf())
}
