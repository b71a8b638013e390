// src/finance/loader.rs
//! CSV Asset Loading
//!
//! One file per asset, named `<ASSET>.csv`, with a header row and columns
//!
//! ```text
//! date, open, high, low, close, ...
//! ```
//!
//! Each row contributes one daily return `(close − open) / open`; the close of
//! the last row becomes the asset's last closing price.

use crate::error::{LoadAssetError, McError, McResult};
use crate::finance::asset::Asset;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const OPEN_COLUMN: usize = 1;
const CLOSE_COLUMN: usize = 4;

/// How many of the loaded assets take part in the option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCountType {
    /// First asset (by file name) only
    Single,
    /// Every asset in the directory, priced as an equally weighted basket
    Multiple,
}

impl TryFrom<u32> for AssetCountType {
    type Error = McError;

    fn try_from(choice: u32) -> McResult<Self> {
        match choice {
            1 => Ok(AssetCountType::Single),
            2 => Ok(AssetCountType::Multiple),
            other => Err(McError::InvalidSelection {
                what: "asset count".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for AssetCountType {
    type Err = McError;

    fn from_str(s: &str) -> McResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "single" => Ok(AssetCountType::Single),
            "2" | "multiple" | "multi" | "basket" => Ok(AssetCountType::Multiple),
            other => Err(McError::InvalidSelection {
                what: "asset count".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AssetCountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetCountType::Single => write!(f, "single"),
            AssetCountType::Multiple => write!(f, "multiple"),
        }
    }
}

fn parse_price(record: &csv::StringRecord, column: usize, label: &str) -> Result<f64, String> {
    let raw = record
        .get(column)
        .ok_or_else(|| format!("missing {} column", label))?;
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid {} price '{}'", label, raw))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} price must be positive, got {}", label, value));
    }
    Ok(value)
}

/// Read one asset file; the asset is named after the file stem
pub fn read_asset_file(path: &Path) -> Result<Asset, LoadAssetError> {
    let fail = |reason: String| LoadAssetError::FileRead {
        file: path.to_path_buf(),
        reason,
    };

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| fail("file has no name".to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| fail(e.to_string()))?;

    let mut daily_returns = Vec::new();
    let mut last_close = 0.0;
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| fail(e.to_string()))?;
        // row numbers are 1-based and skip the header
        let open = parse_price(&record, OPEN_COLUMN, "open")
            .map_err(|e| fail(format!("row {}: {}", row + 2, e)))?;
        let close = parse_price(&record, CLOSE_COLUMN, "close")
            .map_err(|e| fail(format!("row {}: {}", row + 2, e)))?;
        daily_returns.push((close - open) / open);
        last_close = close;
    }

    if daily_returns.is_empty() {
        return Err(fail("no data rows below the header".to_string()));
    }

    Asset::from_daily_returns(name, &daily_returns, last_close).map_err(|e| fail(e.to_string()))
}

/// Load every `*.csv` asset in `directory`, sorted by file name
///
/// Files that cannot be read are skipped with a warning. Returns
/// `DirectoryOpen` when the directory cannot be listed and `NoValidFiles`
/// when nothing usable was found. In `Single` mode only the first asset is kept.
pub fn load_assets(directory: &Path, count: AssetCountType) -> Result<Vec<Asset>, LoadAssetError> {
    let entries = fs::read_dir(directory).map_err(|source| LoadAssetError::DirectoryOpen {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "csv"))
        .collect();
    files.sort();
    debug!(directory = %directory.display(), files = files.len(), "found asset files");

    let mut assets = Vec::with_capacity(files.len());
    for file in &files {
        match read_asset_file(file) {
            Ok(asset) => {
                debug!(
                    asset = asset.name(),
                    mean = asset.return_mean(),
                    std_dev = asset.return_std_dev(),
                    last_close = asset.last_close(),
                    "loaded asset"
                );
                assets.push(asset);
                if count == AssetCountType::Single {
                    break;
                }
            }
            Err(e) => warn!("{}; skipping", e),
        }
    }

    if assets.is_empty() {
        return Err(LoadAssetError::NoValidFiles {
            path: directory.to_path_buf(),
        });
    }

    info!(count = assets.len(), "assets loaded");
    Ok(assets)
}
