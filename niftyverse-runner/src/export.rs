//! Bucket CSV artifacts.
//!
//! One column headed `ticker`, one symbol per row, in bucket order. Files
//! are written to a sibling temp file and renamed into place, so a failed
//! write never leaves a truncated bucket behind.

use crate::builder::BuildError;
use niftyverse_core::SymbolList;
use std::path::Path;

pub const TICKER_HEADER: &str = "ticker";

/// Encode a symbol list as CSV bytes.
pub fn export_symbols_csv(symbols: &SymbolList) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([TICKER_HEADER])?;
    for symbol in symbols {
        wtr.write_record([symbol.as_str()])?;
    }
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Write `symbols` to `path`, replacing any existing file.
pub fn write_bucket_csv(path: &Path, symbols: &SymbolList) -> Result<(), BuildError> {
    let bytes = export_symbols_csv(symbols).map_err(|source| BuildError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("csv.tmp");
    let io_err = |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Err(e) = std::fs::write(&tmp, &bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}
