//! CLI subcommands.

pub mod config;
pub mod regions;
pub mod simulate;

use std::fs;
use std::path::Path;

use geonotify::region::RegionCatalog;

use crate::error::CliError;

/// Load the catalog from `path`, or the built-in catalog.
pub fn load_catalog(path: Option<&Path>) -> Result<RegionCatalog, CliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|error| CliError::FileRead {
                path: path.to_path_buf(),
                error,
            })?;
            Ok(RegionCatalog::from_json(&json)?)
        }
        None => Ok(RegionCatalog::builtin()?),
    }
}
