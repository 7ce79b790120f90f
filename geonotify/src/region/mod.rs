//! Points of interest monitored for enter/exit transitions.
//!
//! The [`RegionCatalog`] is built once (from the embedded catalog or a JSON
//! document) and never mutated afterwards. Other components refer to regions
//! by id and resolve them through [`RegionCatalog::find_by_id`].
//!
//! # Example
//!
//! ```
//! use geonotify::region::RegionCatalog;
//!
//! let catalog = RegionCatalog::builtin().unwrap();
//! let coral_bay = catalog.find_by_id("coral-bay").unwrap();
//! assert_eq!(coral_bay.name, "Coral Bay");
//! ```

mod catalog;

pub use catalog::{CatalogError, Region, RegionCatalog};
