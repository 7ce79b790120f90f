//! Region catalog: load-once list of circular regions with id lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{great_circle_distance_meters, validate_coordinates, GeoError, GeoPoint};

/// Catalog shipped with the application.
const BUILTIN_CATALOG_JSON: &str = include_str!("../../data/regions.json");

/// Errors building or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Region not found: {0}")]
    NotFound(String),

    #[error("Duplicate region id: {0}")]
    DuplicateId(String),

    #[error("Region has an empty id")]
    EmptyId,

    #[error("Region {id} has invalid radius {radius} (must be > 0)")]
    InvalidRadius { id: String, radius: f64 },

    #[error("Region {id} has invalid centre: {source}")]
    InvalidCenter {
        id: String,
        #[source]
        source: GeoError,
    },

    #[error("Failed to parse region catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A named circular region (point of interest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_meters: f64,
}

impl Region {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        center_latitude: f64,
        center_longitude: f64,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center_latitude,
            center_longitude,
            radius_meters,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_latitude, self.center_longitude)
    }

    /// Whether the point lies within the region's circle (boundary inclusive).
    pub fn contains(&self, point: GeoPoint) -> bool {
        great_circle_distance_meters(self.center(), point) <= self.radius_meters
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyId);
        }
        // Written as a negated comparison so NaN is rejected too
        if !(self.radius_meters > 0.0) {
            return Err(CatalogError::InvalidRadius {
                id: self.id.clone(),
                radius: self.radius_meters,
            });
        }
        validate_coordinates(self.center_latitude, self.center_longitude).map_err(|source| {
            CatalogError::InvalidCenter {
                id: self.id.clone(),
                source,
            }
        })
    }
}

/// Immutable, ordered collection of regions with reverse lookup by id.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl RegionCatalog {
    /// Build a catalog, validating every region.
    pub fn new(regions: Vec<Region>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(regions.len());
        for (position, region) in regions.iter().enumerate() {
            region.validate()?;
            if index.insert(region.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(region.id.clone()));
            }
        }
        Ok(Self { regions, index })
    }

    /// Parse a catalog from a JSON array of regions.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let regions: Vec<Region> = serde_json::from_str(json)?;
        Self::new(regions)
    }

    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    /// All regions in load order.
    pub fn list_regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Region, CatalogError> {
        self.index
            .get(id)
            .map(|&position| &self.regions[position])
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Regions whose circle contains the point, in load order.
    pub fn regions_containing(&self, point: GeoPoint) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.contains(point))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
