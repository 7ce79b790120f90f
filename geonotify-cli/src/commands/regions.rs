//! `geonotify regions`

use std::path::Path;

use clap::Args;
use console::style;
use geonotify::geo::{validate_coordinates, GeoPoint};
use geonotify::region::Region;

use super::load_catalog;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RegionsArgs {
    /// Only show regions containing this latitude
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Only show regions containing this longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: RegionsArgs, catalog_path: Option<&Path>) -> Result<(), CliError> {
    let catalog = load_catalog(catalog_path)?;

    let point = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => {
            validate_coordinates(lat, lon)?;
            Some(GeoPoint::new(lat, lon))
        }
        _ => None,
    };

    let regions: Vec<&Region> = match point {
        Some(point) => catalog.regions_containing(point).collect(),
        None => catalog.list_regions().iter().collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&regions)?;
        println!("{}", json);
        return Ok(());
    }

    if regions.is_empty() {
        println!("No regions found.");
        return Ok(());
    }

    println!(
        "{:<22} {:<28} {:>10} {:>10} {:>8}",
        style("ID").bold(),
        style("NAME").bold(),
        style("LAT").bold(),
        style("LON").bold(),
        style("RADIUS").bold()
    );
    for region in &regions {
        let distance = point
            .map(|p| format!("  {:.0} m from centre", region.center().distance_to(&p)))
            .unwrap_or_default();
        println!(
            "{:<22} {:<28} {:>10.4} {:>10.4} {:>6.0} m{}",
            style(&region.id).cyan(),
            region.name,
            region.center_latitude,
            region.center_longitude,
            region.radius_meters,
            distance
        );
    }
    println!();
    println!("{} region(s)", regions.len());

    Ok(())
}
