//! Static location tables and their spatial selections.
//!
//! Coordinates are WGS84 decimal degrees (EPSG:4326), city positions taken
//! from Wikipedia.

use anyhow::Result;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::cdo::{grid, scratch_file};

/// How a location picks values out of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Selection {
    /// Value of the grid cell nearest to the point.
    Point { lat: f64, lon: f64 },
    /// Spatial mean over all cells inside the box.
    BoundingBox {
        west: f64,
        east: f64,
        south: f64,
        north: f64,
    },
}

/// Operators selecting one location, plus the scratch grid they refer to.
#[derive(Debug)]
pub struct PreparedSelection {
    pub operators: Vec<String>,
    _target_grid: Option<NamedTempFile>,
}

impl Selection {
    /// Builds the operators, writing a one-cell target grid for points.
    /// The grid file lives as long as the returned value.
    pub fn prepare(&self) -> Result<PreparedSelection> {
        match *self {
            Selection::Point { lat, lon } => {
                let target = scratch_file(".grid", &grid::nearest_neighbour(lon, lat))?;
                Ok(PreparedSelection {
                    operators: vec![format!("-remapnn,{}", target.path().display())],
                    _target_grid: Some(target),
                })
            }
            Selection::BoundingBox { .. } => Ok(PreparedSelection {
                operators: self.expression().split(' ').map(str::to_string).collect(),
                _target_grid: None,
            }),
        }
    }

    /// The selection as a self-contained `cdo` expression.
    pub fn expression(&self) -> String {
        match *self {
            Selection::Point { lat, lon } => format!("-remapnn,lon={}_lat={}", lon, lat),
            Selection::BoundingBox {
                west,
                east,
                south,
                north,
            } => format!("-fldmean -sellonlatbox,{},{},{},{}", west, east, south, north),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    #[serde(skip)]
    pub key: String,
    #[serde(flatten)]
    pub selection: Selection,
    pub name: String,
}

impl Location {
    pub fn point(key: &str, name: &str, lat: f64, lon: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            selection: Selection::Point { lat, lon },
        }
    }

    pub fn bounding_box(key: &str, name: &str, west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            selection: Selection::BoundingBox {
                west,
                east,
                south,
                north,
            },
        }
    }
}

const CITIES: &[(&str, &str, f64, f64)] = &[
    ("aalen", "Aalen", 48.837222, 10.093611),
    ("bamberg", "Bamberg", 49.891667, 10.891667),
    ("berlin", "Berlin", 52.518611, 13.408333),
    ("frankfurt", "Frankfurt", 50.110924, 8.682127),
    ("freiburg", "Freiburg", 47.994828, 7.849881),
    ("hamburg", "Hamburg", 53.550556, 9.993333),
    ("heidelberg", "Heidelberg", 49.41032, 8.69707),
    ("heidenheim", "Heidenheim", 48.67668, 10.15406),
    ("innsbruck", "Innsbruck", 47.269212, 11.404102),
    ("karlsruhe", "Karlsruhe", 49.014, 8.4043),
    ("kempten", "Kempten", 47.733333, 10.316667),
    ("koeln", "Köln", 50.937531, 6.960279),
    ("konstanz", "Konstanz", 47.66336, 9.17598),
    ("leipzig", "Leipzig", 51.339695, 12.373075),
    ("madrid", "Madrid", 40.4125, -3.703889),
    ("mailand", "Mailand", 45.4625, 9.186389),
    ("mannheim", "Mannheim", 49.48776, 8.46622),
    ("paris", "Paris", 48.856667, 2.351667),
    ("pforzheim", "Pforzheim", 48.8907, 8.70245),
    ("regensburg", "Regensburg", 49.01525, 12.10175),
    ("stuttgart", "Stuttgart", 48.775556, 9.182778),
    ("ulm", "Ulm", 48.400833, 9.987222),
    ("wien", "Wien", 48.208174, 16.373819),
    ("zuerich", "Zürich", 47.376887, 8.541694),
];

// west, east, south, north
const REGIONS: &[(&str, &str, f64, f64, f64, f64)] = &[
    ("baden_wuerttemberg", "Baden-Württemberg", 7.5, 10.5, 47.5, 49.8),
    ("bayern", "Bayern", 8.9, 13.9, 47.2, 50.6),
    ("deutschland", "Deutschland", 5.8, 15.1, 47.2, 55.1),
    ("alpenraum", "Alpenraum", 5.0, 16.5, 45.0, 48.5),
    ("mitteleuropa", "Mitteleuropa", 2.0, 20.0, 44.0, 56.0),
];

/// Named cities, extracted by nearest neighbour.
pub fn cities() -> Vec<Location> {
    CITIES
        .iter()
        .map(|&(key, name, lat, lon)| Location::point(key, name, lat, lon))
        .collect()
}

/// Regions, extracted as spatial means.
pub fn regions() -> Vec<Location> {
    REGIONS
        .iter()
        .map(|&(key, name, west, east, south, north)| {
            Location::bounding_box(key, name, west, east, south, north)
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
