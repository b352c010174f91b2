//! Grid descriptions in the `cdo griddes` text format.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("{axis}-axis mismatch: expected `{expected}`, found {found:?}")]
    AxisMismatch {
        axis: char,
        expected: &'static str,
        found: Option<String>,
    },
}

const LONLAT_AXES: [&str; 4] = [
    r#"xlongname = "longitude""#,
    r#"xunits    = "degrees_east""#,
    r#"ylongname = "latitude""#,
    r#"yunits    = "degrees_north""#,
];

/// Splits a `key = value` line. Continuation lines of multi-line values
/// yield `None`.
fn entry(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    Some((key, value.trim()))
}

fn values<'a>(description: &'a str, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    description
        .lines()
        .filter_map(entry)
        .filter(move |(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn check_axis(
    description: &str,
    key: &str,
    axis: char,
    expected: &'static str,
) -> Result<(), GridError> {
    let mut names = values(description, key).peekable();
    if names.peek().is_none() {
        return Err(GridError::AxisMismatch {
            axis,
            expected,
            found: None,
        });
    }

    for name in names {
        if name != expected {
            return Err(GridError::AxisMismatch {
                axis,
                expected,
                found: Some(name.to_string()),
            });
        }
    }

    Ok(())
}

/// Rewrites a `generic` grid as a `lonlat` grid with explicit axis metadata.
///
/// Returns `None` when the grid needs no patch. Only generic grids whose
/// axes are named `lon` and `lat` are patched; any other naming is an error.
pub fn repair(description: &str) -> Result<Option<String>, GridError> {
    let is_generic = values(description, "gridtype").any(|v| v == "generic");
    if !is_generic {
        return Ok(None);
    }

    check_axis(description, "xname", 'x', "lon")?;
    check_axis(description, "yname", 'y', "lat")?;

    let mut patched = String::with_capacity(description.len() + 128);
    for line in description.lines() {
        match entry(line) {
            Some(("gridtype", "generic")) => patched.push_str("gridtype  = lonlat"),
            _ => patched.push_str(line),
        }
        patched.push('\n');
    }
    for line in LONLAT_AXES {
        patched.push_str(line);
        patched.push('\n');
    }

    Ok(Some(patched))
}

/// A one-cell `lonlat` grid centred on the given coordinate, used as the
/// target of a nearest-neighbour remap.
pub fn nearest_neighbour(lon: f64, lat: f64) -> String {
    format!(
        "gridtype = lonlat\nxsize = 1\nysize = 1\nxfirst = {}\nyfirst = {}\n",
        lon, lat
    )
}

// -- Tests -------------------------------------------------------------------
