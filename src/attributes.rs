//! Variable attributes read through the netCDF library.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use netcdf::AttributeValue;
use serde_json::{Map, Value};

/// Attributes of `variable` in `file`, in file order. Attributes whose names
/// start with `_` are internal to the format and skipped.
pub fn variable_attributes(file: &Path, variable: &str) -> Result<Map<String, Value>> {
    let nc_file =
        netcdf::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let var = nc_file
        .variable(variable)
        .ok_or_else(|| anyhow!("No variable {} in {}", variable, file.display()))?;

    let mut attributes = Map::new();
    for attribute in var.attributes() {
        let name = attribute.name();
        if name.starts_with('_') {
            continue;
        }

        let value = attribute
            .value()
            .with_context(|| format!("Failed to read {}:{} in {}", variable, name, file.display()))?;
        attributes.insert(name.to_string(), to_json(value));
    }

    Ok(attributes)
}

/// Scalars map to JSON scalars, arrays to JSON arrays. Non-finite floats
/// become `null`.
pub fn to_json(value: AttributeValue) -> Value {
    match value {
        AttributeValue::Uchar(v) => Value::from(v),
        AttributeValue::Uchars(v) => Value::from(v),
        AttributeValue::Schar(v) => Value::from(v),
        AttributeValue::Schars(v) => Value::from(v),
        AttributeValue::Ushort(v) => Value::from(v),
        AttributeValue::Ushorts(v) => Value::from(v),
        AttributeValue::Short(v) => Value::from(v),
        AttributeValue::Shorts(v) => Value::from(v),
        AttributeValue::Uint(v) => Value::from(v),
        AttributeValue::Uints(v) => Value::from(v),
        AttributeValue::Int(v) => Value::from(v),
        AttributeValue::Ints(v) => Value::from(v),
        AttributeValue::Ulonglong(v) => Value::from(v),
        AttributeValue::Ulonglongs(v) => Value::from(v),
        AttributeValue::Longlong(v) => Value::from(v),
        AttributeValue::Longlongs(v) => Value::from(v),
        AttributeValue::Float(v) => float(v),
        AttributeValue::Floats(v) => Value::Array(v.into_iter().map(float).collect()),
        AttributeValue::Double(v) => Value::from(v),
        AttributeValue::Doubles(v) => Value::from(v),
        AttributeValue::Str(v) => Value::from(v),
        AttributeValue::Strs(v) => Value::from(v),
    }
}

// Widen through the shortest decimal form so 0.1f stays 0.1.
fn float(value: f32) -> Value {
    let widened = value
        .to_string()
        .parse::<f64>()
        .unwrap_or_else(|_| f64::from(value));

    Value::from(widened)
}

// -- Tests -------------------------------------------------------------------
