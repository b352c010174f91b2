//! JSON sidecar describing one output table.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use crate::{config::CRS, locations::Location};

/// Source attributes of a variable plus the locations a table covers.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    fields: Map<String, Value>,
}

impl MetadataRecord {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { fields: attributes }
    }

    /// Records every location of a merged table under `areas`.
    pub fn with_areas(mut self, locations: &[Location]) -> Result<Self> {
        let mut areas = Map::new();
        for location in locations {
            areas.insert(location.key.clone(), serde_json::to_value(location)?);
        }
        areas.insert("_crs".to_string(), json!(CRS));

        self.fields.insert("areas".to_string(), Value::Object(areas));
        Ok(self)
    }

    /// Records the single location of a per-location table under `area`.
    pub fn with_area(mut self, location: &Location) -> Self {
        self.fields.insert(
            "area".to_string(),
            json!({
                "key": location.key,
                "name": location.name,
                "selection": location.selection.expression(),
                "_crs": CRS,
            }),
        );
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

pub fn save_metadata(record: &MetadataRecord, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, record.fields())?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
