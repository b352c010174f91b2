//! The two fixed dataset requests.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;

const REANALYSIS_VARIABLES: &[&str] = &[
    "growing_degree_days",
    "heating_degree_days",
    "cooling_degree_days",
    "tropical_nights",
    "hot_days",
    "warmest_three_day_period",
    "heatwave_days",
    "high_utci_days",
    "frost_days",
    "total_precipitation",
    "maximum_consecutive_five_day_precipitation",
    "extreme_precipitation_total",
    "frequency_of_extreme_precipitation",
    "consecutive_dry_days",
    "duration_of_meteorological_droughts",
    "magnitude_of_meteorological_droughts",
    "days_with_high_fire_danger",
    "extreme_wind_speed_days",
    "fire_weather_index",
];

// No UTCI indicator for the regional models.
const PROJECTION_VARIABLES: &[&str] = &[
    "growing_degree_days",
    "heating_degree_days",
    "cooling_degree_days",
    "tropical_nights",
    "hot_days",
    "warmest_three_day_period",
    "heatwave_days",
    "frost_days",
    "total_precipitation",
    "maximum_consecutive_five_day_precipitation",
    "extreme_precipitation_total",
    "frequency_of_extreme_precipitation",
    "consecutive_dry_days",
    "duration_of_meteorological_droughts",
    "magnitude_of_meteorological_droughts",
    "days_with_high_fire_danger",
    "extreme_wind_speed_days",
    "fire_weather_index",
];

const OTHER_PARAMETERS: &[&str] = &["30_c", "35_c", "40_c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Reanalysis,
    Projections,
}

/// Request body sent as the `inputs` of a CDS job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRequest {
    pub variable: Vec<String>,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcm: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rcm: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensemble_member: Option<Vec<String>>,
    pub temporal_aggregation: Vec<String>,
    pub spatial_aggregation: String,
    pub other_parameters: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Reanalysis,
    Projections,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Reanalysis, DatasetKind::Projections];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Reanalysis => "reanalysis",
            DatasetKind::Projections => "projections",
        }
    }

    /// Location of the downloaded archive below `cds_dir`.
    pub fn archive_path(&self, cds_dir: &Path) -> PathBuf {
        cds_dir.join(format!("{}.zip", self.name()))
    }

    pub fn request(&self) -> DatasetRequest {
        match self {
            DatasetKind::Reanalysis => DatasetRequest {
                variable: to_strings(REANALYSIS_VARIABLES),
                origin: Origin::Reanalysis,
                gcm: None,
                rcm: None,
                experiment: None,
                ensemble_member: None,
                temporal_aggregation: to_strings(&["yearly"]),
                spatial_aggregation: "gridded".to_string(),
                other_parameters: to_strings(OTHER_PARAMETERS),
            },
            DatasetKind::Projections => DatasetRequest {
                variable: to_strings(PROJECTION_VARIABLES),
                origin: Origin::Projections,
                gcm: Some(to_strings(&["mpi_esm_lr"])),
                rcm: Some(to_strings(&["cclm4_8_17"])),
                experiment: Some(to_strings(&["rcp4_5", "rcp8_5"])),
                ensemble_member: Some(to_strings(&["r1i1p1"])),
                temporal_aggregation: to_strings(&["yearly"]),
                spatial_aggregation: "gridded".to_string(),
                other_parameters: to_strings(OTHER_PARAMETERS),
            },
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_serialise_reanalysis_request_without_model_fields() {
        let value = serde_json::to_value(DatasetKind::Reanalysis.request()).unwrap();

        assert_eq!(value["origin"], json!("reanalysis"));
        assert_eq!(value["spatial_aggregation"], json!("gridded"));
        assert_eq!(value["temporal_aggregation"], json!(["yearly"]));
        assert_eq!(value["other_parameters"], json!(["30_c", "35_c", "40_c"]));
        assert_eq!(value["variable"].as_array().unwrap().len(), 19);
        assert!(value.get("gcm").is_none());
        assert!(value.get("experiment").is_none());
    }

    #[test]
    fn should_serialise_projection_model_parameters() {
        let value = serde_json::to_value(DatasetKind::Projections.request()).unwrap();

        assert_eq!(value["origin"], json!("projections"));
        assert_eq!(value["gcm"], json!(["mpi_esm_lr"]));
        assert_eq!(value["rcm"], json!(["cclm4_8_17"]));
        assert_eq!(value["experiment"], json!(["rcp4_5", "rcp8_5"]));
        assert_eq!(value["ensemble_member"], json!(["r1i1p1"]));
        assert_eq!(value["variable"].as_array().unwrap().len(), 18);
        assert!(!value["variable"]
            .as_array()
            .unwrap()
            .contains(&json!("high_utci_days")));
    }

    #[test]
    fn should_name_archives_after_kind() {
        let dir = Path::new("/data/cds");

        assert_eq!(
            DatasetKind::Reanalysis.archive_path(dir),
            PathBuf::from("/data/cds/reanalysis.zip")
        );
        assert_eq!(
            DatasetKind::Projections.archive_path(dir),
            PathBuf::from("/data/cds/projections.zip")
        );
    }
}
