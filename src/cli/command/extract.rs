//! Extract time series for a set of locations and write CSV/JSON pairs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::{
    archive::zip_directory,
    attributes::variable_attributes,
    cdo::Cdo,
    cli::create_progress_bar,
    config::Settings,
    locations::{self, Location},
    output::{save_metadata, save_table, MetadataRecord},
    series::{Series, Table},
};

use super::{fetch::load_nc_files, make_archive_file_name};

/// How extracted series are grouped into output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One table per variable with a column per location.
    Merged,
    /// One table per variable and location.
    PerLocation,
}

/// A location set paired with an output grouping.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: &'static str,
    pub locations: Vec<Location>,
    pub grouping: Grouping,
}

impl Variant {
    pub fn merged() -> Self {
        Self {
            name: "merged",
            locations: locations::cities(),
            grouping: Grouping::Merged,
        }
    }

    pub fn split() -> Self {
        Self {
            name: "split",
            locations: locations::cities(),
            grouping: Grouping::PerLocation,
        }
    }

    pub fn regions() -> Self {
        Self {
            name: "regions",
            locations: locations::regions(),
            grouping: Grouping::PerLocation,
        }
    }
}

/// Runs the whole pipeline and returns the path of the zip archive.
pub async fn extract(settings: &Settings, variant: &Variant) -> Result<PathBuf> {
    let csv_dir = settings.csv_dir();
    if csv_dir.exists() {
        fs::remove_dir_all(&csv_dir)
            .with_context(|| format!("Failed to clean {}", csv_dir.display()))?;
    }
    fs::create_dir_all(&csv_dir)?;

    let nc_files = load_nc_files(settings).await?;
    info!(files = nc_files.len(), variant = variant.name, "Extracting time series");

    let extractor = Extractor {
        cdo: Cdo::new(&settings.cdo),
        variant,
        csv_dir: csv_dir.clone(),
    };

    let bar = create_progress_bar(nc_files.len() as u64, "Extracting time series...".to_string());
    for nc_file in &nc_files {
        bar.set_message(file_stem(nc_file)?.to_string());
        extractor.process_file(nc_file)?;
        bar.inc(1);
    }
    bar.finish_with_message("Time series extracted");

    let archive_path = make_archive_file_name(settings, variant.name);
    zip_directory(&csv_dir, &archive_path)?;

    Ok(archive_path)
}

struct Extractor<'a> {
    cdo: Cdo,
    variant: &'a Variant,
    csv_dir: PathBuf,
}

impl Extractor<'_> {
    fn process_file(&self, nc_file: &Path) -> Result<()> {
        let variables = self.cdo.show_variables(nc_file)?;
        debug!(file = %nc_file.display(), ?variables, "Variables found");

        for variable in &variables {
            self.process_variable(nc_file, variable)?;
        }

        Ok(())
    }

    fn process_variable(&self, nc_file: &Path, variable: &str) -> Result<()> {
        info!(file = %nc_file.display(), variable, "Processing variable");

        let stem = file_stem(nc_file)?;
        let attributes = variable_attributes(nc_file, variable)?;
        let record = MetadataRecord::new(attributes);

        match self.variant.grouping {
            Grouping::Merged => {
                let name = output_name(stem, variable, None);
                let record = record.with_areas(&self.variant.locations)?;
                save_metadata(&record, &self.csv_dir.join(format!("{}.json", name)))?;

                let mut columns = Vec::with_capacity(self.variant.locations.len());
                for location in &self.variant.locations {
                    let series = self.extract(nc_file, variable, location)?;
                    columns.push((location.key.clone(), series));
                }
                save_table(
                    &Table::merge(columns)
                        .with_context(|| format!("Failed to merge {} in {}", variable, stem))?,
                    &self.csv_dir.join(format!("{}.csv", name)),
                )?;
            }
            Grouping::PerLocation => {
                for location in &self.variant.locations {
                    let name = output_name(stem, variable, Some(&location.key));
                    let series = self.extract(nc_file, variable, location)?;

                    save_metadata(
                        &record.clone().with_area(location),
                        &self.csv_dir.join(format!("{}.json", name)),
                    )?;
                    let table = Table::single("value", series).with_context(|| {
                        format!("Failed to tabulate {} at {}", variable, location.key)
                    })?;
                    save_table(
                        &table,
                        &self.csv_dir.join(format!("{}.csv", name)),
                    )?;
                }
            }
        }

        Ok(())
    }

    fn extract(&self, nc_file: &Path, variable: &str, location: &Location) -> Result<Series> {
        let table = self
            .cdo
            .extract_series(nc_file, variable, &location.selection)
            .with_context(|| {
                format!(
                    "Failed to extract {} at {} from {}",
                    variable,
                    location.key,
                    nc_file.display()
                )
            })?;
        let series = Series::parse(&table)
            .with_context(|| format!("Unexpected table for {} at {}", variable, location.key))?;

        if series.is_empty() {
            warn!(variable, location = %location.key, "No values extracted");
        } else {
            debug!(variable, location = %location.key, rows = series.len(), "Series extracted");
        }

        Ok(series)
    }
}

fn file_stem(nc_file: &Path) -> Result<&str> {
    nc_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| anyhow!("Unusable file name {}", nc_file.display()))
}

/// Base name shared by the CSV and JSON files of one output unit.
fn output_name(stem: &str, variable: &str, location: Option<&str>) -> String {
    match location {
        Some(location) => format!("{}-{}-{}", stem, variable, location),
        None => format!("{}-{}", stem, variable),
    }
}

// -- Tests -------------------------------------------------------------------


#[cfg(all(test, unix))]
mod pipeline_tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        attributes::tests::write_indicator_file,
        cdo::tests::{fake_cdo, fake_tool},
    };

    fn settings(tmp: &TempDir) -> Settings {
        let tools = tmp.path().join("bin");
        fs::create_dir_all(&tools).unwrap();

        let mut settings = Settings::with_data_dir(tmp.path().join("data"));
        settings.archive_dir = tmp.path().join("out");
        settings.secret_command = "false".to_string();
        settings.cdo = fake_cdo(&tools);

        fs::create_dir_all(settings.nc_dir()).unwrap();
        write_indicator_file(&settings.nc_dir().join("indicators.nc"));
        settings
    }

    fn two_cities() -> Variant {
        Variant {
            name: "test",
            locations: vec![
                Location::point("a", "A", 48.0, 9.0),
                Location::point("b", "B", 49.0, 10.0),
            ],
            grouping: Grouping::Merged,
        }
    }

    #[tokio::test]
    async fn should_write_merged_tables_per_variable() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);

        let archive = extract(&settings, &two_cities()).await.unwrap();

        let csv_dir = settings.csv_dir();
        let table = fs::read_to_string(csv_dir.join("indicators-fd.csv")).unwrap();
        assert_eq!(table, "date,a,b\n1981-07-01,12.5,12.5\n1982-07-01,13.0,13.0\n");
        assert!(csv_dir.join("indicators-hdd.csv").exists());

        let metadata: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(csv_dir.join("indicators-fd.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(metadata["long_name"], "Frost days");
        assert!(metadata.get("_FillValue").is_none());
        assert_eq!(metadata["areas"]["_crs"], "EPSG:4326");
        assert_eq!(metadata["areas"]["b"]["name"], "B");

        assert_eq!(archive, tmp.path().join("out/ecde-indicators-test.zip"));
        assert!(archive.exists());
    }

    #[tokio::test]
    async fn should_write_one_table_per_location() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        let variant = Variant {
            grouping: Grouping::PerLocation,
            ..two_cities()
        };

        extract(&settings, &variant).await.unwrap();

        let mut names: Vec<String> = fs::read_dir(settings.csv_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "indicators-fd-a.csv",
                "indicators-fd-a.json",
                "indicators-fd-b.csv",
                "indicators-fd-b.json",
                "indicators-hdd-a.csv",
                "indicators-hdd-a.json",
                "indicators-hdd-b.csv",
                "indicators-hdd-b.json",
            ]
        );

        let table = fs::read_to_string(settings.csv_dir().join("indicators-hdd-b.csv")).unwrap();
        assert_eq!(table, "date,value\n1981-07-01,12.5\n1982-07-01,13.0\n");

        let metadata: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(settings.csv_dir().join("indicators-hdd-b.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(metadata["units"], "K d");
        assert_eq!(metadata["area"]["selection"], "-remapnn,lon=10_lat=49");
    }

    #[tokio::test]
    async fn should_produce_identical_outputs_on_rerun() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);

        extract(&settings, &two_cities()).await.unwrap();
        let csv = fs::read(settings.csv_dir().join("indicators-fd.csv")).unwrap();
        let json = fs::read(settings.csv_dir().join("indicators-fd.json")).unwrap();
        fs::write(settings.csv_dir().join("leftover.csv"), "").unwrap();

        extract(&settings, &two_cities()).await.unwrap();

        assert_eq!(csv, fs::read(settings.csv_dir().join("indicators-fd.csv")).unwrap());
        assert_eq!(json, fs::read(settings.csv_dir().join("indicators-fd.json")).unwrap());
        assert!(!settings.csv_dir().join("leftover.csv").exists());
    }

    #[tokio::test]
    async fn should_abort_on_failing_tool() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        settings.cdo = fake_tool(&tmp.path().join("bin"), "cdo-broken", "exit 1\n");

        let err = extract(&settings, &two_cities()).await.unwrap_err();

        assert!(err.downcast_ref::<crate::cdo::ToolError>().is_some());
        assert!(!tmp.path().join("out/ecde-indicators-test.zip").exists());
    }

    #[tokio::test]
    async fn should_abort_when_a_date_repeats() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        settings.cdo = fake_tool(
            &tmp.path().join("bin"),
            "cdo-levels",
            r#"case "$1" in
  showvar) echo " fd" ;;
  griddes) printf 'gridtype  = lonlat\n' ;;
  -outputtab*) printf '1981-07-01 1\n1981-07-01 2\n' ;;
  *) for last; do :; done; : > "$last" ;;
esac
"#,
        );

        let err = extract(&settings, &two_cities()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Duplicate date 1981-07-01"));
        assert!(!tmp.path().join("out/ecde-indicators-test.zip").exists());
    }
}
