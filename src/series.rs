//! Date-indexed series parsed from `cdo outputtab` text.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn from_line(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let (Some(date), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(anyhow!("Expected `date value`, got `{}`", line.trim()));
        };

        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .with_context(|| format!("Invalid date in `{}`", line.trim()))?;
        let value = value
            .parse::<f64>()
            .with_context(|| format!("Invalid value in `{}`", line.trim()))?;

        Ok(Observation { date, value })
    }
}

/// Values of one variable at one location, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub observations: Vec<Observation>,
}

impl Series {
    /// Parses a whitespace separated date/value table; blank lines are skipped.
    pub fn parse(table: &str) -> Result<Self> {
        let observations = table
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Observation::from_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Series { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Series joined on their dates, one named column per series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl Table {
    /// Outer-joins the series by date. Columns keep the given order; cells
    /// without a value stay empty.
    ///
    /// A series holding the same date twice is an error: every cell takes
    /// exactly one observation.
    pub fn merge(series: Vec<(String, Series)>) -> Result<Self> {
        let width = series.len();
        let mut columns = Vec::with_capacity(width);
        let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

        for (index, (column, values)) in series.into_iter().enumerate() {
            for observation in values.observations {
                let cell = &mut rows
                    .entry(observation.date)
                    .or_insert_with(|| vec![None; width])[index];
                if let Some(previous) = cell {
                    bail!(
                        "Duplicate date {} in column {} ({} and {})",
                        observation.date.format(DATE_FORMAT),
                        column,
                        previous,
                        observation.value
                    );
                }
                *cell = Some(observation.value);
            }
            columns.push(column);
        }

        Ok(Table { columns, rows })
    }

    pub fn single(column: &str, series: Series) -> Result<Self> {
        Self::merge(vec![(column.to_string(), series)])
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_parse_line() {
        let observation = Observation::from_line("  1986-07-02      27.5 ").unwrap();

        assert_eq!(observation.date, date(1986, 7, 2));
        assert_eq!(observation.value, 27.5);
    }

    #[test]
    fn should_parse_exponent_values() {
        let observation = Observation::from_line("2000-01-01 -9e+33").unwrap();
        assert_eq!(observation.value, -9e33);
    }

    #[test]
    fn should_reject_malformed_lines() {
        assert!(Observation::from_line("1986-07-02").is_err());
        assert!(Observation::from_line("1986-07-02 1 2").is_err());
        assert!(Observation::from_line("cdo remapnn: Processed 1 variable").is_err());
        assert!(Observation::from_line("07/02/1986 3").is_err());
    }

    #[test]
    fn should_parse_one_row_per_time_step() {
        let table = "1981-07-01 1\n\n1982-07-01 2\n1983-07-01 3\n";
        let series = Series::parse(table).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.observations[2].value, 3.0);
    }

    #[test]
    fn should_merge_two_locations_aligned_by_date() {
        let a = Series::parse("1981-07-01 1\n1982-07-01 2\n").unwrap();
        let b = Series::parse("1982-07-01 20\n1981-07-01 10\n").unwrap();

        let table = Table::merge(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();

        assert_eq!(table.columns, vec!["A", "B"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[&date(1981, 7, 1)], vec![Some(1.0), Some(10.0)]);
        assert_eq!(table.rows[&date(1982, 7, 1)], vec![Some(2.0), Some(20.0)]);
    }

    #[test]
    fn should_leave_gaps_for_missing_dates() {
        let a = Series::parse("1981-07-01 1\n1982-07-01 2\n").unwrap();
        let b = Series::parse("1982-07-01 20\n").unwrap();

        let table = Table::merge(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();

        assert_eq!(table.rows[&date(1981, 7, 1)], vec![Some(1.0), None]);
    }

    #[test]
    fn should_reject_repeated_dates_within_a_series() {
        let series =
            Series::parse("1981-07-01 1\n1981-07-01 2\n1982-07-01 3\n1982-07-01 4\n").unwrap();

        let err = Table::single("value", series).unwrap_err();

        assert!(err.to_string().contains("Duplicate date 1981-07-01 in column value"));
    }

    #[test]
    fn should_allow_same_date_across_columns() {
        let a = Series::parse("1981-07-01 1\n").unwrap();
        let b = Series::parse("1981-07-01 1\n").unwrap();

        let table = Table::merge(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();

        assert_eq!(table.rows[&date(1981, 7, 1)], vec![Some(1.0), Some(1.0)]);
    }
}
