//! Wrapper around the `cdo` (Climate Data Operators) executable.

pub mod grid;

use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

use crate::locations::Selection;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        args: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Runs `program` with `args` and returns its output, failing on a
/// non-zero exit.
fn run_tool(program: &Path, args: &[OsString]) -> Result<Output, ToolError> {
    let rendered = args
        .iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(program = %program.display(), args = %rendered, "Running external tool");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.display().to_string(),
            args: rendered,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if !output.stderr.is_empty() {
        trace!(stderr = %String::from_utf8_lossy(&output.stderr), "Tool diagnostics");
    }

    Ok(output)
}

/// Creates a scratch file that is deleted when the guard is dropped.
pub fn scratch_file(suffix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(concat!(env!("CARGO_PKG_NAME"), ".tmp-"))
        .suffix(suffix)
        .tempfile()
        .context("Failed to create scratch file")?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;

    Ok(file)
}

#[derive(Debug, Clone)]
pub struct Cdo {
    program: PathBuf,
}

impl Cdo {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<String, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let output = run_tool(&self.program, &args)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Names of the variables stored in `file`.
    pub fn show_variables(&self, file: &Path) -> Result<Vec<String>, ToolError> {
        let stdout = self.run([OsString::from("showvar"), file.into()])?;

        Ok(stdout.split_whitespace().map(str::to_string).collect())
    }

    /// The grid description of `file`.
    pub fn grid_description(&self, file: &Path) -> Result<String, ToolError> {
        self.run([OsString::from("griddes"), file.into()])
    }

    /// Applies the operator chain to `input`, writing `output`.
    pub fn apply(&self, operators: &[String], input: &Path, output: &Path) -> Result<(), ToolError> {
        let args = operators
            .iter()
            .map(OsString::from)
            .chain([input.into(), output.into()]);
        self.run(args)?;

        Ok(())
    }

    /// Date/value table of the single field in `input`, without header.
    pub fn output_table(&self, input: &Path) -> Result<String, ToolError> {
        self.run([OsString::from("-outputtab,date,value,nohead"), input.into()])
    }

    /// Extracts the raw date/value table of `variable` at `selection`.
    ///
    /// `outputtab` runs on its own against an intermediate file: when it
    /// shares a chain with a remap, `cdo` writes remap diagnostics into the
    /// same stream as the table.
    pub fn extract_series(
        &self,
        file: &Path,
        variable: &str,
        selection: &Selection,
    ) -> Result<String> {
        let description = self.grid_description(file)?;
        let fixed_grid = grid::repair(&description)
            .with_context(|| format!("Unsupported grid in {}", file.display()))?
            .map(|patched| scratch_file(".grid", &patched))
            .transpose()?;

        let prepared = selection.prepare()?;
        let mut operators = prepared.operators.clone();
        if let Some(fixed) = &fixed_grid {
            operators.push(format!("-setgrid,{}", fixed.path().display()));
        }
        operators.push(format!("-selname,{}", variable));

        let intermediate = scratch_file(".nc", "")?;
        self.apply(&operators, file, intermediate.path())?;

        Ok(self.output_table(intermediate.path())?)
    }
}

// -- Tests -------------------------------------------------------------------
