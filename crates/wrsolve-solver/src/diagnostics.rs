//! On-disk artifacts: model dumps, per-attempt trace files and the note log.
//!
//! Without a directory every writer is a no-op except the note log, which
//! still keeps its lines in memory so they can be attached to results.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use wrsolve_core::{ModelInstance, format_number};

use crate::error::SolverError;

/// First line of every `.cols`/`.rows` trace file.
pub const TRACE_HEADER: &str = "quicklog version 1.0";

const NOTES_FILE: &str = "notes.log";

fn io_error(path: &Path, err: &std::io::Error) -> SolverError {
    SolverError::Diagnostics {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), SolverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
    }
    fs::write(path, contents).map_err(|err| io_error(path, &err))
}

/// Append-only human-readable log of strategies, tolerances and findings.
#[derive(Debug, Clone, Default)]
pub struct NoteLog {
    path: Option<PathBuf>,
    lines: Vec<String>,
}

impl NoteLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            lines: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a line. File errors are logged, never returned: a note must
    /// not be the reason a solve fails.
    pub fn write(&mut self, line: impl Into<String>) {
        let line = line.into();
        if let Some(path) = &self.path {
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{line}"));
            if let Err(err) = appended {
                tracing::warn!(
                    component = "diagnostics",
                    operation = "note",
                    status = "error",
                    path = %path.display(),
                    error = %err,
                    "Failed to append note"
                );
            }
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop the in-memory lines; the file keeps everything.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

/// Writes artifacts for one model under an optional directory.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
    model_name: String,
    trace: bool,
    notes: NoteLog,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Diagnostics {
    /// Write artifacts below `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created.
    pub fn new(dir: impl Into<PathBuf>, trace: bool) -> Result<Self, SolverError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| io_error(&dir, &err))?;
        Ok(Self {
            notes: NoteLog::new(Some(dir.join(NOTES_FILE))),
            dir: Some(dir),
            model_name: "model".to_string(),
            trace,
        })
    }

    /// Keep notes in memory and write nothing.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            model_name: "model".to_string(),
            trace: false,
            notes: NoteLog::default(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model_name = name.into();
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn notes(&self) -> &NoteLog {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteLog {
        &mut self.notes
    }

    /// Note prefixed with the model name.
    pub fn note(&mut self, line: impl AsRef<str>) {
        let line = format!("{} {}", self.model_name, line.as_ref());
        self.notes.write(line);
    }

    /// Write `<model><suffix>.lp` and `.mps`.
    ///
    /// Returns the written paths, or `None` without a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn dump(
        &self,
        instance: &ModelInstance,
        suffix: &str,
    ) -> Result<Option<(PathBuf, PathBuf)>, SolverError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let stem = format!("{}{}", self.model_name, suffix);
        let lp = dir.join(format!("{stem}.lp"));
        let mps = dir.join(format!("{stem}.mps"));
        write_file(&lp, &instance.to_lp_string())?;
        write_file(&mps, &instance.to_mps_string(&stem))?;
        tracing::info!(
            component = "diagnostics",
            operation = "dump",
            status = "success",
            path = %lp.display(),
            "Wrote model dump"
        );
        Ok(Some((lp, mps)))
    }

    /// Write `<model>_<tag>.cols` and `.rows` when tracing is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn trace(
        &self,
        instance: &ModelInstance,
        tag: &str,
    ) -> Result<Option<(PathBuf, PathBuf)>, SolverError> {
        let Some(dir) = self.dir.as_ref().filter(|_| self.trace) else {
            return Ok(None);
        };
        let stem = format!("{}_{}", self.model_name, tag);
        let cols = dir.join(format!("{stem}.cols"));
        let rows = dir.join(format!("{stem}.rows"));
        write_file(&cols, &trace_columns(instance))?;
        write_file(&rows, &trace_rows(instance))?;
        Ok(Some((cols, rows)))
    }
}

/// `is_int,name,weight,lower,upper` per column.
pub fn trace_columns(instance: &ModelInstance) -> String {
    let mut out = format!("{TRACE_HEADER}\n");
    for column in instance.columns() {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            u8::from(column.is_integer),
            column.name,
            format_number(column.objective),
            format_number(column.bounds.lower),
            format_number(column.bounds.upper)
        ));
    }
    out
}

/// `name,lower,upper,n,[idx],[coef]` per row.
pub fn trace_rows(instance: &ModelInstance) -> String {
    let mut out = format!("{TRACE_HEADER}\n");
    for row in instance.rows() {
        let indices: Vec<String> = row.columns.iter().map(ToString::to_string).collect();
        let coefficients: Vec<String> = row.coefficients.iter().map(|c| format_number(*c)).collect();
        out.push_str(&format!(
            "{},{},{},{},[{}],[{}]\n",
            row.name,
            format_number(row.bounds.lower),
            format_number(row.bounds.upper),
            row.len(),
            indices.join(", "),
            coefficients.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrsolve_core::{Bounds, Constraint, ModelBuilder, Sign, Variable};

    fn instance() -> ModelInstance {
        let variables = vec![
            Variable::continuous("x", Bounds::new(0.0, 5.0)).with_weight(2.0),
            Variable::integer("n", Bounds::new(0.0, 3.0)),
        ];
        let constraints = vec![
            Constraint::new("cap", Sign::LessEqual, -4.0)
                .term("x", 2.0)
                .term("n", -1.0),
        ];
        ModelBuilder::new(&variables, &constraints).build().unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wrsolve-diag-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn trace_files_use_quicklog_layout() {
        let instance = instance();
        let cols = trace_columns(&instance);
        assert!(cols.starts_with("quicklog version 1.0\n"));
        assert!(cols.contains("0,x,2,0,5\n"));
        assert!(cols.contains("1,n,0,0,3\n"));

        let rows = trace_rows(&instance);
        assert!(rows.contains("cap,-1e28,4,2,[0, 1],[2, -1]\n"));
    }

    #[test]
    fn disabled_diagnostics_keep_notes_only() {
        let mut diagnostics = Diagnostics::disabled();
        diagnostics.set_model_name("1921_10_c1");
        diagnostics.note("solveName: 2");
        assert_eq!(diagnostics.notes().lines(), ["1921_10_c1 solveName: 2"]);
        assert!(diagnostics.dump(&instance(), "_infeasible").unwrap().is_none());
    }

    #[test]
    fn dump_and_notes_are_written() {
        let dir = scratch_dir("dump");
        let mut diagnostics = Diagnostics::new(&dir, true).unwrap();
        diagnostics.set_model_name("cycle");
        diagnostics.note("first");
        diagnostics.note("second");

        let (lp, mps) = diagnostics
            .dump(&instance(), "_infeasible")
            .unwrap()
            .unwrap();
        assert_eq!(lp, dir.join("cycle_infeasible.lp"));
        assert!(fs::read_to_string(&lp).unwrap().contains("Subject To"));
        assert!(fs::read_to_string(&mps).unwrap().starts_with("NAME cycle_infeasible"));

        let (cols, _) = diagnostics.trace(&instance(), "2").unwrap().unwrap();
        assert_eq!(cols, dir.join("cycle_2.cols"));

        let notes = fs::read_to_string(dir.join(NOTES_FILE)).unwrap();
        assert_eq!(notes, "cycle first\ncycle second\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn trace_is_skipped_when_disabled() {
        let dir = scratch_dir("notrace");
        let diagnostics = Diagnostics::new(&dir, false).unwrap();
        assert!(diagnostics.trace(&instance(), "2").unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
