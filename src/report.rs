//! CSV export of the statistics history.
//!
//! Once [`ContextReportExt::add_statistics_reports`] has been called, every statistics snapshot
//! appends one `tick,series,value` row per series to the file of its collector,
//! `{directory}/{file_prefix}{collector}.csv`.
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::EpigridError;
use crate::statistics::ContextStatisticsExt;
use crate::HashMap;

/// One line of a statistics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub tick: usize,
    pub series: String,
    pub value: usize,
}

/// Where report files are written and what happens to existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            directory: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    pub fn directory(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.directory = directory.into();
        self
    }

    pub fn file_prefix(&mut self, file_prefix: impl Into<String>) -> &mut Self {
        self.file_prefix = file_prefix.into();
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// The file the report of `collector` is written to.
    pub fn report_path(&self, collector: &str) -> PathBuf {
        self.directory.join(format!("{}{collector}.csv", self.file_prefix))
    }
}

#[derive(Default)]
struct ReportData {
    options: ReportOptions,
    // Keyed by collector name.
    file_writers: RefCell<HashMap<String, Writer<File>>>,
}

define_data_plugin!(ReportPlugin, ReportData, ReportData::default());

// Checks that the path names a CSV file that may be written, creating its parent directories.
fn create_report_file(path: &Path, overwrite: bool) -> Result<File, EpigridError> {
    if path.extension().and_then(OsStr::to_str) != Some("csv") {
        return Err(EpigridError::ReportError(format!(
            "report files must be CSVs, got {}",
            path.display()
        )));
    }
    if !overwrite && path.exists() {
        return Err(EpigridError::ReportError(format!(
            "{} already exists; enable overwrite to replace it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

pub trait ContextReportExt {
    /// The options used by later calls to `add_report`.
    fn report_options(&mut self) -> &mut ReportOptions;

    /// Opens the report file for one collector.
    ///
    /// # Errors
    ///
    /// Returns `EpigridError::ReportError` if the file exists and overwriting is disabled,
    /// or an I/O error if it cannot be created.
    fn add_report(&mut self, collector: &str) -> Result<(), EpigridError>;

    /// Opens a report file for every registered collector.
    ///
    /// # Errors
    ///
    /// Stops at the first report that cannot be opened; see `add_report`.
    fn add_statistics_reports(&mut self) -> Result<(), EpigridError>;

    /// Writes one row per series to the report of `collector`. Does nothing if that report
    /// has not been opened.
    fn send_statistics(
        &self,
        collector: &str,
        tick: usize,
        series_names: &[String],
        values: &[usize],
    );
}

impl ContextReportExt for Context {
    fn report_options(&mut self) -> &mut ReportOptions {
        &mut self.get_data_mut(ReportPlugin).options
    }

    fn add_report(&mut self, collector: &str) -> Result<(), EpigridError> {
        let data = self.get_data_mut(ReportPlugin);
        let path = data.options.report_path(collector);
        let file = create_report_file(&path, data.options.overwrite)?;
        trace!("writing {collector} statistics to {}", path.display());
        data.file_writers
            .borrow_mut()
            .insert(collector.to_string(), Writer::from_writer(file));
        Ok(())
    }

    fn add_statistics_reports(&mut self) -> Result<(), EpigridError> {
        let collectors: Vec<String> = self
            .collector_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for collector in collectors {
            self.add_report(&collector)?;
        }
        Ok(())
    }

    fn send_statistics(
        &self,
        collector: &str,
        tick: usize,
        series_names: &[String],
        values: &[usize],
    ) {
        let Some(data) = self.get_data_container(ReportPlugin) else {
            return;
        };
        let mut file_writers = data
            .file_writers
            .try_borrow_mut()
            .expect("report writers are already borrowed");
        let Some(writer) = file_writers.get_mut(collector) else {
            return;
        };
        for (series, value) in series_names.iter().zip(values) {
            writer
                .serialize(StatisticsRow {
                    tick,
                    series: series.clone(),
                    value: *value,
                })
                .expect("Failed to write report row");
        }
        writer.flush().expect("Failed to flush writer");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::agents::{AgentKind, ContextAgentsExt};
    use crate::grid::ContextGridExt;
    use crate::parameters::{ContextParametersExt, Parameters};
    use crate::random::ContextRandomExt;

    fn setup() -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context
            .set_parameters(Parameters {
                num_agents: 4,
                start_infection_rate: 0.0,
                vaccine_batch_size: 0,
                ..Parameters::default()
            })
            .unwrap();
        context.init_grid();
        for _ in 0..4 {
            context.add_agent(AgentKind::Regular);
        }
        context.init_statistics();
        context
    }

    fn read_rows(path: &Path) -> Vec<StatisticsRow> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(Result::unwrap).collect()
    }

    #[test]
    fn one_report_per_collector() {
        let temp_dir = tempdir().unwrap();
        let mut context = setup();
        context
            .report_options()
            .directory(temp_dir.path())
            .file_prefix("run_");
        context.add_statistics_reports().unwrap();
        context.collect_statistics();

        for collector in ["state", "mask", "vaccination", "age", "death_time"] {
            let path = temp_dir.path().join(format!("run_{collector}.csv"));
            assert!(path.exists(), "missing report for {collector}");
        }

        let rows = read_rows(&temp_dir.path().join("run_state.csv"));
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows[0],
            StatisticsRow {
                tick: 0,
                series: "Susceptible".to_string(),
                value: 4,
            }
        );
    }

    #[test]
    fn rows_accumulate_across_snapshots() {
        let temp_dir = tempdir().unwrap();
        let mut context = setup();
        context.report_options().directory(temp_dir.path());
        context.add_report("mask").unwrap();
        context.collect_statistics();
        context.advance_tick();
        context.collect_statistics();

        let rows = read_rows(&temp_dir.path().join("mask.csv"));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].tick, 1);
        assert_eq!(rows[2].series, "Wearing Mask");
        assert!(!temp_dir.path().join("state.csv").exists());
    }

    #[test]
    fn existing_report_needs_overwrite() {
        let temp_dir = tempdir().unwrap();
        let mut context = setup();
        context.report_options().directory(temp_dir.path());
        context.add_report("state").unwrap();

        let result = context.add_report("state");
        assert!(matches!(result, Err(EpigridError::ReportError(_))));

        context.report_options().overwrite(true);
        context.add_report("state").unwrap();
    }

    #[test]
    fn nested_directories_are_created() {
        let temp_dir = tempdir().unwrap();
        let mut context = setup();
        let directory = temp_dir.path().join("a").join("b");
        context.report_options().directory(&directory);
        context.add_report("age").unwrap();
        assert!(directory.join("age.csv").exists());
    }

    #[test]
    fn only_csv_files_are_allowed() {
        let temp_dir = tempdir().unwrap();
        let result = create_report_file(&temp_dir.path().join("state.tsv"), true);
        match result {
            Err(EpigridError::ReportError(message)) => assert!(message.contains("must be CSVs")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn sending_without_reports_is_a_no_op() {
        let context = Context::new();
        context.send_statistics("state", 0, &["Infected".to_string()], &[1]);
    }
}
