use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::data::{Event, PanelRow, RegionalIndex};
use crate::errors::PipelineError;
use crate::source::{RawTable, TableSource};
use crate::types::{CellValue, SourceId};

const INDEX_HEADER: [&str; 3] = ["date", "region7", "stress_index"];
const EVENTS_HEADER: [&str; 2] = ["event_date", "event_type"];
const PANEL_HEADER: [&str; 6] = [
    "event_date",
    "event_type",
    "region7",
    "pre_mean",
    "post_mean",
    "delta_stress",
];

/// Delimited file on disk exposed as a table source.
#[derive(Clone, Debug)]
pub struct CsvFileSource {
    id: SourceId,
    path: PathBuf,
    delimiter: u8,
}

impl CsvFileSource {
    /// Comma-delimited file at `path`.
    pub fn new(id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Use a different field delimiter (e.g. `b';'`).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// File this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvFileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<RawTable, PipelineError> {
        read_delimited(&self.path, &self.id, self.delimiter)
    }
}

/// Read a comma-delimited file with a header row into a `RawTable`.
///
/// Rows may be ragged; fields are trimmed. A file without a header row is
/// malformed.
pub fn read_table(path: impl AsRef<Path>, source_id: &str) -> Result<RawTable, PipelineError> {
    read_delimited(path.as_ref(), source_id, b',')
}

fn read_delimited(path: &Path, source_id: &str, delimiter: u8) -> Result<RawTable, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|column| column.is_empty()) {
        return Err(PipelineError::malformed(
            source_id,
            format!("{} has no header row", path.display()),
        ));
    }
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(
        "[shock_response:transport] read {} rows x {} columns from {}",
        rows.len(),
        columns.len(),
        path.display()
    );
    Ok(RawTable::new(source_id, columns, rows))
}

fn write_rows<T, W>(writer: W, header: &[&str], rows: &[T]) -> Result<(), PipelineError>
where
    T: Serialize,
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(!rows.is_empty()).from_writer(writer);
    if rows.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File, PipelineError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Write the index as `date,region7,stress_index`.
pub fn write_index(path: impl AsRef<Path>, index: &RegionalIndex) -> Result<(), PipelineError> {
    let path = path.as_ref();
    write_rows(create(path)?, &INDEX_HEADER, index.rows())?;
    info!(
        "[shock_response:transport] wrote {} index rows to {}",
        index.len(),
        path.display()
    );
    Ok(())
}

/// Write events as `event_date,event_type`.
pub fn write_events(path: impl AsRef<Path>, events: &[Event]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    write_rows(create(path)?, &EVENTS_HEADER, events)?;
    info!(
        "[shock_response:transport] wrote {} events to {}",
        events.len(),
        path.display()
    );
    Ok(())
}

/// Write the panel; missing window means become empty fields.
pub fn write_panel(path: impl AsRef<Path>, panel: &[PanelRow]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    write_rows(create(path)?, &PANEL_HEADER, panel)?;
    info!(
        "[shock_response:transport] wrote {} panel rows to {}",
        panel.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EventType;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn read_table_trims_and_tolerates_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quakes.csv");
        fs::write(
            &path,
            "Date , Magnitude,Depth\n31/10/2025 07:18:50, 4.6 ,7.0\n01/11/2025 10:00:00,3.1\n",
        )
        .unwrap();
        let table = read_table(&path, "earthquakes").unwrap();
        assert_eq!(table.columns(), ["Date", "Magnitude", "Depth"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], "4.6");
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let source = CsvFileSource::new("prices", dir.path().join("absent.csv"));
        assert!(matches!(source.load(), Err(PipelineError::Csv(_) | PipelineError::Io(_))));
    }

    #[test]
    fn semicolon_delimited_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "Date;Price\n11/23/2025;41.2\n").unwrap();
        let table = CsvFileSource::new("prices", &path)
            .with_delimiter(b';')
            .load()
            .unwrap();
        assert_eq!(table.columns(), ["Date", "Price"]);
        assert_eq!(table.rows()[0], vec!["11/23/2025".to_string(), "41.2".to_string()]);
    }

    #[test]
    fn panel_writer_leaves_missing_means_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("panel.csv");
        let panel = vec![PanelRow {
            event_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            event_type: EventType::FxShock,
            entity_group: "Ege".to_string(),
            pre_mean: None,
            post_mean: Some(0.5),
            delta: None,
        }];
        write_panel(&path, &panel).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("event_date,event_type,region7,pre_mean,post_mean,delta_stress")
        );
        assert_eq!(lines.next(), Some("2024-03-01,fx_shock,Ege,,0.5,"));
    }

    #[test]
    fn empty_tables_still_get_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write_events(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "event_date,event_type");
    }
}
