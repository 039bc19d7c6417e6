//! Reading input CSV files and writing analysis artifacts.

use crate::core::{Event, EventCatalog, EventCategory, ImpactDirection, ImpactMagnitude};
use crate::error::{RegimeError, Result};
use crate::preprocess::{parse_date, RawObservation};
use crate::report::{render_report, AnalysisArtifact};
use csv::{ByteRecord, StringRecord};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the structured artifact.
pub const ARTIFACT_FILE: &str = "analysis.json";
/// File name of the text report.
pub const REPORT_FILE: &str = "change_point_report.txt";

const EVENT_COLUMNS: [&str; 6] = [
    "date",
    "event_category",
    "event_description",
    "impact_direction",
    "impact_magnitude",
    "confidence_level",
];

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| RegimeError::Io(format!("failed to open '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Field `index` of a record, with invalid UTF-8 replaced so the row fails
/// value parsing instead of the whole file.
fn field(record: &ByteRecord, index: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(record.get(index).unwrap_or_default())
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| RegimeError::Parse(format!("missing '{name}' column")))
}

/// Read raw (date, price) rows from CSV with `Date` and `Price` columns,
/// matched case-insensitively. Values are left unparsed; undecodable bytes
/// become U+FFFD and the row is dropped later by preprocessing.
pub fn read_price_rows<R: Read>(reader: R) -> Result<Vec<RawObservation>> {
    let mut reader = csv_reader(reader);
    let headers = reader.headers()?.clone();
    let date_col = column(&headers, "date")?;
    let price_col = column(&headers, "price")?;

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(RawObservation::new(
            field(&record, date_col),
            field(&record, price_col),
        ));
    }
    Ok(rows)
}

pub fn load_price_rows(path: impl AsRef<Path>) -> Result<Vec<RawObservation>> {
    let path = path.as_ref();
    let rows = read_price_rows(open(path)?)?;
    info!(path = %path.display(), rows = rows.len(), "price file read");
    Ok(rows)
}

fn parse_event(record: &ByteRecord, cols: &[usize; 6]) -> Option<Event> {
    let text = |i: usize| field(record, cols[i]);
    let date = parse_date(&text(0))?;
    let direction: ImpactDirection = text(3).parse().ok()?;
    let magnitude: ImpactMagnitude = text(4).parse().ok()?;
    Some(
        Event::new(date, EventCategory::from(text(1).into_owned()), text(2))
            .direction(direction)
            .magnitude(magnitude)
            .confidence(text(5)),
    )
}

/// Read an event catalog. Rows that do not parse are dropped and counted.
pub fn read_events<R: Read>(reader: R) -> Result<EventCatalog> {
    let mut reader = csv_reader(reader);
    let headers = reader.headers()?.clone();
    let mut cols = [0; 6];
    for (slot, name) in cols.iter_mut().zip(EVENT_COLUMNS) {
        *slot = column(&headers, name)?;
    }

    let mut catalog = EventCatalog::default();
    for record in reader.byte_records() {
        match parse_event(&record?, &cols) {
            Some(event) => catalog.events.push(event),
            None => catalog.rows_dropped += 1,
        }
    }
    if catalog.rows_dropped > 0 {
        warn!(dropped = catalog.rows_dropped, "dropped unparseable event rows");
    }
    Ok(catalog)
}

/// Load the event catalog if the file exists. A missing file is `Ok(None)`.
pub fn load_events(path: impl AsRef<Path>) -> Result<Option<EventCatalog>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "event catalog not found; continuing without events");
        return Ok(None);
    }
    let catalog = read_events(open(path)?)?;
    info!(path = %path.display(), events = catalog.events.len(), "event catalog read");
    Ok(Some(catalog))
}

/// Where [`write_artifacts`] put its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub artifact: PathBuf,
    pub report: PathBuf,
}

/// Write `analysis.json` and the text report into `dir`, replacing any
/// previous run's files.
pub fn write_artifacts(dir: impl AsRef<Path>, artifact: &AnalysisArtifact) -> Result<ArtifactPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let paths = ArtifactPaths {
        artifact: dir.join(ARTIFACT_FILE),
        report: dir.join(REPORT_FILE),
    };
    let writer = BufWriter::new(File::create(&paths.artifact)?);
    serde_json::to_writer_pretty(writer, artifact)?;
    fs::write(&paths.report, render_report(artifact))?;

    info!(dir = %dir.display(), "artifacts written");
    Ok(paths)
}

pub fn read_artifact(path: impl AsRef<Path>) -> Result<AnalysisArtifact> {
    let file = open(path.as_ref())?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
