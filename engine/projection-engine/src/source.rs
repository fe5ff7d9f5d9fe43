//! Record sources feeding raw simulation rows to the builder

use crate::config::ColumnConfig;
use crate::error::{ProjectionError, Result};
use crate::models::RawProjectionRecord;
use csv::StringRecord;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Supplier of raw projection records.
///
/// `freshness` must move forward whenever the underlying data changes; the
/// store reloads when it sees a newer token than the one it cached.
pub trait RecordSource: Send + Sync {
    /// Token describing the current version of the data
    fn freshness(&self) -> Result<SystemTime>;

    /// Read every record
    fn load(&self) -> Result<Vec<RawProjectionRecord>>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Reads records from a simulation table exported as CSV
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
    columns: ColumnConfig,
}

/// Header positions resolved against the candidate lists
#[derive(Debug)]
struct ColumnIndex {
    name: usize,
    id: Option<usize>,
    team: Option<usize>,
    position: Option<usize>,
    mean: Option<usize>,
    median: Option<usize>,
    ceiling: Option<usize>,
    curve: Option<usize>,
    extras: Vec<(String, usize)>,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnConfig) -> Self {
        Self { path: path.into(), columns }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn resolve_columns(&self, headers: &StringRecord) -> Result<ColumnIndex> {
        let name = find_column(headers, &self.columns.name).ok_or_else(|| ProjectionError::MissingColumn {
            file: self.file_name(),
            column: self.columns.name.first().cloned().unwrap_or_default(),
        })?;

        let extras = self
            .columns
            .extra_stats
            .iter()
            .filter_map(|column| {
                find_column(headers, std::slice::from_ref(column)).map(|idx| (column.clone(), idx))
            })
            .collect();

        Ok(ColumnIndex {
            name,
            id: find_column(headers, &self.columns.id),
            team: find_column(headers, &self.columns.team),
            position: find_column(headers, &self.columns.position),
            mean: find_column(headers, &self.columns.mean),
            median: find_column(headers, &self.columns.median),
            ceiling: find_column(headers, &self.columns.ceiling),
            curve: find_column(headers, &self.columns.curve),
            extras,
        })
    }
}

impl RecordSource for CsvRecordSource {
    fn freshness(&self) -> Result<SystemTime> {
        let metadata = std::fs::metadata(&self.path)
            .map_err(|_| ProjectionError::SourceMissing(self.path.clone()))?;
        Ok(metadata.modified()?)
    }

    fn load(&self) -> Result<Vec<RawProjectionRecord>> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => {}
            _ => return Err(ProjectionError::SourceMissing(self.path.clone())),
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let columns = self.resolve_columns(&headers)?;

        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut skipped = 0usize;

        for row in reader.records() {
            let row = row?;
            let name = text(&row, Some(columns.name)).unwrap_or_default();
            if name.is_empty() {
                skipped += 1;
                continue;
            }

            // Ids name export files, so explicit ones are slugged too
            let base_id = text(&row, columns.id)
                .map(|id| slugify(&id))
                .unwrap_or_else(|| slugify(&name));
            let id = unique_id(&base_id, &mut seen_ids);

            let extras: BTreeMap<String, Option<f64>> = columns
                .extras
                .iter()
                .map(|(column, idx)| (column.clone(), number(&row, Some(*idx))))
                .collect();

            records.push(RawProjectionRecord {
                id,
                name,
                team: text(&row, columns.team),
                position: text(&row, columns.position),
                mean: number(&row, columns.mean),
                median: number(&row, columns.median),
                ceiling: number(&row, columns.ceiling),
                curve: text(&row, columns.curve).map(serde_json::Value::String),
                extras,
            });
        }

        if skipped > 0 {
            debug!("Skipped {} rows without a player name in {}", skipped, self.file_name());
        }
        info!("Loaded {} projection records from {}", records.len(), self.path.display());

        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Position of the first candidate header present in the table
fn find_column(headers: &StringRecord, candidates: &[String]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h.trim() == candidate.as_str()))
}

fn text(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = row.get(idx?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Numeric cell; blanks, `NaN` and junk become `None`
fn number(row: &StringRecord, idx: Option<usize>) -> Option<f64> {
    let value = row.get(idx?)?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Filesystem-safe id from a player name ("Patrick Mahomes" -> "patrick-mahomes")
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "player".to_string()
    } else {
        slug
    }
}

fn unique_id(base: &str, seen: &mut HashSet<String>) -> String {
    let mut id = base.to_string();
    let mut suffix = 2;
    while !seen.insert(id.clone()) {
        id = format!("{base}-{suffix}");
        suffix += 1;
    }
    id
}
