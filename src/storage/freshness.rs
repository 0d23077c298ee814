use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp layout of the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the freshness file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FreshnessRecord {
    search: String,
    date: String,
}

impl FreshnessRecord {
    fn boundary(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT).with_context(|| {
            format!("Invalid date '{}' for search '{}'", self.date, self.search)
        })
    }
}

/// Per-search boundary below which listings were already seen.
///
/// Backed by a two-column CSV (`search`, `date`) that is read in full on
/// every lookup and rewritten in full on every update. Only one process may
/// use a given file at a time.
#[derive(Debug, Clone)]
pub struct FreshnessStore {
    path: PathBuf,
}

/// Midnight of the day `now` falls on
pub fn start_of_day(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(NaiveTime::MIN)
}

impl FreshnessStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<FreshnessRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let records = reader
            .deserialize::<FreshnessRecord>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Corrupt freshness file {}", self.path.display()))?;

        Ok(records)
    }

    /// Stored boundary for `search_key`, if the search ran before
    pub fn lookup(&self, search_key: &str) -> Result<Option<NaiveDateTime>> {
        let key = search_key.trim();
        let records = self.read_records()?;

        records
            .iter()
            .find(|record| record.search.trim() == key)
            .map(FreshnessRecord::boundary)
            .transpose()
    }

    /// Insert or overwrite the boundary of `search_key`.
    ///
    /// The whole table goes to a sibling temp file first and is then renamed
    /// over the original.
    pub fn update(&self, search_key: &str, boundary: NaiveDateTime) -> Result<()> {
        let key = search_key.trim();
        let date = boundary.format(DATE_FORMAT).to_string();

        let mut records = self.read_records()?;
        match records.iter_mut().find(|record| record.search.trim() == key) {
            Some(record) => record.date = date,
            None => records.push(FreshnessRecord {
                search: key.to_string(),
                date,
            }),
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            for record in &records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Stored boundary {} for '{}'", boundary, key);
        Ok(())
    }
}
