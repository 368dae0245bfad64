use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Draw, LOTTERY_TYPE, PRIZE};
use crate::types::DrawRow;

/// In-memory draw table, always ordered by draw date ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawTable {
    draws: Vec<Draw>,
}

impl DrawTable {
    pub fn new(mut draws: Vec<Draw>) -> Self {
        draws.sort_by_key(|d| d.draw_date());
        Self { draws }
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.draws.iter().map(|d| d.draw_date()).max()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.draws.iter().map(|d| d.draw_date()).min()
    }

    /// Reads the table at `path`; a missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!("No draw table at {}", path.display());
            return Ok(Self::default());
        }

        let mut reader = csv::Reader::from_path(path).map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let mut draws = Vec::new();
        for (i, row) in reader.deserialize::<DrawRow>().enumerate() {
            // Header is line 1.
            let line = i + 2;
            let row = row.map_err(|source| StoreError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let draw = draw_from_row(&row).map_err(|message| StoreError::Row {
                path: path.to_path_buf(),
                row: line,
                message,
            })?;
            draws.push(draw);
        }

        info!("Loaded {} draws from {}", draws.len(), path.display());
        Ok(Self::new(draws))
    }

    /// Rewrites the whole table at `path`. Rows go to a sibling `.tmp` file
    /// first, which then replaces the table, so a failed write leaves the
    /// previous table intact.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = temp_path(path);
        if let Err(e) = self.write_rows(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Saved {} draws to {}", self.draws.len(), path.display());
        Ok(())
    }

    fn write_rows(&self, path: &Path) -> Result<(), StoreError> {
        let csv_err = |source: csv::Error| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        for draw in &self.draws {
            writer.serialize(row_from_draw(draw)).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Merges freshly fetched draws into `existing`.
///
/// Incoming draws dated on or before the latest existing date are dropped
/// first; the survivors go after the existing rows, repeated periods keep
/// their first occurrence, and the result is stably re-sorted by date.
pub fn merge(existing: &DrawTable, incoming: &[Draw]) -> DrawTable {
    let latest = existing.latest_date();

    let fresh = incoming
        .iter()
        .filter(|d| latest.is_none_or(|latest| d.draw_date() > latest));

    let mut seen = HashSet::new();
    let draws: Vec<Draw> = existing
        .draws
        .iter()
        .chain(fresh)
        .filter(|d| seen.insert(d.period().to_string()))
        .cloned()
        .collect();

    DrawTable::new(draws)
}

pub fn row_from_draw(draw: &Draw) -> DrawRow {
    DrawRow {
        draw: draw.period().to_string(),
        date: draw.display_date(),
        ad_date: draw.draw_date().format("%Y-%m-%d").to_string(),
        numbers: draw.numbers_label(),
        price: PRIZE,
        lottery_type: LOTTERY_TYPE.to_string(),
    }
}

pub fn draw_from_row(row: &DrawRow) -> Result<Draw, String> {
    let draw_date = NaiveDate::parse_from_str(row.ad_date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("bad ad_date '{}': {}", row.ad_date, e))?;

    let numbers = row
        .numbers
        .split(',')
        .map(|n| {
            n.trim()
                .parse::<i64>()
                .map_err(|e| format!("bad number '{}': {}", n, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if numbers.len() != 5 {
        return Err(format!("expected 5 numbers, got {}", numbers.len()));
    }

    Draw::new(row.draw.clone(), draw_date, &numbers).map_err(|e| e.to_string())
}
