//! CSV export loading.
//!
//! Reads a FreeStyle Libre or Apple Health glucose export and normalises it
//! into a [`TimeSeries`] of `(timestamp, mg/dL)` readings for the pipeline.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use csv::StringRecord;
use glucose_core::error::{Result, TrendError};
use glucose_core::models::{Reading, TimeSeries};
use glucose_core::time_utils::{
    check_timestamp_format, TimezoneHandler, DEFAULT_TIMESTAMP_FORMAT,
};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Exports carry a metadata line before the header; look this far for it.
const HEADER_SEARCH_ROWS: usize = 5;

// ── ExportSchema ──────────────────────────────────────────────────────────────

/// Column layout of a supported vendor export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportSchema {
    /// FreeStyle Libre reader/app export (German column names).
    Libre,
    /// Apple Health blood-glucose export.
    Health,
}

impl ExportSchema {
    pub fn name(&self) -> &'static str {
        match self {
            ExportSchema::Libre => "libre",
            ExportSchema::Health => "health",
        }
    }

    /// Header of the column holding the reading time.
    pub fn timestamp_column(&self) -> &'static str {
        match self {
            ExportSchema::Libre => "Gerätezeitstempel",
            ExportSchema::Health => "endDate",
        }
    }

    /// Value columns in priority order; the first non-empty one wins.
    pub fn value_columns(&self) -> &'static [&'static str] {
        match self {
            ExportSchema::Libre => &["Glukosewert-Verlauf mg/dL", "Glukose-Scan mg/dL"],
            ExportSchema::Health => &["value"],
        }
    }

    /// Guess the schema from a candidate header row.
    pub fn detect(header: &StringRecord) -> Option<Self> {
        [ExportSchema::Libre, ExportSchema::Health]
            .into_iter()
            .find(|schema| schema.matches_header(header))
    }

    /// Position of the timestamp column, accepting the spelling variants
    /// vendors emit (`Gerätezeitstempel`, `Geraetezeitstempel`, any case).
    pub fn timestamp_index(&self, header: &StringRecord) -> Option<usize> {
        let pattern = self.timestamp_pattern();
        header
            .iter()
            .position(|cell| pattern.is_match(&normalise_header(cell)))
    }

    fn matches_header(&self, header: &StringRecord) -> bool {
        self.timestamp_index(header).is_some()
    }

    fn timestamp_pattern(&self) -> &'static Regex {
        static LIBRE: OnceLock<Regex> = OnceLock::new();
        static HEALTH: OnceLock<Regex> = OnceLock::new();
        match self {
            ExportSchema::Libre => LIBRE.get_or_init(|| {
                Regex::new(r"(?i)^ger(ä|ae)tezeitstempel$").expect("regex is valid")
            }),
            ExportSchema::Health => {
                HEALTH.get_or_init(|| Regex::new(r"(?i)^enddate$").expect("regex is valid"))
            }
        }
    }
}

impl FromStr for ExportSchema {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "libre" => Ok(ExportSchema::Libre),
            "health" => Ok(ExportSchema::Health),
            other => Err(TrendError::UnknownSchema(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a CLI schema choice; `"auto"` means detect from the header.
pub fn parse_schema_choice(s: &str) -> Result<Option<ExportSchema>> {
    if s.trim().eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    s.parse().map(Some)
}

// ── Reader options & results ──────────────────────────────────────────────────

/// How to interpret an export file.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// `None` detects the schema from the header row.
    pub schema: Option<ExportSchema>,
    /// strftime layout tried before the built-in fallbacks.
    pub timestamp_format: String,
    /// IANA timezone for timestamps that carry an offset.
    pub timezone: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            schema: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// Row counts gathered while reading an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Data rows after the header.
    pub rows_read: usize,
    /// Rows dropped because the timestamp was missing or unparseable.
    pub rows_skipped: usize,
    /// Readings (after duplicate merging) that carry a value.
    pub readings_with_value: usize,
}

/// A loaded export.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub series: TimeSeries,
    pub schema: ExportSchema,
    pub stats: IngestStats,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and normalise the export at `path`.
pub fn load_readings(path: &Path, options: &ReaderOptions) -> Result<IngestResult> {
    let file = std::fs::File::open(path).map_err(|source| TrendError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let result = read_readings(file, options, path)?;
    info!(
        "Loaded {} readings ({} with values) from {} as {} export",
        result.series.len(),
        result.stats.readings_with_value,
        path.display(),
        result.schema
    );
    Ok(result)
}

/// Parse an export from any reader. `source` is only used in error messages.
pub fn read_readings<R: Read>(
    input: R,
    options: &ReaderOptions,
    source: &Path,
) -> Result<IngestResult> {
    check_timestamp_format(&options.timestamp_format)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.records();

    // ── Locate the header row ─────────────────────────────────────────────────
    let mut found: Option<(StringRecord, ExportSchema)> = None;
    for _ in 0..HEADER_SEARCH_ROWS {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        let schema = match options.schema {
            Some(schema) if schema.matches_header(&record) => Some(schema),
            Some(_) => None,
            None => ExportSchema::detect(&record),
        };
        if let Some(schema) = schema {
            found = Some((record, schema));
            break;
        }
    }
    let Some((header, schema)) = found else {
        return Err(TrendError::SchemaNotDetected(source.to_path_buf()));
    };
    debug!("Header row detected for {} export", schema);

    let ts_idx = schema.timestamp_index(&header).ok_or_else(|| {
        TrendError::MissingColumn {
            schema: schema.name().to_string(),
            column: schema.timestamp_column().to_string(),
        }
    })?;
    let value_idx: Vec<usize> = schema
        .value_columns()
        .iter()
        .map(|column| {
            find_column(&header, column).ok_or_else(|| TrendError::MissingColumn {
                schema: schema.name().to_string(),
                column: column.to_string(),
            })
        })
        .collect::<Result<_>>()?;

    // ── Data rows ─────────────────────────────────────────────────────────────
    let tz = TimezoneHandler::new(&options.timezone);
    let mut stats = IngestStats::default();
    let mut readings: Vec<Reading> = Vec::new();

    for record in records {
        let record = record?;
        stats.rows_read += 1;

        let raw_ts = record.get(ts_idx).unwrap_or("");
        let Some(timestamp) = tz.parse_timestamp(raw_ts, &options.timestamp_format) else {
            stats.rows_skipped += 1;
            debug!("Skipping row {}: bad timestamp {:?}", stats.rows_read, raw_ts);
            continue;
        };

        let value = value_idx
            .iter()
            .find_map(|&idx| record.get(idx).and_then(parse_value));
        readings.push(Reading::new(timestamp, value));
    }

    if stats.rows_skipped > 0 {
        warn!(
            "Skipped {} of {} rows with unparseable timestamps",
            stats.rows_skipped, stats.rows_read
        );
    }

    let series = TimeSeries::from_unsorted(readings);
    if series.is_empty() {
        return Err(TrendError::EmptyInput);
    }
    stats.readings_with_value = series.present_count();

    Ok(IngestResult {
        series,
        schema,
        stats,
    })
}

/// Parse a glucose cell, coercing anything non-numeric to `None`.
///
/// Accepts a decimal comma, as written by German-locale exports.
pub fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn normalise_header(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}').trim().to_string()
}

fn find_column(header: &StringRecord, name: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| normalise_header(cell).eq_ignore_ascii_case(name))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
