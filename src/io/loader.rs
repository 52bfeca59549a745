//! CSV ingestion for raw meter exports and the cleaned intermediate file.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::{Result, SimError};
use crate::series::TimeSeriesSample;

/// Timestamp layout of the raw export (`31/12/2023 23:45`).
pub const RAW_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Timestamp layout of the cleaned intermediate file.
pub const CLEAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header of the cleaned intermediate file.
pub const CLEAN_HEADER: [&str; 4] = ["Time", "Pprod(W)", "Pdemand(W)", "Pimb"];

/// Summary rows embedded in raw exports; matched against the first column.
pub const SUMMARY_MARKERS: &[&str] = &[
    "Time Interval",
    "Energy Production",
    "Energy Demand",
    "Total Energy Imbalance",
    "% Overproduction",
];

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows read after the header.
    pub rows_read: usize,
    /// Rows dropped because they carry summary marker text.
    pub summary_rows: usize,
    /// Rows dropped because a field failed to parse.
    pub unparsable_rows: usize,
    /// Rows dropped because their timestamp repeats an earlier row.
    pub duplicate_rows: usize,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.rows_read - self.summary_rows - self.unparsable_rows - self.duplicate_rows
    }
}

/// Chronologically sorted, duplicate-free samples plus row accounting.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub samples: Vec<TimeSeriesSample>,
    pub report: LoadReport,
}

/// Reads a raw meter export from disk.
///
/// # Errors
///
/// Returns [`SimError::MissingSource`] if the file does not exist and
/// [`SimError::InsufficientData`] if no row survives cleaning.
pub fn load_raw_csv(path: &Path) -> Result<LoadedSeries> {
    let file = open_source(path)?;
    info!(path = %path.display(), "loading raw export");
    read_raw(BufReader::new(file))
}

/// Reads a cleaned intermediate file from disk.
pub fn load_cleaned_csv(path: &Path) -> Result<LoadedSeries> {
    let file = open_source(path)?;
    info!(path = %path.display(), "loading cleaned series");
    read_cleaned(BufReader::new(file))
}

/// Parses a raw export: `DD/MM/YYYY HH:MM`, production, demand, imbalance.
pub fn read_raw(reader: impl Read) -> Result<LoadedSeries> {
    read_with_format(reader, RAW_TIME_FORMAT)
}

/// Parses a cleaned file written by [`write_cleaned`].
pub fn read_cleaned(reader: impl Read) -> Result<LoadedSeries> {
    read_with_format(reader, CLEAN_TIME_FORMAT)
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SimError::MissingSource(path.to_path_buf()),
        _ => SimError::Io(e),
    })
}

fn read_with_format(reader: impl Read, time_format: &str) -> Result<LoadedSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut report = LoadReport::default();
    let mut samples = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers.
        let line = idx + 2;
        report.rows_read += 1;

        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(SimError::Csv(e)),
            Err(e) => {
                warn!(line, error = %e, "dropping malformed row");
                report.unparsable_rows += 1;
                continue;
            }
        };

        let first = record.get(0).unwrap_or_default();
        if SUMMARY_MARKERS.iter().any(|m| first.contains(m)) {
            debug!(line, "skipping summary row");
            report.summary_rows += 1;
            continue;
        }

        match parse_record(&record, time_format) {
            Some(sample) => samples.push(sample),
            None => {
                warn!(line, row = ?record, "dropping unparsable row");
                report.unparsable_rows += 1;
            }
        }
    }

    samples.sort_by_key(|s| s.timestamp);
    let before = samples.len();
    samples.dedup_by_key(|s| s.timestamp);
    report.duplicate_rows = before - samples.len();
    if report.duplicate_rows > 0 {
        warn!(count = report.duplicate_rows, "dropped rows with duplicate timestamps");
    }

    if samples.is_empty() {
        return Err(SimError::InsufficientData(format!(
            "no valid rows among {} read",
            report.rows_read
        )));
    }

    info!(
        kept = report.kept(),
        summary = report.summary_rows,
        unparsable = report.unparsable_rows,
        "series loaded"
    );
    Ok(LoadedSeries { samples, report })
}

fn parse_record(record: &csv::StringRecord, time_format: &str) -> Option<TimeSeriesSample> {
    let timestamp = NaiveDateTime::parse_from_str(record.get(0)?, time_format).ok()?;
    let production_w = parse_number(record.get(1)?)?;
    let demand_w = parse_number(record.get(2)?)?;
    let imbalance_w = parse_number(record.get(3)?)?;
    Some(TimeSeriesSample {
        imbalance_w,
        ..TimeSeriesSample::new(timestamp, production_w, demand_w)
    })
}

/// Parses a finite number; NaN/inf literals count as missing.
fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Writes samples in the cleaned intermediate layout.
pub fn write_cleaned(samples: &[TimeSeriesSample], writer: impl io::Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CLEAN_HEADER)?;
    for s in samples {
        wtr.write_record(&[
            s.timestamp.format(CLEAN_TIME_FORMAT).to_string(),
            s.production_w.to_string(),
            s.demand_w.to_string(),
            s.imbalance_w.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the cleaned intermediate file to `path`.
pub fn write_cleaned_csv(samples: &[TimeSeriesSample], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_cleaned(samples, io::BufWriter::new(file))?;
    info!(path = %path.display(), rows = samples.len(), "cleaned series written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
Time,Production,Demand,Imbalance
01/06/2023 00:00,0,500,500
01/06/2023 00:15,-0,480,480
01/06/2023 12:00,-2000,600,-1400
Time Interval,15 min,,
Energy Production,-12345,,
01/06/2023 12:15,abc,600,0
01/06/2023 06:00,-100,400,300
";

    #[test]
    fn raw_rows_are_cleaned_and_sorted() {
        let loaded = read_raw(RAW.as_bytes()).expect("load");
        assert_eq!(loaded.samples.len(), 4);
        assert_eq!(loaded.report.summary_rows, 2);
        assert_eq!(loaded.report.unparsable_rows, 1);
        assert_eq!(loaded.report.kept(), 4);

        let times: Vec<_> = loaded.samples.iter().map(|s| s.timestamp).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);

        let noon = loaded.samples.last().expect("noon sample");
        assert_eq!(noon.production_w, 2000.0);
        assert_eq!(noon.imbalance_w, -1400.0);
    }

    #[test]
    fn production_is_never_negative() {
        let loaded = read_raw(RAW.as_bytes()).expect("load");
        assert!(loaded.samples.iter().all(|s| s.production_w >= 0.0));
    }

    #[test]
    fn duplicate_timestamps_keep_first() {
        let raw = "\
Time,P,D,I
01/06/2023 00:00,-1,2,1
01/06/2023 00:00,-9,9,0
";
        let loaded = read_raw(raw.as_bytes()).expect("load");
        assert_eq!(loaded.samples.len(), 1);
        assert_eq!(loaded.report.duplicate_rows, 1);
        assert_eq!(loaded.samples[0].production_w, 1.0);
    }

    #[test]
    fn nan_values_are_dropped() {
        let raw = "\
Time,P,D,I
01/06/2023 00:00,NaN,2,1
01/06/2023 00:15,-1,2,1
";
        let loaded = read_raw(raw.as_bytes()).expect("load");
        assert_eq!(loaded.samples.len(), 1);
        assert_eq!(loaded.report.unparsable_rows, 1);
    }

    #[test]
    fn only_summary_rows_is_an_error() {
        let raw = "Time,P,D,I\nEnergy Demand,1,,\n";
        let err = read_raw(raw.as_bytes()).expect_err("must fail");
        assert!(matches!(err, SimError::InsufficientData(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_raw_csv(Path::new("/nonexistent/raw.csv")).expect_err("must fail");
        assert!(matches!(err, SimError::MissingSource(_)));
    }

    #[test]
    fn cleaned_file_reads_back() {
        let loaded = read_raw(RAW.as_bytes()).expect("load");
        let mut buf = Vec::new();
        write_cleaned(&loaded.samples, &mut buf).expect("write");

        let text = String::from_utf8(buf).expect("utf-8");
        assert!(text.starts_with("Time,Pprod(W),Pdemand(W),Pimb"));

        let reread = read_cleaned(text.as_bytes()).expect("reread");
        assert_eq!(reread.samples, loaded.samples);
    }
}
