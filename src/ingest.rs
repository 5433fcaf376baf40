//! Household power feed reader
//!
//! Reads delimited meter exports (`Date;Time;Global_active_power;...`) into
//! [`RawRecord`]s. Columns are located by header name, so extra or reordered
//! columns are fine. Rows the csv layer cannot decode become empty records
//! and are dropped (and counted) by the aggregator; a failing underlying
//! read aborts the whole feed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::RawRecord;
use crate::pipeline::PipelineError;

pub const DATE_COLUMN: &str = "Date";
pub const TIME_COLUMN: &str = "Time";
pub const POWER_COLUMN: &str = "Global_active_power";

/// Reader settings, mirrored by the `[data]` config section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedFormat {
    pub delimiter: char,
    /// Token marking an absent value
    pub missing_token: String,
}

impl Default for FeedFormat {
    fn default() -> Self {
        Self {
            delimiter: ';',
            missing_token: "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeterFeedReader {
    format: FeedFormat,
}

struct ColumnIndex {
    date: usize,
    time: usize,
    power: usize,
}

impl MeterFeedReader {
    pub fn new(format: FeedFormat) -> Result<Self, PipelineError> {
        if !format.delimiter.is_ascii() {
            return Err(PipelineError::Configuration(format!(
                "feed delimiter {:?} must be a single ASCII character",
                format.delimiter
            )));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> &FeedFormat {
        &self.format
    }

    pub fn read_path(&self, path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
        let file = File::open(path).map_err(|e| {
            PipelineError::ingestion(format!("cannot open {}: {}", path.display(), e))
        })?;
        self.read(BufReader::new(file))
    }

    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.format.delimiter as u8)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::ingestion(format!("unreadable header: {}", e)))?
            .clone();
        let columns = ColumnIndex {
            date: Self::column(&headers, DATE_COLUMN)?,
            time: Self::column(&headers, TIME_COLUMN)?,
            power: Self::column(&headers, POWER_COLUMN)?,
        };

        let mut records = Vec::new();
        let mut undecodable = 0usize;
        for row in reader.records() {
            match row {
                Ok(row) => records.push(self.to_record(&row, &columns)),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(PipelineError::ingestion(format!(
                        "feed read failed after {} rows: {}",
                        records.len(),
                        e
                    )));
                }
                Err(e) => {
                    debug!(error = %e, "undecodable feed row");
                    undecodable += 1;
                    records.push(RawRecord::default());
                }
            }
        }

        debug!(rows = records.len(), undecodable, "meter feed read");
        Ok(records)
    }

    fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, PipelineError> {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| PipelineError::ingestion(format!("column '{}' not found", name)))
    }

    fn to_record(&self, row: &csv::StringRecord, columns: &ColumnIndex) -> RawRecord {
        let field = |idx: usize| {
            row.get(idx)
                .filter(|v| !v.is_empty() && *v != self.format.missing_token)
                .map(str::to_string)
        };
        RawRecord {
            date: field(columns.date),
            time: field(columns.time),
            active_power: field(columns.power),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
Date;Time;Global_active_power;Global_reactive_power;Voltage
16/12/2006;17:24:00;4.216;0.418;234.840
16/12/2006;17:25:00;?;?;?
17/12/2006;00:00:00;1.044;0.152;242.730
";

    #[test]
    fn test_reads_feed_with_sentinels() {
        let records = MeterFeedReader::default().read(FEED.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], RawRecord::new("16/12/2006", "17:24:00", "4.216"));
        assert_eq!(records[1].date.as_deref(), Some("16/12/2006"));
        assert!(records[1].active_power.is_none());
        assert_eq!(records[2].active_power.as_deref(), Some("1.044"));
    }

    #[test]
    fn test_reordered_columns_and_custom_delimiter() {
        let feed = "Voltage,Global_active_power,Time,Date\n240,2.5,08:00:00,01/01/2010\n";
        let reader = MeterFeedReader::new(FeedFormat {
            delimiter: ',',
            missing_token: "NA".into(),
        })
        .unwrap();

        let records = reader.read(feed.as_bytes()).unwrap();
        assert_eq!(records, vec![RawRecord::new("01/01/2010", "08:00:00", "2.5")]);
    }

    #[test]
    fn test_short_row_yields_missing_fields() {
        let feed = "Date;Time;Global_active_power\n01/01/2010;08:00:00\n";
        let records = MeterFeedReader::default().read(feed.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].active_power.is_none());
    }

    #[test]
    fn test_invalid_utf8_row_is_dropped() {
        let feed: &[u8] =
            b"Date;Time;Global_active_power\n01/01/2010;08:00:00;\xff\n02/01/2010;08:00:00;1.5\n";
        let records = MeterFeedReader::default().read(feed).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], RawRecord::default());
        assert_eq!(records[1], RawRecord::new("02/01/2010", "08:00:00", "1.5"));
    }

    /// Serves `data`, then fails every later read
    struct FailingFeed {
        data: &'static [u8],
        served: bool,
    }

    impl Read for FailingFeed {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
            }
            self.served = true;
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_io_failure_mid_feed_is_fatal() {
        let feed = FailingFeed {
            data: b"Date;Time;Global_active_power\n01/01/2010;08:00:00;1.5\n",
            served: false,
        };
        let result = MeterFeedReader::default().read(feed);
        assert!(matches!(result, Err(PipelineError::Ingestion(msg)) if msg.contains("disk gone")));
    }

    #[test]
    fn test_missing_power_column() {
        let feed = "Date;Time;Voltage\n01/01/2010;08:00:00;240\n";
        let result = MeterFeedReader::default().read(feed.as_bytes());
        assert!(matches!(result, Err(PipelineError::Ingestion(msg)) if msg.contains("Global_active_power")));
    }

    #[test]
    fn test_missing_file() {
        let result = MeterFeedReader::default().read_path(Path::new("/nonexistent/feed.txt"));
        assert!(matches!(result, Err(PipelineError::Ingestion(_))));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let result = MeterFeedReader::new(FeedFormat {
            delimiter: '§',
            missing_token: "?".into(),
        });
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }
}
