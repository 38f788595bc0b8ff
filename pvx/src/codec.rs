//! Point-value file format: JSON Lines, one [`PointValue`] per line.

use std::io::{BufRead, Write};

use crate::schema::{PointValue, Version};
use crate::Result;

/// What a transfer moved: value count and the version range seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub count: u64,
    pub first_version: Option<Version>,
    pub last_version: Option<Version>,
}

impl TransferSummary {
    /// Count one value carrying `version`.
    pub fn observe(&mut self, version: Option<Version>) {
        self.count += 1;
        if let Some(version) = version {
            self.first_version = Some(self.first_version.map_or(version, |v| v.min(version)));
            self.last_version = Some(self.last_version.map_or(version, |v| v.max(version)));
        }
    }
}

/// Writes point values to a stream.
pub struct ValuesWriter<W: Write> {
    inner: W,
    summary: TransferSummary,
}

impl<W: Write> ValuesWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            summary: TransferSummary::default(),
        }
    }

    /// Encode one value.
    pub fn append(&mut self, value: &PointValue) -> Result<()> {
        serde_json::to_writer(&mut self.inner, value)?;
        self.inner.write_all(b"\n")?;
        self.summary.observe(value.version);
        Ok(())
    }

    /// Flush and hand back the stream.
    pub fn finish(mut self) -> Result<(W, TransferSummary)> {
        self.inner.flush()?;
        Ok((self.inner, self.summary))
    }
}

/// Reads point values from a stream, skipping blank lines.
pub struct ValuesReader<R: BufRead> {
    inner: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> ValuesReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for ValuesReader<R> {
    type Item = Result<PointValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(text).map_err(|e| {
                tracing::error!(line = self.line, "Malformed point value: {}", e);
                e.into()
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PointRef;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::io::Cursor;
    use uuid::Uuid;

    fn value(hour: u32, version: Option<u32>) -> PointValue {
        let mut value = PointValue::new(
            PointRef::named(Uuid::nil(), "Tank1.Level"),
            Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            json!(hour as f64 / 2.0),
        );
        value.version = version.map(|m| Utc.with_ymd_and_hms(2024, 2, 1, 0, m, 0).unwrap());
        value
    }

    #[test]
    fn test_writer_summary_tracks_version_range() {
        let mut writer = ValuesWriter::new(Vec::new());
        writer.append(&value(1, Some(5))).unwrap();
        writer.append(&value(2, Some(3))).unwrap();
        writer.append(&value(3, None)).unwrap();
        writer.append(&value(4, Some(9))).unwrap();

        let (bytes, summary) = writer.finish().unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.first_version, value(0, Some(3)).version);
        assert_eq!(summary.last_version, value(0, Some(9)).version);
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_empty_summary() {
        let (bytes, summary) = ValuesWriter::new(Vec::new()).finish().unwrap();
        assert!(bytes.is_empty());
        assert_eq!(summary, TransferSummary::default());
    }

    #[test]
    fn test_reader_reads_written_values() {
        let written = vec![value(1, Some(1)), value(2, None)];
        let mut writer = ValuesWriter::new(Vec::new());
        for v in &written {
            writer.append(v).unwrap();
        }
        let (bytes, _) = writer.finish().unwrap();

        let read: Vec<_> = ValuesReader::new(Cursor::new(bytes))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn test_reader_skips_blank_lines() {
        let input = format!(
            "\n{}\n   \n",
            r#"{"point":{"uuid":"00000000-0000-0000-0000-000000000000"},"stamp":"2024-01-01T00:00:00Z"}"#
        );
        let read: Vec<_> = ValuesReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].value, serde_json::Value::Null);
        assert_eq!(read[0].point.name, None);
    }

    #[test]
    fn test_reader_reports_malformed_line() {
        let mut reader = ValuesReader::new(Cursor::new("\nnot json\n"));
        assert!(matches!(reader.next(), Some(Err(crate::Error::Codec(_)))));
        assert_eq!(reader.line(), 2);
    }
}
