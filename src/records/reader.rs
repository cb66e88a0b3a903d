//! Delimited record reader.
//!
//! One record per line after a header line, positional fields split on a
//! fixed delimiter. There is no quoting: a delimiter inside a field shifts
//! every following field.

use crate::error::{Result, StoreError};
use crate::types::Record;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Rows with fewer fields are rejected.
pub const MIN_FIELDS: usize = 17;

/// Fields past this position are ignored.
pub const MAX_FIELDS: usize = 18;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Parse one data line into a record.
///
/// `line` is the 1-based line number used in error reports. Empty numeric
/// fields become `0.0`. A non-empty amount that does not parse rejects the
/// line; a risk score that does not parse becomes `0.0`.
pub fn parse_line(text: &str, delimiter: char, line: usize) -> Result<Record> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let fields: Vec<&str> = text.splitn(MAX_FIELDS + 1, delimiter).collect();

    if fields.len() < MIN_FIELDS {
        return Err(StoreError::MalformedRecord {
            line,
            reason: format!("expected {} fields, found {}", MIN_FIELDS, fields.len()),
        });
    }

    let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();

    Ok(Record {
        transaction_id: field(0),
        timestamp: field(1),
        sender_account: field(2),
        receiver_account: field(3),
        amount: required_amount(fields[4], line)?,
        transaction_type: field(5),
        merchant_category: field(6),
        location: field(7),
        device_used: field(8),
        is_fraud: parse_flag(fields[9]),
        fraud_type: field(10),
        time_since_last_transaction: lenient_score(fields[11]),
        spending_deviation_score: lenient_score(fields[12]),
        velocity_score: lenient_score(fields[13]),
        geo_anomaly_score: lenient_score(fields[14]),
        payment_channel: field(15),
        ip_address: field(16),
        device_hash: field(17),
    })
}

fn required_amount(token: &str, line: usize) -> Result<f64> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(0.0);
    }
    token.parse().map_err(|_| StoreError::MalformedRecord {
        line,
        reason: format!("unparsable amount {:?}", token),
    })
}

fn lenient_score(token: &str) -> f64 {
    token.trim().parse().unwrap_or(0.0)
}

fn parse_flag(token: &str) -> bool {
    matches!(token, "1" | "true" | "True")
}

/// Iterator over the data lines of a delimited input.
///
/// Yields one `Result` per data line. Malformed lines come back as
/// `StoreError::MalformedRecord` and iteration continues; an I/O error ends
/// iteration after it is returned.
pub struct RecordReader<R> {
    lines: Lines<R>,
    delimiter: char,
    line: usize,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::file(path, e))?;
        Ok(Self::new(BufReader::new(file), DEFAULT_DELIMITER))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, delimiter: char) -> Self {
        Self {
            lines: reader.lines(),
            delimiter,
            line: 0,
            failed: false,
        }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Number of lines consumed so far, header included.
    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(StoreError::Io(e)));
                }
            };
            self.line += 1;

            // Header
            if self.line == 1 {
                continue;
            }

            return Some(parse_line(&text, self.delimiter, self.line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "transaction_id,timestamp,sender_account,receiver_account,amount,transaction_type,merchant_category,location,device_used,is_fraud,fraud_type,time_since_last_transaction,spending_deviation_score,velocity_score,geo_anomaly_score,payment_channel,ip_address,device_hash";

    #[test]
    fn test_parse_full_line() {
        let record = parse_line(
            "T2,2024-01-02,C,D,50.0,wire,retail,LA,phoneY,1,scam,1.5,0.2,3,-0.75,wire_transfer,2.2.2.2,h2",
            ',',
            2,
        )
        .unwrap();

        assert_eq!(record.transaction_id, "T2");
        assert_eq!(record.amount, 50.0);
        assert_eq!(record.transaction_type, "wire");
        assert_eq!(record.location, "LA");
        assert!(record.is_fraud);
        assert_eq!(record.fraud_type, "scam");
        assert_eq!(record.time_since_last_transaction, 1.5);
        assert_eq!(record.velocity_score, 3.0);
        assert_eq!(record.geo_anomaly_score, -0.75);
        assert_eq!(record.payment_channel, "wire_transfer");
        assert_eq!(record.device_hash, "h2");
    }

    #[test]
    fn test_seventeen_fields_leave_hash_empty() {
        let record =
            parse_line("T1,ts,A,B,1,card,retail,NYC,phone,0,,0,0,0,0,card,1.1.1.1", ',', 2).unwrap();
        assert_eq!(record.ip_address, "1.1.1.1");
        assert_eq!(record.device_hash, "");
    }

    #[test]
    fn test_extra_fields_ignored() {
        let record =
            parse_line("T1,ts,A,B,1,card,retail,NYC,phone,0,,0,0,0,0,card,ip,h1,extra,more", ',', 2)
                .unwrap();
        assert_eq!(record.device_hash, "h1");
    }

    #[test]
    fn test_numeric_coercion() {
        let record = parse_line("T1,ts,A,B,,card,retail,NYC,phone,0,,,abc,,x,card,ip,h", ',', 2).unwrap();
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.time_since_last_transaction, 0.0);
        assert_eq!(record.spending_deviation_score, 0.0);
        assert_eq!(record.geo_anomaly_score, 0.0);
    }

    #[test]
    fn test_unparsable_amount_rejected() {
        let err = parse_line("T1,ts,A,B,lots,card,retail,NYC,phone,0,,0,0,0,0,card,ip,h", ',', 7)
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord { line: 7, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_short_line_rejected() {
        let err = parse_line("T1,ts,A", ',', 3).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn test_fraud_flag_forms() {
        for (token, expected) in [("1", true), ("true", true), ("True", true), ("TRUE", false), ("0", false), ("yes", false)] {
            let line = format!("T,ts,A,B,1,card,retail,NYC,phone,{},,0,0,0,0,card,ip,h", token);
            assert_eq!(parse_line(&line, ',', 2).unwrap().is_fraud, expected, "token {}", token);
        }
    }

    #[test]
    fn test_reader_skips_header_and_reports_lines() {
        let input = format!(
            "{}\nT1,ts,A,B,1,card,retail,NYC,phone,0,,0,0,0,0,card,ip,h\r\nbroken\nT3,ts,A,B,2,ach,retail,LA,phone,0,,0,0,0,0,ACH,ip,h\n",
            HEADER
        );
        let results: Vec<_> = RecordReader::new(Cursor::new(input), ',').collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().device_hash, "h");
        assert!(matches!(results[1], Err(StoreError::MalformedRecord { line: 3, .. })));
        assert_eq!(results[2].as_ref().unwrap().transaction_id, "T3");
    }

    #[test]
    fn test_reader_custom_delimiter() {
        let input = format!(
            "{}\nT1;ts;A;B;1;card;retail;NYC;phone;0;;0;0;0;0;card;ip;h\n",
            HEADER
        );
        let records: Vec<_> = RecordReader::new(Cursor::new(input), ',')
            .with_delimiter(';')
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "NYC");
    }

    #[test]
    fn test_header_only() {
        let mut reader = RecordReader::new(Cursor::new(HEADER.to_string()), ',');
        assert!(reader.next().is_none());
        assert_eq!(reader.line_number(), 1);
    }

    #[test]
    fn test_open_missing_file_names_path() {
        let err = RecordReader::open("/definitely/not/here.csv").err().unwrap();
        match err {
            StoreError::File { path, .. } => assert!(path.ends_with("here.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
