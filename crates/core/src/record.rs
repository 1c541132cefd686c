use crate::{ReconcileError, Result};
use std::io::BufRead;

/// One row of the system-of-record dataset: a content item together with
/// its access-control list, transaction and change-set identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRecord {
    pub node_id: u64,
    pub acl_id: u64,
    pub txn_id: u64,
    pub changeset_id: u64,
}

impl SourceRecord {
    /// Parse one dataset line. Columns may be separated by commas or any
    /// whitespace; the column order is fixed:
    /// `node_id acl_id txn_id changeset_id`.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() != 4 {
            return Err(ReconcileError::InputFormat(format!(
                "expected 4 integer columns, got {}: {line:?}",
                fields.len()
            )));
        }
        let parse = |field: &str, name: &str| -> Result<u64> {
            field.parse::<u64>().map_err(|_| {
                ReconcileError::InputFormat(format!("{name} is not a non-negative integer: {field:?}"))
            })
        };
        Ok(Self {
            node_id: parse(fields[0], "node_id")?,
            acl_id: parse(fields[1], "acl_id")?,
            txn_id: parse(fields[2], "txn_id")?,
            changeset_id: parse(fields[3], "changeset_id")?,
        })
    }
}

/// Read the full dataset from a line-oriented source.
///
/// The first non-empty line is validated eagerly so a malformed extract
/// fails the run before any network activity; later malformed lines fail
/// with their line number.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<SourceRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = SourceRecord::parse_line(trimmed).map_err(|e| match e {
            ReconcileError::InputFormat(detail) => {
                ReconcileError::InputFormat(format!("line {}: {detail}", idx + 1))
            }
            other => other,
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_whitespace_and_comma_separated_lines() {
        let a = SourceRecord::parse_line("1 2 3 4").unwrap();
        let b = SourceRecord::parse_line("1,2,3,4").unwrap();
        let c = SourceRecord::parse_line("  1\t2 , 3  4 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.node_id, 1);
        assert_eq!(a.changeset_id, 4);
    }

    #[test]
    fn rejects_wrong_arity_and_non_integers() {
        assert!(SourceRecord::parse_line("1 2 3").is_err());
        assert!(SourceRecord::parse_line("1 2 3 4 5").is_err());
        assert!(SourceRecord::parse_line("1 2 x 4").is_err());
        assert!(SourceRecord::parse_line("-1 2 3 4").is_err());
    }

    #[test]
    fn read_records_reports_line_numbers() {
        let data = "1 2 3 4\n\n5 6 7 oops\n";
        let err = read_records(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn read_records_skips_blank_lines() {
        let data = "1 2 3 4\n\n5 6 7 8\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].node_id, 5);
    }
}
