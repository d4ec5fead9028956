//! JSONL email datasets: one [`Record`] per line.

use crate::model::Record;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid email record: {source}\n  Content: {snippet}")]
    Parse {
        line: usize,
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: duplicate record id '{id}' (first seen on line {first_line})")]
    DuplicateId {
        line: usize,
        id: String,
        first_line: usize,
    },
}

/// Decodes JSONL from a reader. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<Record>, DatasetError> {
    parse_lines(reader, "<input>")
}

pub fn parse_jsonl_str(raw: &str) -> Result<Vec<Record>, DatasetError> {
    parse_jsonl(raw.as_bytes())
}

pub fn load_jsonl(path: &Path) -> Result<Vec<Record>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = parse_lines(BufReader::new(file), &path.display().to_string())?;
    tracing::debug!(path = %path.display(), records = records.len(), "dataset loaded");
    Ok(records)
}

fn parse_lines<R: BufRead>(reader: R, origin: &str) -> Result<Vec<Record>, DatasetError> {
    let mut records = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|source| DatasetError::Io {
            path: origin.to_string(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: Record =
            serde_json::from_str(trimmed).map_err(|source| DatasetError::Parse {
                line: line_no,
                snippet: trimmed.chars().take(50).collect(),
                source,
            })?;
        if let Some(&first_line) = seen.get(&record.id) {
            return Err(DatasetError::DuplicateId {
                line: line_no,
                id: record.id,
                first_line,
            });
        }
        seen.insert(record.id.clone(), line_no);
        records.push(record);
    }
    Ok(records)
}

/// Ids in dataset order, for "unknown id" hints.
pub fn record_ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

pub fn find_record<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines_and_keeps_order() {
        let raw = "{\"id\": 2, \"content\": \"b\"}\n\n   \n{\"id\": \"1\", \"sender\": \"a@b.c\", \"content\": \"a\"}\n";
        let records = parse_jsonl_str(raw).unwrap();
        assert_eq!(record_ids(&records), vec!["2", "1"]);
        assert_eq!(records[1].sender.as_deref(), Some("a@b.c"));
        assert!(find_record(&records, "1").is_some());
        assert!(find_record(&records, "3").is_none());
    }

    #[test]
    fn parse_error_carries_line_number() {
        let raw = "{\"id\": 1, \"content\": \"a\"}\n\n{\"id\": 2, \"content\": \n";
        match parse_jsonl_str(raw).unwrap_err() {
            DatasetError::Parse { line, snippet, .. } => {
                assert_eq!(line, 3);
                assert!(snippet.starts_with("{\"id\": 2"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = "{\"id\": 1, \"content\": \"a\"}\n{\"id\": 2, \"content\": \"b\"}\n{\"id\": \"1\", \"content\": \"c\"}\n";
        let err = parse_jsonl_str(raw).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::DuplicateId { line: 3, first_line: 1, .. }
        ));
        assert!(err.to_string().contains("'1'"));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": 7, \"subject\": \"Lunch\", \"content\": \"Hi\"}}").unwrap();
        let records = load_jsonl(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject.as_deref(), Some("Lunch"));

        let err = load_jsonl(Path::new("/definitely/not/here.jsonl")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert!(err.to_string().contains("not/here.jsonl"));
    }
}
