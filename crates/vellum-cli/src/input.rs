//! JSONL embedding reader.
//!
//! Two line shapes are accepted:
//! - `{"key": "42", "embedding": [..]}` (the key may also be a number)
//! - `["some text", [..]]`, keyed by the record's position in the file

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One parsed input record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub embedding: Vec<f32>,
}

// `Pair` goes first: serde would also accept a two-element array as `Keyed`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Line {
    Pair(String, Vec<f32>),
    Keyed { key: Key, embedding: Vec<f32> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Key {
    Text(String),
    Number(u64),
}

/// Parses one line; `position` keys records without an explicit key.
pub fn parse_line(line: &str, position: usize) -> serde_json::Result<Record> {
    let record = match serde_json::from_str::<Line>(line)? {
        Line::Keyed { key, embedding } => Record {
            key: match key {
                Key::Text(text) => text,
                Key::Number(n) => n.to_string(),
            },
            embedding,
        },
        Line::Pair(_, embedding) => Record {
            key: position.to_string(),
            embedding,
        },
    };
    Ok(record)
}

/// Streams records from a JSONL file, skipping blank lines.
///
/// Malformed lines are logged and skipped; they do not consume a position.
pub struct RecordReader {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    position: usize,
}

impl RecordReader {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            position: 0,
        })
    }

    /// Reads up to `max` records. An empty batch means end of input.
    pub fn next_batch(&mut self, max: usize) -> anyhow::Result<Vec<Record>> {
        let mut batch = Vec::with_capacity(max);
        while batch.len() < max {
            let Some(line) = self.lines.next() else {
                break;
            };
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line, self.position) {
                Ok(record) => {
                    self.position += 1;
                    batch.push(record);
                }
                Err(err) => {
                    tracing::warn!(line = self.line_no, error = %err, "Skipping malformed input line");
                }
            }
        }
        Ok(batch)
    }

    /// Reads every remaining record.
    pub fn read_all(mut self) -> anyhow::Result<Vec<Record>> {
        let mut records = Vec::new();
        loop {
            let batch = self.next_batch(1024)?;
            if batch.is_empty() {
                return Ok(records);
            }
            records.extend(batch);
        }
    }
}
