//! Question datasets and run records.
//!
//! Two question layouts are accepted:
//!
//! - `Question.json`: one JSON object per line with `question` and `answer`
//! - `train.json`: a single JSON array whose objects carry `answers`
//!
//! Every other field on a question (`qlabel`, `answer_type`, ...) is kept in
//! [`QaItem::attributes`] and copied onto the [`RunRecord`] written for it.

use crate::error::EvalError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

/// Label used when a record has no `qlabel` / `answer_type`.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One question with its accepted answers.
#[derive(Debug, Clone, PartialEq)]
pub struct QaItem {
    /// Zero-based position in the dataset.
    pub id: usize,
    pub question: String,
    pub answers: Vec<String>,
    pub attributes: Map<String, Value>,
}

impl QaItem {
    pub fn qlabel(&self) -> String {
        label(&self.attributes, "qlabel")
    }

    pub fn answer_type(&self) -> String {
        label(&self.attributes, "answer_type")
    }
}

/// The result of answering one question, as written by a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub id: usize,
    #[serde(default)]
    pub question: String,
    #[serde(rename = "answer", default, deserialize_with = "deserialize_answers")]
    pub answers: Vec<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<u64>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RunRecord {
    pub fn new(item: &QaItem, output: impl Into<String>) -> Self {
        Self {
            id: item.id,
            question: item.question.clone(),
            answers: item.answers.clone(),
            output: output.into(),
            context_tokens: None,
            retrieval_ms: None,
            total_ms: None,
            attributes: item.attributes.clone(),
        }
    }

    pub fn with_telemetry(mut self, context_tokens: usize, retrieval_ms: u64, total_ms: u64) -> Self {
        self.context_tokens = Some(context_tokens);
        self.retrieval_ms = Some(retrieval_ms);
        self.total_ms = Some(total_ms);
        self
    }

    pub fn qlabel(&self) -> String {
        label(&self.attributes, "qlabel")
    }

    pub fn answer_type(&self) -> String {
        label(&self.attributes, "answer_type")
    }
}

fn label(attributes: &Map<String, Value>, key: &str) -> String {
    match attributes.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => UNKNOWN_LABEL.to_string(),
        Some(Value::String(_)) => UNKNOWN_LABEL.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Accept a single answer string, a list of answers, or a scalar.
fn answers_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::Number(_) | Value::Bool(_) => vec![value.to_string()],
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

fn deserialize_answers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(answers_from_value(&value))
}

fn item_from_value(value: Value, id: usize, line: usize) -> Result<QaItem, EvalError> {
    let Value::Object(mut map) = value else {
        return Err(EvalError::MissingField {
            line,
            field: "question",
        });
    };

    let question = match map.remove("question") {
        Some(Value::String(q)) => q,
        _ => {
            return Err(EvalError::MissingField {
                line,
                field: "question",
            });
        }
    };

    let answers = map
        .remove("answer")
        .or_else(|| map.remove("answers"))
        .map(|v| answers_from_value(&v))
        .ok_or(EvalError::MissingField {
            line,
            field: "answer",
        })?;

    // Positional ids replace any id carried by the file.
    map.remove("id");

    Ok(QaItem {
        id,
        question,
        answers,
        attributes: map,
    })
}

/// Parse a question file. A leading `[` selects the array layout.
pub fn parse_dataset(content: &str) -> Result<Vec<QaItem>, EvalError> {
    if content.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(content).map_err(|source| EvalError::Json {
            line: source.line(),
            source,
        })?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, v)| item_from_value(v, i, i + 1))
            .collect();
    }

    let mut items = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| EvalError::Json {
            line: idx + 1,
            source,
        })?;
        let id = items.len();
        items.push(item_from_value(value, id, idx + 1)?);
    }
    Ok(items)
}

/// Parse a JSONL run file. Unparseable lines are skipped and counted.
pub fn parse_run_records(content: &str) -> (Vec<RunRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RunRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping unparseable run record");
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

async fn read(path: &Path) -> Result<String, EvalError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EvalError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Load a question file from disk.
pub async fn load_dataset(path: &Path) -> Result<Vec<QaItem>, EvalError> {
    let items = parse_dataset(&read(path).await?)?;
    info!(path = %path.display(), questions = items.len(), "Dataset loaded");
    Ok(items)
}

/// Load a run file from disk, returning the records and the number of skipped lines.
pub async fn load_run_records(path: &Path) -> Result<(Vec<RunRecord>, usize), EvalError> {
    let (records, skipped) = parse_run_records(&read(path).await?);
    info!(path = %path.display(), records = records.len(), skipped, "Run records loaded");
    Ok((records, skipped))
}
