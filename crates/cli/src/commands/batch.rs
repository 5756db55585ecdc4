//! `kgrag batch`: Answer a dataset and write one JSONL record per question.

use super::{Overrides, build_engine, load_config};
use kgrag_eval::{QaItem, RunRecord, load_dataset};
use kgrag_pipeline::QueryEngine;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{info, warn};

/// Answer one question. Failures become an empty output with an `error` attribute.
async fn answer(engine: &QueryEngine, item: &QaItem) -> RunRecord {
    match engine.query(&item.question).await {
        Ok(outcome) => RunRecord::new(item, outcome.answer).with_telemetry(
            outcome.metadata.context_tokens,
            outcome.timings.retrieval_ms,
            outcome.timings.total_ms,
        ),
        Err(e) => {
            warn!(id = item.id, error = %e, "Query failed");
            failed(item, e.to_string())
        }
    }
}

fn failed(item: &QaItem, error: String) -> RunRecord {
    let mut record = RunRecord::new(item, "");
    record
        .attributes
        .insert("error".into(), serde_json::Value::String(error));
    record
}

fn average(values: impl Iterator<Item = u64>) -> f64 {
    let (sum, n) = values.fold((0u64, 0u64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

/// Answer `items` with at most `concurrency` queries in flight, preserving input order.
async fn answer_all(
    engine: Arc<QueryEngine>,
    items: Vec<QaItem>,
    concurrency: usize,
) -> Vec<RunRecord> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut task_slots: HashMap<task::Id, usize> = HashMap::with_capacity(items.len());

    for (slot, item) in items.iter().cloned().enumerate() {
        let engine = engine.clone();
        let permits = permits.clone();
        let handle = tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            answer(&engine, &item).await
        });
        task_slots.insert(handle.id(), slot);
    }

    let mut records: Vec<Option<RunRecord>> = vec![None; items.len()];
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, record)) => {
                if let Some(&slot) = task_slots.get(&id) {
                    records[slot] = Some(record);
                }
            }
            Err(e) => {
                if let Some(&slot) = task_slots.get(&e.id()) {
                    warn!(id = items[slot].id, error = %e, "Query task aborted");
                    records[slot] = Some(failed(&items[slot], e.to_string()));
                }
            }
        }
    }

    // Every slot is filled unless a task id went missing.
    items
        .iter()
        .zip(records)
        .map(|(item, record)| {
            record.unwrap_or_else(|| failed(item, "query task produced no result".into()))
        })
        .collect()
}

pub async fn run(
    dataset: &Path,
    output: &Path,
    overrides: Overrides,
    limit: Option<usize>,
    concurrency: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let mut items = load_dataset(dataset).await?;
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    let engine = Arc::new(build_engine(&config).await?);

    println!(
        "🔎 Answering {} questions with {} ({})...",
        items.len(),
        engine.strategy(),
        engine.model()
    );

    let records = answer_all(engine, items, concurrency).await;

    let mut lines = String::new();
    for record in &records {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, lines).await?;

    let failed = records
        .iter()
        .filter(|r| r.attributes.contains_key("error"))
        .count();
    let answered: Vec<&RunRecord> = records.iter().filter(|r| r.total_ms.is_some()).collect();

    info!(
        answered = answered.len(),
        failed,
        output = %output.display(),
        "Batch complete"
    );

    println!("   ✅ {} answered, {} failed", answered.len(), failed);
    println!(
        "   Average retrieval time: {:.1} ms",
        average(answered.iter().filter_map(|r| r.retrieval_ms))
    );
    println!(
        "   Average total time:     {:.1} ms",
        average(answered.iter().filter_map(|r| r.total_ms))
    );
    println!(
        "   Average context tokens: {:.1}",
        average(answered.iter().filter_map(|r| r.context_tokens.map(|t| t as u64)))
    );
    println!("   Results written to {}", output.display());

    Ok(())
}
